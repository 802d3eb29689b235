// ============================================================================
// File: scriptpad/src/language/registry.rs
// ----------------------------------------------------------------------------
// Fixed set of languages known to an engine, keyed by logical name.
// ============================================================================

use std::collections::BTreeMap;

use crate::error::{ExecError, Result};

use super::LanguageSpec;

/// Lookup table of supported languages
///
/// Built once when the engine is created and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: BTreeMap<String, LanguageSpec>,
}

impl LanguageRegistry {
    /// Registry with no languages
    pub fn empty() -> Self {
        Self {
            languages: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in python, javascript and deno entries
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for spec in [
            LanguageSpec::python(),
            LanguageSpec::javascript(),
            LanguageSpec::deno(),
        ] {
            registry.languages.insert(spec.name.clone(), spec);
        }
        registry
    }

    /// Add or replace a language
    ///
    /// # Errors
    /// Rejects templates that do not contain exactly one placeholder.
    pub fn register(&mut self, spec: LanguageSpec) -> Result<()> {
        if spec.placeholder_count() != 1 {
            return Err(ExecError::Config(format!(
                "language '{}' must have exactly one $FILE placeholder, found {}",
                spec.name,
                spec.placeholder_count()
            )));
        }
        if spec.command.trim().is_empty() {
            return Err(ExecError::Config(format!(
                "language '{}' has an empty interpreter command",
                spec.name
            )));
        }
        self.languages.insert(spec.name.clone(), spec);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, spec: LanguageSpec) -> Result<Self> {
        self.register(spec)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&LanguageSpec> {
        self.languages.get(name)
    }

    /// Find the language whose extension matches, with or without the dot
    pub fn by_extension(&self, extension: &str) -> Option<&LanguageSpec> {
        let wanted = extension.trim_start_matches('.');
        self.languages
            .values()
            .find(|spec| spec.extension.trim_start_matches('.').eq_ignore_ascii_case(wanted))
    }

    /// Distinct interpreter commands, in a stable order
    pub fn commands(&self) -> Vec<String> {
        let mut commands: Vec<String> =
            self.languages.values().map(|s| s.command.clone()).collect();
        commands.sort();
        commands.dedup();
        commands
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::ArgToken;

    #[test]
    fn builtin_lookup() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("javascript").map(|s| s.command.as_str()), Some("node"));
        assert!(registry.get("cobol").is_none());
        assert_eq!(registry.commands(), vec!["deno", "node", "python"]);
    }

    #[test]
    fn extension_lookup() {
        let registry = LanguageRegistry::builtin();
        assert_eq!(registry.by_extension("py").map(|s| s.name.as_str()), Some("python"));
        assert_eq!(registry.by_extension(".TS").map(|s| s.name.as_str()), Some("deno"));
        assert!(registry.by_extension("rb").is_none());
    }

    #[test]
    fn rejects_templates_without_single_placeholder() {
        let mut registry = LanguageRegistry::empty();
        let none = LanguageSpec::new("sh", "sh", ".sh").with_args(vec![ArgToken::literal("-e")]);
        assert!(registry.register(none).is_err());

        let two = LanguageSpec::new("sh", "sh", ".sh")
            .with_args(vec![ArgToken::placeholder(), ArgToken::placeholder()]);
        assert!(registry.register(two).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn register_replaces_existing_entry() {
        let registry = LanguageRegistry::builtin()
            .with(LanguageSpec::new("python", "python3", ".py"))
            .expect("replacement should register");
        assert_eq!(registry.get("python").map(|s| s.command.as_str()), Some("python3"));
        assert_eq!(registry.len(), 3);
    }
}
