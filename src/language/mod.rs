// ============================================================================
// File: scriptpad/src/language/mod.rs
// ----------------------------------------------------------------------------
// Language descriptions: which interpreter runs a language, how the script is
// handed to it, and the argument template used to build the command line.
// ============================================================================

mod registry;

pub use registry::LanguageRegistry;

use serde::{Deserialize, Serialize};

/// One token of an interpreter argument template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgToken {
    /// Replaced by the script file path or the inline script text
    Placeholder(ScriptSlot),
    /// Passed through unchanged
    Literal(String),
}

/// Marker for the placeholder token in serialized templates (`"$FILE"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptSlot {
    #[serde(rename = "$FILE")]
    Script,
}

impl ArgToken {
    pub fn literal<S: Into<String>>(value: S) -> Self {
        ArgToken::Literal(value.into())
    }

    pub fn placeholder() -> Self {
        ArgToken::Placeholder(ScriptSlot::Script)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ArgToken::Placeholder(_))
    }
}

/// How the script reaches the interpreter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStyle {
    /// Written to a temporary file whose path fills the placeholder
    #[default]
    File,
    /// Passed directly as a command-line argument (`-c` / `-e` style)
    Inline,
}

/// Immutable description of a supported language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpec {
    /// Logical name used by callers (e.g. "python")
    pub name: String,

    /// Interpreter command looked up on the search path (e.g. "node")
    pub command: String,

    /// Script file extension including the dot (e.g. ".py")
    pub extension: String,

    /// Argument template with exactly one placeholder
    pub args: Vec<ArgToken>,

    #[serde(default)]
    pub style: InvocationStyle,
}

impl LanguageSpec {
    /// Create a file-invoked language whose template is just the script path
    pub fn new<N, C, E>(name: N, command: C, extension: E) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        E: Into<String>,
    {
        Self {
            name: name.into(),
            command: command.into(),
            extension: extension.into(),
            args: vec![ArgToken::placeholder()],
            style: InvocationStyle::File,
        }
    }

    /// Replace the argument template
    pub fn with_args(mut self, args: Vec<ArgToken>) -> Self {
        self.args = args;
        self
    }

    /// Set the invocation style
    pub fn with_style(mut self, style: InvocationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn python() -> Self {
        Self::new("python", "python", ".py")
    }

    pub fn javascript() -> Self {
        Self::new("javascript", "node", ".js")
    }

    pub fn deno() -> Self {
        Self::new("deno", "deno", ".ts").with_args(vec![
            ArgToken::literal("run"),
            ArgToken::literal("-q"),
            ArgToken::placeholder(),
        ])
    }

    /// Number of placeholder tokens in the template
    pub fn placeholder_count(&self) -> usize {
        self.args.iter().filter(|t| t.is_placeholder()).count()
    }
}
