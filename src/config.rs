// ============================================================================
// File: scriptpad/src/config.rs
// ----------------------------------------------------------------------------
// Engine configuration: timeouts, interpreter search, extra languages and the
// debounce policy used by the request coordinator.
// ============================================================================

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ExecError, Result};
use crate::language::{LanguageRegistry, LanguageSpec};

/// Default wall-clock limit for one run
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default debounce window for live re-runs
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Environment variable overriding `timeout_ms`
pub const TIMEOUT_ENV_VAR: &str = "SCRIPTPAD_TIMEOUT_MS";

/// Which edge of a debounce window actually runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebouncePolicy {
    /// Wait for the window to go quiet, then run the newest request
    #[default]
    Trailing,
    /// Run the first request immediately, fold later ones in the window into it
    Leading,
}

/// Debounce settings for the request coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    pub window_ms: u64,
    pub policy: DebouncePolicy,
}

impl DebounceConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_DEBOUNCE_MS,
            policy: DebouncePolicy::Trailing,
        }
    }
}

/// Engine configuration
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline for a single run in milliseconds
    pub timeout_ms: u64,

    /// Directory for script files (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,

    /// Fall back to the login shell's search path
    pub shell_fallback: bool,

    /// Shell consulted for the fallback search path (`$SHELL` when unset)
    pub login_shell: Option<PathBuf>,

    /// Directories searched after the inherited search path
    pub extra_search_paths: Vec<PathBuf>,

    /// Pinned interpreter paths by command name
    pub interpreter_overrides: HashMap<String, PathBuf>,

    /// Additional or replacement languages
    pub languages: Vec<LanguageSpec>,

    pub debounce: DebounceConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SCRIPTPAD_TIMEOUT_MS` if it is set and parses
    pub fn apply_env(self) -> Self {
        let raw = std::env::var(TIMEOUT_ENV_VAR).ok();
        self.with_timeout_override(raw.as_deref())
    }

    /// Apply a raw timeout override; zero or unparsable values are ignored
    pub fn with_timeout_override(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.timeout_ms = ms,
                _ => warn!("Ignoring invalid {TIMEOUT_ENV_VAR} value: {raw:?}"),
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(ExecError::Config("timeout_ms must be greater than zero".into()));
        }
        // Surfaces template errors at load time rather than on first run
        self.registry().map(|_| ())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolved script directory
    pub fn script_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Built-in languages with configured entries merged over them
    pub fn registry(&self) -> Result<LanguageRegistry> {
        let mut registry = LanguageRegistry::builtin();
        for spec in &self.languages {
            registry.register(spec.clone())?;
        }
        Ok(registry)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis().max(1) as u64;
        self
    }

    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_shell_fallback(mut self, enabled: bool) -> Self {
        self.shell_fallback = enabled;
        self
    }

    pub fn with_login_shell<P: Into<PathBuf>>(mut self, shell: P) -> Self {
        self.login_shell = Some(shell.into());
        self
    }

    pub fn with_search_path<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.extra_search_paths.push(dir.into());
        self
    }

    pub fn with_interpreter<C: Into<String>, P: Into<PathBuf>>(mut self, command: C, path: P) -> Self {
        self.interpreter_overrides.insert(command.into(), path.into());
        self
    }

    pub fn with_language(mut self, spec: LanguageSpec) -> Self {
        self.languages.push(spec);
        self
    }

    pub fn with_debounce(mut self, window: Duration, policy: DebouncePolicy) -> Self {
        self.debounce = DebounceConfig {
            window_ms: window.as_millis() as u64,
            policy,
        };
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            temp_dir: None,
            shell_fallback: true,
            login_shell: None,
            extra_search_paths: Vec::new(),
            interpreter_overrides: HashMap::new(),
            languages: Vec::new(),
            debounce: DebounceConfig::default(),
        }
    }
}
