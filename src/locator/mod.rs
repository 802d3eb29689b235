// ============================================================================
// File: scriptpad/src/locator/mod.rs
// ----------------------------------------------------------------------------
// Interpreter locator: resolves interpreter command names to absolute paths.
//
// Resolution order for each command:
// - a pinned path from configuration
// - the inherited search path, then configured extra directories
// - the login shell's search path (when enabled)
//
// All known commands are resolved together, once, and the table is shared by
// every run for the lifetime of the locator.
// ============================================================================

mod shell_path;

#[cfg(test)]
mod tests;

pub use shell_path::{SHELL_PATH_TIMEOUT, login_shell_search_path};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::OnceCell;
use tokio::task::JoinSet;

use crate::config::EngineConfig;
use crate::language::LanguageRegistry;
use crate::platform_utils::login_shell;

/// Outcome of resolving one command name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterpreter {
    pub command: String,
    pub path: Option<PathBuf>,
}

/// Where the locator looks besides the inherited search path
#[derive(Debug, Clone, Default)]
pub struct SearchSettings {
    pub shell_fallback: bool,
    pub extra_search_paths: Vec<PathBuf>,
    pub overrides: HashMap<String, PathBuf>,
    /// Shell asked for the fallback path; the user's login shell when unset
    pub login_shell: Option<PathBuf>,
}

impl SearchSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            shell_fallback: config.shell_fallback,
            extra_search_paths: config.extra_search_paths.clone(),
            overrides: config.interpreter_overrides.clone(),
            login_shell: config.login_shell.clone(),
        }
    }
}

type PathTable = HashMap<String, ResolvedInterpreter>;

/// Process-lifetime cache of interpreter locations
///
/// The table is filled exactly once; concurrent callers of
/// [`resolve`](Self::resolve) wait on the same initialization.
#[derive(Debug)]
pub struct InterpreterLocator {
    commands: Vec<String>,
    settings: SearchSettings,
    table: OnceCell<PathTable>,
}

impl InterpreterLocator {
    pub fn new(commands: Vec<String>, settings: SearchSettings) -> Self {
        Self {
            commands,
            settings,
            table: OnceCell::new(),
        }
    }

    /// Locator for every command used by `registry`
    pub fn for_registry(registry: &LanguageRegistry, config: &EngineConfig) -> Self {
        Self::new(registry.commands(), SearchSettings::from_config(config))
    }

    /// Locator with a fixed, already-initialized table
    ///
    /// No searching ever happens; commands missing from `entries` are absent.
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<PathBuf>)>,
    {
        let table: PathTable = entries
            .into_iter()
            .map(|(command, path)| {
                let resolved = ResolvedInterpreter {
                    command: command.clone(),
                    path,
                };
                (command, resolved)
            })
            .collect();
        let commands = table.keys().cloned().collect();

        Self {
            commands,
            settings: SearchSettings::default(),
            table: OnceCell::new_with(Some(table)),
        }
    }

    /// Start resolution in the background
    ///
    /// Callers that need a path still go through [`resolve`](Self::resolve),
    /// which waits for this same initialization to finish.
    pub fn spawn_initialize(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let locator = Arc::clone(self);
        tokio::spawn(async move {
            locator.initialize().await;
        })
    }

    /// Resolve all known commands, once
    pub async fn initialize(&self) -> &HashMap<String, ResolvedInterpreter> {
        self.table
            .get_or_init(|| resolve_all(self.commands.clone(), self.settings.clone()))
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.table.initialized()
    }

    /// Absolute path of `command`, or `None` if it could not be found
    pub async fn resolve(&self, command: &str) -> Option<PathBuf> {
        self.initialize()
            .await
            .get(command)
            .and_then(|resolved| resolved.path.clone())
    }

    /// Snapshot of every resolution result, sorted by command
    pub async fn resolved(&self) -> Vec<ResolvedInterpreter> {
        let mut all: Vec<_> = self.initialize().await.values().cloned().collect();
        all.sort_by(|a, b| a.command.cmp(&b.command));
        all
    }
}

async fn resolve_all(commands: Vec<String>, settings: SearchSettings) -> PathTable {
    let mut table = PathTable::new();
    let mut pending = JoinSet::new();

    for command in commands {
        if let Some(pinned) = settings.overrides.get(&command) {
            let path = check_pinned(&command, pinned);
            table.insert(command.clone(), ResolvedInterpreter { command, path });
            continue;
        }

        let extra = settings.extra_search_paths.clone();
        pending.spawn_blocking(move || {
            let path = search_inherited(&command).or_else(|| search_dirs(&command, &extra));
            (command, path)
        });
    }

    let mut missing = Vec::new();
    while let Some(joined) = pending.join_next().await {
        match joined {
            Ok((command, Some(path))) => {
                info!("Found {} at {}", command, path.display());
                table.insert(command.clone(), ResolvedInterpreter { command, path: Some(path) });
            }
            Ok((command, None)) => missing.push(command),
            Err(e) => warn!("Interpreter lookup task failed: {}", e),
        }
    }

    if !missing.is_empty() && settings.shell_fallback {
        debug!("Consulting login shell for {:?}", missing);
        let shell = settings.login_shell.clone().or_else(login_shell);
        let dirs = match shell {
            Some(shell) => login_shell_search_path(&shell, SHELL_PATH_TIMEOUT).await,
            None => None,
        };
        if let Some(dirs) = dirs {
            let lookup = missing.clone();
            let found = tokio::task::spawn_blocking(move || {
                lookup
                    .into_iter()
                    .map(|command| {
                        let path = search_dirs(&command, &dirs);
                        (command, path)
                    })
                    .collect::<Vec<_>>()
            })
            .await;

            missing = match found {
                Ok(results) => {
                    let mut still_missing = Vec::new();
                    for (command, path) in results {
                        match path {
                            Some(path) => {
                                info!("Found {} via login shell at {}", command, path.display());
                                table.insert(
                                    command.clone(),
                                    ResolvedInterpreter { command, path: Some(path) },
                                );
                            }
                            None => still_missing.push(command),
                        }
                    }
                    still_missing
                }
                Err(e) => {
                    warn!("Login shell lookup task failed: {}", e);
                    missing
                }
            };
        }
    }

    for command in missing {
        warn!("Could not find interpreter {} on any search path", command);
        table.insert(command.clone(), ResolvedInterpreter { command, path: None });
    }

    table
}

fn check_pinned(command: &str, pinned: &Path) -> Option<PathBuf> {
    if pinned.is_file() {
        info!("Using pinned {} at {}", command, pinned.display());
        Some(pinned.to_path_buf())
    } else {
        warn!("Pinned interpreter for {} does not exist: {}", command, pinned.display());
        None
    }
}

fn search_inherited(command: &str) -> Option<PathBuf> {
    which::which(command).ok()
}

fn search_dirs(command: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    if dirs.is_empty() {
        return None;
    }
    let joined = std::env::join_paths(dirs).ok()?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    which::which_in(command, Some(joined), cwd).ok()
}
