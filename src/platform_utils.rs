// ============================================================================
// File: scriptpad/src/platform_utils.rs
// ----------------------------------------------------------------------------
// Cross-platform helpers for the interpreter search
// ============================================================================

use std::path::PathBuf;

/// The user's login shell, if the platform has one
///
/// Reads `$SHELL` and falls back to `/bin/sh`. Always `None` on Windows,
/// where GUI processes inherit the full user environment.
#[cfg(unix)]
pub fn login_shell() -> Option<PathBuf> {
    match std::env::var_os("SHELL") {
        Some(shell) if !shell.is_empty() => Some(PathBuf::from(shell)),
        _ => Some(PathBuf::from("/bin/sh")),
    }
}

#[cfg(not(unix))]
pub fn login_shell() -> Option<PathBuf> {
    None
}

/// Split a search-path string on the platform separator, dropping empty entries
pub fn split_search_path(raw: &str) -> Vec<PathBuf> {
    std::env::split_paths(raw)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}
