// ============================================================================
// File: scriptpad/src/locator/shell_path.rs
// ----------------------------------------------------------------------------
// Search-path discovery through the user's login shell.
//
// Desktop launchers (notably on macOS) start GUI processes with a minimal
// PATH. Asking an interactive login shell for its PATH recovers the
// directories added by the user's shell profile.
// ============================================================================

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use tokio::process::Command;

use crate::platform_utils::split_search_path;

pub(crate) const MARKER: &str = "__SCRIPTPAD_PATH__";

/// Upper bound for the shell to print its PATH
pub const SHELL_PATH_TIMEOUT: Duration = Duration::from_secs(5);

/// Ask `shell`, run as an interactive login shell, for its search path
///
/// Returns the directories in search order, or `None` when the shell could
/// not be run or printed nothing usable. Failures are logged, never raised.
pub async fn login_shell_search_path(shell: &Path, timeout: Duration) -> Option<Vec<PathBuf>> {
    let script = format!("printf '%s%s%s' '{MARKER}' \"$PATH\" '{MARKER}'");

    let mut cmd = Command::new(shell);
    cmd.arg("-ilc")
        .arg(&script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!("Failed to run login shell {}: {}", shell.display(), e);
            return None;
        }
        Err(_) => {
            warn!(
                "Login shell {} did not report its PATH within {:?}",
                shell.display(),
                timeout
            );
            return None;
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    match extract_marked(&stdout) {
        Some(raw) => {
            let dirs = split_search_path(raw);
            debug!("Login shell search path has {} entries", dirs.len());
            if dirs.is_empty() { None } else { Some(dirs) }
        }
        None => {
            warn!("Login shell {} printed no PATH", shell.display());
            None
        }
    }
}

/// Text between the first pair of markers
///
/// Profiles may print banners before or after the command runs, so the
/// value is fenced rather than taken as the whole output.
pub(crate) fn extract_marked(text: &str) -> Option<&str> {
    let start = text.find(MARKER)? + MARKER.len();
    let len = text[start..].find(MARKER)?;
    let value = text[start..start + len].trim();
    if value.is_empty() { None } else { Some(value) }
}
