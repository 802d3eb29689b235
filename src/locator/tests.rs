// ============================================================================
// File: scriptpad/src/locator/tests.rs
// ----------------------------------------------------------------------------
// Test suite for the interpreter locator
// ============================================================================

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::EngineConfig;

use super::shell_path::MARKER;
use super::{InterpreterLocator, SHELL_PATH_TIMEOUT, SearchSettings, login_shell_search_path};

fn isolated_settings() -> SearchSettings {
    SearchSettings {
        shell_fallback: false,
        ..SearchSettings::default()
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn fake_interpreter(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write fake interpreter");
    set_executable(&path).expect("make fake interpreter executable");
    path
}

/// A "login shell" that ignores its arguments and reports `search_path`
/// between the PATH markers, after some profile noise
#[cfg(unix)]
fn fake_shell(dir: &Path, search_path: &str) -> PathBuf {
    let path = dir.join("fake-login-shell");
    let body = format!(
        "#!/bin/sh\necho 'Last login: today'\nprintf '%s%s%s\\n' '{MARKER}' '{search_path}' '{MARKER}'\n"
    );
    std::fs::write(&path, body).expect("write fake shell");
    set_executable(&path).expect("make fake shell executable");
    path
}

#[tokio::test]
async fn preset_entries_are_returned_verbatim() {
    let locator = InterpreterLocator::with_entries([
        ("python".to_string(), None),
        ("node".to_string(), Some(PathBuf::from("/opt/node/bin/node"))),
    ]);

    assert!(locator.is_initialized());
    assert_eq!(locator.resolve("python").await, None);
    assert_eq!(locator.resolve("node").await, Some(PathBuf::from("/opt/node/bin/node")));
    assert_eq!(locator.resolve("deno").await, None);
}

#[tokio::test]
async fn unknown_command_is_absent() {
    let locator = InterpreterLocator::new(
        vec!["scriptpad-no-such-interpreter".to_string()],
        isolated_settings(),
    );

    assert_eq!(locator.resolve("scriptpad-no-such-interpreter").await, None);
    let resolved = locator.resolved().await;
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].path, None);
}

#[cfg(unix)]
#[tokio::test]
async fn extra_search_path_is_consulted() {
    let dir = tempfile::tempdir().expect("temp dir");
    let expected = fake_interpreter(dir.path(), "scriptpad-fake-interp");

    let settings = SearchSettings {
        extra_search_paths: vec![dir.path().to_path_buf()],
        ..isolated_settings()
    };
    let locator = InterpreterLocator::new(vec!["scriptpad-fake-interp".to_string()], settings);

    let found = locator.resolve("scriptpad-fake-interp").await.expect("should be found");
    assert_eq!(
        found.canonicalize().expect("canonical found"),
        expected.canonicalize().expect("canonical expected")
    );
}

#[tokio::test]
async fn pinned_paths_must_exist() {
    let dir = tempfile::tempdir().expect("temp dir");
    let real = fake_interpreter(dir.path(), "pinned-python");

    let settings = SearchSettings {
        overrides: [
            ("python".to_string(), real.clone()),
            ("node".to_string(), dir.path().join("missing-node")),
        ]
        .into_iter()
        .collect(),
        ..isolated_settings()
    };
    let locator = InterpreterLocator::new(vec!["python".into(), "node".into()], settings);

    assert_eq!(locator.resolve("python").await, Some(real));
    assert_eq!(locator.resolve("node").await, None);
}

#[cfg(unix)]
#[tokio::test]
async fn inherited_path_finds_sh() {
    let locator = InterpreterLocator::new(vec!["sh".to_string()], isolated_settings());
    let sh = locator.resolve("sh").await.expect("sh should be on PATH");
    assert!(sh.is_absolute());
}

#[tokio::test]
async fn concurrent_callers_share_one_initialization() {
    let locator = Arc::new(InterpreterLocator::new(
        vec!["scriptpad-no-such-interpreter".to_string()],
        isolated_settings(),
    ));
    let background = locator.spawn_initialize();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let locator = Arc::clone(&locator);
        handles.push(tokio::spawn(async move {
            locator.resolve("scriptpad-no-such-interpreter").await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.expect("task should not panic"), None);
    }
    background.await.expect("background init should finish");
    assert!(locator.is_initialized());
}

#[cfg(unix)]
#[tokio::test]
async fn login_shell_path_is_read_between_markers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let shell = fake_shell(dir.path(), "/opt/one/bin:/opt/two/bin");

    let dirs = login_shell_search_path(&shell, SHELL_PATH_TIMEOUT).await;
    assert_eq!(
        dirs,
        Some(vec![PathBuf::from("/opt/one/bin"), PathBuf::from("/opt/two/bin")])
    );
}

#[cfg(unix)]
#[tokio::test]
async fn silent_login_shell_reports_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let shell = dir.path().join("quiet-shell");
    std::fs::write(&shell, "#!/bin/sh\necho 'no path here'\n").expect("write quiet shell");
    set_executable(&shell).expect("make quiet shell executable");

    assert_eq!(login_shell_search_path(&shell, SHELL_PATH_TIMEOUT).await, None);
    assert_eq!(
        login_shell_search_path(&dir.path().join("missing-shell"), SHELL_PATH_TIMEOUT).await,
        None
    );
}

#[cfg(unix)]
#[tokio::test]
async fn login_shell_fallback_finds_interpreter() {
    const COMMAND: &str = "scriptpad-shell-only-interp";

    let shell_dir = tempfile::tempdir().expect("shell dir");
    let bin_dir = tempfile::tempdir().expect("bin dir");
    let expected = fake_interpreter(bin_dir.path(), COMMAND);
    let shell = fake_shell(shell_dir.path(), &bin_dir.path().display().to_string());

    let config = EngineConfig::new().with_login_shell(&shell);
    let settings = SearchSettings::from_config(&config);
    assert!(settings.shell_fallback);
    let locator = InterpreterLocator::new(vec![COMMAND.to_string()], settings);

    let found = locator.resolve(COMMAND).await.expect("found through the login shell");
    assert_eq!(
        found.canonicalize().expect("canonical found"),
        expected.canonicalize().expect("canonical expected")
    );

    // Same shell, fallback off: the inherited path alone does not have it.
    let settings = SearchSettings {
        login_shell: Some(shell),
        ..isolated_settings()
    };
    let locator = InterpreterLocator::new(vec![COMMAND.to_string()], settings);
    assert_eq!(locator.resolve(COMMAND).await, None);
}
