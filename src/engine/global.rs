// ============================================================================
// File: scriptpad/src/engine/global.rs
// ----------------------------------------------------------------------------
// Process-wide engine singleton
// ============================================================================

use std::sync::{Arc, OnceLock};

use log::warn;

use crate::config::EngineConfig;
use crate::error::{ExecError, Result};

use super::{RunOptions, ScriptEngine};

static GLOBAL_ENGINE: OnceLock<Arc<ScriptEngine>> = OnceLock::new();

/// Get the global engine, building it from defaults on first use
///
/// When called inside a tokio runtime the first call also starts interpreter
/// resolution in the background.
pub fn global_engine() -> Arc<ScriptEngine> {
    let engine = GLOBAL_ENGINE.get_or_init(|| {
        let engine = ScriptEngine::new(&EngineConfig::default().apply_env()).unwrap_or_else(|e| {
            warn!("Falling back to built-in engine: {}", e);
            ScriptEngine::builtin()
        });
        if tokio::runtime::Handle::try_current().is_ok() {
            let _ = engine.start();
        }
        Arc::new(engine)
    });
    Arc::clone(engine)
}

/// Install a custom global engine
///
/// # Errors
/// Fails if the global engine was already created.
pub fn init_global_engine(engine: ScriptEngine) -> Result<()> {
    GLOBAL_ENGINE
        .set(Arc::new(engine))
        .map_err(|_| ExecError::Config("Global engine already initialized".to_string()))
}

/// Run a script on the global engine
///
/// Resolves with program output or a diagnostic string; never fails.
pub async fn run_script(language: &str, script: &str, stdin: &str, options: RunOptions) -> String {
    global_engine()
        .run_script(language, script, stdin, options)
        .await
}
