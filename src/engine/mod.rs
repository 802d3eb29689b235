// ============================================================================
// File: scriptpad/src/engine/mod.rs
// ----------------------------------------------------------------------------
// Script execution pipeline: language lookup, interpreter resolution,
// script materialization, process run and output normalization.
//
// Every failure is folded into an `Outcome`; the string-returning entry
// points never fail.
// ============================================================================

mod global;
mod outcome;


pub use global::{global_engine, init_global_engine, run_script};
pub use outcome::{Diagnostic, ExecutionReport, Outcome};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{ExecError, Result};
use crate::language::{LanguageRegistry, LanguageSpec};
use crate::locator::InterpreterLocator;
use crate::materializer::materialize;
use crate::normalizer::normalize;
use crate::runner::{ProcessRunner, RunOutcome};

/// One invocation of a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub id: Uuid,
    pub language: String,
    pub script: String,
    pub stdin: String,
    /// Keep ANSI escape sequences in the output
    pub preserve_color: bool,
}

impl ExecutionRequest {
    pub fn new<L: Into<String>, S: Into<String>>(language: L, script: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            language: language.into(),
            script: script.into(),
            stdin: String::new(),
            preserve_color: false,
        }
    }

    pub fn with_stdin<I: Into<String>>(mut self, stdin: I) -> Self {
        self.stdin = stdin.into();
        self
    }

    pub fn with_color(mut self, preserve_color: bool) -> Self {
        self.preserve_color = preserve_color;
        self
    }
}

/// Caller preferences for [`ScriptEngine::run_script`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub preserve_color: bool,
}

/// Runs scripts through the configured interpreters
#[derive(Debug)]
pub struct ScriptEngine {
    registry: LanguageRegistry,
    locator: Arc<InterpreterLocator>,
    runner: ProcessRunner,
    script_dir: PathBuf,
}

impl ScriptEngine {
    /// Build an engine from configuration
    ///
    /// Interpreter lookup does not start until [`start`](Self::start) or the
    /// first run.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let registry = config.registry()?;
        let locator = InterpreterLocator::for_registry(&registry, config);
        Ok(Self::from_parts(registry, locator, config))
    }

    /// Engine with the built-in languages and default settings
    pub fn builtin() -> Self {
        let config = EngineConfig::default();
        let registry = LanguageRegistry::builtin();
        let locator = InterpreterLocator::for_registry(&registry, &config);
        Self::from_parts(registry, locator, &config)
    }

    /// Assemble an engine from explicit components
    pub fn from_parts(
        registry: LanguageRegistry,
        locator: InterpreterLocator,
        config: &EngineConfig,
    ) -> Self {
        Self {
            registry,
            locator: Arc::new(locator),
            runner: ProcessRunner::new(config.timeout()),
            script_dir: config.script_dir(),
        }
    }

    /// Kick off interpreter resolution in the background
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        self.locator.spawn_initialize()
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn locator(&self) -> &Arc<InterpreterLocator> {
        &self.locator
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Run a script and return the text to display
    ///
    /// Always resolves: failures come back as diagnostic text.
    pub async fn run_script(
        &self,
        language: &str,
        script: &str,
        stdin: &str,
        options: RunOptions,
    ) -> String {
        let request = ExecutionRequest::new(language, script)
            .with_stdin(stdin)
            .with_color(options.preserve_color);
        self.run(&request).await.into_text()
    }

    /// Run a request and return its tagged outcome
    pub async fn run(&self, request: &ExecutionRequest) -> Outcome {
        self.execute(request).await.outcome
    }

    /// Run a request and return the full report
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionReport {
        let started_at = Utc::now();
        let (outcome, exit_code) = self.pipeline(request).await;
        let finished_at = Utc::now();

        let elapsed_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        ExecutionReport {
            id: request.id,
            language: request.language.clone(),
            outcome,
            exit_code,
            started_at,
            finished_at,
            elapsed_ms,
        }
    }

    async fn pipeline(&self, request: &ExecutionRequest) -> (Outcome, Option<i32>) {
        let Some(spec) = self.registry.get(&request.language) else {
            warn!("[{}] unknown language {:?}", request.id, request.language);
            return (
                Diagnostic::UnknownLanguage {
                    language: request.language.clone(),
                }
                .into(),
                None,
            );
        };

        let Some(program) = self.locator.resolve(&spec.command).await else {
            warn!("[{}] {} is not installed", request.id, spec.command);
            return (
                Diagnostic::CommandNotFound {
                    command: spec.command.clone(),
                }
                .into(),
                None,
            );
        };

        // Dropping the invocation removes the script file, whatever the outcome.
        let invocation = match materialize(spec, &request.script, &self.script_dir) {
            Ok(invocation) => invocation,
            Err(e) => {
                return (
                    Diagnostic::MaterializeFailed {
                        reason: e.to_string(),
                    }
                    .into(),
                    None,
                );
            }
        };

        info!(
            "[{}] running {} script with {}",
            request.id,
            spec.name,
            program.display()
        );
        let result = self
            .runner
            .run(&program, invocation.args(), &request.stdin)
            .await;
        drop(invocation);

        settle(spec, result, request.preserve_color, &self.runner)
    }
}

fn settle(
    spec: &LanguageSpec,
    result: RunOutcome,
    preserve_color: bool,
    runner: &ProcessRunner,
) -> (Outcome, Option<i32>) {
    match result {
        RunOutcome::Completed {
            output, exit_code, ..
        } => (Outcome::Output(normalize(&output, preserve_color)), exit_code),
        RunOutcome::TimedOut { .. } => (Diagnostic::timed_out(runner.timeout()).into(), None),
        RunOutcome::LaunchFailed { error } => {
            let reason = match error {
                ExecError::Spawn { source, .. } => source.to_string(),
                other => other.to_string(),
            };
            (
                Diagnostic::LaunchFailed {
                    command: spec.command.clone(),
                    reason,
                }
                .into(),
                None,
            )
        }
    }
}
