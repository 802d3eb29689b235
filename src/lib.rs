//! ============================================================================
//! File: scriptpad/src/lib.rs
//! ----------------------------------------------------------------------------
//! Script execution engine for a desktop code playground.
//!
//! Runs user-supplied code in an external interpreter (Python, Node.js, Deno)
//! and returns one normalized string: the merged program output, or a
//! human-readable diagnostic when the run could not proceed.
//!
//! ```no_run
//! # async fn demo() {
//! use scriptpad::{RunOptions, run_script};
//!
//! let out = run_script("python", "print(input()[::-1])", "olleh", RunOptions::default()).await;
//! assert_eq!(out, "hello");
//! # }
//! ```
//! ============================================================================

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod language;
pub mod locator;
pub mod materializer;
pub mod normalizer;
pub mod platform_utils;
pub mod runner;
pub mod verdict;

pub use config::{DebounceConfig, DebouncePolicy, EngineConfig};
pub use coordinator::{RequestCoordinator, Settled};
pub use engine::{
    Diagnostic, ExecutionReport, ExecutionRequest, Outcome, RunOptions, ScriptEngine,
    global_engine, init_global_engine, run_script,
};
pub use error::{ExecError, Result};
pub use language::{ArgToken, InvocationStyle, LanguageRegistry, LanguageSpec};
pub use locator::{InterpreterLocator, ResolvedInterpreter};
pub use normalizer::normalize;
pub use verdict::{Verdict, compare};
