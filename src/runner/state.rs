// ============================================================================
// File: scriptpad/src/runner/state.rs
// ----------------------------------------------------------------------------
// Lifecycle of a single interpreter process.
//
//   Created ──► Running ──► Completed
//      │           └──────► TimedOut
//      └──────────────────► LaunchFailed
// ============================================================================

use std::fmt;

use log::debug;

/// State of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    Running,
    Completed,
    TimedOut,
    LaunchFailed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::TimedOut | RunState::LaunchFailed)
    }

    pub fn can_transition_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Created, RunState::Running)
                | (RunState::Created, RunState::LaunchFailed)
                | (RunState::Running, RunState::Completed)
                | (RunState::Running, RunState::TimedOut)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Created => "created",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::TimedOut => "timed-out",
            RunState::LaunchFailed => "launch-failed",
        };
        f.write_str(name)
    }
}

/// Tracks the current state and rejects illegal transitions
#[derive(Debug)]
pub struct Lifecycle {
    label: String,
    state: RunState,
}

impl Lifecycle {
    pub fn new<L: Into<String>>(label: L) -> Self {
        Self {
            label: label.into(),
            state: RunState::Created,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Move to `next`, returning false (and staying put) if not allowed
    pub fn advance(&mut self, next: RunState) -> bool {
        if !self.state.can_transition_to(next) {
            debug!("{}: ignoring transition {} -> {}", self.label, self.state, next);
            return false;
        }
        debug!("{}: {} -> {}", self.label, self.state, next);
        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut lifecycle = Lifecycle::new("test");
        assert!(lifecycle.advance(RunState::Running));
        assert!(lifecycle.advance(RunState::Completed));
        assert!(lifecycle.state().is_terminal());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut lifecycle = Lifecycle::new("test");
        assert!(lifecycle.advance(RunState::Running));
        assert!(lifecycle.advance(RunState::TimedOut));
        assert!(!lifecycle.advance(RunState::Completed));
        assert_eq!(lifecycle.state(), RunState::TimedOut);
    }

    #[test]
    fn launch_failure_skips_running() {
        let mut lifecycle = Lifecycle::new("test");
        assert!(!lifecycle.advance(RunState::TimedOut));
        assert!(lifecycle.advance(RunState::LaunchFailed));
        assert!(!lifecycle.advance(RunState::Running));
    }
}
