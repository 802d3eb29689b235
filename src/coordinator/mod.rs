// ============================================================================
// File: scriptpad/src/coordinator/mod.rs
// ----------------------------------------------------------------------------
// Debounced front end for live re-runs (e.g. on every keystroke).
//
// Requests arriving within one debounce window are coalesced into a single
// run. Every coalesced caller receives the result of the run that actually
// executed for its window:
// - Trailing: the newest request runs once the window has been quiet.
// - Leading: the first request runs at once; later ones within the window
//   (each call extends it) share that run's result.
//
// Runs execute on spawned tasks, so a caller that stops waiting never holds
// back the others.
// ============================================================================


use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::{DebounceConfig, DebouncePolicy};
use crate::engine::{Diagnostic, ExecutionRequest, Outcome, RunOptions, ScriptEngine};

/// Result delivered to every caller of one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    /// Request that actually ran, `None` if the run was lost
    pub executed: Option<Uuid>,
    pub outcome: Outcome,
}

impl Settled {
    fn abandoned() -> Self {
        Self {
            executed: None,
            outcome: Diagnostic::Abandoned.into(),
        }
    }

    /// Whether `request` is the one that ran
    pub fn ran(&self, request: &ExecutionRequest) -> bool {
        self.executed == Some(request.id)
    }
}

type Slot = Option<Settled>;

struct Batch {
    /// Held until the run for this window starts (trailing policy only)
    sender: Option<watch::Sender<Slot>>,
    receiver: watch::Receiver<Slot>,
    quiet_until: Instant,
}

impl Batch {
    fn open(quiet_until: Instant) -> Self {
        let (sender, receiver) = watch::channel(None);
        Self {
            sender: Some(sender),
            receiver,
            quiet_until,
        }
    }
}

#[derive(Default)]
struct WindowState {
    generation: u64,
    batch: Option<Batch>,
}

/// Debouncing wrapper around a [`ScriptEngine`]
#[derive(Clone)]
pub struct RequestCoordinator {
    engine: Arc<ScriptEngine>,
    policy: DebouncePolicy,
    window: Duration,
    state: Arc<Mutex<WindowState>>,
}

impl std::fmt::Debug for RequestCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCoordinator")
            .field("policy", &self.policy)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl RequestCoordinator {
    pub fn new(engine: Arc<ScriptEngine>, config: &DebounceConfig) -> Self {
        Self::with_policy(engine, config.policy, config.window())
    }

    pub fn with_policy(engine: Arc<ScriptEngine>, policy: DebouncePolicy, window: Duration) -> Self {
        Self {
            engine,
            policy,
            window,
            state: Arc::new(Mutex::new(WindowState::default())),
        }
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn engine(&self) -> &Arc<ScriptEngine> {
        &self.engine
    }

    /// String form of [`submit`](Self::submit)
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
        self.submit(request).await.outcome.into_text()
    }

    /// Submit a request and wait for its window to settle
    pub async fn submit(&self, request: ExecutionRequest) -> Settled {
        let receiver = match self.policy {
            DebouncePolicy::Trailing => self.enqueue_trailing(request),
            DebouncePolicy::Leading => self.enqueue_leading(request),
        };
        settle(receiver).await
    }

    fn enqueue_trailing(&self, request: ExecutionRequest) -> watch::Receiver<Slot> {
        let (ticket, receiver) = {
            let mut state = lock(&self.state);
            state.generation += 1;
            let ticket = state.generation;
            let quiet_until = Instant::now() + self.window;
            let batch = state.batch.get_or_insert_with(|| Batch::open(quiet_until));
            batch.quiet_until = quiet_until;
            (ticket, batch.receiver.clone())
        };
        debug!("[{}] queued as trailing ticket {}", request.id, ticket);

        let engine = Arc::clone(&self.engine);
        let state = Arc::clone(&self.state);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let sender = {
                let mut state = lock(&state);
                if state.generation != ticket {
                    debug!("[{}] superseded", request.id);
                    return;
                }
                state.batch.take().and_then(|mut batch| batch.sender.take())
            };

            if let Some(sender) = sender {
                let outcome = engine.run(&request).await;
                let _ = sender.send(Some(Settled {
                    executed: Some(request.id),
                    outcome,
                }));
            }
        });

        receiver
    }

    fn enqueue_leading(&self, request: ExecutionRequest) -> watch::Receiver<Slot> {
        let now = Instant::now();
        let mut state = lock(&self.state);
        state.generation += 1;

        if let Some(batch) = state.batch.as_mut().filter(|b| b.quiet_until > now) {
            batch.quiet_until = now + self.window;
            debug!("[{}] folded into running leading window", request.id);
            return batch.receiver.clone();
        }

        let mut batch = Batch::open(now + self.window);
        let sender = batch.sender.take();
        let receiver = batch.receiver.clone();
        state.batch = Some(batch);
        drop(state);

        if let Some(sender) = sender {
            let engine = Arc::clone(&self.engine);
            tokio::spawn(async move {
                let outcome = engine.run(&request).await;
                let _ = sender.send(Some(Settled {
                    executed: Some(request.id),
                    outcome,
                }));
            });
        }

        receiver
    }
}

async fn settle(mut receiver: watch::Receiver<Slot>) -> Settled {
    match receiver.wait_for(Option::is_some).await {
        Ok(slot) => match slot.as_ref() {
            Some(settled) => settled.clone(),
            None => Settled::abandoned(),
        },
        Err(_) => Settled::abandoned(),
    }
}

fn lock(state: &Mutex<WindowState>) -> MutexGuard<'_, WindowState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
