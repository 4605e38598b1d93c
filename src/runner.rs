//! Generic execution-state wrapper for asynchronous tools.
//!
//! Every "run an analysis" flow goes through a [`ToolRunner`]: it owns the
//! status/progress/result/error state for one logical operation at a time and
//! emits notices over an event channel so presentation layers never deal with
//! raw failures. Each execution is tagged with an epoch token; completions
//! that lost the token (a newer execute, or a reset) write no state, so an
//! abandoned slow call can never clobber a fresh one.

use crate::model::{Notice, ToolEvent};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedSender;

/// Fallback notice text when a failure carries an empty message.
const GENERIC_ERROR_NOTICE: &str = "an unexpected error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

type SuccessHook<T> = Box<dyn Fn(&T) + Send + Sync>;
type ErrorHook = Box<dyn Fn(&anyhow::Error) + Send + Sync>;

/// Optional behavior attached to a runner at construction time.
pub struct RunnerOptions<T> {
    pub success_message: Option<String>,
    pub on_success: Option<SuccessHook<T>>,
    pub on_error: Option<ErrorHook>,
    pub events: Option<UnboundedSender<ToolEvent>>,
}

impl<T> Default for RunnerOptions<T> {
    fn default() -> Self {
        Self {
            success_message: None,
            on_success: None,
            on_error: None,
            events: None,
        }
    }
}

impl<T> RunnerOptions<T> {
    pub fn events(mut self, tx: UnboundedSender<ToolEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn success_message(mut self, msg: impl Into<String>) -> Self {
        self.success_message = Some(msg.into());
        self
    }

    pub fn on_success(mut self, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl Fn(&anyhow::Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }
}

struct RunnerState<T> {
    status: ToolStatus,
    result: Option<T>,
    error: Option<Arc<anyhow::Error>>,
    progress: u8,
    epoch: u64,
}

impl<T> Default for RunnerState<T> {
    fn default() -> Self {
        Self {
            status: ToolStatus::Idle,
            result: None,
            error: None,
            progress: 0,
            epoch: 0,
        }
    }
}

/// State machine wrapping one asynchronous operation at a time.
///
/// Cloning is cheap and shares state: the engine holds a clone to report
/// progress while the host layer reads status from another.
pub struct ToolRunner<T> {
    state: Arc<Mutex<RunnerState<T>>>,
    options: Arc<RunnerOptions<T>>,
}

impl<T> Clone for ToolRunner<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            options: Arc::clone(&self.options),
        }
    }
}

impl<T> Default for ToolRunner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ToolRunner<T> {
    pub fn new() -> Self {
        Self::with_options(RunnerOptions::default())
    }

    pub fn with_options(options: RunnerOptions<T>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RunnerState::default())),
            options: Arc::new(options),
        }
    }

    /// Run `op` to completion and record its outcome.
    ///
    /// Status moves to `Loading` (prior result/error cleared, progress back
    /// to 0) before the first suspension point. On success the result is
    /// stored, progress jumps to 100, and the configured success notice and
    /// hook fire; on failure the error is normalized into a single
    /// descriptive value, an error notice always fires, and `None` is
    /// returned, so callers inspect [`ToolRunner::error`] instead of
    /// handling a rejection. A completion whose epoch token is stale skips
    /// all state writes, hooks, and notices.
    pub async fn execute<F, E>(&self, op: F) -> Option<T>
    where
        T: Clone,
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let token = {
            let mut st = self.lock();
            st.epoch += 1;
            st.status = ToolStatus::Loading;
            st.result = None;
            st.error = None;
            st.progress = 0;
            st.epoch
        };

        match op.await {
            Ok(value) => {
                let fresh = {
                    let mut st = self.lock();
                    if st.epoch == token {
                        st.status = ToolStatus::Success;
                        st.result = Some(value.clone());
                        st.error = None;
                        st.progress = 100;
                        true
                    } else {
                        false
                    }
                };
                if fresh {
                    if let Some(msg) = &self.options.success_message {
                        self.emit(ToolEvent::Notice(Notice::Success(msg.clone())));
                    }
                    if let Some(hook) = &self.options.on_success {
                        hook(&value);
                    }
                }
                Some(value)
            }
            Err(err) => {
                // Normalize arbitrary failure values into a single error,
                // keeping the full context chain in the message.
                let err = Arc::new(anyhow::anyhow!("{err:#}"));
                let fresh = {
                    let mut st = self.lock();
                    if st.epoch == token {
                        st.status = ToolStatus::Error;
                        st.result = None;
                        st.error = Some(Arc::clone(&err));
                        true
                    } else {
                        false
                    }
                };
                if fresh {
                    let msg = err.to_string();
                    let msg = if msg.trim().is_empty() {
                        GENERIC_ERROR_NOTICE.to_string()
                    } else {
                        msg
                    };
                    self.emit(ToolEvent::Notice(Notice::Error(msg)));
                    if let Some(hook) = &self.options.on_error {
                        hook(&err);
                    }
                }
                None
            }
        }
    }

    /// Record incremental progress from the running operation. The contract
    /// performs no range validation; callers pass 0-100.
    pub fn set_progress(&self, percent: u8) {
        self.lock().progress = percent;
        self.emit(ToolEvent::Progress { percent });
    }

    /// Return to the idle state, discarding result, error, and progress.
    /// Safe at any time; an in-flight operation keeps running but its
    /// completion is ignored.
    pub fn reset(&self) {
        let mut st = self.lock();
        st.epoch += 1;
        st.status = ToolStatus::Idle;
        st.result = None;
        st.error = None;
        st.progress = 0;
    }

    pub fn status(&self) -> ToolStatus {
        self.lock().status
    }

    pub fn progress(&self) -> u8 {
        self.lock().progress
    }

    pub fn result(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock().result.clone()
    }

    pub fn error(&self) -> Option<Arc<anyhow::Error>> {
        self.lock().error.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.lock().error.as_ref().map(|e| e.to_string())
    }

    pub fn is_loading(&self) -> bool {
        self.status() == ToolStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status() == ToolStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status() == ToolStatus::Error
    }

    fn lock(&self) -> MutexGuard<'_, RunnerState<T>> {
        // A poisoned lock only means a panic elsewhere; the state itself is
        // still a valid value.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, ev: ToolEvent) {
        if let Some(tx) = &self.options.events {
            let _ = tx.send(ev);
        }
    }
}
