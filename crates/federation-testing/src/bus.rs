//! Bus doubles for producer-side tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use federation_outbox::{BusError, Envelope, MessageBus};

/// Records every successful send; optionally starts failing after a number of sends.
#[derive(Clone)]
pub struct RecordingBus {
    sent: Arc<Mutex<Vec<(String, Envelope)>>>,
    attempts: Arc<AtomicUsize>,
    succeed_first: Option<usize>,
    failure: BusError,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
            succeed_first: None,
            failure: BusError::Transport("unused".into()),
        }
    }

    /// Accept the first `n` sends, then fail every later one with a transient error.
    pub fn failing_after(n: usize) -> Self {
        Self {
            succeed_first: Some(n),
            failure: BusError::Transport("connection refused".into()),
            ..Self::new()
        }
    }

    /// Reject every send permanently.
    pub fn rejecting() -> Self {
        Self {
            succeed_first: Some(0),
            failure: BusError::Rejected("message too large".into()),
            ..Self::new()
        }
    }

    /// Successful sends, in order.
    pub fn sent(&self) -> Vec<(String, Envelope)> {
        self.sent.lock().unwrap().clone()
    }

    /// Every send call, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for RecordingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus for RecordingBus {
    async fn send(&self, topic: &str, envelope: &Envelope) -> Result<(), BusError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.succeed_first.is_some_and(|limit| attempt >= limit) {
            return Err(self.failure.clone());
        }
        self.sent
            .lock()
            .unwrap()
            .push((topic.to_owned(), envelope.clone()));
        Ok(())
    }
}
