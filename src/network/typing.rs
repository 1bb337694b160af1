use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Sleep, sleep};

use crate::common::TypingSignal;

/// The "someone is typing" indicator with its debounce timer.
///
/// At most one signal is active. A new signal replaces the previous one and
/// restarts the timer; the old timer is dropped with it.
#[derive(Debug)]
pub struct TypingTracker {
    expiry: Duration,
    active: Option<PendingTyping>,
}

#[derive(Debug)]
struct PendingTyping {
    signal: TypingSignal,
    deadline: Pin<Box<Sleep>>,
}

impl TypingTracker {
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            active: None,
        }
    }

    /// Records a typing frame. Returns the new signal, or `None` when the
    /// frame came from `current_user` (or named nobody).
    pub fn observe(&mut self, sender: &str, current_user: &str) -> Option<TypingSignal> {
        let sender = sender.trim();
        if sender.is_empty() || sender == current_user {
            return None;
        }

        let signal = TypingSignal {
            sender_name: sender.to_string(),
        };
        self.active = Some(PendingTyping {
            signal: signal.clone(),
            deadline: Box::pin(sleep(self.expiry)),
        });
        Some(signal)
    }

    pub fn clear(&mut self) -> Option<TypingSignal> {
        self.active.take().map(|pending| pending.signal)
    }

    /// Resolves once the active signal times out, clearing it. Pending
    /// forever while nothing is active. Safe to drop and call again.
    pub async fn expired(&mut self) -> TypingSignal {
        let Some(pending) = self.active.as_mut() else {
            return std::future::pending().await;
        };
        pending.deadline.as_mut().await;
        let signal = pending.signal.clone();
        self.active = None;
        signal
    }
}
