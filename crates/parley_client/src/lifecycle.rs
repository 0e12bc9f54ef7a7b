//! Request lifecycle of interactive submissions.
//!
//! A [`Submitter`] runs at most one submission at a time. Submitting again
//! cancels the request in flight, and only the latest submission can move the
//! lifecycle to a terminal state. Observers follow the state through a
//! [`watch`] channel.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use parley_conversation::RelayResponse;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    client::{Client, Submission},
    error::{Error, Result},
};

/// Identifies one submission of a [`Submitter`].
pub type SubmissionId = u64;

/// State of the latest submission.
#[derive(Debug, Clone, Default)]
pub enum Lifecycle {
    #[default]
    Idle,
    Submitting {
        id: SubmissionId,
    },
    Succeeded {
        id: SubmissionId,
        response: Arc<RelayResponse>,
    },
    Failed {
        id: SubmissionId,
        error: Arc<Error>,
    },
}

impl Lifecycle {
    #[must_use]
    pub fn id(&self) -> Option<SubmissionId> {
        match self {
            Self::Idle => None,
            Self::Submitting { id } | Self::Succeeded { id, .. } | Self::Failed { id, .. } => {
                Some(*id)
            }
        }
    }
}

#[derive(Debug)]
struct Inner {
    client: Client,
    state: watch::Sender<Lifecycle>,
    in_flight: Mutex<Option<CancellationToken>>,
    next_id: AtomicU64,
}

impl Inner {
    /// Settle submission `id`, unless a newer one superseded it.
    fn finish(&self, id: SubmissionId, result: Result<RelayResponse>) {
        let settled = self.state.send_if_modified(|state| {
            if !matches!(state, Lifecycle::Submitting { id: current } if *current == id) {
                return false;
            }

            *state = match result {
                Ok(response) => Lifecycle::Succeeded {
                    id,
                    response: Arc::new(response),
                },
                Err(error) => Lifecycle::Failed {
                    id,
                    error: Arc::new(error),
                },
            };
            true
        });

        if !settled {
            debug!(id, "Dropping result of superseded submission.");
        }
    }
}

/// Runs submissions against a relay, one at a time.
#[derive(Debug, Clone)]
pub struct Submitter {
    inner: Arc<Inner>,
}

impl Submitter {
    #[must_use]
    pub fn new(client: Client) -> Self {
        let (state, _) = watch::channel(Lifecycle::Idle);

        Self {
            inner: Arc::new(Inner {
                client,
                state,
                in_flight: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> Lifecycle {
        self.inner.state.borrow().clone()
    }

    /// Follow state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.inner.state.subscribe()
    }

    /// Start a submission, cancelling the one in flight.
    ///
    /// Must be called within a Tokio runtime.
    pub fn submit(&self, submission: Submission) -> SubmissionId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        if let Some(previous) = self.inner.in_flight.lock().replace(token.clone()) {
            debug!(id, "Cancelling superseded submission.");
            previous.cancel();
        }

        self.inner.state.send_replace(Lifecycle::Submitting { id });

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                () = token.cancelled() => return,
                result = inner.client.send(&submission) => result,
            };

            inner.finish(id, result);
        });

        id
    }

    /// Cancel the submission in flight, if any, and return to idle.
    pub fn cancel(&self) {
        if let Some(token) = self.inner.in_flight.lock().take() {
            token.cancel();
        }

        self.inner.state.send_replace(Lifecycle::Idle);
    }

    /// Wait until no submission is in flight.
    ///
    /// Resolves with the terminal state of the latest submission, or with
    /// [`Lifecycle::Idle`] if it was cancelled. Returns immediately if nothing
    /// is in flight.
    pub async fn wait(&self) -> Lifecycle {
        let mut state = self.subscribe();
        state
            .wait_for(|state| !matches!(state, Lifecycle::Submitting { .. }))
            .await
            .map_or(Lifecycle::Idle, |state| state.clone())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
