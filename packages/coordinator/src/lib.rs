#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Latest-request-wins coordination for pipeline invocations.
//!
//! Callers like a map view issue extraction requests faster than they
//! resolve (panning, re-searching). The [`RequestCoordinator`] assigns
//! each invocation a strictly increasing generation and, on completion,
//! keeps the result only if no newer request has been issued since.
//! Superseded work is not cancelled at the transport level — it runs to
//! completion and its result is silently discarded, so the coordinator
//! stays correct under arbitrarily delayed collaborator responses.
//!
//! Progress updates are gated the same way: only the active request's
//! phase/percent reports reach the [`ProgressSink`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Observer for pipeline progress updates.
///
/// Implementations must be `Send + Sync`; they may be called from
/// whatever task runs the request.
pub trait ProgressSink: Send + Sync {
    /// Reports that `phase` is `percent` complete (0-100).
    fn progress(&self, phase: &str, percent: u8);
}

/// A [`ProgressSink`] that ignores every update.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn progress(&self, _phase: &str, _percent: u8) {}
}

/// Outcome of a coordinated request.
///
/// [`Outcome::Discarded`] is not an error: the result was superseded by
/// a newer request and must never become observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The request was still the latest when it finished.
    Completed(T),
    /// A newer request was issued before this one finished.
    Discarded,
}

impl<T> Outcome<T> {
    /// Whether this request was superseded.
    #[must_use]
    pub const fn is_discarded(&self) -> bool {
        matches!(self, Self::Discarded)
    }

    /// The completed value, if any.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Discarded => None,
        }
    }
}

struct Inner {
    latest: AtomicU64,
    sink: Arc<dyn ProgressSink>,
}

/// Handle given to coordinated work for reporting gated progress.
#[derive(Clone)]
pub struct ProgressHandle {
    id: u64,
    inner: Arc<Inner>,
}

impl ProgressHandle {
    /// Reports progress; dropped silently if this request is no longer
    /// the latest.
    pub fn report(&self, phase: &str, percent: u8) {
        if self.inner.latest.load(Ordering::SeqCst) == self.id {
            self.inner.sink.progress(phase, percent);
        } else {
            log::trace!("dropping stale progress update from request {}", self.id);
        }
    }
}

/// Wraps pipeline invocations in generation tokens so only the most
/// recently issued request's result is ever observed.
pub struct RequestCoordinator {
    inner: Arc<Inner>,
}

impl RequestCoordinator {
    /// Creates a coordinator that discards progress updates.
    #[must_use]
    pub fn new() -> Self {
        Self::with_progress(Arc::new(NullProgress))
    }

    /// Creates a coordinator forwarding the active request's progress
    /// to `sink`.
    #[must_use]
    pub fn with_progress(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                latest: AtomicU64::new(0),
                sink,
            }),
        }
    }

    /// Runs `work` under a fresh generation token.
    ///
    /// The closure receives a [`ProgressHandle`] for gated progress
    /// reporting. When the work finishes, the result is kept only if no
    /// newer request has been issued in the meantime; otherwise it is
    /// discarded without error.
    pub async fn run<F, Fut, T>(&self, work: F) -> Outcome<T>
    where
        F: FnOnce(ProgressHandle) -> Fut,
        Fut: Future<Output = T>,
    {
        let id = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("starting request {id}");

        let handle = ProgressHandle {
            id,
            inner: self.inner.clone(),
        };
        let result = work(handle).await;

        if self.inner.latest.load(Ordering::SeqCst) == id {
            Outcome::Completed(result)
        } else {
            log::debug!("discarding superseded request {id}");
            Outcome::Discarded
        }
    }
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::sync::oneshot;

    use super::*;

    struct RecordingSink {
        updates: Mutex<Vec<(String, u8)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                updates: Mutex::new(Vec::new()),
            }
        }

        fn updates(&self) -> Vec<(String, u8)> {
            self.updates.lock().unwrap().clone()
        }
    }

    impl ProgressSink for RecordingSink {
        fn progress(&self, phase: &str, percent: u8) {
            self.updates
                .lock()
                .unwrap()
                .push((phase.to_string(), percent));
        }
    }

    #[tokio::test]
    async fn sequential_requests_complete() {
        let coordinator = RequestCoordinator::new();

        let first = coordinator.run(|_| async { 1 }).await;
        let second = coordinator.run(|_| async { 2 }).await;

        assert_eq!(first, Outcome::Completed(1));
        assert_eq!(second, Outcome::Completed(2));
    }

    #[tokio::test]
    async fn slow_first_request_is_discarded() {
        let coordinator = Arc::new(RequestCoordinator::new());
        let (release_r1, blocked) = oneshot::channel::<()>();
        let (started_tx, started_rx) = oneshot::channel::<()>();

        let slow = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run(|_| async {
                        started_tx.send(()).ok();
                        blocked.await.ok();
                        "r1"
                    })
                    .await
            })
        };

        // Wait until R1 is issued before issuing R2.
        started_rx.await.unwrap();

        let fast = coordinator.run(|_| async { "r2" }).await;
        assert_eq!(fast, Outcome::Completed("r2"));

        // R1 resolves after R2: its result must never be observed.
        release_r1.send(()).unwrap();
        let slow = slow.await.unwrap();
        assert!(slow.is_discarded());
        assert_eq!(slow.into_option(), None);
    }

    #[tokio::test]
    async fn progress_from_superseded_requests_is_dropped() {
        let sink = Arc::new(RecordingSink::new());
        let coordinator = Arc::new(RequestCoordinator::with_progress(sink.clone()));
        let (release_r1, blocked) = oneshot::channel::<()>();
        let (started_tx, started_rx) = oneshot::channel::<()>();

        let slow = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run(|progress| async move {
                        progress.report("extract", 10);
                        started_tx.send(()).ok();
                        blocked.await.ok();
                        // Stale by now; must not be forwarded.
                        progress.report("extract", 90);
                    })
                    .await
            })
        };

        started_rx.await.unwrap();

        coordinator
            .run(|progress| async move {
                progress.report("label", 50);
            })
            .await
            .into_option()
            .unwrap();

        release_r1.send(()).unwrap();
        slow.await.unwrap();

        let updates = sink.updates();
        assert!(updates.contains(&("extract".to_string(), 10)));
        assert!(updates.contains(&("label".to_string(), 50)));
        assert!(!updates.contains(&("extract".to_string(), 90)));
    }
}
