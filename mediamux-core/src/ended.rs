//! End-of-track notification
//!
//! An [`EndedPromise`] is created pending by a sink when a playback session
//! starts and settles exactly once. Any number of clones may observe it;
//! they all see the same outcome. The paired [`EndedResolver`] stays with
//! the sink. Dropping the resolver without resolving settles the promise as
//! [`TrackEnd::Abandoned`], so observers are never left hanging and never
//! see an error.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// How a track's playback came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackEnd {
    /// Every frame of the track was played
    Finished,
    /// The session was stopped or shut down before the track finished
    Abandoned,
}

/// Single-resolution, multi-observer end-of-track future
#[derive(Clone)]
pub struct EndedPromise {
    outcome: Arc<OnceLock<TrackEnd>>,
    inner: Shared<BoxFuture<'static, TrackEnd>>,
}

impl EndedPromise {
    /// Create a pending promise and its resolver
    pub fn pending() -> (EndedResolver, EndedPromise) {
        let (tx, rx) = oneshot::channel();
        let outcome = Arc::new(OnceLock::new());
        let inner = async move { rx.await.unwrap_or(TrackEnd::Abandoned) }
            .boxed()
            .shared();

        let resolver = EndedResolver {
            tx: Some(tx),
            outcome: outcome.clone(),
        };
        (resolver, EndedPromise { outcome, inner })
    }

    /// Create an already-settled promise
    pub fn settled(end: TrackEnd) -> EndedPromise {
        let (mut resolver, promise) = Self::pending();
        resolver.settle(end);
        promise
    }

    /// Outcome if the promise has settled
    pub fn peek(&self) -> Option<TrackEnd> {
        self.outcome.get().copied()
    }

    /// Whether the promise has settled
    pub fn is_settled(&self) -> bool {
        self.peek().is_some()
    }

    /// Whether both handles observe the same promise
    pub fn ptr_eq(&self, other: &EndedPromise) -> bool {
        Arc::ptr_eq(&self.outcome, &other.outcome)
    }
}

impl Future for EndedPromise {
    type Output = TrackEnd;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<TrackEnd> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for EndedPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndedPromise")
            .field("outcome", &self.peek())
            .finish()
    }
}

/// Settling side of an [`EndedPromise`]
#[derive(Debug)]
pub struct EndedResolver {
    tx: Option<oneshot::Sender<TrackEnd>>,
    outcome: Arc<OnceLock<TrackEnd>>,
}

impl EndedResolver {
    /// Settle the promise as [`TrackEnd::Finished`]
    pub fn resolve(mut self) {
        self.settle(TrackEnd::Finished);
    }

    fn settle(&mut self, end: TrackEnd) {
        if let Some(tx) = self.tx.take() {
            let _ = self.outcome.set(end);
            let _ = tx.send(end);
        }
    }
}

impl Drop for EndedResolver {
    fn drop(&mut self) {
        self.settle(TrackEnd::Abandoned);
    }
}
