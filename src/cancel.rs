//! Cancellation handles for in-flight requests.

use tokio_util::sync::CancellationToken;

/// Cooperative cancellation handle shared by everything spawned on behalf of
/// one logical request.
///
/// Handles form a tree: cancelling a handle cancels every child derived from
/// it, and a child derived from an already-cancelled handle is born
/// cancelled, so an attempt spawned while a cancel is in flight can never
/// outlive it. Cancelling is idempotent.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Derives a child handle cancelled together with this one.
    pub(crate) fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Requests cancellation of this handle and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once cancellation was requested on this handle or an
    /// ancestor.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when cancellation is requested.
    pub(crate) async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}
