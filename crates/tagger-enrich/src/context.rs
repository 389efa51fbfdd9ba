//! Cancellation and deadlines for lookups.
//!
//! A [`LookupContext`] travels with every lookup. Each suspension point (the
//! rate-limit wait and every outbound request) runs through
//! [`LookupContext::run`], which aborts as soon as the caller cancels or the
//! deadline passes and reports [`EnrichError::Canceled`] or
//! [`EnrichError::DeadlineExceeded`].

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{EnrichError, EnrichResult};

#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl LookupContext {
    /// A context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context cancelled together with `token`.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a child context that also expires after `timeout`.
    ///
    /// The child keeps the earlier of the parent's deadline and the new
    /// one. Cancelling the parent cancels the child; cancelling the child
    /// leaves the parent untouched.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// Fail fast if the context is already cancelled or expired.
    pub fn check(&self) -> EnrichResult<()> {
        if self.token.is_cancelled() {
            return Err(EnrichError::Canceled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(EnrichError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context ends first.
    ///
    /// When the context ends, `fut` is dropped and the cancellation error is
    /// returned unchanged.
    pub async fn run<T, F>(&self, fut: F) -> EnrichResult<T>
    where
        F: Future<Output = EnrichResult<T>>,
    {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(EnrichError::Canceled),
            () = expired => Err(EnrichError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let ctx = LookupContext::new();
        let value = ctx.run(async { Ok(42) }).await;
        assert_eq!(value, Ok(42));
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_fast() {
        let ctx = LookupContext::new();
        ctx.cancel();
        assert!(ctx.is_done());
        let result = ctx.run(async { Ok(()) }).await;
        assert_eq!(result, Err(EnrichError::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_pending_future() {
        let ctx = LookupContext::new().with_timeout(Duration::from_secs(2));
        let result: EnrichResult<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(EnrichError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait() {
        let token = CancellationToken::new();
        let ctx = LookupContext::from_token(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let result: EnrichResult<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert_eq!(result, Err(EnrichError::Canceled));
        canceller.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_keeps_earlier_deadline() {
        let parent = LookupContext::new().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(30));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_millis(10));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test]
    async fn test_cancelling_parent_cancels_child() {
        let parent = LookupContext::new();
        let child = parent.with_timeout(Duration::from_secs(30));
        parent.cancel();
        assert_eq!(child.check(), Err(EnrichError::Canceled));

        let other_parent = LookupContext::new();
        let other_child = other_parent.with_timeout(Duration::from_secs(30));
        other_child.cancel();
        assert!(other_parent.check().is_ok());
    }
}
