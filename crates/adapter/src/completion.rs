//! Async completion handles for adapter operations.
//!
//! A [`Completion`] stands in for librados's `AioCompletion`: the adapter
//! starts the operation immediately and hands back an owning handle that
//! the caller waits on whenever it actually needs the result. Handles are
//! move-only and must be waited on before they are dropped -- a completion
//! dropped without `wait_for_complete` almost always means a retained
//! write was lost, so it is treated as a programming error rather than
//! silently ignored.

use crate::error::AdapterError;
use tokio::sync::oneshot;

/// An in-flight adapter operation that will eventually resolve to a `T`.
///
/// Every `ObjectStore` async operation returns one of these. The adapter
/// guarantees the completion fires exactly once, whether the caller ever
/// waits on it or not.
#[must_use = "a completion must be waited on with wait_for_complete"]
pub struct Completion<T> {
    rx: oneshot::Receiver<Result<T, AdapterError>>,
    waited: bool,
}

impl<T> Completion<T> {
    /// Build a completion paired with the sender side a background task
    /// uses to resolve it.
    pub fn channel() -> (CompletionSender<T>, Completion<T>) {
        let (tx, rx) = oneshot::channel();
        (CompletionSender(tx), Completion { rx, waited: false })
    }

    /// Build an already-resolved completion, useful for adapters that
    /// complete synchronously (e.g. a local mock).
    pub fn ready(result: Result<T, AdapterError>) -> Self {
        let (tx, completion) = Self::channel();
        tx.send(result);
        completion
    }

    /// Wait for the operation to finish and consume the handle.
    pub async fn wait_for_complete(mut self) -> Result<T, AdapterError> {
        self.waited = true;
        match (&mut self.rx).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Io("completion sender dropped".into())),
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        debug_assert!(
            self.waited,
            "Completion dropped without wait_for_complete: a submitted op's result was discarded"
        );
    }
}

/// The write half of a [`Completion`], held by whatever task performs the
/// actual work.
pub struct CompletionSender<T>(oneshot::Sender<Result<T, AdapterError>>);

impl<T> CompletionSender<T> {
    pub fn send(self, result: Result<T, AdapterError>) {
        // The receiver may already be gone if the caller dropped the
        // completion without waiting; that is the caller's bug, not ours.
        let _ = self.0.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_completion_resolves_immediately() {
        let c: Completion<u32> = Completion::ready(Ok(7));
        assert_eq!(c.wait_for_complete().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn channel_completion_resolves_after_send() {
        let (tx, rx) = Completion::<u32>::channel();
        tx.send(Ok(42));
        assert_eq!(rx.wait_for_complete().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn dropped_sender_surfaces_as_io_error() {
        let (tx, rx) = Completion::<u32>::channel();
        drop(tx);
        assert!(rx.wait_for_complete().await.is_err());
    }
}
