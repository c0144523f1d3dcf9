//! Async digest result type implementing the unwrapping pattern

use crate::{BladeDigest, BladeError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Pending digest computation
pub struct AsyncDigestResult {
    receiver: oneshot::Receiver<Result<BladeDigest>>,
}

/// Pending digest computation with a user-defined result handler
pub struct AsyncDigestResultWithHandler<F> {
    receiver: oneshot::Receiver<Result<BladeDigest>>,
    handler: Option<F>,
}

impl AsyncDigestResult {
    /// Create a new `AsyncDigestResult` from a oneshot receiver
    pub(crate) fn new(receiver: oneshot::Receiver<Result<BladeDigest>>) -> Self {
        Self { receiver }
    }

    /// Create an `AsyncDigestResult` that's already completed
    #[must_use]
    pub fn ready(result: Result<BladeDigest>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { receiver: rx }
    }

    /// Create an `AsyncDigestResult` that yields an error
    #[must_use]
    pub fn error(error: BladeError) -> Self {
        Self::ready(Err(error))
    }

    /// Resolve through `handler` instead of returning the `Result`
    pub fn on_result<F, T>(self, handler: F) -> AsyncDigestResultWithHandler<F>
    where
        F: FnOnce(Result<BladeDigest>) -> T,
    {
        AsyncDigestResultWithHandler {
            receiver: self.receiver,
            handler: Some(handler),
        }
    }
}

fn dropped() -> BladeError {
    BladeError::internal("Digest task dropped")
}

impl Future for AsyncDigestResult {
    type Output = Result<BladeDigest>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(dropped())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<F, T> Future for AsyncDigestResultWithHandler<F>
where
    F: FnOnce(Result<BladeDigest>) -> T + Unpin,
{
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let result = match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => result,
            Poll::Ready(Err(_)) => Err(dropped()),
            Poll::Pending => return Poll::Pending,
        };

        // Handler runs once; polling again after completion stays pending
        match this.handler.take() {
            Some(handler) => Poll::Ready(handler(result)),
            None => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_and_error() {
        let digest = BladeDigest::new([1u8; 64], 0);
        assert_eq!(AsyncDigestResult::ready(Ok(digest)).await, Ok(digest));
        assert_eq!(
            AsyncDigestResult::error(BladeError::NullInput).await,
            Err(BladeError::NullInput)
        );
    }

    #[tokio::test]
    async fn test_dropped_sender() {
        let (tx, rx) = oneshot::channel::<Result<BladeDigest>>();
        drop(tx);
        assert!(matches!(
            AsyncDigestResult::new(rx).await,
            Err(BladeError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_handler_unwraps() {
        let hex = AsyncDigestResult::ready(Ok(BladeDigest::new([0xAB; 64], 1)))
            .on_result(|result| result.map(|d| d.to_hex()).unwrap_or_default())
            .await;
        assert_eq!(hex, "ab".repeat(64));
    }
}
