use std::pin::Pin;
use std::task::{self, Poll};

use crate::provider::GatewayError;

/// A streaming response from the chat gateway.
///
/// The response delivers the assistant text incrementally, one content
/// delta at a time, in the order the gateway produced them.
pub trait ChatStream: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: GatewayError;

    /// Attempts to pull out the next content delta from the response.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct response state:
    ///
    /// - `Poll::Pending` means that this response is still waiting for
    ///   the next delta. Implementations will ensure that the current
    ///   task will be notified when the next delta may be ready.
    /// - `Poll::Ready(Ok(Some(delta)))` means the response has a delta
    ///   to deliver, and may produce further deltas on subsequent
    ///   `poll_next_delta` calls.
    /// - `Poll::Ready(Ok(None))` means the response has completed,
    ///   either via the gateway's terminal sentinel or because the
    ///   underlying stream ended. Both are graceful completions.
    /// - `Poll::Ready(Err(error))` means an error occurred while
    ///   processing the response.
    ///
    /// Calling this method after completion should always return `None`.
    fn poll_next_delta(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>>;
}
