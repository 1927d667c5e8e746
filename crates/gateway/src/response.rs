use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use voltcart_model::{ChatStream, ErrorKind};

use crate::Error;
use crate::io::{Lines, StreamEvent, parse_line};

struct PartialState {
    lines: Lines,
    // Set once the terminal sentinel has been observed. A stream that
    // ends without the sentinel completes the same way.
    done: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextDelta = Result<(Option<String>, PartialState), Error>;

pin_project! {
    /// A streaming gateway response.
    ///
    /// Content deltas are surfaced in the order the gateway produced
    /// them; framing noise (separators, keep-alives, malformed frames)
    /// is consumed silently.
    pub struct GatewayResponse {
        next_delta_fut: Option<PinnedFuture<NextDelta>>,
    }
}

impl GatewayResponse {
    #[inline]
    pub(crate) fn from_lines(lines: Lines) -> Self {
        let partial_state = PartialState { lines, done: false };
        let next_delta_fut = async move { next_delta(partial_state).await };
        Self {
            next_delta_fut: Some(Box::pin(next_delta_fut)),
        }
    }
}

impl ChatStream for GatewayResponse {
    type Error = crate::Error;

    fn poll_next_delta(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>> {
        let this = self.project();
        let Some(next_delta_fut) = this.next_delta_fut else {
            // The stream has been exhausted.
            return Poll::Ready(Ok(None));
        };
        let (delta, partial_state) =
            match ready!(next_delta_fut.as_mut().poll(cx)) {
                Ok((Some(delta), partial_state)) => (delta, partial_state),
                Ok((None, _)) => {
                    *this.next_delta_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_delta_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new
        // future for the next delta.
        let next_delta_fut = async move { next_delta(partial_state).await };
        *this.next_delta_fut = Some(Box::pin(next_delta_fut));

        Poll::Ready(Ok(Some(delta)))
    }
}

async fn next_delta(mut partial_state: PartialState) -> NextDelta {
    if partial_state.done {
        return Ok((None, partial_state));
    }

    loop {
        let line = match partial_state.lines.next_line().await {
            Ok(Some(line)) => line,
            // An end of stream before the sentinel is a graceful
            // completion, not an error.
            Ok(None) => return Ok((None, partial_state)),
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse line: {line}");

        match parse_line(&line) {
            StreamEvent::Ignorable => continue,
            StreamEvent::Done => {
                partial_state.done = true;
                return Ok((None, partial_state));
            }
            StreamEvent::Delta(delta) => {
                return Ok((Some(delta), partial_state));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;

    use super::*;

    async fn collect_deltas(chunks: VecDeque<Bytes>) -> Vec<String> {
        let lines = Lines::new(chunks.into());
        let mut resp = pin!(GatewayResponse::from_lines(lines));
        let mut deltas = vec![];
        loop {
            let Some(delta) = poll_fn(|cx| resp.as_mut().poll_next_delta(cx))
                .await
                .unwrap()
            else {
                break;
            };
            deltas.push(delta);
        }
        deltas
    }

    #[tokio::test]
    async fn test_terminal_sentinel() {
        let chunks = VecDeque::from(vec![Bytes::from_static(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\
              data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\
              data: [DONE]\n",
        )]);
        let lines = Lines::new(chunks.into());
        let mut resp = pin!(GatewayResponse::from_lines(lines));

        let mut text = String::new();
        loop {
            let Some(delta) = poll_fn(|cx| resp.as_mut().poll_next_delta(cx))
                .await
                .unwrap()
            else {
                break;
            };
            text.push_str(&delta);
        }
        assert_eq!(text, "Hi there");

        // Polling after completion keeps returning `None`.
        let after = poll_fn(|cx| resp.as_mut().poll_next_delta(cx))
            .await
            .unwrap();
        assert_eq!(after, None);
    }

    #[tokio::test]
    async fn test_malformed_frame_tolerance() {
        let chunks = VecDeque::from(vec![Bytes::from_static(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\
              data: {invalid json\n\
              data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\
              data: [DONE]\n",
        )]);
        let deltas = collect_deltas(chunks).await;
        assert_eq!(deltas, ["Hi", " there"]);
    }

    #[tokio::test]
    async fn test_end_without_sentinel_is_graceful() {
        let chunks = VecDeque::from(vec![Bytes::from_static(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n",
        )]);
        let deltas = collect_deltas(chunks).await;
        assert_eq!(deltas, ["partial"]);
    }

    // Splitting the same logical stream at any byte offset, including
    // mid-line and mid-code-point, must yield identical deltas.
    #[tokio::test]
    async fn test_fragmentation_invariance() {
        let stream = "data: {\"choices\":[{\"delta\":{\"content\":\"Héllo\"}}]}\n\
                      : keep-alive\n\
                      data: {\"choices\":[{\"delta\":{\"content\":\" wörld\"}}]}\n\
                      data: [DONE]\n";
        let bytes = stream.as_bytes();
        let expected =
            vec!["Héllo".to_owned(), " wörld".to_owned()];

        for split in 0..=bytes.len() {
            let chunks = VecDeque::from(vec![
                Bytes::copy_from_slice(&bytes[..split]),
                Bytes::copy_from_slice(&bytes[split..]),
            ]);
            let deltas = collect_deltas(chunks).await;
            assert_eq!(deltas, expected, "split at byte {split}");
        }
    }

    #[tokio::test]
    async fn test_recorded_response() {
        let chunks = VecDeque::from(vec![Bytes::from_static(include_bytes!(
            "fixtures/test_response.txt"
        ))]);
        let deltas = collect_deltas(chunks).await;
        assert_eq!(
            deltas.concat(),
            "Here are a few project ideas for your first build."
        );
    }
}
