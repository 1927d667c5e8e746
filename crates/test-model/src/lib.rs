//! A local fake gateway for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use voltcart_model::{
    ChatMessage, ChatProvider, ChatRequest, ChatStream, ErrorKind,
    GatewayError,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl GatewayError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct TestChatStream {
    provider: TestGatewayProvider,
    step_idx: usize,
    event_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ChatStream for TestChatStream {
    type Error = crate::Error;

    fn poll_next_delta(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>> {
        // SAFETY: No field requires structural pinning.
        let this = unsafe { self.get_unchecked_mut() };

        let step = &this.provider.script[this.step_idx];
        let preset_events = match step {
            ScriptStep::UserTurn => {
                return Poll::Ready(Err(Error {
                    message: "not an assistant turn",
                    kind: ErrorKind::Other,
                }));
            }
            ScriptStep::AssistantTurn(response) => &response.events,
        };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if this.event_idx < preset_events.len() {
                let event = preset_events[this.event_idx].clone();
                this.event_idx += 1;
                return match event {
                    PresetEvent::Delta(delta) => Poll::Ready(Ok(Some(delta))),
                    PresetEvent::Fail(kind) => Poll::Ready(Err(Error {
                        message: "preset mid-stream failure",
                        kind,
                    })),
                };
            }
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(
            this.provider.delay.unwrap_or(Duration::from_millis(1)),
        )));
        Pin::new(this).poll_next_delta(cx)
    }
}

#[derive(Clone, Debug)]
enum ScriptStep {
    UserTurn,
    AssistantTurn(PresetResponse),
}

/// A local fake gateway for testing purpose.
///
/// Set up a script of alternating user and assistant steps before
/// sending any request; the step answering a request is picked by the
/// number of history messages it carries (system instructions are not
/// counted). Requests that run past the end of the script fail.
///
/// # Note
///
/// This type clones the whole script per stream and is only meant for
/// tests.
#[derive(Clone, Debug, Default)]
pub struct TestGatewayProvider {
    script: Vec<ScriptStep>,
    delay: Option<Duration>,
}

impl TestGatewayProvider {
    #[inline]
    pub fn add_assistant_turn(&mut self, preset: PresetResponse) {
        self.script.push(ScriptStep::AssistantTurn(preset));
    }

    #[inline]
    pub fn add_user_turn(&mut self) {
        self.script.push(ScriptStep::UserTurn);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }
}

impl ChatProvider for TestGatewayProvider {
    type Error = crate::Error;
    type Stream = TestChatStream;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static
    {
        let step_idx = req
            .messages
            .iter()
            .filter(|msg| !matches!(msg, ChatMessage::System(_)))
            .count();
        let result = 'blk: {
            if step_idx >= self.script.len() {
                break 'blk Err(Error {
                    message: "script exhausted",
                    kind: ErrorKind::Other,
                });
            }
            if let ScriptStep::AssistantTurn(response) = &self.script[step_idx]
            {
                if let Some(kind) = response.failure {
                    break 'blk Err(Error {
                        message: "preset request failure",
                        kind,
                    });
                }
            }
            Ok(TestChatStream {
                provider: self.clone(),
                step_idx,
                event_idx: 0,
                sleep: None,
            })
        };
        ready(result)
    }
}
