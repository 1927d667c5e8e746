//! The conversation store driving a single assistant chat.
//!
//! All state transitions happen on the single event-processing path:
//! a submitted input, a content delta, stream completion, or a stream
//! error. There is no parallelism and no lock discipline; the session
//! exclusively owns the message list, and renderers observe it through
//! the subscription list.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::future::poll_fn;
use std::pin::pin;

use voltcart_model::{
    ChatMessage, ChatProvider, ChatRequest, ChatStream, ErrorKind,
    GatewayError,
};

use crate::suggest::{self, SuggestionOption};

/// Error returned when a submission is rejected before any network
/// activity happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmitError {
    /// The input is empty after trimming.
    EmptyInput,
    /// The previous turn has not reached its terminal state yet.
    ///
    /// There is exactly one mutable open assistant slot, so a second
    /// turn is rejected rather than queued or cancelled.
    TurnInFlight,
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::EmptyInput => write!(f, "input is empty"),
            SubmitError::TurnInFlight => {
                write!(f, "a turn is already in flight")
            }
        }
    }
}

impl StdError for SubmitError {}

/// The lifecycle stage of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionStage {
    /// No turn is in flight; submissions are accepted.
    #[default]
    Idle,
    /// A turn is in flight and the last assistant message is open for
    /// appending.
    Streaming,
}

type UpdateFn = Box<dyn Fn(&[ChatMessage]) + Send + Sync>;

/// A chat session: the ordered message list, the single-in-flight turn
/// guard, and the quick-reply suggestions derived from the latest
/// finalized assistant message.
#[derive(Default)]
pub struct ChatSession {
    system_prompt: Option<String>,
    messages: Vec<ChatMessage>,
    stage: SessionStage,
    suggestions: Vec<SuggestionOption>,
    on_update: Vec<UpdateFn>,
}

impl ChatSession {
    /// Creates an empty session.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the system instructions sent with every request.
    ///
    /// The system prompt is not part of the visible message list.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a callback invoked with the full message list after
    /// every mutation. This drives incremental rendering.
    #[inline]
    pub fn subscribe(
        &mut self,
        on_update: impl Fn(&[ChatMessage]) + Send + Sync + 'static,
    ) {
        self.on_update.push(Box::new(on_update));
    }

    /// Returns the visible messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the current lifecycle stage.
    #[inline]
    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    /// Returns the quick-reply options for the latest finalized
    /// assistant message. Empty when no menu is available; renderers
    /// must not treat that as an error state.
    #[inline]
    pub fn suggestions(&self) -> &[SuggestionOption] {
        &self.suggestions
    }

    /// Validates the input and starts a new turn.
    ///
    /// The trimmed user message is appended optimistically and the
    /// session moves to [`SessionStage::Streaming`]. Returns the
    /// request to send to the gateway.
    pub fn begin_turn(
        &mut self,
        input: &str,
    ) -> Result<ChatRequest, SubmitError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        if self.stage != SessionStage::Idle {
            return Err(SubmitError::TurnInFlight);
        }

        self.stage = SessionStage::Streaming;
        self.suggestions.clear();
        self.messages.push(ChatMessage::User(input.to_owned()));
        self.notify();
        Ok(self.build_request())
    }

    /// Runs one full conversational turn against the given provider.
    ///
    /// Submission errors are returned; everything that fails after the
    /// turn has started (transport, auth, quota, rate limit, stream
    /// errors) is converted to a terminal assistant message and the
    /// session stays usable for a new turn.
    pub async fn send_message<P: ChatProvider>(
        &mut self,
        provider: &P,
        input: &str,
    ) -> Result<(), SubmitError> {
        let request = self.begin_turn(input)?;

        let stream = match provider.send_request(&request).await {
            Ok(stream) => stream,
            Err(err) => {
                error!("gateway request failed: {err}");
                let kind = err.kind();
                if kind == ErrorKind::AuthRequired {
                    // The turn never started server-side, roll back
                    // the optimistic user message.
                    self.messages.pop();
                }
                self.push_error_message(kind);
                return Ok(());
            }
        };

        // Open the assistant slot right before consuming the stream.
        self.messages.push(ChatMessage::Assistant(String::new()));
        self.notify();

        let mut stream = pin!(stream);
        loop {
            match poll_fn(|cx| stream.as_mut().poll_next_delta(cx)).await {
                Ok(Some(delta)) => {
                    self.append_delta(&delta);
                    self.notify();
                }
                Ok(None) => {
                    self.finish_turn();
                    break;
                }
                Err(err) => {
                    error!("gateway stream failed: {err}");
                    self.replace_open_message(err.kind());
                    break;
                }
            }
        }
        Ok(())
    }

    fn build_request(&self) -> ChatRequest {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage::System(prompt.clone()));
        }
        messages.extend(self.messages.iter().cloned());
        ChatRequest { messages }
    }

    fn append_delta(&mut self, delta: &str) {
        if let Some(ChatMessage::Assistant(content)) = self.messages.last_mut()
        {
            content.push_str(delta);
        }
    }

    /// Finalizes the open assistant message and derives the
    /// quick-reply options from it.
    fn finish_turn(&mut self) {
        self.stage = SessionStage::Idle;
        if let Some(ChatMessage::Assistant(content)) = self.messages.last() {
            self.suggestions = suggest::extract_options(content);
        }
        self.notify();
    }

    /// Appends a terminal assistant message for a turn that failed
    /// before any response bytes arrived.
    fn push_error_message(&mut self, kind: ErrorKind) {
        self.stage = SessionStage::Idle;
        self.messages
            .push(ChatMessage::Assistant(error_message(kind).to_owned()));
        self.notify();
    }

    /// Replaces the open (possibly partially filled) assistant message
    /// for a turn that failed mid-stream.
    fn replace_open_message(&mut self, kind: ErrorKind) {
        self.stage = SessionStage::Idle;
        if let Some(ChatMessage::Assistant(content)) = self.messages.last_mut()
        {
            *content = error_message(kind).to_owned();
        }
        self.suggestions.clear();
        self.notify();
    }

    fn notify(&self) {
        for on_update in &self.on_update {
            on_update(&self.messages);
        }
    }
}

/// The user-facing text for a failed turn. Names the failure class
/// without leaking diagnostic detail.
fn error_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::AuthRequired => {
            "Please sign in to chat with the assistant."
        }
        ErrorKind::RateLimited => {
            "You're sending messages too quickly. Give it a moment and \
             try again."
        }
        ErrorKind::QuotaExhausted => {
            "The assistant has reached its usage limit for now. Please \
             try again later."
        }
        ErrorKind::Other => {
            "Something went wrong while contacting the assistant. Please \
             try again."
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use voltcart_test_model::{
        PresetEvent, PresetResponse, TestGatewayProvider,
    };

    use super::*;

    fn provider_with_single_reply(
        deltas: &[&str],
    ) -> TestGatewayProvider {
        let mut provider = TestGatewayProvider::default();
        provider.add_user_turn();
        provider.add_assistant_turn(PresetResponse::with_deltas(
            deltas.to_vec(),
        ));
        provider
    }

    #[tokio::test]
    async fn test_simple_turn() {
        let provider = provider_with_single_reply(&["Hi", " there"]);
        let mut session = ChatSession::new();
        session.send_message(&provider, "Hello").await.unwrap();

        assert_eq!(
            session.messages(),
            &[
                ChatMessage::User("Hello".to_owned()),
                ChatMessage::Assistant("Hi there".to_owned()),
            ]
        );
        assert_eq!(session.stage(), SessionStage::Idle);
    }

    #[tokio::test]
    async fn test_input_is_trimmed() {
        let provider = provider_with_single_reply(&["ok"]);
        let mut session = ChatSession::new();
        session.send_message(&provider, "  Hello \n").await.unwrap();
        assert_eq!(session.messages()[0], ChatMessage::User("Hello".to_owned()));
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let provider = TestGatewayProvider::default();
        let mut session = ChatSession::new();
        let err = session.send_message(&provider, "   ").await.unwrap_err();
        assert_eq!(err, SubmitError::EmptyInput);
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_second_turn_rejected_while_in_flight() {
        let mut session = ChatSession::new();
        session.begin_turn("First question").unwrap();
        assert_eq!(session.stage(), SessionStage::Streaming);

        let err = session.begin_turn("Second question").unwrap_err();
        assert_eq!(err, SubmitError::TurnInFlight);
        // The in-flight turn is untouched.
        assert_eq!(
            session.messages(),
            &[ChatMessage::User("First question".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_auth_failure_rolls_back_user_message() {
        let mut provider = TestGatewayProvider::default();
        provider.add_user_turn();
        provider.add_assistant_turn(PresetResponse::failing(
            ErrorKind::AuthRequired,
        ));

        let mut session = ChatSession::new();
        session.send_message(&provider, "Hello").await.unwrap();

        assert_eq!(
            session.messages(),
            &[ChatMessage::Assistant(
                "Please sign in to chat with the assistant.".to_owned()
            )]
        );
        assert_eq!(session.stage(), SessionStage::Idle);
    }

    #[tokio::test]
    async fn test_rate_limit_keeps_user_message() {
        let mut provider = TestGatewayProvider::default();
        provider.add_user_turn();
        provider.add_assistant_turn(PresetResponse::failing(
            ErrorKind::RateLimited,
        ));

        let mut session = ChatSession::new();
        session.send_message(&provider, "Hello").await.unwrap();

        assert_eq!(session.messages().len(), 2);
        assert_eq!(
            session.messages()[0],
            ChatMessage::User("Hello".to_owned())
        );
        assert_eq!(
            session.messages()[1].content(),
            "You're sending messages too quickly. Give it a moment and \
             try again."
        );
    }

    #[tokio::test]
    async fn test_mid_stream_failure_replaces_open_message() {
        let mut provider = TestGatewayProvider::default();
        provider.add_user_turn();
        provider.add_assistant_turn(PresetResponse::with_events([
            PresetEvent::Delta("partial answer".to_owned()),
            PresetEvent::Fail(ErrorKind::Other),
        ]));
        // The session stays usable afterwards.
        provider.add_user_turn();
        provider.add_assistant_turn(PresetResponse::with_deltas(["Recovered"]));

        let mut session = ChatSession::new();
        session.send_message(&provider, "Hello").await.unwrap();

        assert_eq!(
            session.messages()[1].content(),
            "Something went wrong while contacting the assistant. Please \
             try again."
        );
        assert_eq!(session.stage(), SessionStage::Idle);

        session.send_message(&provider, "Again").await.unwrap();
        assert_eq!(session.messages()[3].content(), "Recovered");
    }

    #[tokio::test]
    async fn test_same_script_is_deterministic() {
        let provider = provider_with_single_reply(&["One", " two", " three"]);

        let mut first = ChatSession::new();
        first.send_message(&provider, "Count").await.unwrap();
        let mut second = ChatSession::new();
        second.send_message(&provider, "Count").await.unwrap();

        assert_eq!(first.messages(), second.messages());
        assert_eq!(first.suggestions(), second.suggestions());
    }

    #[tokio::test]
    async fn test_updates_are_monotonic() {
        let provider = provider_with_single_reply(&["a", "b", "c"]);
        let mut session = ChatSession::new();

        let lengths = Arc::new(Mutex::new(Vec::new()));
        session.subscribe({
            let lengths = Arc::clone(&lengths);
            move |messages| {
                if let Some(ChatMessage::Assistant(content)) = messages.last()
                {
                    lengths.lock().unwrap().push(content.len());
                }
            }
        });

        session.send_message(&provider, "Go").await.unwrap();

        let lengths = lengths.lock().unwrap();
        assert!(!lengths.is_empty());
        assert!(lengths.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_suggestions_follow_finalized_message() {
        let provider = provider_with_single_reply(&[
            "1. Smart Planter\n",
            "A beginner kit.\n",
            "2. Weather Station\n",
            "Logs temperature.",
        ]);
        let mut session = ChatSession::new();
        session.send_message(&provider, "Ideas?").await.unwrap();

        let suggestions = session.suggestions();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].title, "Smart Planter");
        assert_eq!(suggestions[1].title, "Weather Station");

        // A new turn clears the stale menu immediately.
        session.begin_turn("Tell me more").unwrap();
        assert!(session.suggestions().is_empty());
    }

    #[tokio::test]
    async fn test_system_prompt_included_in_request() {
        let mut session =
            ChatSession::new().with_system_prompt("Recommend hardware.");
        let request = session.begin_turn("Hi").unwrap();
        assert_eq!(
            request.messages,
            vec![
                ChatMessage::System("Recommend hardware.".to_owned()),
                ChatMessage::User("Hi".to_owned()),
            ]
        );
        // The system prompt stays out of the visible list.
        assert_eq!(
            session.messages(),
            &[ChatMessage::User("Hi".to_owned())]
        );
    }
}
