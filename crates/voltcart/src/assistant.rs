use voltcart_core::{ChatSession, SessionStage, SubmitError, SuggestionOption};
use voltcart_model::{ChatMessage, ChatProvider};

/// An assistant builder.
///
/// See [`Assistant`].
pub struct AssistantBuilder<P> {
    provider: P,
    session: ChatSession,
}

impl<P: ChatProvider> AssistantBuilder<P> {
    /// Creates an assistant builder with a specified gateway provider.
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            session: ChatSession::new(),
        }
    }

    /// Sets the system instructions sent with every request.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.session = self.session.with_system_prompt(prompt);
        self
    }

    /// Attaches a callback to be invoked with the full message list
    /// after every change.
    #[inline]
    pub fn on_update(
        mut self,
        on_update: impl Fn(&[ChatMessage]) + Send + Sync + 'static,
    ) -> Self {
        self.session.subscribe(on_update);
        self
    }

    /// Builds a new assistant.
    pub fn build(self) -> Assistant<P> {
        debug!("assistant session ready");
        Assistant {
            provider: self.provider,
            session: self.session,
        }
    }
}

/// The shopping assistant, like a chat panel docked in the storefront.
///
/// The assistant pairs a configured session with the provider it talks
/// through; it is basically a wrapper around [`ChatSession`].
pub struct Assistant<P> {
    provider: P,
    session: ChatSession,
}

impl<P: ChatProvider> Assistant<P> {
    /// Sends a message and drives the turn to completion.
    #[inline]
    pub async fn send(&mut self, input: &str) -> Result<(), SubmitError> {
        self.session.send_message(&self.provider, input).await
    }

    /// Returns the visible messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[ChatMessage] {
        self.session.messages()
    }

    /// Returns the quick-reply options for the latest finalized
    /// assistant message.
    #[inline]
    pub fn suggestions(&self) -> &[SuggestionOption] {
        self.session.suggestions()
    }

    /// Returns the current lifecycle stage.
    #[inline]
    pub fn stage(&self) -> SessionStage {
        self.session.stage()
    }
}
