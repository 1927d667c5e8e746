use serde::{Deserialize, Serialize};

/// A request to be sent to the chat gateway.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatRequest {
    /// The conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
}

/// A complete message in the conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}

impl ChatMessage {
    /// Returns the text content of this message.
    #[inline]
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System(text)
            | ChatMessage::User(text)
            | ChatMessage::Assistant(text) => text,
        }
    }
}
