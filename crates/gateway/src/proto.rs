use serde::{Deserialize, Serialize};
use voltcart_model::{ChatMessage, ChatRequest};

use crate::GatewayConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<Message>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ChatRequest,
    config: &GatewayConfig,
) -> CompletionRequest {
    CompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        stream: true,
    }
}

#[inline]
fn create_message(msg: &ChatMessage) -> Message {
    match msg {
        ChatMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ChatMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ChatMessage::Assistant(content) => Message::Assistant {
            content: content.clone(),
        },
    }
}
