//! Grading provider trait and chat message types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::GradingError;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait for chat-completion backends that grade submissions
///
/// Implementations send the messages and hand back the assistant's content
/// string untouched; interpreting it is the response parser's job.
#[async_trait]
pub trait GradingProvider: Send + Sync {
    /// Send the messages and return the raw assistant reply
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GradingError>;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}
