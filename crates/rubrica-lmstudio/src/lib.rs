//! LM Studio integration for rubrica
//!
//! This crate provides the HTTP implementation of the GradingProvider trait
//! for any server exposing an OpenAI-compatible chat-completion endpoint.

mod client;
mod config;


pub use client::{extract_content, ChatCompletionClient};
pub use config::{
    LmStudioConfig, DEFAULT_API_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT,
};

// Re-export core types for convenience
pub use rubrica_core::{ChatMessage, Error, GradingError, GradingProvider, Result};
