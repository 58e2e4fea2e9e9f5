//! Core traits and types for rubrica
//!
//! This crate holds everything between a grading request and a canonical
//! result: the rubric prompt, the provider trait the HTTP client implements,
//! recovery of the JSON object from a free-form model reply, and the
//! normalizer that accepts both historical reply layouts.

pub mod error;
pub mod evaluator;
pub mod llm;
pub mod normalizer;
pub mod parser;
pub mod prompt;
pub mod types;


pub use error::{Error, GradingError, Result};
pub use evaluator::Evaluator;
pub use llm::{ChatMessage, GradingProvider, Role};
pub use normalizer::{normalize, FlatEvaluation, NestedEvaluation, RawEvaluation};
pub use parser::{extract_json_slice, parse_reply};
pub use prompt::{PromptBuilder, PromptVariant};
pub use types::*;
