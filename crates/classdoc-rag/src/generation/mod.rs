//! Prompt construction for answer generation

mod prompt;

pub use prompt::{PromptBuilder, SYSTEM_PROMPT};
