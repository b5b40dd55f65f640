//! Text-generation integration
//!
//! The model is used twice per question: once to turn the question into SQL,
//! once to turn the result back into prose.

pub mod openai;
pub mod protocol;

pub use openai::{ChatMessage, OpenAiClient};
pub use protocol::{Prompt, TextGenerator};

#[cfg(test)]
pub use protocol::MockTextGenerator;
