//! Text-generation protocol definitions
//!
//! The language model is an external capability reached through the narrow
//! `TextGenerator` trait. Prompts keep policy text and caller text in separate
//! segments so the question can never be read as a directive.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A two-segment prompt.
///
/// `system` holds schema and policy text written by us. `user` holds
/// everything derived from caller input, already labelled as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// External text-generation capability.
///
/// Both calls are single-shot: prompt in, text out, no conversation state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Best-effort single SQL query (possibly wrapped in a JSON plan or fences)
    async fn generate_query(&self, prompt: &Prompt) -> Result<String>;

    /// Best-effort natural-language text
    async fn generate_interpretation(&self, prompt: &Prompt) -> Result<String>;
}
