use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OracleError, Result};

/// A caller's natural-language question.
///
/// Treated purely as data: it is length-checked and trimmed, never parsed or
/// spliced into an instruction position of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Trim and bound-check raw caller input
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OracleError::InvalidQuestion(
                "question must not be empty".to_string(),
            ));
        }

        let len = trimmed.chars().count();
        if len > max_chars {
            return Err(OracleError::InvalidQuestion(format!(
                "question is {} characters, the limit is {}",
                len, max_chars
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Natural-language answer returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer(String);

impl Answer {
    /// Blank text is not an answer
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
