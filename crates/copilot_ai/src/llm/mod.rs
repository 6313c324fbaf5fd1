use std::fmt;
use std::str::FromStr;

use copilot_core::error::AppError;
use serde::{Deserialize, Serialize};

pub mod ollama_llm;
mod prompts;

pub const RESPONSE_MODE_INVALID: &str = "RESPONSE_MODE_INVALID";

/// How the generator should use the retrieved course content.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Answer the question directly, citing sources.
    Answer,
    /// Point the student at relevant content without answering outright.
    #[default]
    Recommendation,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Answer => "answer",
            ResponseMode::Recommendation => "recommendation",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "answer" => Ok(ResponseMode::Answer),
            "recommendation" => Ok(ResponseMode::Recommendation),
            other => Err(AppError::new(
                RESPONSE_MODE_INVALID,
                "Response mode must be 'answer' or 'recommendation'",
            )
            .with_details(format!("response_mode={other}"))),
        }
    }
}

/// Decides whether a question may be processed at all.
pub trait Guardrail {
    fn classify(&self, question: &str) -> Result<bool, AppError>;
}

/// Produces an answer from the rendered source bundle.
///
/// The returned text is untrusted: the citation resolver validates every `[n]` marker in it.
pub trait Generator {
    fn generate(
        &self,
        prompt_sources: &str,
        question: &str,
        mode: ResponseMode,
    ) -> Result<String, AppError>;
}
