use std::collections::BTreeMap;

use copilot_core::bundle::build_bundle;
use copilot_core::domain::CitationEntry;
use copilot_core::error::AppError;
use copilot_core::resolve::{resolve_citations, ResolveOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::llm::{Generator, Guardrail, ResponseMode};
use crate::retrieve::Retriever;

pub const QUESTION_EMPTY: &str = "QUESTION_EMPTY";

pub const REFUSAL_TEXT: &str = "I'm sorry, I couldn't process your question. \
Please ensure it is appropriate to the purpose of this copilot.";

pub const FAILURE_TEXT: &str = "I'm sorry, something went wrong while answering your question. \
Please try again later.";

/// Collaborators for one copilot instance.
pub struct CopilotDeps<'a> {
    pub guardrail: &'a dyn Guardrail,
    pub retriever: &'a dyn Retriever,
    pub generator: &'a dyn Generator,
    pub resolve: ResolveOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CopilotAnswer {
    pub text: String,
    pub citations: BTreeMap<u32, CitationEntry>,
}

impl CopilotAnswer {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            citations: BTreeMap::new(),
        }
    }
}

/// Run one question through guardrail, retrieval, generation and citation resolution.
///
/// A question the guardrail rejects yields the refusal text without retrieving anything. Any
/// collaborator or resolution error aborts the whole question; no partial citation table is
/// returned.
pub fn ask(
    deps: &CopilotDeps<'_>,
    question: &str,
    mode: ResponseMode,
) -> Result<CopilotAnswer, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::new(QUESTION_EMPTY, "Question must not be empty"));
    }

    if !deps.guardrail.classify(question)? {
        warn!(question_len = question.len(), "question rejected by guardrail");
        return Ok(CopilotAnswer::plain(REFUSAL_TEXT));
    }

    let passages = deps.retriever.retrieve(question)?;
    let bundle = build_bundle(&passages)?;
    info!(
        passages = passages.len(),
        sources = bundle.sources.len(),
        source_ids = bundle.source_id_count(),
        "sources formatted"
    );
    debug!(content_sha256 = %bundle.content_sha256, "source bundle fingerprint");

    let answer = deps.generator.generate(&bundle.content, question, mode)?;
    let resolved = resolve_citations(&answer, &bundle.sources, &deps.resolve)?;
    info!(
        mode = %mode,
        citations = resolved.citations.len(),
        "answer resolved"
    );

    Ok(CopilotAnswer {
        text: resolved.text,
        citations: resolved.citations,
    })
}

/// Like [`ask`], but never fails: errors are logged and replaced by a generic answer so internal
/// detail never reaches the student.
pub fn respond(deps: &CopilotDeps<'_>, question: &str, mode: ResponseMode) -> CopilotAnswer {
    match ask(deps, question, mode) {
        Ok(answer) => answer,
        Err(e) => {
            error!(
                code = %e.code,
                message = %e.message,
                details = e.details.as_deref().unwrap_or(""),
                retryable = e.retryable,
                "copilot question failed"
            );
            CopilotAnswer::plain(FAILURE_TEXT)
        }
    }
}
