use copilot_core::domain::Passage;
use copilot_core::error::AppError;
use copilot_core::ingest::decode_search_hits;

/// Supplies the passages retrieved for one question.
pub trait Retriever {
    fn retrieve(&self, question: &str) -> Result<Vec<Passage>, AppError>;
}

impl<F> Retriever for F
where
    F: Fn(&str) -> Result<Vec<Passage>, AppError>,
{
    fn retrieve(&self, question: &str) -> Result<Vec<Passage>, AppError> {
        self(question)
    }
}

/// Serves a fixed JSON array of search hits for every question.
///
/// Useful for replaying a captured search response through the pipeline.
#[derive(Debug, Clone)]
pub struct SearchHitsReplay {
    raw_json: String,
}

impl SearchHitsReplay {
    pub fn new(raw_json: impl Into<String>) -> Self {
        Self {
            raw_json: raw_json.into(),
        }
    }
}

impl Retriever for SearchHitsReplay {
    fn retrieve(&self, _question: &str) -> Result<Vec<Passage>, AppError> {
        decode_search_hits(&self.raw_json)
    }
}
