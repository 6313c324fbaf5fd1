use std::str::FromStr;
use std::time::Duration;

use copilot_core::error::AppError;
use copilot_core::resolve::ResolveOptions;

use crate::llm::ResponseMode;

pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

/// Runtime settings for the copilot pipeline and its Ollama collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct CopilotConfig {
    pub ollama_base_url: String,
    pub generate_model: String,
    pub guardrail_model: String,
    pub generate_timeout: Duration,
    pub guardrail_timeout: Duration,
    pub course_name: String,
    pub default_mode: ResponseMode,
    pub resolve: ResolveOptions,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://127.0.0.1:11434".to_string(),
            generate_model: "llama3.1:8b".to_string(),
            guardrail_model: "llama3.1:8b".to_string(),
            generate_timeout: Duration::from_secs(60),
            guardrail_timeout: Duration::from_secs(10),
            course_name: "this course".to_string(),
            default_mode: ResponseMode::Recommendation,
            resolve: ResolveOptions::default(),
        }
    }
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>, AppError> {
    match raw {
        None => Ok(None),
        Some(v) => v.trim().parse::<T>().map(Some).map_err(|_| {
            AppError::new(CONFIG_INVALID, "Invalid configuration value")
                .with_details(format!("key={key}; value={v}"))
        }),
    }
}

impl CopilotConfig {
    /// Load settings from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset keys keep their defaults.
    ///
    /// Keys: `COPILOT_OLLAMA_BASE_URL`, `COPILOT_GENERATE_MODEL`, `COPILOT_GUARDRAIL_MODEL`,
    /// `COPILOT_GENERATE_TIMEOUT_SECS`, `COPILOT_GUARDRAIL_TIMEOUT_SECS`, `COPILOT_COURSE_NAME`,
    /// `COPILOT_RESPONSE_MODE`, `COPILOT_VIDEO_MERGE_THRESHOLD_SECS`,
    /// `COPILOT_VIDEO_TRAILING_PAD_SECS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("COPILOT_OLLAMA_BASE_URL") {
            cfg.ollama_base_url = v.trim().to_string();
        }
        if let Some(v) = get("COPILOT_GENERATE_MODEL") {
            cfg.generate_model = v.trim().to_string();
        }
        if let Some(v) = get("COPILOT_GUARDRAIL_MODEL") {
            cfg.guardrail_model = v.trim().to_string();
        }
        if let Some(v) = get("COPILOT_COURSE_NAME") {
            cfg.course_name = v.trim().to_string();
        }
        if let Some(secs) = parse_var::<u64>(
            "COPILOT_GENERATE_TIMEOUT_SECS",
            get("COPILOT_GENERATE_TIMEOUT_SECS"),
        )? {
            cfg.generate_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(
            "COPILOT_GUARDRAIL_TIMEOUT_SECS",
            get("COPILOT_GUARDRAIL_TIMEOUT_SECS"),
        )? {
            cfg.guardrail_timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = get("COPILOT_RESPONSE_MODE") {
            cfg.default_mode = mode.parse()?;
        }
        if let Some(t) = parse_var::<f64>(
            "COPILOT_VIDEO_MERGE_THRESHOLD_SECS",
            get("COPILOT_VIDEO_MERGE_THRESHOLD_SECS"),
        )? {
            if !t.is_finite() || t < 0.0 {
                return Err(AppError::new(CONFIG_INVALID, "Merge threshold must be non-negative")
                    .with_details(format!("key=COPILOT_VIDEO_MERGE_THRESHOLD_SECS; value={t}")));
            }
            cfg.resolve.merge_threshold_secs = t;
        }
        if let Some(pad) = parse_var::<i64>(
            "COPILOT_VIDEO_TRAILING_PAD_SECS",
            get("COPILOT_VIDEO_TRAILING_PAD_SECS"),
        )? {
            if pad < 0 {
                return Err(AppError::new(CONFIG_INVALID, "Trailing pad must be non-negative")
                    .with_details(format!("key=COPILOT_VIDEO_TRAILING_PAD_SECS; value={pad}")));
            }
            cfg.resolve.trailing_pad_secs = pad;
        }

        if cfg.generate_timeout.is_zero() || cfg.guardrail_timeout.is_zero() {
            return Err(AppError::new(CONFIG_INVALID, "Timeouts must be at least one second"));
        }
        Ok(cfg)
    }
}
