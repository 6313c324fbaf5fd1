use std::time::Duration;

use copilot_core::error::AppError;

pub const REMOTE_INVALID: &str = "AI_REMOTE_INVALID";
pub const OLLAMA_UNHEALTHY: &str = "AI_OLLAMA_UNHEALTHY";
pub const OLLAMA_UNREACHABLE: &str = "AI_OLLAMA_UNREACHABLE";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    /// Create a client for an Ollama-compatible server.
    ///
    /// The base URL must be `http(s)://host[:port]`: no credentials, no path, and a port in
    /// `1..=65535` when one is given. A trailing `/` is trimmed.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let invalid = |why: &str| {
            AppError::new(REMOTE_INVALID, "Ollama base URL is invalid")
                .with_details(format!("base_url={base_url}; reason={why}"))
        };

        let authority = base_url
            .strip_prefix("http://")
            .or_else(|| base_url.strip_prefix("https://"))
            .ok_or_else(|| invalid("scheme must be http or https"))?;
        if authority.is_empty() {
            return Err(invalid("missing host"));
        }
        if authority.contains('@') {
            return Err(invalid("credentials are not allowed"));
        }
        if authority.contains(['/', '?', '#']) {
            return Err(invalid("path, query and fragment are not allowed"));
        }
        if let Some((host, port)) = authority.rsplit_once(':') {
            // Bracketed IPv6 literals carry colons of their own.
            if !host.is_empty() && !port.contains(']') {
                match port.parse::<u16>() {
                    Ok(p) if p > 0 => {}
                    _ => return Err(invalid("port must be in 1..=65535")),
                }
            }
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self, timeout: Duration) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url).timeout(timeout).call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new(OLLAMA_UNHEALTHY, "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(ureq::Error::Status(status, _)) => Err(
                AppError::new(OLLAMA_UNHEALTHY, "Ollama health check failed")
                    .with_details(format!("status={status}")),
            ),
            Err(e) => Err(AppError::new(OLLAMA_UNREACHABLE, "Failed to reach Ollama")
                .with_details(format!("base_url={}; err={e}", self.base_url))
                .with_retryable(true)),
        }
    }
}
