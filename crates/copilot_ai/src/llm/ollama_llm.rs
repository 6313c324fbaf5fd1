use std::time::Duration;

use copilot_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::prompts::{generate_prompt, guardrail_prompt};
use super::{Generator, Guardrail, ResponseMode};
use crate::config::CopilotConfig;
use crate::guardrails::{parse_verdict, GUARDRAIL_FAILED};
use crate::ollama::OllamaClient;

pub const GENERATE_FAILED: &str = "AI_GENERATE_FAILED";

/// Guardrail and generation backed by an Ollama-compatible `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
    generate_model: String,
    guardrail_model: String,
    course_name: String,
    generate_timeout: Duration,
    guardrail_timeout: Duration,
}

impl OllamaLlm {
    pub fn from_config(config: &CopilotConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: OllamaClient::new(&config.ollama_base_url)?,
            generate_model: config.generate_model.clone(),
            guardrail_model: config.guardrail_model.clone(),
            course_name: config.course_name.clone(),
            generate_timeout: config.generate_timeout,
            guardrail_timeout: config.guardrail_timeout,
        })
    }

    fn call(
        &self,
        code: &str,
        model: &str,
        prompt: &str,
        options: Option<GenerateOptions>,
        timeout: Duration,
    ) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
            options,
        };

        let resp = ureq::post(&url)
            .timeout(timeout)
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new(code, "Failed to encode generate request").with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: GenerateResponse = r.into_json().map_err(|e| {
                    AppError::new(code, "Failed to decode generate response")
                        .with_details(e.to_string())
                })?;
                if v.response.trim().is_empty() {
                    return Err(AppError::new(code, "Generate response was empty")
                        .with_details(format!("model={model}")));
                }
                Ok(v.response)
            }
            Ok(r) => Err(AppError::new(code, "Generate request failed")
                .with_details(format!("model={model}; status={}", r.status()))),
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(code, "Generate request failed")
                .with_details(format!("model={model}; status={status}"))),
            Err(e) => Err(AppError::new(code, "Failed to call generate endpoint")
                .with_details(format!("model={model}; err={e}"))
                .with_retryable(true)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Guardrail for OllamaLlm {
    fn classify(&self, question: &str) -> Result<bool, AppError> {
        let reply = self.call(
            GUARDRAIL_FAILED,
            &self.guardrail_model,
            &guardrail_prompt(question),
            Some(GenerateOptions { num_predict: 1 }),
            self.guardrail_timeout,
        )?;
        parse_verdict(&reply)
    }
}

impl Generator for OllamaLlm {
    fn generate(
        &self,
        prompt_sources: &str,
        question: &str,
        mode: ResponseMode,
    ) -> Result<String, AppError> {
        let prompt = generate_prompt(&self.course_name, mode, prompt_sources, question);
        self.call(
            GENERATE_FAILED,
            &self.generate_model,
            &prompt,
            None,
            self.generate_timeout,
        )
    }
}
