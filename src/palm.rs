use crate::config::AssistantConfig;
use crate::error::{CompletionError, ConfigError};
use crate::logging;
use crate::prompts::CompletionRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Sampling temperature sent with every request, kept low so repeated runs read alike.
pub const TEMPERATURE: f64 = 0.1;
/// Only the first candidate is ever used.
pub const CANDIDATE_COUNT: u32 = 1;

/// Raw text of the first candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub text: String,
}

/// Anything that turns one instruction into one completion.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, CompletionError>;
}

#[derive(Debug, Serialize)]
struct PromptMessage<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Prompt<'a> {
    messages: Vec<PromptMessage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateMessageRequest<'a> {
    model: &'a str,
    prompt: Prompt<'a>,
    temperature: f64,
    candidate_count: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateMessageResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PalmError {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct PalmClient {
    client: Client,
    config: AssistantConfig,
    api_key: RwLock<String>,
}

impl PalmClient {
    pub fn new(config: AssistantConfig) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ConfigError::Client)?;
        let api_key = RwLock::new(config.api_key.clone());

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn set_api_key(&self, api_key: &str) {
        *self.api_key.write().unwrap_or_else(PoisonError::into_inner) = api_key.to_string();
    }

    pub fn config(&self) -> AssistantConfig {
        AssistantConfig {
            api_key: self.api_key.read().unwrap_or_else(PoisonError::into_inner).clone(),
            ..self.config.clone()
        }
    }

    fn request_body<'a>(&'a self, instruction_text: &'a str) -> GenerateMessageRequest<'a> {
        GenerateMessageRequest {
            model: &self.config.model,
            prompt: Prompt {
                messages: vec![PromptMessage {
                    content: instruction_text,
                }],
            },
            temperature: TEMPERATURE,
            candidate_count: CANDIDATE_COUNT,
        }
    }

    async fn send(&self, instruction_text: &str) -> Result<CompletionResult, CompletionError> {
        let api_key = self.api_key.read().unwrap_or_else(PoisonError::into_inner).clone();
        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&self.request_body(instruction_text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<PalmError>(&body) {
                Ok(parsed) => match parsed.error.status {
                    Some(kind) => format!("{} - {}", kind, parsed.error.message),
                    None => parsed.error.message,
                },
                Err(_) => body,
            };
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        first_candidate(&body)
    }

    /// Checks the configured key with a trivial prompt.
    pub async fn validate_api_key(&self) -> Result<bool, CompletionError> {
        match self.send("Say 'ok'").await {
            Ok(_) => Ok(true),
            Err(CompletionError::Provider { status, message }) => match status {
                400 | 401 | 403 => Ok(false),
                429 => Err(CompletionError::Provider {
                    status,
                    message: "Rate limited - too many requests".to_string(),
                }),
                _ => Err(CompletionError::Provider { status, message }),
            },
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CompletionBackend for PalmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult, CompletionError> {
        logging::log_completion(
            None,
            &format!(
                "Sending {} chars to {}",
                request.instruction_text.chars().count(),
                self.config.model
            ),
        );
        let result = self.send(&request.instruction_text).await;
        match &result {
            Ok(completion) => logging::log_completion(
                None,
                &format!("Received: {}", logging::preview(&completion.text, 120)),
            ),
            Err(e) => logging::log_error(None, &format!("Completion failed: {}", e)),
        }
        result
    }
}

/// Decodes a provider body and keeps only the first candidate.
pub fn first_candidate(body: &str) -> Result<CompletionResult, CompletionError> {
    let decoded: GenerateMessageResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::MalformedResponse(format!("undecodable body: {}", e)))?;

    let candidate = decoded
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse("no candidates".to_string()))?;

    candidate
        .content
        .map(|text| CompletionResult { text })
        .ok_or_else(|| CompletionError::MalformedResponse("candidate has no content".to_string()))
}
