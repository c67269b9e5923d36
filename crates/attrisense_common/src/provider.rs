//! Generative-text provider clients.
//!
//! One synchronous request per prompt: no streaming, no retries. The HTTP
//! client carries an explicit timeout so a hung provider ends up on the
//! fallback path instead of blocking the session.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("AI recommendations are disabled in configuration")]
    Disabled,

    #[error("No API key configured")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Provider rejected the credential (HTTP {0})")]
    Unauthorized(u16),

    #[error("Provider quota exceeded")]
    QuotaExceeded,

    #[error("HTTP {status} from provider: {message}")]
    Status { status: u16, message: String },

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

/// Prompt in, generated text out.
pub trait TextProvider: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.trim_start_matches("models/").to_string(),
            api_key,
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

impl TextProvider for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!("POST {} ({} prompt chars)", self.url(), prompt.len());
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::HttpError(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            return Err(match code {
                401 | 403 => ProviderError::Unauthorized(code),
                429 => ProviderError::QuotaExceeded,
                _ => ProviderError::Status {
                    status: code,
                    message: status.canonical_reason().unwrap_or("unknown").to_string(),
                },
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        extract_text(parsed)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("no candidates".to_string()))?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(ProviderError::EmptyResponse)
    } else {
        Ok(text)
    }
}

/// Scripted provider for tests and offline demos.
pub struct FakeTextProvider {
    responses: Mutex<Vec<Result<String, ProviderError>>>,
    call_count: Mutex<usize>,
    last_prompt: Mutex<Option<String>>,
}

impl FakeTextProvider {
    /// Responses are returned in order; the last one repeats.
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn always_ok(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn always_error(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl TextProvider for FakeTextProvider {
    fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        *self.last_prompt.lock().unwrap_or_else(|e| e.into_inner()) = Some(prompt.to_string());

        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        match responses.len() {
            0 => Err(ProviderError::EmptyResponse),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
