use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::http::{http_client, post_json};
use crate::CommentaryClient;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Clone)]
pub struct GeminiClientConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl std::fmt::Debug for GeminiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClientConfig")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClientConfig {
    /// Loads config from env vars:
    /// - `GEMINI_API_KEY` (required, `None` when unset or blank)
    /// - `GEMINI_MODEL`   (default: `gemini-2.0-flash`)
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?.trim().to_string();
        if api_key.is_empty() {
            return None;
        }
        let model = std::env::var("GEMINI_MODEL")
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }
}

/// Hosted Gemini `generateContent` client (blocking HTTP).
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiClientConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiClientConfig) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_secs(30))?,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    pub fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let endpoint = self.endpoint();
        let request = generate_request(system_prompt, user_prompt);

        let response: GenerateResponse = post_json(
            self.http
                .post(&endpoint)
                .header("x-goog-api-key", &self.config.api_key),
            &endpoint,
            &request,
        )?;

        response_text(response)
    }
}

impl CommentaryClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.generate(system_prompt, user_prompt)
    }
}

fn generate_request(system_prompt: &str, user_prompt: &str) -> GenerateRequest {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: system_prompt.to_string(),
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: user_prompt.to_string(),
            }],
        }],
    }
}

fn response_text(response: GenerateResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Gemini response had no candidates"))?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(anyhow!("Gemini response had no text"));
    }
    Ok(text.trim().to_string())
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
