//! Short natural-language commentary on the aggregated totals.
//!
//! Two backends share the [`CommentaryClient`] trait: a hosted Gemini model
//! (`GEMINI_API_KEY`) and a local Ollama server (`OLLAMA_MODEL`). Whatever the
//! model answers is displayed as-is.

pub mod gemini;
mod http;
pub mod ollama;

use models::CategorySum;
use num_format::{Locale, ToFormattedString};
use thiserror::Error;

pub use gemini::{GeminiClient, GeminiClientConfig};
pub use ollama::{OllamaClient, OllamaClientConfig};

pub const SYSTEM_PROMPT: &str = "당신은 가족 자산 현황을 설명하는 재무 코치입니다. \
주어진 숫자만 근거로 한국어로 3~4문장의 짧은 코멘트를 작성하세요. \
투자 권유나 특정 상품 추천은 하지 마세요.";

#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("commentary request failed: {0:#}")]
    Request(#[from] anyhow::Error),
    #[error("model returned an empty answer")]
    Empty,
}

/// Figures handed to the model. Amounts are whole won, liabilities negative.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentaryRequest {
    pub total_assets: i64,
    pub total_liabilities: i64,
    pub net_worth: i64,
    pub category_sums: Vec<CategorySum>,
    pub target_net_worth: Option<i64>,
}

pub trait CommentaryClient {
    fn name(&self) -> &str;
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String>;

    fn commentary(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
        let answer = self.complete(SYSTEM_PROMPT, &user_prompt(request))?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(CommentaryError::Empty);
        }
        Ok(answer.to_string())
    }
}

fn won(v: i64) -> String {
    format!("{}원", v.to_formatted_string(&Locale::en))
}

/// Renders the figures as the user turn of the conversation.
pub fn user_prompt(req: &CommentaryRequest) -> String {
    let mut lines = vec![
        format!("총 자산: {}", won(req.total_assets)),
        format!("총 부채: {}", won(req.total_liabilities)),
        format!("순자산: {}", won(req.net_worth)),
    ];
    if !req.category_sums.is_empty() {
        lines.push("분류별 합계:".to_string());
        for c in &req.category_sums {
            lines.push(format!("- {}: {}", c.category, won(c.amount)));
        }
    }
    if let Some(target) = req.target_net_worth {
        lines.push(format!("목표 순자산: {}", won(target)));
    }
    lines.join("\n")
}

/// Picks a backend from the environment: Gemini when `GEMINI_API_KEY` is set,
/// otherwise Ollama when `OLLAMA_MODEL` is set. `None` disables commentary.
pub fn client_from_env() -> Option<Box<dyn CommentaryClient>> {
    if let Some(config) = GeminiClientConfig::from_env() {
        match GeminiClient::new(config) {
            Ok(client) => return Some(Box::new(client)),
            Err(e) => tracing::warn!("gemini client unavailable: {e:#}"),
        }
    }
    if let Some(config) = OllamaClientConfig::from_env() {
        match OllamaClient::new(config) {
            Ok(client) => return Some(Box::new(client)),
            Err(e) => tracing::warn!("ollama client unavailable: {e:#}"),
        }
    }
    tracing::info!("no commentary backend configured, commentary disabled");
    None
}
