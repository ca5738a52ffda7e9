use std::net::IpAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::http::{http_client, post_json};
use crate::CommentaryClient;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Local models are slow on first load.
const TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for a model served by a local Ollama daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaClientConfig {
    pub base_url: String,
    pub model: String,
}

impl OllamaClientConfig {
    /// `OLLAMA_MODEL` selects the model and switches the backend on; unset or
    /// blank means no local commentary. `OLLAMA_BASE_URL` defaults to
    /// `http://localhost:11434`.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let model = lookup("OLLAMA_MODEL")?.trim().to_string();
        if model.is_empty() {
            return None;
        }
        let base_url = lookup("OLLAMA_BASE_URL")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Some(Self { base_url, model })
    }
}

/// One-shot `/api/generate` client. Ledger figures never leave the machine,
/// so only loopback hosts are accepted.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    endpoint: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaClientConfig) -> Result<Self> {
        let base = loopback_url(&config.base_url)?;
        let endpoint = base
            .join("api/generate")
            .context("Failed to build Ollama /api/generate URL")?;
        Ok(Self {
            http: http_client(TIMEOUT)?,
            endpoint,
            model: config.model,
        })
    }
}

impl CommentaryClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = GenerateBody {
            model: &self.model,
            system: system_prompt,
            prompt: user_prompt,
            stream: false,
            options: Sampling { temperature: 0.3 },
        };
        let reply: GenerateReply = post_json(
            self.http.post(self.endpoint.clone()),
            self.endpoint.as_str(),
            &body,
        )?;
        Ok(reply.response)
    }
}

fn loopback_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid OLLAMA_BASE_URL: {raw}"))?;
    if url.scheme() != "http" {
        bail!("OLLAMA_BASE_URL must use http:// (got '{}')", url.scheme());
    }
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("OLLAMA_BASE_URL is missing a host"))?;
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    let loopback = bare.eq_ignore_ascii_case("localhost")
        || bare.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback());
    if !loopback {
        bail!("OLLAMA_BASE_URL host '{host}' is not a loopback address; set GEMINI_API_KEY for a hosted model");
    }
    Ok(url)
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Sampling,
}

#[derive(Debug, Serialize)]
struct Sampling {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Option<OllamaClientConfig> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        OllamaClientConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_config_requires_a_model() {
        assert_eq!(config_from(&[]), None);
        assert_eq!(config_from(&[("OLLAMA_MODEL", "  ")]), None);
        let cfg = config_from(&[("OLLAMA_MODEL", " llama3.2 ")]).unwrap();
        assert_eq!(cfg.model, "llama3.2");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_loopback_hosts_are_accepted() {
        for url in [
            "http://localhost:11434",
            "http://127.0.0.1:11434/",
            "http://127.0.0.2:11434",
            "http://[::1]:11434",
        ] {
            assert!(loopback_url(url).is_ok(), "{url}");
        }
    }

    #[test]
    fn test_remote_or_https_hosts_are_refused() {
        for url in [
            "http://example.com:11434",
            "http://192.168.0.10:11434",
            "https://localhost:11434",
            "not a url",
        ] {
            assert!(loopback_url(url).is_err(), "{url}");
        }
    }

    #[test]
    fn test_client_targets_generate_endpoint() {
        let client = OllamaClient::new(OllamaClientConfig {
            base_url: "http://localhost:11434/".to_string(),
            model: "llama3.2".to_string(),
        })
        .unwrap();
        assert_eq!(client.endpoint.as_str(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_generate_body_shape() {
        let body = GenerateBody {
            model: "llama3.2",
            system: "sys",
            prompt: "usr",
            stream: false,
            options: Sampling { temperature: 0.3 },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "llama3.2");
        assert_eq!(value["system"], "sys");
        assert_eq!(value["prompt"], "usr");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["temperature"], 0.3);
    }

    #[test]
    fn test_reply_without_text_is_blank() {
        let reply: GenerateReply = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(reply.response.is_empty());
    }
}
