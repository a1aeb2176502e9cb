//! Text generation collaborator.
//!
//! [`Generator`] is the narrow interface the answer composer depends on:
//! a system prompt and a user prompt in, answer text out.
//! [`ChatClient`] implements it against any OpenAI-compatible
//! `POST {base_url}/chat/completions` endpoint (Groq by default).
//!
//! The call is a single blocking request: no retries, no timeout beyond
//! the transport default. Any non-2xx status becomes
//! [`Error::Generation`] carrying the status and response body; transport
//! failures carry no status.

use serde::Deserialize;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Produces answer text from a prompt pair.
pub trait Generator: Send {
    /// Model identifier, for display.
    fn model_name(&self) -> &str;

    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Blocking client for OpenAI-compatible chat-completions APIs.
pub struct ChatClient {
    config: LlmConfig,
    api_key: Option<String>,
    http: reqwest::blocking::Client,
}

impl ChatClient {
    /// Build a client, reading the API key from `config.api_key_env`.
    ///
    /// A missing key is not an error here: the client is still usable for
    /// display, and [`generate`](Generator::generate) reports
    /// [`Error::Configuration`] on first use.
    pub fn from_config(config: &LlmConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &LlmConfig, api_key: Option<String>) -> Self {
        Self {
            config: config.clone(),
            api_key,
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl Generator for ChatClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            Error::Configuration(format!("{} not set", self.config.api_key_env))
        })?;

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "top_p": self.config.top_p,
            "stream": false,
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| Error::Generation {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "chat completion failed");
            return Err(Error::Generation {
                status: Some(status.as_u16()),
                message: body_text,
            });
        }

        let completion: ChatCompletion = response.json().map_err(|e| Error::Generation {
            status: Some(status.as_u16()),
            message: format!("invalid response body: {}", e),
        })?;
        completion.into_text()
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl ChatCompletion {
    fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Generation {
                status: None,
                message: "response contained no choices".to_string(),
            })
    }
}
