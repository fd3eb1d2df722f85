//! LLM voter — external chat-completion classification.
//!
//! The transport hides behind [`ChatCompleter`]; [`HttpChatCompleter`]
//! speaks the OpenAI-compatible chat-completions JSON shape that local
//! (Ollama) and hosted providers share.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use cloak_core::{Error, Result};

use crate::types::{Intent, VoterId};
use crate::voter::IntentVoter;

pub const DEFAULT_API_BASE: &str = "http://localhost:11434/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gemma";

/// Configuration for the external LLM call.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub max_tokens: usize,
}

impl LlmConfig {
    /// Read endpoint, model, and key from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(api_base) = std::env::var("CLOAK_LLM_API_BASE") {
            config.api_base = api_base;
        }
        if let Ok(model) = std::env::var("CLOAK_LLM_MODEL") {
            config.model = model;
        }
        config.api_key = std::env::var("CLOAK_LLM_API_KEY").ok();
        config
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            model: DEFAULT_MODEL.into(),
            api_key: None,
            // Deterministic, single-word replies.
            temperature: 0.0,
            max_tokens: 10,
        }
    }
}

/// Narrow interface to the chat-completion backend.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible HTTP chat-completion client.
pub struct HttpChatCompleter {
    client: Client,
    config: LlmConfig,
}

impl HttpChatCompleter {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ChatCompleter for HttpChatCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let mut request = self
            .client
            .post(&self.config.api_base)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Llm(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("API error {}: {}", status, body)));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("malformed response: {}", e)))?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| Error::Llm("response missing message content".into()))
    }
}

/// LLM-backed voter with a fixed classification prompt.
pub struct LlmVoter {
    completer: Arc<dyn ChatCompleter>,
}

impl LlmVoter {
    pub fn new(completer: Arc<dyn ChatCompleter>) -> Self {
        Self { completer }
    }

    fn build_prompt(query: &str) -> String {
        format!(
            r#"You are an intent classifier. Your job is to identify if the query is asking for:
1) "search": information retrieval, listing, finding data, looking up information
2) "reasoning": explanations, analysis, comparisons, evaluations

Respond with ONLY the word "search" or "reasoning".

Examples of search queries:
- Find all emails from John
- Show me customer records from last month
- Search for documents containing financial data
- List all transactions over $1000

Examples of reasoning queries:
- Why did the transaction fail?
- How does this algorithm work?
- Explain the difference between these two reports
- Analyze the trends in this dataset

Query: {}
Intent:"#,
            query
        )
    }
}

#[async_trait]
impl IntentVoter for LlmVoter {
    fn id(&self) -> VoterId {
        VoterId::Llm
    }

    async fn classify(&self, query: &str) -> Result<Intent> {
        let reply = self.completer.complete(&Self::build_prompt(query)).await?;
        let normalized = reply.to_lowercase();
        debug!("llm voter raw reply: {:?}", reply);

        if normalized.contains("search") {
            Ok(Intent::Search)
        } else if normalized.contains("reasoning") {
            Ok(Intent::Reasoning)
        } else {
            Err(Error::Llm(format!("unexpected reply: {:?}", reply)))
        }
    }
}
