//! Prompt stages
//!
//! A prompt stage renders a template from the context, sends it to an
//! OpenAI-compatible chat completions endpoint and stores the reply under
//! its output field. Replies that are valid JSON objects or arrays are stored
//! parsed so downstream stages can address their fields.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use flowmancer_core::domain::context::{Context, StageOutput};
use serde_json::{Value, json};
use tracing::debug;

use super::{Stage, StageError};
use crate::config::Settings;

/// Longest rendering of a single placeholder, in characters
const MAX_FIELD_CHARS: usize = 4000;

/// Placeholder value for fields missing from the context
const MISSING: &str = "N/A";

/// Minimal chat completions client
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl LlmClient {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    pub fn with_client(settings: &Settings, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: settings.llm_api_url.trim_end_matches('/').to_string(),
            api_key: settings.llm_api_key.clone(),
            model: settings.llm_model.clone(),
            temperature: settings.llm_temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a single user message and returns the reply text
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            anyhow::bail!("LLM API key is not configured");
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!(url = %url, model = %self.model, "sending LLM request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM provider returned {}: {}", status, text);
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("LLM response has no message content"))
    }
}

/// Stage that asks an LLM to produce one output field
pub struct PromptStage {
    name: String,
    template: String,
    output_field: String,
    client: LlmClient,
}

impl PromptStage {
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        output_field: impl Into<String>,
        client: LlmClient,
    ) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            output_field: output_field.into(),
            client,
        }
    }
}

#[async_trait]
impl Stage for PromptStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, context: &Context) -> Result<StageOutput, StageError> {
        let prompt = render_template(&self.template, context);

        let reply = self
            .client
            .complete(&prompt)
            .await
            .map_err(|e| StageError::new(&self.name, format!("{:#}", e)))?;

        let mut output = StageOutput::new();
        output.insert(self.output_field.clone(), parse_reply(&reply));
        output.insert(
            format!("{}_model", self.output_field),
            json!(self.client.model()),
        );
        Ok(output)
    }
}

/// Replaces `{path}` placeholders with context values
///
/// Paths are dotted context lookups. Strings are inserted verbatim, other
/// values as compact JSON, missing values as `N/A`. Braces that do not
/// enclose a plain path (JSON examples in the template) are left untouched.
pub fn render_template(template: &str, context: &Context) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) if is_placeholder(&after[..close]) => {
                let path = &after[..close];
                let value = match context.lookup(path) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => MISSING.to_string(),
                    Some(other) => other.to_string(),
                };
                rendered.push_str(&truncate_chars(&value, MAX_FIELD_CHARS));
                rest = &after[close + 1..];
            }
            _ => {
                rendered.push('{');
                rest = after;
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

fn is_placeholder(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// Keeps structured replies structured, tolerating ```json fences
fn parse_reply(reply: &str) -> Value {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(unfenced) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => Value::String(reply.to_string()),
    }
}
