//! Engine settings
//!
//! Process-wide, read-only configuration: LLM provider access for prompt
//! stages, integration credentials and run concurrency. Built once at
//! startup and shared as `Arc<Settings>`.

use std::time::Duration;

/// Engine settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Application name reported by the server and sent as user agent
    pub app_name: String,

    /// Base URL of an OpenAI-compatible API (e.g., "https://api.groq.com/openai/v1")
    pub llm_api_url: String,

    /// API key for the LLM provider; prompt stages fail when empty
    pub llm_api_key: String,

    /// Model used by prompt stages
    pub llm_model: String,

    /// Sampling temperature used by prompt stages
    pub llm_temperature: f32,

    /// n8n REST API base URL (e.g., "http://localhost:5678/api/v1")
    pub n8n_api_url: Option<String>,

    /// n8n API key, sent as `X-N8N-API-KEY`
    pub n8n_api_key: Option<String>,

    /// Default webhook used by `Webhook` targets with an empty url
    pub zapier_webhook_url: Option<String>,

    /// Per-request timeout for integration notifications
    pub notify_timeout: Duration,

    /// Maximum number of runs executing stages at the same time
    pub max_concurrent_runs: usize,
}

impl Settings {
    /// Creates settings with defaults for everything
    pub fn new() -> Self {
        Self {
            app_name: "FlowMancer".to_string(),
            llm_api_url: "https://api.groq.com/openai/v1".to_string(),
            llm_api_key: String::new(),
            llm_model: "llama-3.3-70b-versatile".to_string(),
            llm_temperature: 0.7,
            n8n_api_url: None,
            n8n_api_key: None,
            zapier_webhook_url: None,
            notify_timeout: Duration::from_secs(30),
            max_concurrent_runs: 16,
        }
    }

    /// Creates settings from environment variables
    ///
    /// Recognized environment variables (all optional):
    /// - APP_NAME (default: FlowMancer)
    /// - LLM_API_URL (default: https://api.groq.com/openai/v1)
    /// - LLM_API_KEY, falling back to GROQ_API_KEY
    /// - LLM_MODEL (default: llama-3.3-70b-versatile)
    /// - LLM_TEMPERATURE (default: 0.7)
    /// - N8N_API_URL, N8N_API_KEY
    /// - ZAPIER_WEBHOOK_URL
    /// - NOTIFY_TIMEOUT (seconds, default: 30)
    /// - MAX_CONCURRENT_RUNS (default: 16)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new();

        let app_name = non_empty_var("APP_NAME").unwrap_or(defaults.app_name);

        let llm_api_url = non_empty_var("LLM_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.llm_api_url);

        let llm_api_key = non_empty_var("LLM_API_KEY")
            .or_else(|| non_empty_var("GROQ_API_KEY"))
            .unwrap_or_default();

        let llm_model = non_empty_var("LLM_MODEL").unwrap_or(defaults.llm_model);

        let llm_temperature = match non_empty_var("LLM_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .map_err(|_| anyhow::anyhow!("LLM_TEMPERATURE must be a number, got '{}'", raw))?,
            None => defaults.llm_temperature,
        };

        let notify_timeout = non_empty_var("NOTIFY_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.notify_timeout);

        let max_concurrent_runs = non_empty_var("MAX_CONCURRENT_RUNS")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_concurrent_runs);

        Ok(Self {
            app_name,
            llm_api_url,
            llm_api_key,
            llm_model,
            llm_temperature,
            n8n_api_url: non_empty_var("N8N_API_URL").map(|url| url.trim_end_matches('/').to_string()),
            n8n_api_key: non_empty_var("N8N_API_KEY"),
            zapier_webhook_url: non_empty_var("ZAPIER_WEBHOOK_URL"),
            notify_timeout,
            max_concurrent_runs,
        })
    }

    /// Whether n8n targets can be delivered
    pub fn n8n_configured(&self) -> bool {
        self.n8n_api_url.is_some() && self.n8n_api_key.is_some()
    }

    /// Validates the settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.app_name.trim().is_empty() {
            anyhow::bail!("app_name cannot be empty");
        }

        if !is_http_url(&self.llm_api_url) {
            anyhow::bail!("llm_api_url must start with http:// or https://");
        }

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            anyhow::bail!("llm_temperature must be between 0.0 and 2.0");
        }

        if let Some(url) = &self.n8n_api_url {
            if !is_http_url(url) {
                anyhow::bail!("n8n_api_url must start with http:// or https://");
            }
        }

        if let Some(url) = &self.zapier_webhook_url {
            if !is_http_url(url) {
                anyhow::bail!("zapier_webhook_url must start with http:// or https://");
            }
        }

        if self.notify_timeout.is_zero() {
            anyhow::bail!("notify_timeout must be greater than 0");
        }

        if self.max_concurrent_runs == 0 {
            anyhow::bail!("max_concurrent_runs must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "FlowMancer");
        assert_eq!(settings.notify_timeout, Duration::from_secs(30));
        assert_eq!(settings.max_concurrent_runs, 16);
        assert!(!settings.n8n_configured());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();

        settings.llm_api_url = "not-a-url".to_string();
        assert!(settings.validate().is_err());
        settings.llm_api_url = "https://api.openai.com/v1".to_string();
        assert!(settings.validate().is_ok());

        settings.max_concurrent_runs = 0;
        assert!(settings.validate().is_err());
        settings.max_concurrent_runs = 1;

        settings.n8n_api_url = Some("localhost:5678".to_string());
        assert!(settings.validate().is_err());
        settings.n8n_api_url = Some("http://localhost:5678/api/v1".to_string());
        assert!(settings.validate().is_ok());

        settings.notify_timeout = Duration::ZERO;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_n8n_requires_url_and_key() {
        let mut settings = Settings::default();
        settings.n8n_api_url = Some("http://localhost:5678/api/v1".to_string());
        assert!(!settings.n8n_configured());
        settings.n8n_api_key = Some("secret".to_string());
        assert!(settings.n8n_configured());
    }
}
