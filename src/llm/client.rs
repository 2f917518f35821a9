use crate::consts::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, ENV_API_KEY, ENV_BASE_URL, ENV_MODEL, ENV_TIMEOUT_SECS,
};
use crate::exceptions::PatchError;
use crate::llm::api_models::{ChatCompletionRequest, ChatCompletionResponse, Message};
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Where and how to reach the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    /// `None` waits for the endpoint indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: None,
            timeout: None,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, PatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PatchError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match non_empty(ENV_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    PatchError::Configuration(format!(
                        "{} must be a whole number of seconds, got '{}'.",
                        ENV_TIMEOUT_SECS, raw
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let defaults = Self::default();
        Ok(Self {
            base_url: non_empty(ENV_BASE_URL).unwrap_or(defaults.base_url),
            model: non_empty(ENV_MODEL).unwrap_or(defaults.model),
            api_key: non_empty(ENV_API_KEY),
            temperature: None,
            timeout,
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        model: Option<String>,
        base_url: Option<String>,
        temperature: Option<f32>,
    ) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if temperature.is_some() {
            self.temperature = temperature;
        }
        self
    }
}

#[derive(Debug)]
pub struct LlmClient {
    http: HttpClient,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, PatchError> {
        if config.model.trim().is_empty() {
            return Err(PatchError::Configuration("A model name is required.".into()));
        }
        let http = crate::utils::setup_http_client(config.timeout)
            .map_err(|e| PatchError::Configuration(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { http, config })
    }

    /// Sends a non-streaming chat request and returns the first choice's content.
    #[instrument(skip_all, fields(model = %self.config.model))]
    pub async fn complete(&self, messages: Vec<Message>) -> Result<String, PatchError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let req = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            temperature: self.config.temperature,
        };

        let mut request_builder = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&req);
        if let Some(key) = &self.config.api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", key));
        }

        debug!(%url, "sending completion request");
        let response = request_builder
            .send()
            .await
            .map_err(|e| PatchError::Provider(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PatchError::Provider(e.to_string()))?;

        if !status.is_success() {
            let error_msg = if text.trim().is_empty() {
                format!("API Error (Status: {}): [Empty Body]", status)
            } else {
                format!("API Error (Status: {}): {}", status, text)
            };
            return Err(PatchError::Provider(error_msg));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| PatchError::Provider(format!("Malformed completion response: {}", e)))?;

        if let Some(usage) = &parsed.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "completion usage"
            );
        }

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            PatchError::Provider("Completion response contained no choices.".into())
        })?;
        if let Some(reason) = &choice.finish_reason {
            debug!(finish_reason = %reason, "completion finished");
        }

        choice.message.content.ok_or_else(|| {
            PatchError::Provider("Completion response contained no message content.".into())
        })
    }
}

pub fn append_file_context_xml(buffer: &mut String, path: &str, content: &str) {
    use std::fmt::Write;
    let _ = writeln!(buffer, "<file path=\"{}\">", path);
    buffer.push_str(content);
    if !content.ends_with('\n') {
        buffer.push('\n');
    }
    buffer.push_str("</file>\n");
}

/// The system + user messages asking for a whole-file rewrite.
pub fn build_rewrite_messages(
    system_prompt: &str,
    instruction: &str,
    path: &str,
    content: &str,
) -> Vec<Message> {
    let mut user = String::new();
    append_file_context_xml(&mut user, path, content);
    user.push_str("\n<instruction>\n");
    user.push_str(instruction.trim());
    user.push_str("\n</instruction>\n\nReturn the complete updated file.");

    vec![Message::system(system_prompt), Message::user(user)]
}
