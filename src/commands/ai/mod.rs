//! Commands that forward a prompt to the OpenAI API and reply with the answer.

/// Submodule defining the `chatgpt` command.
pub mod chatgpt;
/// Submodule defining the `gpt3` command.
pub mod gpt3;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use super::CommandError;
use crate::config::OpenAiConfig;

/// Errors returned by the OpenAI API client.
#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("API communication failure: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Unable to parse text from JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with an error object.
    #[error("Refused to complete request: {0}")]
    Refusal(String),

    #[error("Unknown response from OpenAI API")]
    Unknown,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Client for the chat and legacy completion endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(http: Client, api_key: &str, base_url: &str, max_tokens: u32) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens,
        }
    }

    /// Builds a client from configuration, failing when no API key is set.
    pub fn from_config(http: &Client, config: &OpenAiConfig) -> Result<Self, CommandError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(CommandError::MissingApiKey {
                setting: "OPENAI_API_KEY",
            })?;
        Ok(Self::new(
            http.clone(),
            api_key,
            &config.base_url,
            config.max_tokens,
        ))
    }

    /// Sends `prompt` as a single user message and returns the text of every choice.
    pub async fn chat(&self, model: &str, prompt: &str) -> Result<Vec<String>, OpenAiError> {
        let request = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let response: ChatResponse = self.post("chat/completions", &request).await?;
        let answers: Vec<String> = response
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect();

        if answers.is_empty() {
            return Err(OpenAiError::Unknown);
        }
        Ok(answers)
    }

    /// Runs a text completion for `prompt` and returns the text of every choice.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<Vec<String>, OpenAiError> {
        let request = CompletionRequest {
            model,
            prompt,
            max_tokens: self.max_tokens,
        };

        let response: CompletionResponse = self.post("completions", &request).await?;
        if response.choices.is_empty() {
            return Err(OpenAiError::Unknown);
        }
        Ok(response.choices.into_iter().map(|c| c.text).collect())
    }

    /// POSTs `body` to `endpoint`, surfacing `{"error": {"message": ...}}` bodies as refusals.
    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, OpenAiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(url = %url, "Sending OpenAI request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text)?;

        match &value["error"]["message"] {
            Value::String(message) => {
                error!(%status, "OpenAI request refused: {}", message);
                Err(OpenAiError::Refusal(message.to_owned()))
            }
            _ => Ok(serde_json::from_value(value)?),
        }
    }
}
