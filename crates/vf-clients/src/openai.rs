//! OpenAI chat completions client used for code generation.
//!
//! Reference images are inlined as base64 JPEG data URLs next to the text
//! prompt. Images that cannot be read, or are empty placeholders, are left
//! out of the request.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use vf_core::config::CodegenConfig;
use vf_core::{Error, Result};
use vf_pipeline::CodeGenerator;

use crate::http::{client, network, read_body};

pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(&CodegenConfig {
            api_key: Some(api_key.into()),
            ..CodegenConfig::default()
        })
    }

    pub fn from_config(config: &CodegenConfig) -> Self {
        Self {
            http: client(config.request_timeout()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Set custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn content(&self, prompt: &str, images: &[PathBuf]) -> MessageContent {
        let mut parts = Vec::new();
        for path in images {
            if let Some(url) = data_url(path).await {
                parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrl { url },
                });
            }
        }

        if parts.is_empty() {
            return MessageContent::Text(prompt.to_string());
        }
        parts.insert(
            0,
            ContentPart::Text {
                text: prompt.to_string(),
            },
        );
        MessageContent::Parts(parts)
    }
}

/// Read an image into a `data:image/jpeg;base64,...` URL.
async fn data_url(path: &Path) -> Option<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => {
            tracing::debug!(image = %path.display(), "skipping empty image");
            None
        }
        Ok(bytes) => Some(format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes))),
        Err(e) => {
            tracing::warn!(image = %path.display(), "skipping unreadable image: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl CodeGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str, images: &[PathBuf]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Validation("code generation API key is not configured".into()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: self.content(prompt, images).await,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        tracing::debug!(model = %self.model, images = images.len(), "chat completion request");

        let resp = self
            .http
            .post(self.chat_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(network)?;

        let body = read_body(resp).await?;
        let parsed: ChatResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Internal("chat completion returned no content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_only_content_is_a_string() {
        let json = serde_json::to_value(MessageContent::Text("hi".into())).unwrap();
        assert_eq!(json, serde_json::json!("hi"));
    }

    #[test]
    fn parts_are_tagged() {
        let content = MessageContent::Parts(vec![
            ContentPart::Text { text: "look".into() },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/jpeg;base64,AAAA".into(),
                },
            },
        ]);
        let json = serde_json::to_value(content).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"type": "text", "text": "look"},
                {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AAAA"}}
            ])
        );
    }

    #[tokio::test]
    async fn empty_and_missing_images_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("placeholder.jpg");
        std::fs::write(&empty, b"").unwrap();
        let real = dir.path().join("frame_000.jpg");
        std::fs::write(&real, [0xFF, 0xD8, 0xFF]).unwrap();

        assert_eq!(data_url(&empty).await, None);
        assert_eq!(data_url(&dir.path().join("nope.jpg")).await, None);
        assert_eq!(
            data_url(&real).await.as_deref(),
            Some("data:image/jpeg;base64,/9j/")
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let client = OpenAiClient::from_config(&CodegenConfig::default());
        let err = client.generate("hi", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
