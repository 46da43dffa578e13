use crate::ai_agent::llm::model_provider::{ChatMessage, LLMChatter, LLMModelConfig, LLMResponse};

use reqwest::{header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE}, Client, Response};
use serde::{Deserialize, Serialize};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::time::Duration;


#[derive(Serialize, Debug)]
struct GroqChatRequest {
  messages: Vec<ChatMessage>,
  model: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<f32>,
  #[serde(rename = "max_tokens")]
  #[serde(skip_serializing_if = "Option::is_none")]
  max_completion_tokens: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  top_p: Option<f32>,
  stream: bool,
}

#[derive(Deserialize, Debug)]
struct GroqResponseMessage {
  content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GroqChoice {
  message: GroqResponseMessage,
}

#[derive(Deserialize, Debug)]
struct GroqChatResponse {
  choices: Vec<GroqChoice>,
}

/// OpenAI-compatible chat completions client for Groq.
pub struct GroqProvider {
  api_key: String,
  client: Client,
}

impl GroqProvider {

  pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context("Failed to create Groq HTTP client")?;
    Ok(GroqProvider { api_key: api_key.to_string(), client })
  }

  fn headers(&self) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
      .context("GROQ_API_KEY contains characters not allowed in a header")?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
  }
}

#[async_trait]
impl LLMChatter for GroqProvider {
  async fn chat(&self, messages: Vec<ChatMessage>, config: &LLMModelConfig) -> Result<LLMResponse> {
    let request: GroqChatRequest = GroqChatRequest {
      model: config.model_name.clone(),
      messages,
      temperature: config.temperature,
      max_completion_tokens: config.max_tokens,
      top_p: config.top_p,
      stream: false,
    };

    let url: String = format!("{}/chat/completions", config.base_url);
    let response: Response = self.client.post(&url).headers(self.headers()?).json(&request).send().await
      .map_err(|e| {
        if e.is_timeout() {
          anyhow!("Groq request timed out: {}", e)
        } else {
          anyhow!("Groq request failed: {}", e)
        }
      })?;

    let status = response.status();
    if !status.is_success() {
      let detail: String = response.text().await.unwrap_or_default();
      log::error!("Error getting response from Groq: {}", status);
      return Err(anyhow!("Groq returned {}: {}", status, detail.chars().take(200).collect::<String>()));
    }

    let groq_response: GroqChatResponse = response.json().await.context("Groq response was not a chat completion")?;
    let first: GroqChoice = groq_response.choices.into_iter().next().ok_or_else(|| anyhow!("No response choices received from Groq"))?;
    let content: String = first.message.content.unwrap_or_default();

    Ok(LLMResponse { content })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{spawn_stub_server, stub_config};
  use pretty_assertions::assert_eq;

  #[actix_web::test]
  async fn returns_first_choice_content() {
    let base = spawn_stub_server();
    let config = stub_config(&base);
    let provider = GroqProvider::new(&config.groq_api_key, config.http_timeout).unwrap();

    let reply = provider.chat(vec![ChatMessage::user("hello")], &LLMModelConfig::from_config(&config)).await.unwrap();
    assert_eq!(reply.content, "echo: hello");
  }

  #[actix_web::test]
  async fn rejected_credential_and_server_faults_are_errors() {
    let base = spawn_stub_server();
    let config = stub_config(&base);

    let provider = GroqProvider::new("wrong", config.http_timeout).unwrap();
    let err = provider.chat(vec![ChatMessage::user("hi")], &LLMModelConfig::from_config(&config)).await.unwrap_err();
    assert!(err.to_string().contains("401"));

    let provider = GroqProvider::new(&config.groq_api_key, config.http_timeout).unwrap();
    let mut model = LLMModelConfig::from_config(&config);
    model.model_name = "broken-model".to_string();
    assert!(provider.chat(vec![ChatMessage::user("hi")], &model).await.is_err());

    model.model_name = "silent-model".to_string();
    let err = provider.chat(vec![ChatMessage::user("hi")], &model).await.unwrap_err();
    assert!(err.to_string().contains("No response choices"));
  }
}
