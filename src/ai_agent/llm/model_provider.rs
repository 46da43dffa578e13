use serde::{Serialize, Deserialize};
use anyhow::Result;
use async_trait::async_trait;

use crate::app::config::Config;

/// Model settings, fixed once at startup and shared by every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMModelConfig {
  pub model_name: String,
  pub base_url: String,
  pub temperature: Option<f32>,
  pub max_tokens: Option<u32>,
  pub top_p: Option<f32>,
}

impl LLMModelConfig {
  pub fn from_config(config: &Config) -> Self {
    LLMModelConfig {
      model_name: config.model_name.clone(),
      base_url: config.groq_base_url.clone(),
      temperature: Some(config.temperature),
      max_tokens: Some(config.max_tokens),
      top_p: None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: String, // "user" or "assistant"
  pub content: String,
}

impl ChatMessage {
  pub fn user(content: &str) -> Self {
    ChatMessage { role: "user".to_string(), content: content.to_string() }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
  pub content: String,
}

#[async_trait]
pub trait LLMChatter : Send + Sync {
  async fn chat(&self, messages: Vec<ChatMessage>, config: &LLMModelConfig) -> Result<LLMResponse>;
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use serde_json::json;

  #[test]
  fn prompts_go_out_as_single_user_turns() {
    let message = ChatMessage::user("Ringkas data ini");
    assert_eq!(serde_json::to_value(&message).unwrap(), json!({"role": "user", "content": "Ringkas data ini"}));
  }
}
