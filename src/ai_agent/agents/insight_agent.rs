use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai_agent::data::models::SegmentTable;
use crate::ai_agent::llm::model_provider::{ChatMessage, LLMChatter, LLMModelConfig, LLMResponse};
use crate::ai_agent::prompts::formatter::PromptTemplate;
use crate::ai_agent::prompts::templates::{INTERPRETATION_PROMPT, RISK_PROMPT, SUMMARY_PROMPT};
use crate::app::errors::{DashboardError, DashboardResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
  Summary,
  Interpretation,
  Risk,
}

impl InsightKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      InsightKind::Summary => "summary",
      InsightKind::Interpretation => "interpretation",
      InsightKind::Risk => "risk",
    }
  }

  pub fn template(&self) -> &'static str {
    match self {
      InsightKind::Summary => SUMMARY_PROMPT,
      InsightKind::Interpretation => INTERPRETATION_PROMPT,
      InsightKind::Risk => RISK_PROMPT,
    }
  }

  /// Heading of the dashboard section holding this insight.
  pub fn title(&self) -> &'static str {
    match self {
      InsightKind::Summary => "Ringkasan Keuangan",
      InsightKind::Interpretation => "Interpretasi Tren",
      InsightKind::Risk => "Analisis Risiko",
    }
  }
}

/// Sends formatted prompts to the language model and returns its text verbatim.
pub struct InsightAgent {
  chatter: Arc<dyn LLMChatter>,
  model: LLMModelConfig,
}

impl InsightAgent {
  pub fn new(chatter: Arc<dyn LLMChatter>, model: LLMModelConfig) -> Self {
    InsightAgent { chatter, model }
  }

  pub async fn generate(&self, prompt: &str) -> DashboardResult<String> {
    if prompt.trim().is_empty() {
      return Err(DashboardError::Inference("refusing to send an empty prompt".to_string()));
    }

    let messages: Vec<ChatMessage> = vec![ChatMessage::user(prompt)];
    let response: LLMResponse = self.chatter.chat(messages, &self.model).await.map_err(|e| {
      log::error!("Inference call to {} failed: {:#}", self.model.model_name, e);
      DashboardError::Inference(format!("{:#}", e))
    })?;

    Ok(response.content)
  }

  pub async fn insight(&self, kind: InsightKind, table: &SegmentTable) -> DashboardResult<String> {
    log::info!("Generating {} insight for {}", kind.as_str(), table.symbol());
    let prompt: String = PromptTemplate::new(kind.template())?.format(table)?;
    self.generate(&prompt).await
  }
}
