use std::sync::Arc;

use crate::ai_agent::llm::groq::GroqProvider;
use crate::ai_agent::llm::model_provider::LLMChatter;
use crate::app::config::Config;
use crate::app::errors::{DashboardError, DashboardResult};

pub fn get_model(config: &Config) -> DashboardResult<Arc<dyn LLMChatter>> {
  log::info!("Initializing Groq client for model: {}", config.model_name);

  let client = GroqProvider::new(&config.groq_api_key, config.http_timeout)
    .map_err(|e| DashboardError::Config(format!("{:#}", e)))?;
  Ok(Arc::new(client))
}
