use std::env;
use std::str::FromStr;
use std::time::Duration;

use log;

use crate::app::errors::{DashboardError, DashboardResult};

pub const DEFAULT_SECTORS_BASE_URL: &str = "https://api.sectors.app/v1";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Clone, Debug)]
pub struct Config {
  pub sectors_api_key: String,
  pub groq_api_key: String,
  pub sectors_base_url: String,
  pub groq_base_url: String,
  pub model_name: String,
  pub temperature: f32,
  pub max_tokens: u32,
  pub http_timeout: Duration,
  pub chart_timeout: Duration,
  pub bind_addr: String,
}

impl Config {

  /// Reads the process environment once. Both credentials are required.
  pub fn load() -> DashboardResult<Self> {
    match dotenv::dotenv() {
      Ok(_) => log::info!("Loaded .env file"),
      Err(_) => log::warn!("No .env file found, reading configuration from the environment only"),
    }

    Self::from_lookup(|key| env::var(key).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> DashboardResult<Self> where F: Fn(&str) -> Option<String> {
    let sectors_api_key: String = required(&lookup, "SECTORS_API_KEY")?;
    let groq_api_key: String = required(&lookup, "GROQ_API_KEY")?;

    let sectors_base_url: String = optional(&lookup, "SECTORS_BASE_URL", DEFAULT_SECTORS_BASE_URL.to_string())?;
    let groq_base_url: String = optional(&lookup, "GROQ_BASE_URL", DEFAULT_GROQ_BASE_URL.to_string())?;
    let model_name: String = optional(&lookup, "LLM_MODEL", DEFAULT_MODEL.to_string())?;
    let temperature: f32 = optional(&lookup, "LLM_TEMPERATURE", 0.55)?;
    let max_tokens: u32 = optional(&lookup, "LLM_MAX_TOKENS", 1024)?;
    let http_timeout_secs: u64 = optional(&lookup, "HTTP_TIMEOUT_SECS", 30)?;
    let chart_timeout_ms: u64 = optional(&lookup, "CHART_TIMEOUT_MS", 2000)?;
    let bind_addr: String = optional(&lookup, "BIND_ADDR", "127.0.0.1:8080".to_string())?;

    if !(0.0..=2.0).contains(&temperature) {
      return Err(DashboardError::Config(format!("LLM_TEMPERATURE must be between 0 and 2, got {}", temperature)));
    }

    return Ok(Config {
      sectors_api_key,
      groq_api_key,
      sectors_base_url: sectors_base_url.trim_end_matches('/').to_string(),
      groq_base_url: groq_base_url.trim_end_matches('/').to_string(),
      model_name,
      temperature,
      max_tokens,
      http_timeout: Duration::from_secs(http_timeout_secs),
      chart_timeout: Duration::from_millis(chart_timeout_ms),
      bind_addr,
    });
  }
}

fn required<F>(lookup: &F, key: &str) -> DashboardResult<String> where F: Fn(&str) -> Option<String> {
  match lookup(key) {
    Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
    _ => Err(DashboardError::Config(format!("{} is not set; add it to the environment or .env", key))),
  }
}

fn optional<F, T>(lookup: &F, key: &str, default: T) -> DashboardResult<T> where F: Fn(&str) -> Option<String>, T: FromStr, T::Err: std::fmt::Display {
  match lookup(key) {
    Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
      DashboardError::Config(format!("{} has an invalid value {:?}: {}", key, raw, e))
    }),
    _ => Ok(default),
  }
}
