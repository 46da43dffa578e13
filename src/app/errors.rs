use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
  #[error("HTTP error: {0}")]
  Http(String),
  #[error("Parse error: {0}")]
  Parse(String),
  #[error("Template error: {0}")]
  Template(String),
  #[error("Inference error: {0}")]
  Inference(String),
  #[error("Chart synthesis error: {0}")]
  Synthesis(String),
  #[error("Sanitization error: {0}")]
  Sanitization(String),
  #[error("Execution error: {0}")]
  Execution(String),
  #[error("Missing artifact: generated chart script never bound `{0}`")]
  MissingArtifact(String),
  #[error("Configuration error: {0}")]
  Config(String),
  #[error("Invalid request: {0}")]
  InvalidRequest(String),
  #[error("A dashboard pipeline is already running, try again when it finishes")]
  Busy,
}

pub type DashboardResult<T> = Result<T, DashboardError>;

impl DashboardError {
  /// Short label shown next to the error indicator of a failed section.
  pub fn kind(&self) -> &'static str {
    match self {
      DashboardError::Http(_) => "HttpError",
      DashboardError::Parse(_) => "ParseError",
      DashboardError::Template(_) => "TemplateError",
      DashboardError::Inference(_) => "InferenceError",
      DashboardError::Synthesis(_) => "SynthesisError",
      DashboardError::Sanitization(_) => "SanitizationError",
      DashboardError::Execution(_) => "ExecutionError",
      DashboardError::MissingArtifact(_) => "MissingArtifactError",
      DashboardError::Config(_) => "ConfigError",
      DashboardError::InvalidRequest(_) => "InvalidRequest",
      DashboardError::Busy => "Busy",
    }
  }
}

impl From<reqwest::Error> for DashboardError {
  fn from(value: reqwest::Error) -> Self {
    if value.is_decode() {
      DashboardError::Parse(value.to_string())
    } else {
      DashboardError::Http(value.to_string())
    }
  }
}

impl From<polars::prelude::PolarsError> for DashboardError {
  fn from(value: polars::prelude::PolarsError) -> Self {
    DashboardError::Parse(format!("segment table: {}", value))
  }
}

impl ResponseError for DashboardError {
  fn status_code(&self) -> StatusCode {
    match self {
      DashboardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
      DashboardError::Busy => StatusCode::TOO_MANY_REQUESTS,
      DashboardError::Http(_) | DashboardError::Inference(_) => StatusCode::BAD_GATEWAY,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    HttpResponse::build(self.status_code()).json(serde_json::json!({
      "error": self.to_string(),
      "kind": self.kind(),
    }))
  }
}
