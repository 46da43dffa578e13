use crate::ai_agent::data::data::SectorsHeaderData;
use crate::ai_agent::data::models::{SegmentTable, SegmentsResponse};
use crate::app::config::Config;
use crate::app::errors::{DashboardError, DashboardResult};

use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde_json::Value;

/// Client for the Sectors financial data API.
pub struct API {
  client: Client,
  config: Config,
}

impl API {
  pub fn new(config: Config) -> DashboardResult<Self> {
    let client: Client = Client::builder()
      .timeout(config.http_timeout)
      .build()
      .map_err(|e| DashboardError::Config(format!("failed to build data API client: {}", e)))?;

    Ok(API { client, config })
  }

  /// Authenticated GET of `{base_url}/{endpoint}`, returning the JSON body.
  pub async fn fetch_data(&self, endpoint: &str, params: Option<&[(&str, &str)]>) -> DashboardResult<Value> {
    let endpoint: &str = endpoint.trim_start_matches('/');
    if endpoint.is_empty() {
      return Err(DashboardError::Http("endpoint must not be empty".to_string()));
    }

    let url: String = format!("{}/{}", self.config.sectors_base_url, endpoint);
    log::debug!("Sectors API URL: {}", url);
    let headers: HeaderMap = SectorsHeaderData::new(self.config.sectors_api_key.clone()).to_header_map()?;

    let mut request = self.client.get(&url).headers(headers);
    if let Some(params) = params {
      request = request.query(params);
    }

    let response: Response = request.send().await.map_err(|e| {
      log::error!("Request to {} failed: {}", url, e);
      DashboardError::Http(format!("GET {} failed: {}", url, e))
    })?;

    let status = response.status();
    if !status.is_success() {
      log::error!("Error getting data from {} with status code: {}", url, status);
      return Err(DashboardError::Http(format!("GET {} returned {}", url, status)));
    }

    let body: String = response.text().await
      .map_err(|e| DashboardError::Http(format!("reading body of {} failed: {}", url, e)))?;

    serde_json::from_str(&body).map_err(|e| {
      DashboardError::Parse(format!("response of {} is not valid JSON: {}", url, e))
    })
  }

  pub async fn get_segments(&self, ticker: &str) -> DashboardResult<SegmentTable> {
    let ticker: String = normalize_ticker(ticker)?;
    log::info!("Fetching revenue segments for {}", ticker);

    let payload: Value = self.fetch_data(&format!("company/get-segments/{}/", ticker), None).await?;
    let response: SegmentsResponse = parse_segments(payload)?;
    let table = SegmentTable::from_response(response);

    if table.is_empty() {
      log::warn!("{} reported an empty revenue breakdown", table.symbol());
    }
    log::info!("Fetched {} segments for {} ({})", table.len(), table.symbol(), table.financial_year());
    Ok(table)
  }
}

pub fn normalize_ticker(ticker: &str) -> DashboardResult<String> {
  let ticker: String = ticker.trim().to_uppercase();
  if ticker.is_empty() {
    return Err(DashboardError::InvalidRequest("ticker must not be empty".to_string()));
  }
  if !ticker.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-') {
    return Err(DashboardError::InvalidRequest(format!("ticker {:?} contains unsupported characters", ticker)));
  }
  Ok(ticker)
}

/// Checks the segments schema key by key so the error names what is missing.
pub fn parse_segments(payload: Value) -> DashboardResult<SegmentsResponse> {
  let object = payload.as_object()
    .ok_or_else(|| DashboardError::Parse("segments response is not a JSON object".to_string()))?;

  for key in ["symbol", "financial_year", "revenue_breakdown"] {
    if !object.contains_key(key) {
      return Err(DashboardError::Parse(format!("segments response lacks `{}`", key)));
    }
  }

  if !object["symbol"].is_string() {
    return Err(DashboardError::Parse("`symbol` must be a string".to_string()));
  }
  if !object["financial_year"].is_i64() && !object["financial_year"].is_u64() {
    return Err(DashboardError::Parse("`financial_year` must be an integer".to_string()));
  }

  let breakdown = object["revenue_breakdown"].as_array()
    .ok_or_else(|| DashboardError::Parse("`revenue_breakdown` must be an array".to_string()))?;

  for (index, row) in breakdown.iter().enumerate() {
    if !row.get("source").map_or(false, Value::is_string) {
      return Err(DashboardError::Parse(format!("revenue_breakdown[{}].source must be a string", index)));
    }
    if !row.get("value").map_or(false, Value::is_number) {
      return Err(DashboardError::Parse(format!("revenue_breakdown[{}].value must be a number", index)));
    }
  }

  serde_json::from_value(payload).map_err(|e| DashboardError::Parse(format!("segments response: {}", e)))
}
