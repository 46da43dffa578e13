use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::app::errors::{DashboardError, DashboardResult};

/// Headers for the Sectors API. The key is sent as-is, without a scheme.
#[derive(Debug, Clone)]
pub struct SectorsHeaderData {
  pub api_key: String,
}

impl SectorsHeaderData {
  pub fn new(api_key: String) -> Self {
    SectorsHeaderData { api_key }
  }

  pub fn to_header_map(&self) -> DashboardResult<HeaderMap> {
    let mut headers: HeaderMap = HeaderMap::new();

    let mut value = HeaderValue::from_str(&self.api_key)
      .map_err(|_| DashboardError::Config("SECTORS_API_KEY contains characters not allowed in a header".to_string()))?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    return Ok(headers);
  }
}
