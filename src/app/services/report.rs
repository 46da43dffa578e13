use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ai_agent::chart::executor::ChartArtifact;
use crate::ai_agent::data::models::SegmentRecord;
use crate::app::errors::{DashboardError, DashboardResult};

/// Result of one dashboard section. A failed section carries its error label and message
/// so the page can show an indicator while sibling sections still render.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "body", rename_all = "snake_case")]
pub enum SectionOutcome<T> {
  Rendered(T),
  Failed { kind: String, message: String },
}

impl<T> SectionOutcome<T> {
  pub fn failed(error: &DashboardError) -> Self {
    SectionOutcome::Failed { kind: error.kind().to_string(), message: error.to_string() }
  }

  pub fn is_rendered(&self) -> bool {
    matches!(self, SectionOutcome::Rendered(_))
  }

  pub fn rendered(&self) -> Option<&T> {
    match self {
      SectionOutcome::Rendered(value) => Some(value),
      SectionOutcome::Failed { .. } => None,
    }
  }
}

impl<T> From<DashboardResult<T>> for SectionOutcome<T> {
  fn from(result: DashboardResult<T>) -> Self {
    match result {
      Ok(value) => SectionOutcome::Rendered(value),
      Err(error) => SectionOutcome::failed(&error),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
  pub ticker: String,
  pub symbol: Option<String>,
  pub financial_year: Option<i32>,
  pub generated_at: DateTime<Utc>,
  pub segments: Vec<SegmentRecord>,
  pub summary: SectionOutcome<String>,
  pub chart: SectionOutcome<ChartArtifact>,
  pub interpretation: SectionOutcome<String>,
  pub risk: SectionOutcome<String>,
}

impl DashboardReport {
  /// Report for a run whose data fetch failed: every section carries the fetch error.
  pub fn fetch_failed(ticker: &str, error: &DashboardError) -> Self {
    DashboardReport {
      ticker: ticker.to_string(),
      symbol: None,
      financial_year: None,
      generated_at: Utc::now(),
      segments: Vec::new(),
      summary: SectionOutcome::failed(error),
      chart: SectionOutcome::failed(error),
      interpretation: SectionOutcome::failed(error),
      risk: SectionOutcome::failed(error),
    }
  }

  pub fn failed_sections(&self) -> usize {
    [
      self.summary.is_rendered(),
      self.chart.is_rendered(),
      self.interpretation.is_rendered(),
      self.risk.is_rendered(),
    ].iter().filter(|rendered| !**rendered).count()
  }
}
