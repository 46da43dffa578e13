use chrono::Utc;
use tokio::sync::Semaphore;

use crate::ai_agent::agents::chart_agent::ChartAgent;
use crate::ai_agent::agents::insight_agent::{InsightAgent, InsightKind};
use crate::ai_agent::chart::executor::ChartExecutor;
use crate::ai_agent::data::models::SegmentTable;
use crate::ai_agent::llm::model_provider::LLMModelConfig;
use crate::ai_agent::llm::models::get_model;
use crate::ai_agent::tools::api::{normalize_ticker, API};
use crate::app::config::Config;
use crate::app::errors::{DashboardError, DashboardResult};
use crate::app::services::report::{DashboardReport, SectionOutcome};

pub struct DashboardService {
  api: API,
  insights: InsightAgent,
  charts: ChartAgent,
  guard: Semaphore,
}

impl DashboardService {
  pub fn new(api: API, insights: InsightAgent, charts: ChartAgent) -> Self {
    DashboardService { api, insights, charts, guard: Semaphore::new(1) }
  }

  pub fn from_config(config: &Config) -> DashboardResult<Self> {
    let api: API = API::new(config.clone())?;
    let chatter = get_model(config)?;
    let model: LLMModelConfig = LLMModelConfig::from_config(config);

    let insights = InsightAgent::new(chatter.clone(), model.clone());
    let charts = ChartAgent::new(chatter, model, ChartExecutor::new(config.chart_timeout));
    Ok(DashboardService::new(api, insights, charts))
  }

  /// Runs fetch, summary, chart, interpretation and risk strictly in that order.
  /// Only one run may be in flight; a second caller gets `Busy` instead of waiting.
  pub async fn run(&self, ticker: &str) -> DashboardResult<DashboardReport> {
    let ticker: String = normalize_ticker(ticker)?;
    let _permit = self.guard.try_acquire().map_err(|_| {
      log::warn!("Rejected dashboard run for {}: another run is in flight", ticker);
      DashboardError::Busy
    })?;

    let table: SegmentTable = match self.api.get_segments(&ticker).await {
      Ok(table) => table,
      Err(e) => {
        log::error!("Fetching segments for {} failed, skipping all sections: {}", ticker, e);
        return Ok(DashboardReport::fetch_failed(&ticker, &e));
      }
    };

    let summary = self.section(InsightKind::Summary, &table).await;
    let chart = SectionOutcome::from(self.charts.visualize(&ticker, &table).await);
    if let SectionOutcome::Failed { kind, message } = &chart {
      log::warn!("Chart section for {} failed with {}: {}", ticker, kind, message);
    }
    let interpretation = self.section(InsightKind::Interpretation, &table).await;
    let risk = self.section(InsightKind::Risk, &table).await;

    let report = DashboardReport {
      ticker: ticker.clone(),
      symbol: Some(table.symbol().to_string()),
      financial_year: Some(table.financial_year()),
      generated_at: Utc::now(),
      segments: table.records().to_vec(),
      summary,
      chart,
      interpretation,
      risk,
    };

    log::info!("Dashboard for {} finished with {} failed section(s)", ticker, report.failed_sections());
    Ok(report)
  }

  async fn section(&self, kind: InsightKind, table: &SegmentTable) -> SectionOutcome<String> {
    let outcome = SectionOutcome::from(self.insights.insight(kind, table).await);
    if let SectionOutcome::Failed { kind: error, message } = &outcome {
      log::warn!("{} section for {} failed with {}: {}", kind.as_str(), table.symbol(), error, message);
    }
    outcome
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{spawn_stub_server, stub_config, ScriptedChatter};
  use anyhow::anyhow;
  use pretty_assertions::assert_eq;
  use std::sync::Arc;
  use std::time::Duration;

  const GOOD_CHART: &str = "```python\nimport chart\nimport data\nfig = chart.bar(x=data.column('source'), y=data.column('value') / 1e12, title='Revenue & Cost Segments BBCA', rotate_labels=45)\n```";

  fn service(base: &str, replies: Vec<anyhow::Result<String>>) -> (Arc<ScriptedChatter>, DashboardService) {
    let config = stub_config(base);
    let chatter = Arc::new(ScriptedChatter::new(replies));
    let model = LLMModelConfig::from_config(&config);
    let insights = InsightAgent::new(chatter.clone(), model.clone());
    let charts = ChartAgent::new(chatter.clone(), model, ChartExecutor::new(Duration::from_secs(5)));
    (chatter, DashboardService::new(API::new(config).unwrap(), insights, charts))
  }

  #[actix_web::test]
  async fn full_run_renders_every_section_in_order() {
    let base = spawn_stub_server();
    let (chatter, service) = service(&base, vec![
      Ok("ringkasan".to_string()),
      Ok(GOOD_CHART.to_string()),
      Ok("interpretasi".to_string()),
      Ok("risiko".to_string()),
    ]);

    let report = service.run(" bbca ").await.unwrap();
    assert_eq!(report.ticker, "BBCA");
    assert_eq!(report.symbol.as_deref(), Some("BBCA"));
    assert_eq!(report.segments.len(), 2);
    assert_eq!(report.summary.rendered().map(String::as_str), Some("ringkasan"));
    assert_eq!(report.chart.rendered().unwrap().figure.title, "Revenue & Cost Segments BBCA");
    assert_eq!(report.interpretation.rendered().map(String::as_str), Some("interpretasi"));
    assert_eq!(report.risk.rendered().map(String::as_str), Some("risiko"));
    assert_eq!(report.failed_sections(), 0);

    let prompts = chatter.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[0].starts_with("Anda adalah analis keuangan."));
    assert!(prompts[1].contains("'fig'"));
    assert!(prompts[3].contains("analis risiko"));
  }

  #[actix_web::test]
  async fn missing_breakdown_fails_all_sections_without_model_calls() {
    let base = spawn_stub_server();
    let (chatter, service) = service(&base, vec![]);

    let report = service.run("NOKEY").await.unwrap();
    assert_eq!(report.failed_sections(), 4);
    match &report.summary {
      SectionOutcome::Failed { kind, message } => {
        assert_eq!(kind, "ParseError");
        assert!(message.contains("revenue_breakdown"));
      }
      other => panic!("expected failure, got {:?}", other),
    }
    assert!(chatter.prompts().is_empty());
  }

  #[actix_web::test]
  async fn chart_without_fig_leaves_other_sections_intact() {
    let base = spawn_stub_server();
    let (_, service) = service(&base, vec![
      Ok("ringkasan".to_string()),
      Ok("import chart\nplot = chart.bar(x=['a'], y=[1])".to_string()),
      Ok("interpretasi".to_string()),
      Err(anyhow!("rate limited")),
    ]);

    let report = service.run("BBCA").await.unwrap();
    assert!(report.summary.is_rendered());
    assert!(report.interpretation.is_rendered());
    assert!(matches!(&report.chart, SectionOutcome::Failed { kind, .. } if kind == "MissingArtifactError"));
    assert!(matches!(&report.risk, SectionOutcome::Failed { kind, .. } if kind == "InferenceError"));
    assert_eq!(report.failed_sections(), 2);
  }

  #[actix_web::test]
  async fn overlapping_runs_are_rejected() {
    let base = spawn_stub_server();
    let (chatter, service) = service(&base, vec![]);

    let held = service.guard.try_acquire().unwrap();
    assert!(matches!(service.run("BBCA").await, Err(DashboardError::Busy)));
    drop(held);

    assert!(chatter.prompts().is_empty());
  }

  #[actix_web::test]
  async fn empty_ticker_is_rejected_before_fetching() {
    let (_, service) = service("http://127.0.0.1:9", vec![]);
    assert!(matches!(service.run("   ").await, Err(DashboardError::InvalidRequest(_))));
  }
}
