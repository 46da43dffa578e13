use std::time::Duration;

use serde::Serialize;

use crate::ai_agent::chart::figure::Figure;
use crate::ai_agent::chart::render::render_svg;
use crate::ai_agent::chart::script::interpreter::{run_script, DataModule, Value};
use crate::ai_agent::data::models::SegmentTable;
use crate::app::errors::{DashboardError, DashboardResult};

/// Name the chart script must bind its figure to.
pub const ARTIFACT_NAME: &str = "fig";

#[derive(Debug, Clone, Serialize)]
pub struct ChartArtifact {
  pub figure: Figure,
  pub svg: String,
}

#[derive(Debug, Clone)]
pub struct ChartExecutor {
  timeout: Duration,
}

impl ChartExecutor {
  pub fn new(timeout: Duration) -> Self {
    ChartExecutor { timeout }
  }

  /// Runs sanitized chart code against the dataset and renders what it bound to `fig`.
  pub async fn execute(&self, code: String, table: &SegmentTable) -> DashboardResult<ChartArtifact> {
    let data = DataModule::new(table.to_dataframe()?, table.symbol(), table.financial_year());

    self.run_blocking(move || execute_blocking(&code, &data)).await
  }

  /// Runs `job` on the blocking pool, giving up once the time budget is spent.
  async fn run_blocking<T, F>(&self, job: F) -> DashboardResult<T>
  where
    F: FnOnce() -> DashboardResult<T> + Send + 'static,
    T: Send + 'static,
  {
    let task = tokio::task::spawn_blocking(job);

    match tokio::time::timeout(self.timeout, task).await {
      Ok(Ok(result)) => result,
      Ok(Err(join_error)) => {
        log::error!("Chart script task failed: {}", join_error);
        Err(DashboardError::Execution(format!("chart script crashed: {}", join_error)))
      }
      Err(_) => {
        log::warn!("Chart script exceeded {} ms", self.timeout.as_millis());
        Err(DashboardError::Execution(format!("chart script exceeded its time budget of {} ms", self.timeout.as_millis())))
      }
    }
  }
}

fn execute_blocking(code: &str, data: &DataModule) -> DashboardResult<ChartArtifact> {
  let mut scope = run_script(code, data)?;

  let figure: Figure = match scope.take(ARTIFACT_NAME) {
    Some(Value::Figure(figure)) => figure,
    Some(other) => {
      return Err(DashboardError::Execution(format!(
        "`{}` is bound to a {}, expected a chart from the chart module", ARTIFACT_NAME, other.type_name()
      )));
    }
    None => {
      log::warn!("Chart script finished without binding `{}`; bound names: {:?}", ARTIFACT_NAME, scope.names());
      return Err(DashboardError::MissingArtifact(ARTIFACT_NAME.to_string()));
    }
  };

  let svg: String = render_svg(&figure)?;
  Ok(ChartArtifact { figure, svg })
}
