use std::sync::Arc;

use crate::app::errors::{DashboardError, DashboardResult};
use crate::app::services::dashboard_service::DashboardService;
use crate::app::services::report::DashboardReport;
use crate::app::views::page::{dashboard_page, error_page};

pub struct DashboardController {
  service: Arc<DashboardService>,
}

impl DashboardController {
  pub fn new(service: Arc<DashboardService>) -> Self {
    DashboardController { service }
  }

  pub async fn report(&self, ticker: &str) -> DashboardResult<DashboardReport> {
    match self.service.run(ticker).await {
      Ok(report) => Ok(report),
      Err(e) => {
        log::error!("Dashboard run for {:?} failed: {}", ticker, e);
        Err(e)
      }
    }
  }

  /// Renders the dashboard page; pipeline-level faults become an error page
  /// returned together with the error so the route can pick a status code.
  pub async fn page(&self, ticker: &str) -> Result<String, (DashboardError, String)> {
    match self.report(ticker).await {
      Ok(report) => Ok(dashboard_page(&report)),
      Err(e) => {
        let page = error_page(ticker, e.kind(), &e.to_string());
        Err((e, page))
      }
    }
  }
}
