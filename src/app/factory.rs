use actix_web::{web, App};
use std::sync::Arc;

use crate::app::config::Config;
use crate::app::errors::DashboardResult;
use crate::app::routes::routes::Routes;

use super::controller::dashboard_controller::DashboardController;
use super::services::dashboard_service::DashboardService;

/// Built once per process and cloned into every worker, so all workers share one in-flight guard.
#[derive(Clone)]
pub struct AppState {
  pub dashboard_controller: Arc<DashboardController>
}

impl AppState {
  pub fn new(app_config: &Config) -> DashboardResult<Self> {
    let dashboard_service: Arc<DashboardService> = Arc::new(DashboardService::from_config(app_config)?);
    let dashboard_controller: Arc<DashboardController> = Arc::new(DashboardController::new(dashboard_service));
    Ok(AppState { dashboard_controller })
  }
}

pub struct CreateApp {
  app_state: AppState,
}

impl CreateApp {
  pub fn new(app_state: AppState) -> Self {
    CreateApp { app_state }
  }

  pub fn build_app(&self,) -> App<impl actix_web::dev::ServiceFactory<actix_web::dev::ServiceRequest,Config = (),Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,Error = actix_web::Error,InitError = (),>,> {
    App::new()
    .app_data(web::Data::new(self.app_state.dashboard_controller.clone()))
    .configure(Routes::configure)
  }
}
