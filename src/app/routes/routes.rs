use actix_web::{web, HttpResponse, Responder, ResponseError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app::controller::dashboard_controller::DashboardController;
use crate::app::errors::DashboardError;
use crate::app::views::page::index_page;

#[derive(Deserialize, Serialize)]
pub struct DashboardQuery {
  ticker: Option<String>,
}

pub struct Routes;

impl Routes {

  pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(Self::index)));
    cfg.service(web::resource("/health").route(web::get().to(Self::health)));
    cfg.service(web::resource("/dashboard").route(web::get().to(Self::dashboard)));
    cfg.service(web::resource("/api/dashboard/{ticker}").route(web::get().to(Self::dashboard_json)));
  }

  async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
      "status": "ok",
      "info": "Revenue & Cost Segments Dashboard",
      "code": 200,
    }))
  }

  async fn index() -> impl Responder {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(index_page())
  }

  async fn dashboard(controller: web::Data<Arc<DashboardController>>, query: web::Query<DashboardQuery>) -> HttpResponse {
    let ticker: &str = query.ticker.as_deref().unwrap_or_default();

    match controller.page(ticker).await {
      Ok(page) => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(page),
      Err((e, page)) => HttpResponse::build(e.status_code()).content_type("text/html; charset=utf-8").body(page),
    }
  }

  async fn dashboard_json(controller: web::Data<Arc<DashboardController>>, ticker: web::Path<String>) -> Result<HttpResponse, DashboardError> {
    let report = controller.report(&ticker).await?;
    Ok(HttpResponse::Ok().json(report))
  }
}
