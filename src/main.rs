use actix_web::HttpServer;
use anyhow::Context;
use std::env;

use crate::app::config::Config;
use crate::app::factory::{AppState, CreateApp};

mod app;
mod ai_agent;
#[cfg(test)]
mod test_support;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  if env::var_os("RUST_LOG").is_none() {
    env::set_var("RUST_LOG", "actix_web=info,info");
  }
  env_logger::init();

  let config: Config = Config::load().context("Invalid configuration")?;
  let app_state: AppState = AppState::new(&config).context("Failed to initialize dashboard")?;

  log::info!("Serving dashboard on http://{} with model {}", config.bind_addr, config.model_name);

  let server_builder = HttpServer::new(move || {
    let factory: CreateApp = CreateApp::new(app_state.clone());
    factory.build_app().wrap(actix_web::middleware::Logger::default())
  });

  let server = server_builder.bind(config.bind_addr.as_str())
    .with_context(|| format!("Cannot bind {}", config.bind_addr))?;

  server.run().await?;

  Ok(())
}
