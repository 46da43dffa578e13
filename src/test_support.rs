use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::ai_agent::data::models::{RevenueSegment, SegmentTable, SegmentsResponse};
use crate::ai_agent::llm::model_provider::{ChatMessage, LLMChatter, LLMModelConfig, LLMResponse};
use crate::app::config::Config;

pub const STUB_SECTORS_KEY: &str = "s-key";
pub const STUB_GROQ_KEY: &str = "g-key";

pub fn stub_config(base: &str) -> Config {
  Config {
    sectors_api_key: STUB_SECTORS_KEY.to_string(),
    groq_api_key: STUB_GROQ_KEY.to_string(),
    sectors_base_url: format!("{}/v1", base),
    groq_base_url: format!("{}/openai/v1", base),
    model_name: "stub-model".to_string(),
    temperature: 0.55,
    max_tokens: 256,
    http_timeout: Duration::from_secs(5),
    chart_timeout: Duration::from_millis(2000),
    bind_addr: "127.0.0.1:0".to_string(),
  }
}

pub fn bbca_table() -> SegmentTable {
  SegmentTable::from_response(SegmentsResponse {
    symbol: "BBCA".to_string(),
    financial_year: 2023,
    revenue_breakdown: vec![
      RevenueSegment { source: "Retail Banking".to_string(), value: 5e12 },
      RevenueSegment { source: "Corporate Banking".to_string(), value: 3e12 },
    ],
  })
}

/// Starts a stub of the Sectors and Groq APIs on an ephemeral port and returns its base URL.
/// Must be called from inside an actix runtime.
pub fn spawn_stub_server() -> String {
  let server = HttpServer::new(|| {
    App::new()
      .route("/v1/company/get-segments/{ticker}/", web::get().to(segments))
      .route("/v1/echo/", web::get().to(echo))
      .route("/openai/v1/chat/completions", web::post().to(chat_completions))
  })
  .workers(1)
  .disable_signals()
  .shutdown_timeout(0)
  .bind(("127.0.0.1", 0))
  .expect("stub server should bind");

  let addr = server.addrs()[0];
  actix_web::rt::spawn(server.run());
  format!("http://{}", addr)
}

fn authorized(req: &HttpRequest, expected: &str) -> bool {
  req.headers().get("Authorization").and_then(|v| v.to_str().ok()) == Some(expected)
}

async fn segments(req: HttpRequest, ticker: web::Path<String>) -> HttpResponse {
  if !authorized(&req, STUB_SECTORS_KEY) {
    return HttpResponse::Unauthorized().json(json!({"detail": "invalid key"}));
  }

  match ticker.as_str() {
    "BBCA" => HttpResponse::Ok().json(json!({
      "symbol": "BBCA",
      "financial_year": 2023,
      "revenue_breakdown": [
        {"source": "Retail Banking", "value": 5e12},
        {"source": "Corporate Banking", "value": 3e12}
      ]
    })),
    "NOKEY" => HttpResponse::Ok().json(json!({"symbol": "NOKEY", "financial_year": 2023})),
    "BADJSON" => HttpResponse::Ok().content_type("application/json").body("{not json"),
    _ => HttpResponse::NotFound().json(json!({"detail": "unknown ticker"})),
  }
}

async fn echo(req: HttpRequest) -> HttpResponse {
  HttpResponse::Ok().json(json!({"query": req.query_string()}))
}

async fn chat_completions(req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
  if !authorized(&req, &format!("Bearer {}", STUB_GROQ_KEY)) {
    return HttpResponse::Unauthorized().json(json!({"error": {"message": "invalid api key"}}));
  }
  if body["model"] == "broken-model" {
    return HttpResponse::InternalServerError().json(json!({"error": {"message": "model crashed"}}));
  }
  if body["model"] == "silent-model" {
    return HttpResponse::Ok().json(json!({"choices": []}));
  }

  let prompt = body["messages"].as_array()
    .and_then(|m| m.last())
    .and_then(|m| m["content"].as_str())
    .unwrap_or_default();
  HttpResponse::Ok().json(json!({
    "choices": [{"message": {"role": "assistant", "content": format!("echo: {}", prompt)}}]
  }))
}

/// Replies with canned responses in order and records every prompt it receives.
pub struct ScriptedChatter {
  replies: Mutex<VecDeque<anyhow::Result<String>>>,
  prompts: Mutex<Vec<String>>,
}

impl ScriptedChatter {
  pub fn new(replies: Vec<anyhow::Result<String>>) -> Self {
    ScriptedChatter { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) }
  }

  pub fn prompts(&self) -> Vec<String> {
    self.prompts.lock().unwrap().clone()
  }
}

#[async_trait]
impl LLMChatter for ScriptedChatter {
  async fn chat(&self, messages: Vec<ChatMessage>, _config: &LLMModelConfig) -> anyhow::Result<LLMResponse> {
    let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
    self.prompts.lock().unwrap().push(prompt);

    let reply = self.replies.lock().unwrap().pop_front()
      .unwrap_or_else(|| Err(anyhow!("no scripted reply left")));
    reply.map(|content| LLMResponse { content })
  }
}
