use std::sync::Arc;

use crate::ai_agent::chart::executor::{ChartArtifact, ChartExecutor};
use crate::ai_agent::chart::sanitize::sanitize_chart_code;
use crate::ai_agent::data::models::SegmentTable;
use crate::ai_agent::llm::model_provider::{ChatMessage, LLMChatter, LLMModelConfig};
use crate::ai_agent::prompts::formatter::render_table;
use crate::ai_agent::prompts::templates::CHART_SCRIPT_GUIDE;
use crate::app::errors::{DashboardError, DashboardResult};

pub fn chart_title(ticker: &str) -> String {
  format!("Revenue & Cost Segments {}", ticker)
}

/// Prompt asking for a chart script over the rendered dataset.
pub fn chart_prompt(ticker: &str, table: &SegmentTable) -> DashboardResult<String> {
  let data: String = render_table(table)?;
  Ok(format!(
    "Anda adalah seorang programmer yang ahli dalam visualisasi data.
Berikut adalah data segmen pendapatan dan biaya perusahaan:
{data}

Buat sebuah skrip grafik untuk menghasilkan bar plot yang rapih.
Instruksi:
- Sumbu X adalah 'source' (segmen pendapatan/biaya)
- Sumbu Y adalah 'value' dalam triliun IDR (gunakan pembagian value / 1e12)
- Gunakan warna berbeda untuk membedakan setiap segmen
- Putar label X agar lebih terbaca
- Beri judul '{title}'

Tulis HANYA kode skrip grafik yang bisa langsung dieksekusi. Jangan sertakan penjelasan apapun.
Pastikan untuk taruh hasilnya dalam variabel bernama 'fig' dan pastikan untuk meng-import semua modul yang diperlukan.

{guide}
",
    data = data,
    title = chart_title(ticker),
    guide = CHART_SCRIPT_GUIDE,
  ))
}

/// Asks the model for chart code, strips its wrapper text and runs it in the script sandbox.
pub struct ChartAgent {
  chatter: Arc<dyn LLMChatter>,
  model: LLMModelConfig,
  executor: ChartExecutor,
}

impl ChartAgent {
  pub fn new(chatter: Arc<dyn LLMChatter>, model: LLMModelConfig, executor: ChartExecutor) -> Self {
    ChartAgent { chatter, model, executor }
  }

  pub async fn synthesize(&self, ticker: &str, table: &SegmentTable) -> DashboardResult<String> {
    let prompt: String = chart_prompt(ticker, table)?;
    let messages = vec![ChatMessage::user(&prompt)];

    let response = self.chatter.chat(messages, &self.model).await.map_err(|e| {
      log::error!("Chart synthesis for {} failed: {:#}", ticker, e);
      DashboardError::Synthesis(format!("{:#}", e))
    })?;
    Ok(response.content)
  }

  pub async fn visualize(&self, ticker: &str, table: &SegmentTable) -> DashboardResult<ChartArtifact> {
    log::info!("Synthesizing chart for {}", ticker);
    let raw: String = self.synthesize(ticker, table).await?;
    let code: String = sanitize_chart_code(&raw)?;
    log::debug!("Sanitized chart script for {}:\n{}", ticker, code);

    self.executor.execute(code, table).await
  }
}
