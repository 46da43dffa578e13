use crate::ai_agent::agents::insight_agent::InsightKind;
use crate::ai_agent::chart::executor::ChartArtifact;
use crate::app::services::report::{DashboardReport, SectionOutcome};

const PAGE_TITLE: &str = "Revenue & Cost Segments Dashboard";

const STYLE: &str = "body{font-family:sans-serif;max-width:1040px;margin:2rem auto;padding:0 1rem;color:#222}\
details{border:1px solid #ddd;border-radius:6px;margin:1rem 0;padding:.5rem 1rem}\
summary{font-weight:bold;cursor:pointer}\
pre{white-space:pre-wrap;font-family:inherit}\
.error{color:#b00020}\
table{border-collapse:collapse}td,th{padding:.25rem .75rem;border-bottom:1px solid #eee}td.num{text-align:right}";

pub fn escape_html(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      other => escaped.push(other),
    }
  }
  escaped
}

fn layout(body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
    title = escape_html(PAGE_TITLE),
    style = STYLE,
    body = body,
  )
}

/// Ticker form; the button disables itself on submit so one browser cannot start overlapping runs.
fn ticker_form(value: &str) -> String {
  format!(
    "<form method=\"get\" action=\"/dashboard\" onsubmit=\"this.querySelector('button').disabled=true;this.querySelector('button').textContent='Memproses...';\">\n\
<label for=\"ticker\">Ticker saham</label>\n\
<input id=\"ticker\" name=\"ticker\" value=\"{value}\" placeholder=\"BBCA\" required>\n\
<button type=\"submit\">Generate Insight</button>\n</form>",
    value = escape_html(value),
  )
}

pub fn index_page() -> String {
  layout(&ticker_form(""))
}

pub fn error_page(ticker: &str, kind: &str, message: &str) -> String {
  layout(&format!(
    "{form}\n<p class=\"error\">&#9888; {kind}: {message}</p>",
    form = ticker_form(ticker),
    kind = escape_html(kind),
    message = escape_html(message),
  ))
}

fn failure(kind: &str, message: &str) -> String {
  format!("<p class=\"error\">&#9888; {}: {}</p>", escape_html(kind), escape_html(message))
}

fn text_section(title: &str, outcome: &SectionOutcome<String>) -> String {
  let body = match outcome {
    SectionOutcome::Rendered(text) => format!("<pre>{}</pre>", escape_html(text)),
    SectionOutcome::Failed { kind, message } => failure(kind, message),
  };
  format!("<details open>\n<summary>{}</summary>\n{}\n</details>", escape_html(title), body)
}

fn chart_section(outcome: &SectionOutcome<ChartArtifact>) -> String {
  // render_svg already strips markup from chart text.
  let body = match outcome {
    SectionOutcome::Rendered(artifact) => format!("<figure>{}</figure>", artifact.svg),
    SectionOutcome::Failed { kind, message } => failure(kind, message),
  };
  format!("<details open>\n<summary>Visualisasi Segmen</summary>\n{}\n</details>", body)
}

fn segments_table(report: &DashboardReport) -> String {
  if report.segments.is_empty() {
    return String::new();
  }

  let rows: String = report.segments.iter().map(|record| {
    format!("<tr><td>{}</td><td class=\"num\">{}</td></tr>", escape_html(&record.source), record.value)
  }).collect();

  format!(
    "<details>\n<summary>Data Segmen {} ({})</summary>\n<table><tr><th>source</th><th>value</th></tr>{}</table>\n</details>",
    escape_html(report.symbol.as_deref().unwrap_or(&report.ticker)),
    report.financial_year.map(|y| y.to_string()).unwrap_or_default(),
    rows,
  )
}

pub fn dashboard_page(report: &DashboardReport) -> String {
  let sections = [
    ticker_form(&report.ticker),
    format!("<p>Dibuat {}</p>", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    segments_table(report),
    text_section(InsightKind::Summary.title(), &report.summary),
    chart_section(&report.chart),
    text_section(InsightKind::Interpretation.title(), &report.interpretation),
    text_section(InsightKind::Risk.title(), &report.risk),
  ];
  layout(&sections.join("\n"))
}
