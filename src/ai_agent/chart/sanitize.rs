use std::sync::OnceLock;

use regex::Regex;

use crate::app::errors::{DashboardError, DashboardResult};

static FENCED_BLOCK: OnceLock<Regex> = OnceLock::new();
static STATEMENT_START: OnceLock<Regex> = OnceLock::new();

fn fenced_block() -> &'static Regex {
  // Opening fence with an optional language tag; the closing fence may be missing
  // when the model output was truncated.
  FENCED_BLOCK.get_or_init(|| {
    Regex::new(r"(?s)```[ \t]*[A-Za-z0-9_+.-]*[ \t]*\r?\n(.*?)(?:```|\z)").expect("fence pattern is valid")
  })
}

fn statement_start() -> &'static Regex {
  STATEMENT_START.get_or_init(|| {
    Regex::new(r"^\s*(?:import\s+[A-Za-z_]|#|[A-Za-z_][A-Za-z0-9_]*\s*=(?:$|[^=]))").expect("statement pattern is valid")
  })
}

/// Strips markdown fences and the prose a model wraps around chart code.
/// Only wrapper patterns are removed; the statements themselves are left untouched.
pub fn sanitize_chart_code(raw: &str) -> DashboardResult<String> {
  let unfenced: &str = match fenced_block().captures(raw) {
    Some(captures) => captures.get(1).map_or("", |m| m.as_str()),
    None => raw,
  };

  let lines: Vec<&str> = unfenced
    .lines()
    .filter(|line| !line.trim_start().starts_with("```"))
    .collect();

  let first = lines.iter().position(|line| statement_start().is_match(line));
  let last = lines.iter().rposition(|line| statement_start().is_match(line));

  let (first, last) = match (first, last) {
    (Some(first), Some(last)) => (first, last),
    _ => {
      return Err(DashboardError::Sanitization("model response contains no chart script statements".to_string()));
    }
  };

  // The last statement may continue over several lines inside open brackets.
  let mut depth: i32 = lines[first..=last].iter().map(|line| bracket_delta(line)).sum();
  let mut end: usize = last;
  while depth > 0 && end + 1 < lines.len() {
    end += 1;
    depth += bracket_delta(lines[end]);
  }

  let code: String = lines[first..=end].join("\n").trim_end().to_string();
  if code.trim().is_empty() {
    return Err(DashboardError::Sanitization("nothing executable left after stripping".to_string()));
  }

  Ok(code)
}

fn bracket_delta(line: &str) -> i32 {
  let mut delta: i32 = 0;
  let mut quote: Option<char> = None;
  let mut escaped = false;

  for c in line.chars() {
    if let Some(q) = quote {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == q {
        quote = None;
      }
      continue;
    }

    match c {
      '#' => break,
      '"' | '\'' => quote = Some(c),
      '(' | '[' => delta += 1,
      ')' | ']' => delta -= 1,
      _ => {}
    }
  }

  delta
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  const CODE: &str = "import chart\nimport data\nfig = chart.bar(x=data.column(\"source\"),\n  y=data.column(\"value\") / 1e12)";

  #[test]
  fn strips_language_fence() {
    let raw = format!("```python\n{}\n```", CODE);
    assert_eq!(sanitize_chart_code(&raw).unwrap(), CODE);
  }

  #[test]
  fn strips_prose_around_fence() {
    let raw = format!("Here is the chart script:\n\n```\n{}\n```\nIt draws a bar chart.", CODE);
    assert_eq!(sanitize_chart_code(&raw).unwrap(), CODE);
  }

  #[test]
  fn strips_prose_without_fence() {
    let raw = format!("Sure! Below is the code.\n{}\n\nLet me know if you need changes.", CODE);
    assert_eq!(sanitize_chart_code(&raw).unwrap(), CODE);
  }

  #[test]
  fn unterminated_fence_keeps_code() {
    let raw = format!("```chart\n{}", CODE);
    assert_eq!(sanitize_chart_code(&raw).unwrap(), CODE);
  }

  #[test]
  fn language_names_inside_code_are_not_touched() {
    let code = "import chart\nfig = chart.bar(x=[\"python\"], y=[1], title=\"python revenue\")";
    assert_eq!(sanitize_chart_code(&format!("```python\n{}\n```", code)).unwrap(), code);
  }

  #[test]
  fn sanitizing_is_idempotent() {
    let inputs = [
      format!("```python\n{}\n```", CODE),
      format!("Intro text\n{}\nOutro text", CODE),
      CODE.to_string(),
      "# only a comment\nx = [1, 2\n".to_string(),
    ];

    for raw in inputs {
      let once = sanitize_chart_code(&raw).unwrap();
      let twice = sanitize_chart_code(&once).unwrap();
      assert_eq!(once, twice);
    }
  }

  #[test]
  fn prose_only_response_fails() {
    for raw in ["", "   ", "```\n```", "I cannot draw charts, sorry."] {
      let err = sanitize_chart_code(raw).unwrap_err();
      assert!(matches!(err, DashboardError::Sanitization(_)), "accepted {:?}", raw);
    }
  }

  #[test]
  fn brackets_inside_strings_are_ignored() {
    assert_eq!(bracket_delta("x = chart.bar(title=\"(a\""), 1);
    assert_eq!(bracket_delta("y = [1, 2] # ]]]"), 0);
  }
}
