use crate::ai_agent::data::frame::{column_names, read_column, ColumnValues};
use crate::ai_agent::data::models::SegmentTable;
use crate::app::errors::{DashboardError, DashboardResult};

pub const DATA_PLACEHOLDER: &str = "data";

#[derive(Debug, Clone, PartialEq)]
enum Piece {
  Literal(String),
  Data,
}

/// A prompt with exactly one `{data}` field. Literal braces are written `{{` and `}}`.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
  pieces: Vec<Piece>,
}

impl PromptTemplate {
  pub fn new(template: &str) -> DashboardResult<Self> {
    let mut pieces: Vec<Piece> = Vec::new();
    let mut literal = String::new();
    let mut placeholders: usize = 0;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
      match c {
        '{' if chars.peek() == Some(&'{') => {
          chars.next();
          literal.push('{');
        }
        '}' if chars.peek() == Some(&'}') => {
          chars.next();
          literal.push('}');
        }
        '{' => {
          let mut name = String::new();
          let mut closed = false;
          for n in chars.by_ref() {
            if n == '}' {
              closed = true;
              break;
            }
            name.push(n);
          }
          if !closed {
            return Err(DashboardError::Template("unclosed `{` in prompt template".to_string()));
          }
          if name.trim() != DATA_PLACEHOLDER {
            return Err(DashboardError::Template(format!("unknown placeholder {{{}}}, only {{data}} is supported", name)));
          }
          placeholders += 1;
          if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
          }
          pieces.push(Piece::Data);
        }
        '}' => {
          return Err(DashboardError::Template("unmatched `}` in prompt template".to_string()));
        }
        other => literal.push(other),
      }
    }

    if !literal.is_empty() {
      pieces.push(Piece::Literal(literal));
    }

    match placeholders {
      1 => Ok(PromptTemplate { pieces }),
      0 => Err(DashboardError::Template("prompt template has no {data} placeholder".to_string())),
      n => Err(DashboardError::Template(format!("prompt template has {} {{data}} placeholders, expected one", n))),
    }
  }

  pub fn format(&self, table: &SegmentTable) -> DashboardResult<String> {
    let rendered: String = render_table(table)?;
    let prompt: String = self.pieces.iter().map(|piece| match piece {
      Piece::Literal(text) => text.as_str(),
      Piece::Data => rendered.as_str(),
    }).collect();
    Ok(prompt)
  }
}

/// Fixed-width text of the table without an index column: text columns are
/// left aligned, numeric columns right aligned.
pub fn render_table(table: &SegmentTable) -> DashboardResult<String> {
  let df = table.to_dataframe()?;

  let mut columns: Vec<(String, bool, Vec<String>)> = Vec::new();
  for name in column_names(&df) {
    let values: ColumnValues = read_column(&df, &name)?;
    columns.push((name, values.is_numeric(), values.display_cells()));
  }

  let widths: Vec<usize> = columns.iter().map(|(name, _, cells)| {
    cells.iter().map(|c| c.chars().count()).chain(std::iter::once(name.chars().count())).max().unwrap_or(0)
  }).collect();

  let mut lines: Vec<String> = Vec::with_capacity(table.len() + 1);
  lines.push(render_row(columns.iter().map(|(name, numeric, _)| (name.as_str(), *numeric)), &widths));
  for row in 0..table.len() {
    lines.push(render_row(columns.iter().map(|(_, numeric, cells)| (cells[row].as_str(), *numeric)), &widths));
  }

  Ok(lines.join("\n"))
}

fn render_row<'a>(cells: impl Iterator<Item = (&'a str, bool)>, widths: &[usize]) -> String {
  let row: Vec<String> = cells.zip(widths).map(|((cell, numeric), width)| {
    if numeric {
      format!("{:>width$}", cell, width = *width)
    } else {
      format!("{:<width$}", cell, width = *width)
    }
  }).collect();
  row.join("  ").trim_end().to_string()
}
