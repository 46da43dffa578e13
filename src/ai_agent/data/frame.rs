use polars::prelude::{DataFrame, DataType};

use crate::app::errors::{DashboardError, DashboardResult};

/// Typed contents of one segment table column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
  Text(Vec<String>),
  Number(Vec<f64>),
}

impl ColumnValues {
  /// Cells as they appear in prompts. Numbers use the shortest round-trip form,
  /// so `5e12` is written `5000000000000`.
  pub fn display_cells(&self) -> Vec<String> {
    match self {
      ColumnValues::Text(cells) => cells.clone(),
      ColumnValues::Number(cells) => cells.iter().map(|v| v.to_string()).collect(),
    }
  }

  pub fn is_numeric(&self) -> bool {
    matches!(self, ColumnValues::Number(_))
  }
}

pub fn read_column(df: &DataFrame, name: &str) -> DashboardResult<ColumnValues> {
  let series = df.column(name).map_err(|_| {
    DashboardError::Parse(format!("segment table has no column named {:?}", name))
  })?;

  let values = match series.dtype() {
    DataType::String => ColumnValues::Text(
      series.str()?.into_iter().map(|v| v.unwrap_or_default().to_string()).collect(),
    ),
    DataType::Float64 => ColumnValues::Number(
      series.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
    ),
    DataType::Int32 => ColumnValues::Number(
      series.i32()?.into_iter().map(|v| v.map(f64::from).unwrap_or(f64::NAN)).collect(),
    ),
    other => {
      return Err(DashboardError::Parse(format!("column {:?} has unsupported type {}", name, other)));
    }
  };

  Ok(values)
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
  df.get_column_names().into_iter().map(String::from).collect()
}
