use std::fmt;
use std::str::FromStr;

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

use crate::app::errors::{DashboardError, DashboardResult};

/// Default segment colours, one per bar or slice, cycled when there are more segments.
pub const DEFAULT_PALETTE: [&str; 10] = [
  "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
  "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
];

pub const MAX_SEGMENTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
  Bar,
  Line,
  Pie,
}

impl ChartKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ChartKind::Bar => "bar",
      ChartKind::Line => "line",
      ChartKind::Pie => "pie",
    }
  }
}

impl FromStr for ChartKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "bar" => Ok(ChartKind::Bar),
      "line" => Ok(ChartKind::Line),
      "pie" => Ok(ChartKind::Pie),
      _ => Err(format!("Unknown chart kind: {}", s)),
    }
  }
}

impl fmt::Display for ChartKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A chart built by a script: one of the closed set of templates plus its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
  pub kind: ChartKind,
  pub title: String,
  pub labels: Vec<String>,
  pub values: Vec<f64>,
  pub x_label: Option<String>,
  pub y_label: Option<String>,
  /// On/off only: turned-on labels are drawn vertically whatever angle the script asked for.
  pub rotate_labels: bool,
  pub colors: Vec<String>,
}

impl Figure {
  pub fn new(kind: ChartKind, labels: Vec<String>, values: Vec<f64>) -> Self {
    Figure {
      kind,
      title: String::new(),
      labels,
      values,
      x_label: None,
      y_label: None,
      rotate_labels: false,
      colors: Vec::new(),
    }
  }

  pub fn validate(&self) -> DashboardResult<()> {
    if self.values.is_empty() {
      return Err(DashboardError::Execution(format!("{} chart has no data points", self.kind)));
    }
    if self.values.len() > MAX_SEGMENTS {
      return Err(DashboardError::Execution(format!("{} chart has {} data points, at most {} are drawn", self.kind, self.values.len(), MAX_SEGMENTS)));
    }
    if self.labels.len() != self.values.len() {
      return Err(DashboardError::Execution(format!(
        "{} chart has {} labels but {} values", self.kind, self.labels.len(), self.values.len()
      )));
    }
    if let Some(bad) = self.values.iter().find(|v| !v.is_finite()) {
      return Err(DashboardError::Execution(format!("{} chart contains non-finite value {}", self.kind, bad)));
    }
    if self.kind == ChartKind::Pie {
      if self.values.iter().any(|v| *v < 0.0) {
        return Err(DashboardError::Execution("pie chart values must not be negative".to_string()));
      }
      let total: f64 = self.values.iter().sum();
      if total <= 0.0 {
        return Err(DashboardError::Execution("pie chart values sum to zero".to_string()));
      }
      if !total.is_finite() {
        return Err(DashboardError::Execution("pie chart values overflow when summed".to_string()));
      }
    } else {
      // Axis bounds always include zero and get 5% padding on each side.
      let min = self.values.iter().cloned().fold(0.0_f64, f64::min);
      let max = self.values.iter().cloned().fold(0.0_f64, f64::max);
      if !((max - min) * 1.1).is_finite() {
        return Err(DashboardError::Execution(format!("{} chart values span too wide a range to draw an axis", self.kind)));
      }
    }
    for color in &self.colors {
      parse_hex_color(color)?;
    }
    Ok(())
  }

  /// Colour for the segment at `index`, falling back to the default palette.
  pub fn color_at(&self, index: usize) -> RGBColor {
    let chosen = if self.colors.is_empty() {
      DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()]
    } else {
      self.colors[index % self.colors.len()].as_str()
    };
    parse_hex_color(chosen).unwrap_or(RGBColor(0x1f, 0x77, 0xb4))
  }
}

pub fn parse_hex_color(text: &str) -> DashboardResult<RGBColor> {
  let hex = text.trim().trim_start_matches('#');
  let invalid = || DashboardError::Execution(format!("colour {:?} is not of the form #rrggbb", text));

  if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
    return Err(invalid());
  }
  let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| invalid());
  Ok(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bar(labels: &[&str], values: &[f64]) -> Figure {
    Figure::new(ChartKind::Bar, labels.iter().map(|s| s.to_string()).collect(), values.to_vec())
  }

  #[test]
  fn valid_bar_chart_passes() {
    assert!(bar(&["Retail", "Corporate"], &[5.0, 3.0]).validate().is_ok());
  }

  #[test]
  fn mismatched_or_empty_data_is_rejected() {
    assert!(bar(&["Retail"], &[5.0, 3.0]).validate().is_err());
    assert!(bar(&[], &[]).validate().is_err());
    assert!(bar(&["a"], &[f64::INFINITY]).validate().is_err());
  }

  #[test]
  fn pie_needs_positive_total() {
    let mut pie = bar(&["a", "b"], &[0.0, 0.0]);
    pie.kind = ChartKind::Pie;
    assert!(pie.validate().is_err());
    pie.values = vec![2.0, -1.0];
    assert!(pie.validate().is_err());
    pie.values = vec![2.0, 1.0];
    assert!(pie.validate().is_ok());
  }

  #[test]
  fn finite_values_with_overflowing_span_are_rejected() {
    assert!(bar(&["a", "b"], &[-1.7e308, 1.7e308]).validate().is_err());
    assert!(bar(&["a"], &[1.7e308]).validate().is_err());
    assert!(bar(&["a"], &[1.0e300]).validate().is_ok());

    let mut pie = bar(&["a", "b"], &[1.7e308, 1.7e308]);
    pie.kind = ChartKind::Pie;
    assert!(pie.validate().is_err());
  }

  #[test]
  fn colours_must_be_hex() {
    let mut figure = bar(&["a"], &[1.0]);
    figure.colors = vec!["#00ff00".into()];
    assert!(figure.validate().is_ok());
    assert_eq!(figure.color_at(3), RGBColor(0, 255, 0));
    figure.colors = vec!["green".into()];
    assert!(figure.validate().is_err());
  }

  #[test]
  fn chart_kind_parses_case_insensitively() {
    assert_eq!("PIE".parse::<ChartKind>().unwrap(), ChartKind::Pie);
    assert!("scatter".parse::<ChartKind>().is_err());
  }
}
