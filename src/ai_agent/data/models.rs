use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};

use crate::app::errors::DashboardResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSegment {
  pub source: String,
  pub value: f64,
}

/// Body of `company/get-segments/{ticker}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentsResponse {
  pub symbol: String,
  pub financial_year: i32,
  pub revenue_breakdown: Vec<RevenueSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
  pub source: String,
  pub value: f64,
  pub symbol: String,
  pub financial_year: i32,
}

/// Rows of one segments response, all tagged with the same symbol and year.
#[derive(Debug, Clone)]
pub struct SegmentTable {
  symbol: String,
  financial_year: i32,
  records: Vec<SegmentRecord>,
}

impl SegmentTable {
  pub fn from_response(response: SegmentsResponse) -> Self {
    let SegmentsResponse { symbol, financial_year, revenue_breakdown } = response;
    let records: Vec<SegmentRecord> = revenue_breakdown.into_iter().map(|segment| SegmentRecord {
      source: segment.source,
      value: segment.value,
      symbol: symbol.clone(),
      financial_year,
    }).collect();

    SegmentTable { symbol, financial_year, records }
  }

  pub fn symbol(&self) -> &str {
    &self.symbol
  }

  pub fn financial_year(&self) -> i32 {
    self.financial_year
  }

  pub fn records(&self) -> &[SegmentRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn sources(&self) -> Vec<String> {
    self.records.iter().map(|r| r.source.clone()).collect()
  }

  pub fn values(&self) -> Vec<f64> {
    self.records.iter().map(|r| r.value).collect()
  }

  pub fn to_dataframe(&self) -> DashboardResult<DataFrame> {
    let sources: Vec<String> = self.sources();
    let values: Vec<f64> = self.values();
    let symbols: Vec<&str> = self.records.iter().map(|r| r.symbol.as_str()).collect();
    let years: Vec<i32> = self.records.iter().map(|r| r.financial_year).collect();

    let df = DataFrame::new(vec![
      Series::new("source", &sources),
      Series::new("value", &values),
      Series::new("symbol", &symbols),
      Series::new("financial_year", &years),
    ])?;

    Ok(df)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn top_level_symbol_and_year_are_copied_onto_rows() {
    let response: SegmentsResponse = serde_json::from_value(serde_json::json!({
      "symbol": "BBCA",
      "financial_year": 2023,
      "revenue_breakdown": [
        {"source": "Retail Banking", "value": 5e12},
        {"source": "Corporate Banking", "value": 3e12}
      ]
    })).unwrap();

    let table = SegmentTable::from_response(response);
    assert_eq!(table.len(), 2);
    assert!(table.records().iter().all(|r| r.symbol == "BBCA" && r.financial_year == 2023));
    assert_eq!(table.sources(), vec!["Retail Banking".to_string(), "Corporate Banking".to_string()]);
  }

  #[test]
  fn dataframe_has_one_row_per_segment() {
    let table = SegmentTable::from_response(SegmentsResponse {
      symbol: "ASII".into(),
      financial_year: 2022,
      revenue_breakdown: vec![RevenueSegment { source: "Automotive".into(), value: 1.5e12 }],
    });
    let df = table.to_dataframe().unwrap();
    assert_eq!(df.shape(), (1, 4));
    assert_eq!(df.get_column_names(), vec!["source", "value", "symbol", "financial_year"]);
  }
}
