use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;

use crate::ai_agent::chart::figure::{ChartKind, Figure};
use crate::app::errors::{DashboardError, DashboardResult};

pub const CHART_SIZE: (u32, u32) = (960, 540);
const FONT: &str = "sans-serif";

fn render_error<E: std::fmt::Debug>(e: E) -> DashboardError {
  DashboardError::Execution(format!("chart rendering failed: {:?}", e))
}

/// Model-supplied text never reaches the SVG with markup characters in it.
fn plain_text(text: &str) -> String {
  text.replace('<', "\u{2039}").replace('>', "\u{203A}")
}

/// Draws a validated figure as a standalone SVG document.
pub fn render_svg(figure: &Figure) -> DashboardResult<String> {
  figure.validate()?;

  let mut figure: Figure = figure.clone();
  figure.title = plain_text(&figure.title);
  figure.labels = figure.labels.iter().map(|label| plain_text(label)).collect();
  figure.x_label = figure.x_label.as_deref().map(plain_text);
  figure.y_label = figure.y_label.as_deref().map(plain_text);
  let figure: &Figure = &figure;

  let mut svg = String::new();
  {
    let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    match figure.kind {
      ChartKind::Bar => draw_bar(&root, figure)?,
      ChartKind::Line => draw_line(&root, figure)?,
      ChartKind::Pie => draw_pie(&root, figure)?,
    }

    root.present().map_err(render_error)?;
  }

  Ok(svg)
}

fn value_range(values: &[f64]) -> DashboardResult<(f64, f64)> {
  let min = values.iter().cloned().fold(0.0_f64, f64::min);
  let max = values.iter().cloned().fold(0.0_f64, f64::max);
  if (max - min).abs() < f64::EPSILON {
    return Ok((0.0, 1.0));
  }
  let pad = (max - min) * 0.05;
  let (low, high) = (if min < 0.0 { min - pad } else { min }, max + pad);
  if !low.is_finite() || !high.is_finite() {
    return Err(DashboardError::Execution("chart axis range is not finite".to_string()));
  }
  Ok((low, high))
}

fn segment_index(value: &SegmentValue<u32>) -> Option<usize> {
  match value {
    SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => Some(*i as usize),
    SegmentValue::Last => None,
  }
}

fn draw_bar<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> DashboardResult<()> {
  let n = figure.values.len() as u32;
  let (y_min, y_max) = value_range(&figure.values)?;

  let mut chart = ChartBuilder::on(root)
    .caption(&figure.title, (FONT, 24))
    .margin(16)
    .x_label_area_size(if figure.rotate_labels { 160 } else { 48 })
    .y_label_area_size(72)
    .build_cartesian_2d((0u32..n).into_segmented(), y_min..y_max)
    .map_err(render_error)?;

  let label_of = |v: &SegmentValue<u32>| match v {
    SegmentValue::CenterOf(i) => figure.labels.get(*i as usize).cloned().unwrap_or_default(),
    _ => String::new(),
  };

  let mut mesh = chart.configure_mesh();
  mesh.disable_x_mesh()
    .x_labels(figure.labels.len())
    .x_label_formatter(&label_of);
  if figure.rotate_labels {
    mesh.x_label_style((FONT, 12).into_font().transform(FontTransform::Rotate90));
  }
  if let Some(x_label) = &figure.x_label {
    mesh.x_desc(x_label.as_str());
  }
  if let Some(y_label) = &figure.y_label {
    mesh.y_desc(y_label.as_str());
  }
  mesh.draw().map_err(render_error)?;

  chart.draw_series(
    Histogram::vertical(&chart)
      .margin(8)
      .style_func(|x: &SegmentValue<u32>, _: &f64| {
        figure.color_at(segment_index(x).unwrap_or(0)).filled()
      })
      .data(figure.values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
  ).map_err(render_error)?;

  Ok(())
}

fn draw_line<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> DashboardResult<()> {
  let n = figure.values.len() as u32;
  let (y_min, y_max) = value_range(&figure.values)?;

  let mut chart = ChartBuilder::on(root)
    .caption(&figure.title, (FONT, 24))
    .margin(16)
    .x_label_area_size(if figure.rotate_labels { 160 } else { 48 })
    .y_label_area_size(72)
    .build_cartesian_2d((0u32..n).into_segmented(), y_min..y_max)
    .map_err(render_error)?;

  let label_of = |v: &SegmentValue<u32>| match v {
    SegmentValue::CenterOf(i) => figure.labels.get(*i as usize).cloned().unwrap_or_default(),
    _ => String::new(),
  };

  let mut mesh = chart.configure_mesh();
  mesh.x_labels(figure.labels.len()).x_label_formatter(&label_of);
  if figure.rotate_labels {
    mesh.x_label_style((FONT, 12).into_font().transform(FontTransform::Rotate90));
  }
  if let Some(x_label) = &figure.x_label {
    mesh.x_desc(x_label.as_str());
  }
  if let Some(y_label) = &figure.y_label {
    mesh.y_desc(y_label.as_str());
  }
  mesh.draw().map_err(render_error)?;

  let points: Vec<(SegmentValue<u32>, f64)> = figure.values.iter().enumerate()
    .map(|(i, v)| (SegmentValue::CenterOf(i as u32), *v))
    .collect();

  chart.draw_series(LineSeries::new(points.clone(), figure.color_at(0).stroke_width(2)))
    .map_err(render_error)?;
  chart.draw_series(points.into_iter().enumerate().map(|(i, point)| {
    Circle::new(point, 4, figure.color_at(i).filled())
  })).map_err(render_error)?;

  Ok(())
}

fn draw_pie<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> DashboardResult<()> {
  let area = root.titled(&figure.title, (FONT, 24)).map_err(render_error)?;
  let (width, height) = area.dim_in_pixel();

  let center: (i32, i32) = ((width / 2) as i32, (height / 2) as i32);
  let radius: f64 = f64::from(width.min(height)) * 0.35;
  let colors: Vec<RGBColor> = (0..figure.values.len()).map(|i| figure.color_at(i)).collect();

  let pie = Pie::new(&center, &radius, figure.values.as_slice(), colors.as_slice(), figure.labels.as_slice());
  area.draw(&pie).map_err(render_error)?;

  Ok(())
}
