use std::collections::HashMap;
use std::fmt;

use polars::prelude::DataFrame;

use crate::ai_agent::chart::figure::{ChartKind, Figure};
use crate::ai_agent::chart::script::parser::{parse, BinaryOp, Expr, Stmt};
use crate::ai_agent::data::frame::{column_names, read_column, ColumnValues};
use crate::app::errors::{DashboardError, DashboardResult};

pub const MAX_STEPS: usize = 100_000;
pub const MAX_LIST_LEN: usize = 10_000;
pub const MAX_TEXT_LEN: usize = 4_096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
  Chart,
  Data,
}

impl Module {
  fn resolve(name: &str) -> Option<Module> {
    match name {
      "chart" => Some(Module::Chart),
      "data" => Some(Module::Data),
      _ => None,
    }
  }

  fn name(&self) -> &'static str {
    match self {
      Module::Chart => "chart",
      Module::Data => "data",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Number(f64),
  Text(String),
  Bool(bool),
  List(Vec<Value>),
  Module(Module),
  Figure(Figure),
}

impl Value {
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Number(_) => "number",
      Value::Text(_) => "string",
      Value::Bool(_) => "bool",
      Value::List(_) => "list",
      Value::Module(_) => "module",
      Value::Figure(_) => "figure",
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Number(n) => write!(f, "{}", n),
      Value::Text(s) => f.write_str(s),
      Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
      Value::List(items) => write!(f, "[{} items]", items.len()),
      Value::Module(m) => write!(f, "<module {}>", m.name()),
      Value::Figure(fig) => write!(f, "<{} chart>", fig.kind),
    }
  }
}

/// The dataset a script may read through `import data`. Nothing else from the
/// host process is reachable.
#[derive(Debug, Clone)]
pub struct DataModule {
  frame: DataFrame,
  symbol: String,
  financial_year: i32,
}

impl DataModule {
  pub fn new(frame: DataFrame, symbol: &str, financial_year: i32) -> Self {
    DataModule { frame, symbol: symbol.to_string(), financial_year }
  }
}

/// Bindings created by one script run. Always starts empty.
#[derive(Debug, Default)]
pub struct Scope {
  bindings: HashMap<String, Value>,
}

impl Scope {
  pub fn get(&self, name: &str) -> Option<&Value> {
    self.bindings.get(name)
  }

  pub fn take(&mut self, name: &str) -> Option<Value> {
    self.bindings.remove(name)
  }

  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.bindings.keys().cloned().collect();
    names.sort();
    names
  }
}

pub struct Interpreter<'a> {
  data: &'a DataModule,
  scope: Scope,
  steps: usize,
  line: usize,
}

/// Parses and runs a script, returning the scope it built.
pub fn run_script(source: &str, data: &DataModule) -> DashboardResult<Scope> {
  let program = parse(source)?;
  let mut interpreter = Interpreter { data, scope: Scope::default(), steps: 0, line: 0 };

  for statement in &program {
    interpreter.execute(statement)?;
  }

  Ok(interpreter.scope)
}

impl<'a> Interpreter<'a> {
  fn fail(&self, message: impl AsRef<str>) -> DashboardError {
    DashboardError::Execution(format!("line {}: {}", self.line, message.as_ref()))
  }

  fn tick(&mut self, cost: usize) -> DashboardResult<()> {
    self.steps += cost;
    if self.steps > MAX_STEPS {
      return Err(self.fail(format!("script exceeded its budget of {} steps", MAX_STEPS)));
    }
    Ok(())
  }

  fn execute(&mut self, statement: &Stmt) -> DashboardResult<()> {
    match statement {
      Stmt::Import { module, line } => {
        self.line = *line;
        self.tick(1)?;
        let resolved = Module::resolve(module)
          .ok_or_else(|| self.fail(format!("no module named {:?}; available modules are `chart` and `data`", module)))?;
        self.scope.bindings.insert(module.clone(), Value::Module(resolved));
      }
      Stmt::Assign { name, value, line } => {
        self.line = *line;
        let value = self.eval(value)?;
        self.scope.bindings.insert(name.clone(), value);
      }
    }
    Ok(())
  }

  fn eval(&mut self, expr: &Expr) -> DashboardResult<Value> {
    self.tick(1)?;
    match expr {
      Expr::Number(n) => Ok(Value::Number(*n)),
      Expr::Str(s) => Ok(Value::Text(s.clone())),
      Expr::Bool(b) => Ok(Value::Bool(*b)),
      Expr::List(items) => {
        if items.len() > MAX_LIST_LEN {
          return Err(self.fail(format!("list literal longer than {} items", MAX_LIST_LEN)));
        }
        let values = items.iter().map(|item| self.eval(item)).collect::<DashboardResult<Vec<_>>>()?;
        Ok(Value::List(values))
      }
      Expr::Name(name) => self.scope.get(name).cloned()
        .ok_or_else(|| self.fail(format!("name {:?} is not defined", name))),
      Expr::Neg(inner) => match self.eval(inner)? {
        Value::Number(n) => Ok(Value::Number(-n)),
        Value::List(items) => {
          self.tick(items.len())?;
          let negated = items.into_iter().map(|item| match item {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(self.fail(format!("cannot negate a {}", other.type_name()))),
          }).collect::<DashboardResult<Vec<_>>>()?;
          Ok(Value::List(negated))
        }
        other => Err(self.fail(format!("cannot negate a {}", other.type_name()))),
      },
      Expr::Binary { op, lhs, rhs } => {
        let lhs = self.eval(lhs)?;
        let rhs = self.eval(rhs)?;
        self.binary(*op, lhs, rhs)
      }
      Expr::Call { target, function, args, kwargs } => {
        let module = match self.scope.get(target) {
          Some(Value::Module(module)) => *module,
          Some(other) => return Err(self.fail(format!("{:?} is a {}, not a module", target, other.type_name()))),
          None => return Err(self.fail(format!("name {:?} is not defined; did you forget `import {}`?", target, target))),
        };
        let args = args.iter().map(|a| self.eval(a)).collect::<DashboardResult<Vec<_>>>()?;
        let mut named: HashMap<String, Value> = HashMap::new();
        for (key, value) in kwargs {
          let value = self.eval(value)?;
          named.insert(key.clone(), value);
        }
        match module {
          Module::Data => self.call_data(function, args, named),
          Module::Chart => self.call_chart(function, args, named),
        }
      }
    }
  }

  fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> DashboardResult<Value> {
    match (lhs, rhs) {
      (Value::Number(a), Value::Number(b)) => self.arith(op, a, b).map(Value::Number),
      (Value::Text(a), Value::Text(b)) if op == BinaryOp::Add => self.concat(&a, &b),
      (Value::Text(a), Value::Number(b)) if op == BinaryOp::Add => self.concat(&a, &b.to_string()),
      (Value::Number(a), Value::Text(b)) if op == BinaryOp::Add => self.concat(&a.to_string(), &b),
      (Value::List(items), Value::Number(b)) => {
        self.tick(items.len())?;
        let mapped = items.into_iter().map(|item| match item {
          Value::Number(a) => self.arith(op, a, b).map(Value::Number),
          other => Err(self.fail(format!("cannot apply `{}` to a {} inside a list", op.symbol(), other.type_name()))),
        }).collect::<DashboardResult<Vec<_>>>()?;
        Ok(Value::List(mapped))
      }
      (Value::Number(a), Value::List(items)) => {
        self.tick(items.len())?;
        let mapped = items.into_iter().map(|item| match item {
          Value::Number(b) => self.arith(op, a, b).map(Value::Number),
          other => Err(self.fail(format!("cannot apply `{}` to a {} inside a list", op.symbol(), other.type_name()))),
        }).collect::<DashboardResult<Vec<_>>>()?;
        Ok(Value::List(mapped))
      }
      (Value::List(left), Value::List(right)) if op == BinaryOp::Add && !all_numbers(&left) => {
        if left.len() + right.len() > MAX_LIST_LEN {
          return Err(self.fail(format!("list longer than {} items", MAX_LIST_LEN)));
        }
        self.tick(left.len() + right.len())?;
        Ok(Value::List(left.into_iter().chain(right).collect()))
      }
      (Value::List(left), Value::List(right)) => {
        if left.len() != right.len() {
          return Err(self.fail(format!("cannot apply `{}` to lists of length {} and {}", op.symbol(), left.len(), right.len())));
        }
        self.tick(left.len())?;
        let mapped = left.into_iter().zip(right).map(|pair| match pair {
          (Value::Number(a), Value::Number(b)) => self.arith(op, a, b).map(Value::Number),
          (a, b) => Err(self.fail(format!("cannot apply `{}` to {} and {}", op.symbol(), a.type_name(), b.type_name()))),
        }).collect::<DashboardResult<Vec<_>>>()?;
        Ok(Value::List(mapped))
      }
      (a, b) => Err(self.fail(format!("cannot apply `{}` to {} and {}", op.symbol(), a.type_name(), b.type_name()))),
    }
  }

  fn concat(&mut self, a: &str, b: &str) -> DashboardResult<Value> {
    let len = a.len() + b.len();
    if len > MAX_TEXT_LEN {
      return Err(self.fail(format!("string longer than {} bytes", MAX_TEXT_LEN)));
    }
    self.tick(len)?;
    let mut text = String::with_capacity(len);
    text.push_str(a);
    text.push_str(b);
    Ok(Value::Text(text))
  }

  fn arith(&self, op: BinaryOp, a: f64, b: f64) -> DashboardResult<f64> {
    match op {
      BinaryOp::Add => Ok(a + b),
      BinaryOp::Sub => Ok(a - b),
      BinaryOp::Mul => Ok(a * b),
      BinaryOp::Div if b == 0.0 => Err(self.fail("division by zero")),
      BinaryOp::Div => Ok(a / b),
    }
  }

  fn call_data(&mut self, function: &str, args: Vec<Value>, named: HashMap<String, Value>) -> DashboardResult<Value> {
    if !named.is_empty() {
      return Err(self.fail(format!("data.{} takes no keyword arguments", function)));
    }

    match (function, args.as_slice()) {
      ("column", [Value::Text(name)]) => {
        let column = read_column(&self.data.frame, name).map_err(|_| {
          self.fail(format!("data has no column {:?}; columns are {}", name, column_names(&self.data.frame).join(", ")))
        })?;
        let values: Vec<Value> = match column {
          ColumnValues::Text(cells) => cells.into_iter().map(Value::Text).collect(),
          ColumnValues::Number(cells) => cells.into_iter().map(Value::Number).collect(),
        };
        self.tick(values.len())?;
        Ok(Value::List(values))
      }
      ("column", _) => Err(self.fail("data.column expects one column name")),
      ("symbol", []) => Ok(Value::Text(self.data.symbol.clone())),
      ("year", []) => Ok(Value::Number(f64::from(self.data.financial_year))),
      ("len", []) => Ok(Value::Number(self.data.frame.height() as f64)),
      ("symbol" | "year" | "len", _) => Err(self.fail(format!("data.{} takes no arguments", function))),
      _ => Err(self.fail(format!("module `data` has no function {:?}", function))),
    }
  }

  fn call_chart(&mut self, function: &str, args: Vec<Value>, mut named: HashMap<String, Value>) -> DashboardResult<Value> {
    let kind: ChartKind = function.parse::<ChartKind>()
      .map_err(|_| self.fail(format!("module `chart` has no function {:?}; use bar, line or pie", function)))?;

    let (label_key, value_key) = match kind {
      ChartKind::Pie => ("labels", "values"),
      ChartKind::Bar | ChartKind::Line => ("x", "y"),
    };

    if args.len() > 2 {
      return Err(self.fail(format!("chart.{} takes at most 2 positional arguments", function)));
    }
    for (position, value) in args.into_iter().enumerate() {
      let key = if position == 0 { label_key } else { value_key };
      if named.insert(key.to_string(), value).is_some() {
        return Err(self.fail(format!("argument `{}` given twice", key)));
      }
    }

    let labels = named.remove(label_key).ok_or_else(|| self.fail(format!("chart.{} needs `{}`", function, label_key)))?;
    let values = named.remove(value_key).ok_or_else(|| self.fail(format!("chart.{} needs `{}`", function, value_key)))?;

    let labels: Vec<String> = match labels {
      Value::List(items) => items.iter().map(|item| match item {
        Value::Text(_) | Value::Number(_) | Value::Bool(_) => Ok(item.to_string()),
        other => Err(self.fail(format!("`{}` may only hold strings or numbers, found a {}", label_key, other.type_name()))),
      }).collect::<DashboardResult<Vec<_>>>()?,
      other => return Err(self.fail(format!("`{}` must be a list, found a {}", label_key, other.type_name()))),
    };
    let values: Vec<f64> = match values {
      Value::List(items) => items.iter().map(|item| match item {
        Value::Number(n) => Ok(*n),
        other => Err(self.fail(format!("`{}` may only hold numbers, found a {}", value_key, other.type_name()))),
      }).collect::<DashboardResult<Vec<_>>>()?,
      other => return Err(self.fail(format!("`{}` must be a list, found a {}", value_key, other.type_name()))),
    };

    let mut figure = Figure::new(kind, labels, values);

    for (key, value) in named {
      match (key.as_str(), value) {
        ("title", Value::Text(text)) => figure.title = text,
        ("x_label", Value::Text(text)) => figure.x_label = Some(text),
        ("y_label", Value::Text(text)) => figure.y_label = Some(text),
        ("rotate_labels", Value::Number(angle)) => figure.rotate_labels = angle != 0.0,
        ("rotate_labels", Value::Bool(flag)) => figure.rotate_labels = flag,
        ("colors", Value::List(items)) => {
          figure.colors = items.into_iter().map(|item| match item {
            Value::Text(color) => Ok(color),
            other => Err(self.fail(format!("`colors` may only hold strings, found a {}", other.type_name()))),
          }).collect::<DashboardResult<Vec<_>>>()?;
        }
        ("title" | "x_label" | "y_label" | "rotate_labels" | "colors", other) => {
          return Err(self.fail(format!("`{}` cannot be a {}", key, other.type_name())));
        }
        _ => return Err(self.fail(format!("chart.{} got an unexpected argument `{}`", function, key))),
      }
    }

    Ok(Value::Figure(figure))
  }
}

fn all_numbers(items: &[Value]) -> bool {
  items.iter().all(|item| matches!(item, Value::Number(_)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::bbca_table;
  use pretty_assertions::assert_eq;

  fn bbca_module() -> DataModule {
    let table = bbca_table();
    DataModule::new(table.to_dataframe().unwrap(), table.symbol(), table.financial_year())
  }

  fn run(source: &str) -> DashboardResult<Scope> {
    run_script(source, &bbca_module())
  }

  #[test]
  fn builds_bar_figure_from_dataset() {
    let mut scope = run(r#"
import chart
import data
labels = data.column("source")
values = data.column("value") / 1e12
fig = chart.bar(x=labels, y=values, title="Revenue & Cost Segments " + data.symbol(), rotate_labels=45)
"#).unwrap();

    let Some(Value::Figure(figure)) = scope.take("fig") else { panic!("fig should be a figure") };
    assert_eq!(figure.kind, ChartKind::Bar);
    assert_eq!(figure.labels, vec!["Retail Banking".to_string(), "Corporate Banking".to_string()]);
    assert_eq!(figure.values, vec![5.0, 3.0]);
    assert_eq!(figure.title, "Revenue & Cost Segments BBCA");
    assert!(figure.rotate_labels);
  }

  #[test]
  fn scope_starts_empty() {
    let scope = run("x = 1").unwrap();
    assert_eq!(scope.names(), vec!["x".to_string()]);
  }

  #[test]
  fn modules_are_only_visible_after_import() {
    let err = run("fig = chart.bar(x=['a'], y=[1])").unwrap_err();
    assert!(matches!(err, DashboardError::Execution(ref msg) if msg.contains("import chart")), "{:?}", err);

    let err = run("values = data.column('value')").unwrap_err();
    assert!(matches!(err, DashboardError::Execution(_)));
  }

  #[test]
  fn ambient_names_are_not_defined() {
    for name in ["os", "env", "config", "GROQ_API_KEY", "fig", "__builtins__"] {
      let err = run(&format!("x = {}", name)).unwrap_err();
      assert!(matches!(err, DashboardError::Execution(ref msg) if msg.contains("not defined")), "{} resolved", name);
    }
  }

  #[test]
  fn unknown_modules_fail() {
    for source in ["import os", "import matplotlib.pyplot", "import subprocess"] {
      assert!(matches!(run(source), Err(DashboardError::Execution(_))), "{} imported", source);
    }
  }

  #[test]
  fn pie_accepts_positional_arguments() {
    let mut scope = run("import chart\nfig = chart.pie(['a', 'b'], [1, 3], title='share')").unwrap();
    let Some(Value::Figure(figure)) = scope.take("fig") else { panic!("fig should be a figure") };
    assert_eq!(figure.kind, ChartKind::Pie);
    assert_eq!(figure.values, vec![1.0, 3.0]);
  }

  #[test]
  fn argument_errors_are_reported() {
    assert!(run("import chart\nfig = chart.scatter(x=[1], y=[1])").is_err());
    assert!(run("import chart\nfig = chart.bar(x=[1])").is_err());
    assert!(run("import chart\nfig = chart.bar(x=[1], y=['a'])").is_err());
    assert!(run("import chart\nfig = chart.bar(x=[1], y=[1], colour='red')").is_err());
    assert!(run("import data\nx = data.column('missing')").is_err());
    assert!(run("x = [1, 2] + 'a'").is_err());
    assert!(run("x = 1 / 0").is_err());
  }

  #[test]
  fn list_arithmetic_is_elementwise() {
    let scope = run("a = [1, 2, 3] * 2\nb = a - [1, 1, 1]\nc = ['x'] + ['y']").unwrap();
    assert_eq!(scope.get("b"), Some(&Value::List(vec![Value::Number(1.0), Value::Number(3.0), Value::Number(5.0)])));
    assert_eq!(scope.get("c"), Some(&Value::List(vec![Value::Text("x".into()), Value::Text("y".into())])));
  }

  #[test]
  fn step_budget_stops_runaway_scripts() {
    let mut source = String::from("import data\nv = data.column('value')\n");
    let big: Vec<String> = (0..5000).map(|i| i.to_string()).collect();
    source.push_str(&format!("a = [{}]\n", big.join(", ")));
    for _ in 0..30 {
      source.push_str("a = a * 2\n");
    }
    let err = run(&source).unwrap_err();
    assert!(matches!(err, DashboardError::Execution(ref msg) if msg.contains("budget")), "{:?}", err);
  }

  #[test]
  fn doubling_a_string_hits_the_length_limit() {
    let mut source = String::from("s = 'aaaaaaaaaaaaaaaa'\n");
    for _ in 0..24 {
      source.push_str("s = s + s\n");
    }
    let err = run(&source).unwrap_err();
    assert!(matches!(err, DashboardError::Execution(ref msg) if msg.contains("string longer than")), "{:?}", err);

    let scope = run("s = 'ab' + 'cd' + 1").unwrap();
    assert_eq!(scope.get("s"), Some(&Value::Text("abcd1".into())));
  }

  #[test]
  fn rotate_labels_is_an_on_off_flag() {
    for (arg, expected) in [("0", false), ("45", true), ("90", true), ("True", true), ("False", false)] {
      let mut scope = run(&format!("import chart\nfig = chart.bar(x=['a'], y=[1], rotate_labels={})", arg)).unwrap();
      let Some(Value::Figure(figure)) = scope.take("fig") else { panic!("fig should be a figure") };
      assert_eq!(figure.rotate_labels, expected, "rotate_labels={}", arg);
    }
  }
}
