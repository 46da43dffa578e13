use crate::ai_agent::chart::script::lexer::{syntax_error, tokenize, Spanned, Token};
use crate::app::errors::DashboardResult;

pub const MAX_STATEMENTS: usize = 200;
pub const MAX_NESTING: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
}

impl BinaryOp {
  pub fn symbol(&self) -> &'static str {
    match self {
      BinaryOp::Add => "+",
      BinaryOp::Sub => "-",
      BinaryOp::Mul => "*",
      BinaryOp::Div => "/",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Number(f64),
  Str(String),
  Bool(bool),
  List(Vec<Expr>),
  Name(String),
  Call {
    target: String,
    function: String,
    args: Vec<Expr>,
    kwargs: Vec<(String, Expr)>,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
  Neg(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
  Import { module: String, line: usize },
  Assign { name: String, value: Expr, line: usize },
}

pub fn parse(source: &str) -> DashboardResult<Vec<Stmt>> {
  let tokens = tokenize(source)?;
  let mut parser = Parser { tokens, pos: 0, nesting: 0 };
  parser.program()
}

struct Parser {
  tokens: Vec<Spanned>,
  pos: usize,
  nesting: usize,
}

impl Parser {
  fn peek(&self) -> &Token {
    &self.tokens[self.pos].token
  }

  fn line(&self) -> usize {
    self.tokens[self.pos].line
  }

  fn advance(&mut self) -> Token {
    let token = self.tokens[self.pos].token.clone();
    if self.pos + 1 < self.tokens.len() {
      self.pos += 1;
    }
    token
  }

  fn expect(&mut self, expected: Token, what: &str) -> DashboardResult<()> {
    if *self.peek() == expected {
      self.advance();
      Ok(())
    } else {
      Err(syntax_error(self.line(), format!("expected {}, found {}", what, describe(self.peek()))))
    }
  }

  fn ident(&mut self, what: &str) -> DashboardResult<String> {
    match self.advance() {
      Token::Ident(name) => Ok(name),
      other => Err(syntax_error(self.line(), format!("expected {}, found {}", what, describe(&other)))),
    }
  }

  fn program(&mut self) -> DashboardResult<Vec<Stmt>> {
    let mut statements: Vec<Stmt> = Vec::new();

    while *self.peek() != Token::Eof {
      if *self.peek() == Token::Newline {
        self.advance();
        continue;
      }
      if statements.len() == MAX_STATEMENTS {
        return Err(syntax_error(self.line(), format!("scripts are limited to {} statements", MAX_STATEMENTS)));
      }
      statements.push(self.statement()?);
    }

    Ok(statements)
  }

  fn statement(&mut self) -> DashboardResult<Stmt> {
    let line = self.line();
    let name = self.ident("a statement")?;

    if name == "import" {
      let mut module = self.ident("a module name")?;
      while *self.peek() == Token::Dot {
        self.advance();
        module.push('.');
        module.push_str(&self.ident("a module name")?);
      }
      self.expect(Token::Newline, "end of line after import")?;
      return Ok(Stmt::Import { module, line });
    }

    if is_reserved(&name) {
      return Err(syntax_error(line, format!("`{}` statements are not supported", name)));
    }

    self.expect(Token::Assign, "`=`")?;
    let value = self.expression()?;
    self.expect(Token::Newline, "end of line")?;
    Ok(Stmt::Assign { name, value, line })
  }

  fn expression(&mut self) -> DashboardResult<Expr> {
    self.nesting += 1;
    if self.nesting > MAX_NESTING {
      return Err(syntax_error(self.line(), "expression is nested too deeply"));
    }

    let mut lhs = self.term()?;
    loop {
      let op = match self.peek() {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        _ => break,
      };
      self.advance();
      let rhs = self.term()?;
      lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
    }

    self.nesting -= 1;
    Ok(lhs)
  }

  fn term(&mut self) -> DashboardResult<Expr> {
    let mut lhs = self.unary()?;
    loop {
      let op = match self.peek() {
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        _ => break,
      };
      self.advance();
      let rhs = self.unary()?;
      lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn unary(&mut self) -> DashboardResult<Expr> {
    if *self.peek() == Token::Minus {
      self.advance();
      self.nesting += 1;
      if self.nesting > MAX_NESTING {
        return Err(syntax_error(self.line(), "expression is nested too deeply"));
      }
      let inner = self.unary()?;
      self.nesting -= 1;
      return Ok(Expr::Neg(Box::new(inner)));
    }
    self.primary()
  }

  fn primary(&mut self) -> DashboardResult<Expr> {
    let line = self.line();
    match self.advance() {
      Token::Number(n) => Ok(Expr::Number(n)),
      Token::Str(s) => Ok(Expr::Str(s)),
      Token::LParen => {
        let inner = self.expression()?;
        self.expect(Token::RParen, "`)`")?;
        Ok(inner)
      }
      Token::LBracket => {
        let mut items = Vec::new();
        while *self.peek() != Token::RBracket {
          items.push(self.expression()?);
          if *self.peek() == Token::Comma {
            self.advance();
          } else {
            break;
          }
        }
        self.expect(Token::RBracket, "`]`")?;
        Ok(Expr::List(items))
      }
      Token::Ident(name) => match name.as_str() {
        "True" => Ok(Expr::Bool(true)),
        "False" => Ok(Expr::Bool(false)),
        _ if *self.peek() == Token::Dot => {
          self.advance();
          let function = self.ident("a function name")?;
          if *self.peek() != Token::LParen {
            return Err(syntax_error(line, format!("attribute access `{}.{}` is only allowed as a call", name, function)));
          }
          self.advance();
          let (args, kwargs) = self.arguments()?;
          Ok(Expr::Call { target: name, function, args, kwargs })
        }
        _ if *self.peek() == Token::LParen => {
          Err(syntax_error(line, format!("`{}(...)` is not available, call functions through an imported module", name)))
        }
        _ => Ok(Expr::Name(name)),
      },
      other => Err(syntax_error(line, format!("unexpected {}", describe(&other)))),
    }
  }

  fn arguments(&mut self) -> DashboardResult<(Vec<Expr>, Vec<(String, Expr)>)> {
    let mut args = Vec::new();
    let mut kwargs: Vec<(String, Expr)> = Vec::new();

    while *self.peek() != Token::RParen {
      let is_keyword = matches!(self.peek(), Token::Ident(_))
        && self.tokens.get(self.pos + 1).map(|t| &t.token) == Some(&Token::Assign);

      if is_keyword {
        let key = self.ident("an argument name")?;
        self.advance();
        if kwargs.iter().any(|(k, _)| *k == key) {
          return Err(syntax_error(self.line(), format!("argument `{}` given twice", key)));
        }
        kwargs.push((key, self.expression()?));
      } else {
        if !kwargs.is_empty() {
          return Err(syntax_error(self.line(), "positional argument after keyword argument"));
        }
        args.push(self.expression()?);
      }

      if *self.peek() == Token::Comma {
        self.advance();
      } else {
        break;
      }
    }

    self.expect(Token::RParen, "`)`")?;
    Ok((args, kwargs))
  }
}

fn is_reserved(name: &str) -> bool {
  matches!(name, "from" | "def" | "class" | "for" | "while" | "if" | "with" | "lambda" | "exec" | "eval" | "return")
}

fn describe(token: &Token) -> String {
  match token {
    Token::Ident(name) => format!("`{}`", name),
    Token::Number(n) => format!("number {}", n),
    Token::Str(_) => "a string".to_string(),
    Token::Newline => "end of line".to_string(),
    Token::Eof => "end of script".to_string(),
    other => format!("{:?}", other),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::errors::DashboardError;
  use pretty_assertions::assert_eq;

  #[test]
  fn parses_imports_and_calls() {
    let program = parse("import chart\nfig = chart.bar(x=['a'], y=[1 / 2], title=\"t\")").unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(program[0], Stmt::Import { module: "chart".into(), line: 1 });

    match &program[1] {
      Stmt::Assign { name, value: Expr::Call { target, function, args, kwargs }, line } => {
        assert_eq!(name, "fig");
        assert_eq!(target, "chart");
        assert_eq!(function, "bar");
        assert!(args.is_empty());
        assert_eq!(kwargs.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), vec!["x", "y", "title"]);
        assert_eq!(*line, 2);
      }
      other => panic!("unexpected statement {:?}", other),
    }
  }

  #[test]
  fn precedence_binds_multiplication_tighter() {
    let program = parse("x = 1 + 2 * 3").unwrap();
    let Stmt::Assign { value, .. } = &program[0] else { panic!("expected assignment") };
    assert_eq!(*value, Expr::Binary {
      op: BinaryOp::Add,
      lhs: Box::new(Expr::Number(1.0)),
      rhs: Box::new(Expr::Binary { op: BinaryOp::Mul, lhs: Box::new(Expr::Number(2.0)), rhs: Box::new(Expr::Number(3.0)) }),
    });
  }

  #[test]
  fn dotted_imports_parse_but_aliases_do_not() {
    assert_eq!(parse("import matplotlib.pyplot").unwrap()[0], Stmt::Import { module: "matplotlib.pyplot".into(), line: 1 });
    assert!(parse("import matplotlib.pyplot as plt").is_err());
    assert!(parse("from os import system").is_err());
  }

  #[test]
  fn bare_function_calls_are_rejected() {
    let err = parse("x = open('secrets.txt')").unwrap_err();
    assert!(matches!(err, DashboardError::Execution(ref msg) if msg.contains("open")));
  }

  #[test]
  fn deep_nesting_is_rejected_without_overflow() {
    let source = format!("x = {}1{}", "(".repeat(500), ")".repeat(500));
    assert!(parse(&source).is_err());
    let source = format!("x = {}1", "-".repeat(500));
    assert!(parse(&source).is_err());
  }

  #[test]
  fn statement_count_is_bounded() {
    let source = "x = 1\n".repeat(MAX_STATEMENTS + 1);
    assert!(parse(&source).is_err());
    let source = "x = 1\n".repeat(MAX_STATEMENTS);
    assert_eq!(parse(&source).unwrap().len(), MAX_STATEMENTS);
  }
}
