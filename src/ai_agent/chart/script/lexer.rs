use crate::app::errors::{DashboardError, DashboardResult};

pub const MAX_SOURCE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
  Ident(String),
  Number(f64),
  Str(String),
  LParen,
  RParen,
  LBracket,
  RBracket,
  Comma,
  Dot,
  Assign,
  Plus,
  Minus,
  Star,
  Slash,
  Newline,
  Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
  pub token: Token,
  pub line: usize,
}

pub fn syntax_error(line: usize, message: impl AsRef<str>) -> DashboardError {
  DashboardError::Execution(format!("syntax error on line {}: {}", line, message.as_ref()))
}

/// Newlines inside brackets are dropped so calls can span several lines.
pub fn tokenize(source: &str) -> DashboardResult<Vec<Spanned>> {
  if source.len() > MAX_SOURCE_BYTES {
    return Err(DashboardError::Execution(format!("chart script is larger than {} bytes", MAX_SOURCE_BYTES)));
  }

  let chars: Vec<char> = source.chars().collect();
  let mut tokens: Vec<Spanned> = Vec::new();
  let mut line: usize = 1;
  let mut depth: usize = 0;
  let mut i: usize = 0;

  while i < chars.len() {
    let c = chars[i];
    match c {
      '\n' => {
        if depth == 0 && !matches!(tokens.last(), None | Some(Spanned { token: Token::Newline, .. })) {
          tokens.push(Spanned { token: Token::Newline, line });
        }
        line += 1;
        i += 1;
      }
      ' ' | '\t' | '\r' => i += 1,
      '#' => {
        while i < chars.len() && chars[i] != '\n' {
          i += 1;
        }
      }
      '(' | '[' => {
        depth += 1;
        tokens.push(Spanned { token: if c == '(' { Token::LParen } else { Token::LBracket }, line });
        i += 1;
      }
      ')' | ']' => {
        depth = depth.checked_sub(1).ok_or_else(|| syntax_error(line, format!("unmatched `{}`", c)))?;
        tokens.push(Spanned { token: if c == ')' { Token::RParen } else { Token::RBracket }, line });
        i += 1;
      }
      ',' => { tokens.push(Spanned { token: Token::Comma, line }); i += 1; }
      '=' => {
        if chars.get(i + 1) == Some(&'=') {
          return Err(syntax_error(line, "comparisons are not supported"));
        }
        tokens.push(Spanned { token: Token::Assign, line });
        i += 1;
      }
      '+' => { tokens.push(Spanned { token: Token::Plus, line }); i += 1; }
      '-' => { tokens.push(Spanned { token: Token::Minus, line }); i += 1; }
      '*' => {
        if chars.get(i + 1) == Some(&'*') {
          return Err(syntax_error(line, "`**` is not supported"));
        }
        tokens.push(Spanned { token: Token::Star, line });
        i += 1;
      }
      '/' => { tokens.push(Spanned { token: Token::Slash, line }); i += 1; }
      '"' | '\'' => {
        let (text, next, newlines) = lex_string(&chars, i, line)?;
        tokens.push(Spanned { token: Token::Str(text), line });
        line += newlines;
        i = next;
      }
      '.' if chars.get(i + 1).map_or(false, |n| n.is_ascii_digit()) => {
        let (number, next) = lex_number(&chars, i, line)?;
        tokens.push(Spanned { token: Token::Number(number), line });
        i = next;
      }
      '.' => { tokens.push(Spanned { token: Token::Dot, line }); i += 1; }
      c if c.is_ascii_digit() => {
        let (number, next) = lex_number(&chars, i, line)?;
        tokens.push(Spanned { token: Token::Number(number), line });
        i = next;
      }
      c if c.is_alphabetic() || c == '_' => {
        let start = i;
        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
          i += 1;
        }
        tokens.push(Spanned { token: Token::Ident(chars[start..i].iter().collect()), line });
      }
      other => return Err(syntax_error(line, format!("unexpected character {:?}", other))),
    }
  }

  if depth != 0 {
    return Err(syntax_error(line, "unclosed bracket at end of script"));
  }
  if !matches!(tokens.last(), None | Some(Spanned { token: Token::Newline, .. })) {
    tokens.push(Spanned { token: Token::Newline, line });
  }
  tokens.push(Spanned { token: Token::Eof, line });
  Ok(tokens)
}

fn lex_number(chars: &[char], start: usize, line: usize) -> DashboardResult<(f64, usize)> {
  let mut i = start;
  while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '_') {
    i += 1;
  }
  if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
    let mut j = i + 1;
    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
      j += 1;
    }
    if j < chars.len() && chars[j].is_ascii_digit() {
      while j < chars.len() && chars[j].is_ascii_digit() {
        j += 1;
      }
      i = j;
    }
  }

  let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
  let number: f64 = text.parse().map_err(|_| syntax_error(line, format!("invalid number {:?}", text)))?;
  Ok((number, i))
}

fn lex_string(chars: &[char], start: usize, line: usize) -> DashboardResult<(String, usize, usize)> {
  let quote = chars[start];
  let mut text = String::new();
  let mut i = start + 1;
  let mut newlines = 0;

  while i < chars.len() {
    let c = chars[i];
    if c == quote {
      return Ok((text, i + 1, newlines));
    }
    if c == '\n' {
      return Err(syntax_error(line, "string literal is not closed before end of line"));
    }
    if c == '\\' {
      let escaped = chars.get(i + 1).ok_or_else(|| syntax_error(line, "dangling escape in string"))?;
      match escaped {
        'n' => text.push('\n'),
        't' => text.push('\t'),
        '\\' | '"' | '\'' => text.push(*escaped),
        '\n' => newlines += 1,
        other => {
          text.push('\\');
          text.push(*other);
        }
      }
      i += 2;
      continue;
    }
    text.push(c);
    i += 1;
  }

  Err(syntax_error(line, "string literal is not closed"))
}
