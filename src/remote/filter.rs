//! Evaluator for the record filter grammar.
//!
//! Supports the subset the query builder emits plus plain comparisons:
//! `field = value`, `field != value`, `relation.id ?= 'value'`, `&&`, `||`
//! and parentheses. Values are single- or double-quoted strings, `true`,
//! `false`, `null` or numbers. `&&` binds tighter than `||`.

use serde_json::Value;

use crate::types::errors::StoreError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Literal(Value),
    Op(OpKind),
    And,
    Or,
    LParen,
    RParen,
}

/// A parsed filter, ready to be matched against records.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Compare { path: Vec<String>, op: OpKind, value: Value },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpKind {
    Eq,
    NotEq,
    /// Matches when any element of a multi-valued field equals the value.
    AnyEq,
}

fn invalid(msg: impl Into<String>) -> StoreError {
    StoreError::InvalidFilter(msg.into())
}

fn tokenize(input: &str) -> Result<Vec<Token>, StoreError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '&' | '|' => {
                if chars.get(i + 1) != Some(&c) {
                    return Err(invalid(format!("expected '{}{}' at offset {}", c, c, i)));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
                i += 2;
            }
            '?' | '!' => {
                if chars.get(i + 1) != Some(&'=') {
                    return Err(invalid(format!("expected '{}=' at offset {}", c, i)));
                }
                tokens.push(Token::Op(if c == '?' { OpKind::AnyEq } else { OpKind::NotEq }));
                i += 2;
            }
            '=' => {
                tokens.push(Token::Op(OpKind::Eq));
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(invalid("unterminated string literal")),
                        Some('\\') => {
                            if let Some(next) = chars.get(i + 1) {
                                text.push(*next);
                            }
                            i += 2;
                        }
                        Some(ch) if *ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            text.push(*ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Literal(Value::String(text)));
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' || c == '-' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || matches!(chars[i], '_' | '.' | '-'))
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::Literal(Value::Bool(true)),
                    "false" => Token::Literal(Value::Bool(false)),
                    "null" => Token::Literal(Value::Null),
                    _ => match word.parse::<f64>() {
                        Ok(n) => Token::Literal(serde_json::json!(n)),
                        Err(_) => Token::Ident(word),
                    },
                });
            }
            other => return Err(invalid(format!("unexpected character '{}'", other))),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> Result<Filter, StoreError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Filter::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Filter, StoreError> {
        let mut left = self.parse_primary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Filter::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Filter, StoreError> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(invalid("missing closing parenthesis")),
                }
            }
            Some(Token::Ident(name)) => {
                let op = match self.next() {
                    Some(Token::Op(op)) => op,
                    _ => return Err(invalid(format!("expected operator after '{}'", name))),
                };
                let value = match self.next() {
                    Some(Token::Literal(v)) => v,
                    _ => return Err(invalid(format!("expected value after '{}'", name))),
                };
                Ok(Filter::Compare {
                    path: name.split('.').map(str::to_string).collect(),
                    op,
                    value,
                })
            }
            Some(token) => Err(invalid(format!("unexpected token {:?}", token))),
            None => Err(invalid("unexpected end of expression")),
        }
    }
}

/// Parses a filter expression. An empty or blank string matches everything.
pub fn parse(input: &str) -> Result<Filter, StoreError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(Filter::All);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let filter = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(invalid(format!(
            "unexpected trailing token {:?}",
            parser.tokens[parser.pos]
        )));
    }
    Ok(filter)
}

/// Resolves a field path. `relation.id` reads the stored relation id(s).
fn resolve<'a>(record: &'a Value, path: &[String]) -> Option<&'a Value> {
    if path.len() == 2 && path[1] == "id" {
        return record.get(&path[0]);
    }
    path.iter().try_fold(record, |current, segment| current.get(segment))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(s), Value::Null) | (Value::Null, Value::String(s)) => s.is_empty(),
        _ => a == b,
    }
}

impl Filter {
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::And(l, r) => l.matches(record) && r.matches(record),
            Filter::Or(l, r) => l.matches(record) || r.matches(record),
            Filter::Compare { path, op, value } => {
                let field = resolve(record, path).unwrap_or(&Value::Null);
                match (field, op) {
                    (Value::Array(items), OpKind::AnyEq) => {
                        items.iter().any(|item| values_equal(item, value))
                    }
                    (Value::Array(items), OpKind::Eq) => {
                        !items.is_empty() && items.iter().all(|item| values_equal(item, value))
                    }
                    (Value::Array(items), OpKind::NotEq) => {
                        !items.iter().any(|item| values_equal(item, value))
                    }
                    (scalar, OpKind::Eq | OpKind::AnyEq) => values_equal(scalar, value),
                    (scalar, OpKind::NotEq) => !values_equal(scalar, value),
                }
            }
        }
    }
}
