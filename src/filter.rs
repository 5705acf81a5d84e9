//! Instance filter: a small predicate language over reference-row fields.
//!
//! Grammar:
//!   expr    := and (("or" | "||") and)*
//!   and     := unary (("and" | "&&") unary)*
//!   unary   := ("not" | "!") unary | primary
//!   primary := "(" expr ")" | "true" | "false" | operand cmp operand
//!   operand := field | string | number
//!   field   := identifier | row["name"] | [name]
//!   cmp     := == | != | < | <= | > | >=
//!
//! Comparisons are numeric when both sides parse as numbers and textual
//! otherwise. A field absent from the row reads as the empty string.

use crate::error::BenchError;
use crate::reference::ReferenceRow;

use regex::Regex;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(String),
    Text(String),
    /// Parsed value plus source text for textual comparison.
    Number(f64, String),
}

/// Compiled predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Const(bool),
    Not(Box<Filter>),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Compare {
        left: Operand,
        op: CmpOp,
        right: Operand,
    },
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Const(true)
    }
}

impl Filter {
    pub fn compile(source: &str) -> Result<Self, BenchError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            end: source.len(),
        };
        let filter = parser.expr()?;
        if let Some((offset, tok)) = parser.peek() {
            return Err(filter_error(*offset, format!("unexpected {:?}", tok)));
        }
        Ok(filter)
    }

    pub fn matches(&self, row: &ReferenceRow) -> bool {
        match self {
            Filter::Const(b) => *b,
            Filter::Not(inner) => !inner.matches(row),
            Filter::And(a, b) => a.matches(row) && b.matches(row),
            Filter::Or(a, b) => a.matches(row) || b.matches(row),
            Filter::Compare { left, op, right } => {
                let l = resolve(left, row);
                let r = resolve(right, row);
                compare(&l, &r).map_or(*op == CmpOp::Ne, |ord| op.holds(ord))
            }
        }
    }

    /// Rows that pass, in input order.
    pub fn select<'a>(&self, rows: &'a [ReferenceRow]) -> Vec<&'a ReferenceRow> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}

enum Resolved<'a> {
    Text(&'a str),
    Number(f64, &'a str),
}

/// A number when the text parses to a non-NaN float, text otherwise.
fn classify(text: &str) -> Resolved<'_> {
    match text.trim().parse::<f64>() {
        Ok(v) if !v.is_nan() => Resolved::Number(v, text),
        _ => Resolved::Text(text),
    }
}

fn resolve<'a>(operand: &'a Operand, row: &'a ReferenceRow) -> Resolved<'a> {
    match operand {
        Operand::Field(name) => classify(row.field(name).unwrap_or("")),
        Operand::Text(s) => classify(s),
        Operand::Number(v, raw) => Resolved::Number(*v, raw),
    }
}

/// `None` for unordered numbers; only `!=` holds then.
fn compare(l: &Resolved<'_>, r: &Resolved<'_>) -> Option<Ordering> {
    match (l, r) {
        (Resolved::Number(a, _), Resolved::Number(b, _)) => a.partial_cmp(b),
        _ => Some(text_of(l).cmp(text_of(r))),
    }
}

fn text_of<'a>(r: &Resolved<'a>) -> &'a str {
    match r {
        Resolved::Text(s) | Resolved::Number(_, s) => s,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    True,
    False,
    Cmp(CmpOp),
    Field(String),
    Text(String),
    Number(f64, String),
}

fn filter_error(offset: usize, message: impl Into<String>) -> BenchError {
    BenchError::Filter {
        offset,
        message: message.into(),
    }
}

// Alternatives are tried left to right; two-char operators first.
const TOKEN_RE: &str = r#"^\s*(?:(?P<lp>\()|(?P<rp>\))|row\[\s*(?:"(?P<rowd>(?:[^"\\]|\\.)*)"|'(?P<rows>(?:[^'\\]|\\.)*)')\s*\]|\[(?P<br>[^\]]*)\]|"(?P<strd>(?:[^"\\]|\\.)*)"|'(?P<strs>(?:[^'\\]|\\.)*)'|(?P<op>==|!=|<=|>=|&&|\|\||<|>|!)|(?P<num>[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)|(?P<ident>[A-Za-z_][A-Za-z0-9_]*))"#;

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, BenchError> {
    let re = Regex::new(TOKEN_RE).map_err(|e| filter_error(0, e.to_string()))?;
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        if rest.trim().is_empty() {
            break;
        }
        let caps = re
            .captures(rest)
            .ok_or_else(|| filter_error(pos + (rest.len() - rest.trim_start().len()), "unrecognized input"))?;
        let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let offset = pos + (rest.len() - rest.trim_start().len());

        let token = if caps.name("lp").is_some() {
            Token::LParen
        } else if caps.name("rp").is_some() {
            Token::RParen
        } else if let Some(m) = caps.name("rowd").or_else(|| caps.name("rows")) {
            Token::Field(unescape(m.as_str()))
        } else if let Some(m) = caps.name("br") {
            Token::Field(m.as_str().trim().to_string())
        } else if let Some(m) = caps.name("strd").or_else(|| caps.name("strs")) {
            Token::Text(unescape(m.as_str()))
        } else if let Some(m) = caps.name("op") {
            match m.as_str() {
                "==" => Token::Cmp(CmpOp::Eq),
                "!=" => Token::Cmp(CmpOp::Ne),
                "<=" => Token::Cmp(CmpOp::Le),
                ">=" => Token::Cmp(CmpOp::Ge),
                "<" => Token::Cmp(CmpOp::Lt),
                ">" => Token::Cmp(CmpOp::Gt),
                "&&" => Token::And,
                "||" => Token::Or,
                _ => Token::Not,
            }
        } else if let Some(m) = caps.name("num") {
            let raw = m.as_str();
            let v = raw
                .parse::<f64>()
                .map_err(|_| filter_error(offset, format!("bad number {}", raw)))?;
            Token::Number(v, raw.to_string())
        } else if let Some(m) = caps.name("ident") {
            match m.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "true" | "True" => Token::True,
                "false" | "False" => Token::False,
                name => Token::Field(name.to_string()),
            }
        } else {
            return Err(filter_error(offset, "unrecognized input"));
        };

        tokens.push((offset, token));
        pos += whole;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn eat(&mut self, want: &Token) -> bool {
        if matches!(self.peek(), Some((_, t)) if t == want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Filter, BenchError> {
        let mut left = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            left = Filter::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Filter, BenchError> {
        let mut left = self.unary()?;
        while self.eat(&Token::And) {
            let right = self.unary()?;
            left = Filter::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Filter, BenchError> {
        if self.eat(&Token::Not) {
            return Ok(Filter::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Filter, BenchError> {
        match self.advance() {
            Some((_, Token::LParen)) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some((_, Token::RParen)) => Ok(inner),
                    Some((offset, t)) => Err(filter_error(offset, format!("expected ')', got {:?}", t))),
                    None => Err(filter_error(self.end, "expected ')'")),
                }
            }
            Some((_, Token::True)) => Ok(Filter::Const(true)),
            Some((_, Token::False)) => Ok(Filter::Const(false)),
            Some((offset, tok)) => {
                let left = operand(offset, tok)?;
                let op = match self.advance() {
                    Some((_, Token::Cmp(op))) => op,
                    Some((offset, t)) => {
                        return Err(filter_error(offset, format!("expected comparison, got {:?}", t)));
                    }
                    None => return Err(filter_error(self.end, "expected comparison")),
                };
                let right = match self.advance() {
                    Some((offset, tok)) => operand(offset, tok)?,
                    None => return Err(filter_error(self.end, "expected operand")),
                };
                Ok(Filter::Compare { left, op, right })
            }
            None => Err(filter_error(self.end, "unexpected end of filter")),
        }
    }
}

fn operand(offset: usize, tok: Token) -> Result<Operand, BenchError> {
    match tok {
        Token::Field(name) => Ok(Operand::Field(name)),
        Token::Text(s) => Ok(Operand::Text(s)),
        Token::Number(v, raw) => Ok(Operand::Number(v, raw)),
        other => Err(filter_error(offset, format!("expected operand, got {:?}", other))),
    }
}
