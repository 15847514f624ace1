//! Ex expression lexer, AST, parser, and evaluator.
//!
//! This is the small default expression model the interpreter ships with:
//! numbers, strings, lists, variables, arithmetic, string concatenation,
//! comparison, regex match, logic, and a handful of functions.
//!
//! Operator precedence (lowest → highest):
//!   or  →  and  →  relational  →  additive/concat  →  multiplicative  →
//!   unary  →  primary

use regex::Regex;

use crate::var::VarStore;

use super::error::ExError;
use super::value::Value;

/// Longest list `range()` will build.
pub const MAX_RANGE_LEN: i128 = 1_000_000;

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Str(String),
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,
    Bang,

    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Match,
    NotMatch,

    And,
    Or,

    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a str,
    chars: std::str::Chars<'a>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            chars: src.chars(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Byte offset of the next unread character.
    fn offset(&self) -> usize {
        self.src.len() - self.chars.as_str().len()
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn read_number(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        Token::Int(s.parse().unwrap_or(i64::MAX))
    }

    /// `"..."` with backslash escapes.
    fn read_double_quoted(&mut self) -> Token {
        let mut s = String::new();
        while let Some(c) = self.chars.next() {
            match c {
                '"' => break,
                '\\' => match self.chars.next() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('e') => s.push('\x1b'),
                    Some(other) => s.push(other),
                    None => break,
                },
                other => s.push(other),
            }
        }
        Token::Str(s)
    }

    /// `'...'` literal; `''` stands for one quote.
    fn read_single_quoted(&mut self) -> Token {
        let mut s = String::new();
        while let Some(c) = self.chars.next() {
            if c == '\'' {
                if self.eat('\'') {
                    s.push('\'');
                } else {
                    break;
                }
            } else {
                s.push(c);
            }
        }
        Token::Str(s)
    }

    fn read_ident(&mut self, first: char) -> Token {
        let mut s = String::from(first);
        // Scope prefix: g:name, v:name, ...
        if "gblwtsv".contains(first) && self.peek() == Some(':') {
            s.push(':');
            self.chars.next();
        }
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        Token::Ident(s)
    }

    fn next_token(&mut self) -> Token {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.chars.next();
        }
        let Some(ch) = self.chars.next() else {
            return Token::Eof;
        };
        match ch {
            '0'..='9' => self.read_number(ch),
            '"' => self.read_double_quoted(),
            '\'' => self.read_single_quoted(),
            'a'..='z' | 'A'..='Z' | '_' => self.read_ident(ch),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '.' => {
                self.eat('.');
                Token::Dot
            }
            '!' => {
                if self.eat('=') {
                    Token::Ne
                } else if self.eat('~') {
                    Token::NotMatch
                } else {
                    Token::Bang
                }
            }
            '=' => {
                if self.eat('=') {
                    Token::Eq
                } else if self.eat('~') {
                    Token::Match
                } else {
                    Token::Unknown('=')
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' if self.eat('&') => Token::And,
            '|' if self.eat('|') => Token::Or,
            ',' => Token::Comma,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            c => Token::Unknown(c),
        }
    }

    /// Tokens paired with the byte offset just past each one.
    fn tokenize(mut self) -> Vec<(Token, usize)> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let done = t == Token::Eof;
            tokens.push((t, self.offset()));
            if done {
                break;
            }
        }
        tokens
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Match,
    NotMatch,
    And,
    Or,
}

#[derive(Debug, Clone, Copy)]
enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone)]
enum Expr {
    Literal(Value),
    Var(String),
    List(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

type ParseResult = Result<Expr, String>;

impl Parser {
    fn new(src: &str) -> Self {
        Parser {
            tokens: Lexer::new(src).tokenize(),
            pos: 0,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map_or(&Token::Eof, |(t, _)| t)
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        self.pos += 1;
        t
    }

    /// Byte offset just past the last consumed token.
    fn consumed(&self) -> usize {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some((_, end)) => *end,
            None => 0,
        }
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.peek() == &Token::Eof
    }

    fn parse_or(&mut self) -> ParseResult {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult {
        let mut lhs = self.parse_relational()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> ParseResult {
        let lhs = self.parse_additive()?;
        let op = match self.peek() {
            Token::Eq => BinOp::Eq,
            Token::Ne => BinOp::Ne,
            Token::Lt => BinOp::Lt,
            Token::Le => BinOp::Le,
            Token::Gt => BinOp::Gt,
            Token::Ge => BinOp::Ge,
            Token::Match => BinOp::Match,
            Token::NotMatch => BinOp::NotMatch,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.parse_additive()?;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_additive(&mut self) -> ParseResult {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                Token::Dot => BinOp::Concat,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> ParseResult {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult {
        match self.peek() {
            Token::Minus => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()?)))
            }
            Token::Bang => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.parse_unary()?)))
            }
            Token::Plus => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_args(&mut self, close: &Token) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            if self.eat(close) {
                return Ok(args);
            }
            if !self.eat(&Token::Comma) {
                return Err(format!("expected {close:?}"));
            }
            // Trailing comma before the closing token.
            if self.eat(close) {
                return Ok(args);
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult {
        match self.advance() {
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let args = self.parse_args(&Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Token::LParen => {
                let inner = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    return Err("expected ')'".into());
                }
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::List(self.parse_args(&Token::RBracket)?)),
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

// ── Expression ────────────────────────────────────────────────────────────────

/// A parsed expression together with its source text.
#[derive(Debug, Clone)]
pub struct Expression {
    src: String,
    ast: Expr,
}

impl Expression {
    /// Parse a single expression; trailing tokens are an error.
    pub fn parse(src: &str) -> Result<Self, ExError> {
        let mut parser = Parser::new(src);
        let invalid = || ExError::InvalidExpression(src.trim().to_owned());
        let ast = parser.parse_or().map_err(|_| invalid())?;
        if !parser.at_end() {
            return Err(invalid());
        }
        Ok(Expression {
            src: src.trim().to_owned(),
            ast,
        })
    }

    /// Parse a whitespace-separated sequence of expressions (`:echo a b`).
    pub fn parse_sequence(src: &str) -> Result<Vec<Self>, ExError> {
        let mut parser = Parser::new(src);
        let mut exprs = Vec::new();
        while !parser.at_end() {
            let start = parser.consumed();
            let ast = parser
                .parse_or()
                .map_err(|_| ExError::InvalidExpression(src.trim().to_owned()))?;
            exprs.push(Expression {
                src: src[start..parser.consumed()].trim().to_owned(),
                ast,
            });
        }
        Ok(exprs)
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// Evaluate against the session's variables.
    pub fn evaluate(&self, vars: &VarStore) -> Result<Value, ExError> {
        eval(&self.ast, vars)
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

fn eval(expr: &Expr, vars: &VarStore) -> Result<Value, ExError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),

        Expr::Var(name) => vars
            .get(name)
            .cloned()
            .ok_or_else(|| ExError::UndefinedVariable(name.clone())),

        Expr::List(items) => items
            .iter()
            .map(|e| eval(e, vars))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),

        Expr::Unary(op, inner) => {
            let v = eval(inner, vars)?;
            Ok(match op {
                UnaryOp::Neg => v.arith_neg(),
                UnaryOp::Not => Value::from(!v.as_bool()),
            })
        }

        Expr::Binary(BinOp::And, lhs, rhs) => {
            if !eval(lhs, vars)?.as_bool() {
                return Ok(Value::Int(0));
            }
            Ok(Value::from(eval(rhs, vars)?.as_bool()))
        }

        Expr::Binary(BinOp::Or, lhs, rhs) => {
            if eval(lhs, vars)?.as_bool() {
                return Ok(Value::Int(1));
            }
            Ok(Value::from(eval(rhs, vars)?.as_bool()))
        }

        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, vars)?;
            let r = eval(rhs, vars)?;
            binary(*op, &l, &r)
        }

        Expr::Call(name, args) => {
            let args = args
                .iter()
                .map(|e| eval(e, vars))
                .collect::<Result<Vec<_>, _>>()?;
            call_function(name, args, vars)
        }
    }
}

fn binary(op: BinOp, l: &Value, r: &Value) -> Result<Value, ExError> {
    use std::cmp::Ordering;
    Ok(match op {
        BinOp::Add => l.arith_add(r),
        BinOp::Sub => l.arith_sub(r),
        BinOp::Mul => l.arith_mul(r),
        BinOp::Div => l.arith_div(r)?,
        BinOp::Rem => l.arith_rem(r)?,
        BinOp::Concat => l.concat(r),
        BinOp::Eq => Value::from(l.cmp_value(r) == Ordering::Equal),
        BinOp::Ne => Value::from(l.cmp_value(r) != Ordering::Equal),
        BinOp::Lt => Value::from(l.cmp_value(r) == Ordering::Less),
        BinOp::Le => Value::from(l.cmp_value(r) != Ordering::Greater),
        BinOp::Gt => Value::from(l.cmp_value(r) == Ordering::Greater),
        BinOp::Ge => Value::from(l.cmp_value(r) != Ordering::Less),
        BinOp::Match | BinOp::NotMatch => {
            let pattern = r.to_string();
            let re = Regex::new(&pattern).map_err(|_| ExError::InvalidPattern(pattern))?;
            let hit = re.is_match(&l.to_string());
            Value::from(if matches!(op, BinOp::Match) { hit } else { !hit })
        }
        BinOp::And => Value::from(l.as_bool() && r.as_bool()),
        BinOp::Or => Value::from(l.as_bool() || r.as_bool()),
    })
}

fn expect_args(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), ExError> {
    if args.len() < min {
        return Err(ExError::NotEnoughArguments(name.to_owned()));
    }
    if args.len() > max {
        return Err(ExError::TooManyArguments(name.to_owned()));
    }
    Ok(())
}

fn call_function(name: &str, args: Vec<Value>, vars: &VarStore) -> Result<Value, ExError> {
    match name {
        "len" => {
            expect_args(name, &args, 1, 1)?;
            Ok(Value::Int(match &args[0] {
                Value::List(items) => items.len() as i64,
                other => other.to_string().chars().count() as i64,
            }))
        }
        "range" => {
            expect_args(name, &args, 1, 2)?;
            // range(n) = 0 .. n-1; range(a, b) = a .. b inclusive.
            let (start, end) = match args.as_slice() {
                [a, b] => (a.as_int(), b.as_int()),
                [n, ..] => (0, n.as_int().saturating_sub(1)),
                [] => return Err(ExError::NotEnoughArguments(name.to_owned())),
            };
            let len = i128::from(end) - i128::from(start) + 1;
            if len > MAX_RANGE_LEN {
                return Err(ExError::RangeTooLong(len));
            }
            Ok(Value::List((start..=end).map(Value::Int).collect()))
        }
        "string" => {
            expect_args(name, &args, 1, 1)?;
            Ok(Value::Str(match &args[0] {
                Value::Str(s) => format!("'{}'", s.replace('\'', "''")),
                other => other.to_string(),
            }))
        }
        "exists" => {
            expect_args(name, &args, 1, 1)?;
            Ok(Value::from(vars.contains(&args[0].to_string())))
        }
        _ => Err(ExError::UnknownFunction(format!("{name}()"))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
