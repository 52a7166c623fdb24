//! Restricted math-expression evaluation.
//!
//! Expressions are tokenized and parsed into an AST, then interpreted
//! against the caller's variable table and a closed function set. There is
//! no dynamic code generation; an expression can reach nothing but the
//! variables and functions listed here.

use motif_data::model::VarValue;
use std::collections::HashMap;
use std::f64::consts::{E, PI, TAU};
use thiserror::Error;

pub type VarTable = HashMap<String, VarValue>;

/// Upper bound on `|var:NAME|` substitution passes. Bounded iteration, not
/// cycle detection: a cyclic chain exhausts the cap, keeps its token
/// verbatim, and fails at parse time.
pub const SUBSTITUTION_PASS_LIMIT: usize = 10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("unexpected character `{0}` in expression")]
    UnexpectedChar(char),
    #[error("malformed number literal `{0}`")]
    BadNumber(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("`{name}` takes {expected} argument(s), got {got}")]
    WrongArity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("variable `{0}` does not hold a number")]
    NonNumericVariable(String),
}

/// Replaces every `|var:NAME|` occurrence with the named variable's textual
/// form, repeating while replacements happen (a variable's text may itself
/// reference another variable), capped at [`SUBSTITUTION_PASS_LIMIT`]
/// passes. Unknown names and tokens unresolved at the cap are left verbatim
/// and will fail the subsequent parse.
pub fn substitute_variables(expression: &str, vars: &VarTable) -> String {
    let mut out = expression.to_string();
    for _ in 0..SUBSTITUTION_PASS_LIMIT {
        if !out.contains("|var:") {
            break;
        }
        let mut replaced = false;
        let mut result = String::with_capacity(out.len());
        let mut rest = out.as_str();
        while let Some(start) = rest.find("|var:") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 5..];
            match after.find('|') {
                Some(end) => {
                    let name = &after[..end];
                    if let Some(value) = vars.get(name) {
                        result.push_str(&value.to_string());
                        replaced = true;
                    } else {
                        result.push_str(&rest[start..start + 5 + end + 1]);
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    // No closing bar; nothing left to resolve.
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        out = result;
        if !replaced {
            break;
        }
    }
    out
}

/// Substitutes indirect variable references, parses, and interprets the
/// expression. Any failure is reported as an [`EvalError`]; this never
/// panics and never touches state outside `vars`.
///
/// `random()` makes an expression non-deterministic; everything else is
/// reproducible for a fixed variable table.
pub fn evaluate(expression: &str, vars: &VarTable) -> Result<f64, EvalError> {
    let substituted = substitute_variables(expression, vars);
    let tokens = tokenize(&substituted)?;
    let ast = Parser::new(tokens).parse()?;
    eval(&ast, vars)
}

// Tokenizer

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(v) => v.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Percent => "%".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let bytes = src.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                let text = &src[start..i];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| EvalError::BadNumber(text.to_string()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] as char == '_')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(src[start..i].to_string()));
            }
            other => return Err(EvalError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

// Parser

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Abs,
    Min,
    Max,
    Pow,
    Sqrt,
    Floor,
    Ceil,
    Round,
    Exp,
    Log,
    Random,
}

impl Func {
    fn from_name(name: &str) -> Option<Func> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "abs" => Func::Abs,
            "min" => Func::Min,
            "max" => Func::Max,
            "pow" => Func::Pow,
            "sqrt" => Func::Sqrt,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "round" => Func::Round,
            "exp" => Func::Exp,
            "log" => Func::Log,
            "random" => Func::Random,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Abs => "abs",
            Func::Min => "min",
            Func::Max => "max",
            Func::Pow => "pow",
            Func::Sqrt => "sqrt",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Round => "round",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Random => "random",
        }
    }

    fn arity(self) -> usize {
        match self {
            Func::Min | Func::Max | Func::Pow => 2,
            Func::Random => 0,
            _ => 1,
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn parse(mut self) -> Result<Expr, EvalError> {
        let expr = self.expr()?;
        match self.peek() {
            None => Ok(expr),
            Some(tok) => Err(EvalError::UnexpectedToken(tok.describe())),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<(), EvalError> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(EvalError::UnexpectedToken(tok.describe())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // unary := ('-' | '+') unary | atom
    fn unary(&mut self) -> Result<Expr, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.atom(),
        }
    }

    // atom := NUMBER | IDENT | IDENT '(' args ')' | '(' expr ')'
    fn atom(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let func = Func::from_name(&name)
                        .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
                    let args = self.args()?;
                    if args.len() != func.arity() {
                        return Err(EvalError::WrongArity {
                            name: func.name(),
                            expected: func.arity(),
                            got: args.len(),
                        });
                    }
                    Ok(Expr::Call(func, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(tok) => Err(EvalError::UnexpectedToken(tok.describe())),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn args(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                Some(tok) => return Err(EvalError::UnexpectedToken(tok.describe())),
                None => return Err(EvalError::UnexpectedEnd),
            }
        }
        Ok(args)
    }
}

// Interpreter

fn eval(expr: &Expr, vars: &VarTable) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Var(name) => match vars.get(name) {
            Some(VarValue::Number(value)) => Ok(*value),
            Some(VarValue::Text(_)) => Err(EvalError::NonNumericVariable(name.clone())),
            // User variables shadow the constants.
            None => match name.as_str() {
                "PI" => Ok(PI),
                "TWO_PI" => Ok(TAU),
                "E" => Ok(E),
                _ => Err(EvalError::UnknownVariable(name.clone())),
            },
        },
        Expr::Neg(inner) => Ok(-eval(inner, vars)?),
        Expr::Binary(op, lhs, rhs) => {
            let a = eval(lhs, vars)?;
            let b = eval(rhs, vars)?;
            Ok(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                BinOp::Rem => a % b,
            })
        }
        Expr::Call(func, args) => {
            let mut values = [0.0f64; 2];
            for (slot, arg) in values.iter_mut().zip(args.iter()) {
                *slot = eval(arg, vars)?;
            }
            Ok(match func {
                Func::Sin => values[0].sin(),
                Func::Cos => values[0].cos(),
                Func::Tan => values[0].tan(),
                Func::Abs => values[0].abs(),
                Func::Min => values[0].min(values[1]),
                Func::Max => values[0].max(values[1]),
                Func::Pow => values[0].powf(values[1]),
                Func::Sqrt => values[0].sqrt(),
                Func::Floor => values[0].floor(),
                Func::Ceil => values[0].ceil(),
                Func::Round => values[0].round(),
                Func::Exp => values[0].exp(),
                Func::Log => values[0].ln(),
                Func::Random => rand::random::<f64>(),
            })
        }
    }
}
