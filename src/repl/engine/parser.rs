//! Pratt parser for the default evaluator
//!
//! Handles expression parsing with binding power.

use super::lexer::{syntax_error, Token};
use crate::repl::value::Value;

/// Binding power levels
pub const BP_LOWEST: u8 = 0;
pub const BP_LOGICAL_OR: u8 = 2;
pub const BP_LOGICAL_AND: u8 = 3;
pub const BP_EQUALITY: u8 = 4;
pub const BP_COMPARISON: u8 = 5;
pub const BP_TERM: u8 = 6;
pub const BP_FACTOR: u8 = 7;
pub const BP_EXPONENT: u8 = 8;
pub const BP_UNARY: u8 = 9;

/// Deepest nesting accepted in one line, for both recursion and tree height
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    LooseEq,
    LooseNe,
    StrictEq,
    StrictNe,
    And,
    Or,
}

/// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    BigInt(i128),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call {
        callee: String,
        args: Vec<Expr>,
        construct: bool,
    },
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Throw(Expr),
}

/// Parser state over a token list
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Active `parse_expression` frames
    depth: usize,
    /// Height of the expression most recently produced
    height: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            height: 0,
        }
    }

    /// Parse `stmt (';' stmt)* ';'?`
    pub fn parse_program(mut self) -> Result<Vec<Stmt>, Value> {
        let mut stmts = Vec::new();
        while self.current().is_some() {
            if self.skip(&Token::Semicolon) {
                continue;
            }
            stmts.push(self.parse_statement()?);
            match self.current() {
                None => break,
                Some(Token::Semicolon) => {
                    self.bump();
                }
                Some(token) => return Err(unexpected(token)),
            }
        }
        Ok(stmts)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn skip(
        &mut self,
        token: &Token,
    ) -> bool {
        if self.current() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(
        &mut self,
        token: &Token,
    ) -> Result<(), Value> {
        match self.current() {
            Some(t) if t == token => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => Err(unexpected(t)),
            None => Err(end_of_input()),
        }
    }

    fn parse_statement(&mut self) -> Result<Stmt, Value> {
        if matches!(self.current(), Some(Token::Ident(k)) if k == "throw") {
            self.bump();
            if self.current().is_none() {
                return Err(end_of_input());
            }
            return Ok(Stmt::Throw(self.parse_expression(BP_LOWEST)?));
        }
        Ok(Stmt::Expr(self.parse_expression(BP_LOWEST)?))
    }

    /// Parse an expression whose operators bind tighter than `min_bp`
    pub fn parse_expression(
        &mut self,
        min_bp: u8,
    ) -> Result<Expr, Value> {
        if self.depth >= MAX_NESTING {
            return Err(too_deep());
        }
        self.depth += 1;
        let result = self.parse_infix(min_bp);
        self.depth -= 1;
        result
    }

    fn parse_infix(
        &mut self,
        min_bp: u8,
    ) -> Result<Expr, Value> {
        let mut left = self.parse_prefix()?;
        let mut height = self.height;

        while let Some(token) = self.current() {
            let Some((op, bp, right_assoc)) = infix_binding(token) else {
                break;
            };
            if bp <= min_bp {
                break;
            }
            self.bump();
            let next_bp = if right_assoc { bp - 1 } else { bp };
            let right = self.parse_expression(next_bp)?;
            height = self.grow(height.max(self.height))?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }

        self.height = height;
        Ok(left)
    }

    /// Height of a node over children of height `child`
    fn grow(
        &mut self,
        child: usize,
    ) -> Result<usize, Value> {
        let height = child + 1;
        if height > MAX_NESTING {
            return Err(too_deep());
        }
        self.height = height;
        Ok(height)
    }

    fn parse_prefix(&mut self) -> Result<Expr, Value> {
        let Some(token) = self.bump() else {
            return Err(end_of_input());
        };

        self.height = 0;
        let expr = match token {
            Token::Number(n) => Expr::Number(n),
            Token::BigInt(n) => Expr::BigInt(n),
            Token::Str(s) => Expr::Str(s),
            Token::Minus => self.parse_unary(UnaryOp::Neg)?,
            Token::Plus => self.parse_unary(UnaryOp::Plus)?,
            Token::Bang => self.parse_unary(UnaryOp::Not)?,
            Token::LParen => {
                let inner = self.parse_expression(BP_LOWEST)?;
                self.expect(&Token::RParen)?;
                inner
            }
            Token::LBracket => Expr::Array(self.parse_list(&Token::RBracket, |p| p.parse_expression(BP_LOWEST))?),
            Token::LBrace => Expr::Object(self.parse_list(&Token::RBrace, Parser::parse_property)?),
            Token::Ident(name) => self.parse_identifier(name)?,
            other => return Err(unexpected(&other)),
        };

        // Unary minus may not be the base of `**`
        if let Expr::Unary(..) = expr {
            if self.current() == Some(&Token::StarStar) {
                return Err(syntax_error(
                    "Unary operator used immediately before exponentiation expression. Parenthesis must be used to disambiguate operator precedence",
                ));
            }
        }
        Ok(expr)
    }

    fn parse_unary(
        &mut self,
        op: UnaryOp,
    ) -> Result<Expr, Value> {
        let operand = self.parse_expression(BP_UNARY)?;
        self.grow(self.height)?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_identifier(
        &mut self,
        name: String,
    ) -> Result<Expr, Value> {
        let expr = match name.as_str() {
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            "null" => Expr::Null,
            "undefined" => Expr::Undefined,
            "NaN" => Expr::Number(f64::NAN),
            "Infinity" => Expr::Number(f64::INFINITY),
            "typeof" => self.parse_unary(UnaryOp::TypeOf)?,
            "throw" => return Err(syntax_error("Unexpected token 'throw'")),
            "new" => {
                let callee = match self.bump() {
                    Some(Token::Ident(callee)) => callee,
                    Some(other) => return Err(unexpected(&other)),
                    None => return Err(end_of_input()),
                };
                let args = if self.skip(&Token::LParen) {
                    self.parse_list(&Token::RParen, |p| p.parse_expression(BP_LOWEST))?
                } else {
                    Vec::new()
                };
                Expr::Call {
                    callee,
                    args,
                    construct: true,
                }
            }
            _ if self.skip(&Token::LParen) => Expr::Call {
                callee: name,
                args: self.parse_list(&Token::RParen, |p| p.parse_expression(BP_LOWEST))?,
                construct: false,
            },
            _ => Expr::Ident(name),
        };
        Ok(expr)
    }

    fn parse_property(&mut self) -> Result<(String, Expr), Value> {
        let key = match self.bump() {
            Some(Token::Ident(k)) | Some(Token::Str(k)) => k,
            Some(Token::Number(n)) => crate::repl::value::format_number(n),
            Some(other) => return Err(unexpected(&other)),
            None => return Err(end_of_input()),
        };
        self.expect(&Token::Colon)?;
        Ok((key, self.parse_expression(BP_LOWEST)?))
    }

    /// Comma separated items up to `close`, trailing comma allowed
    fn parse_list<T>(
        &mut self,
        close: &Token,
        mut item: impl FnMut(&mut Parser) -> Result<T, Value>,
    ) -> Result<Vec<T>, Value> {
        let mut items = Vec::new();
        let mut height = 0;
        loop {
            if self.skip(close) {
                break;
            }
            items.push(item(self)?);
            height = height.max(self.height);
            if !self.skip(&Token::Comma) {
                self.expect(close)?;
                break;
            }
        }
        self.grow(height)?;
        Ok(items)
    }
}

fn infix_binding(token: &Token) -> Option<(BinaryOp, u8, bool)> {
    let binding = match token {
        Token::OrOr => (BinaryOp::Or, BP_LOGICAL_OR, false),
        Token::AndAnd => (BinaryOp::And, BP_LOGICAL_AND, false),
        Token::EqEq => (BinaryOp::LooseEq, BP_EQUALITY, false),
        Token::NotEq => (BinaryOp::LooseNe, BP_EQUALITY, false),
        Token::EqEqEq => (BinaryOp::StrictEq, BP_EQUALITY, false),
        Token::NotEqEq => (BinaryOp::StrictNe, BP_EQUALITY, false),
        Token::Lt => (BinaryOp::Lt, BP_COMPARISON, false),
        Token::Le => (BinaryOp::Le, BP_COMPARISON, false),
        Token::Gt => (BinaryOp::Gt, BP_COMPARISON, false),
        Token::Ge => (BinaryOp::Ge, BP_COMPARISON, false),
        Token::Plus => (BinaryOp::Add, BP_TERM, false),
        Token::Minus => (BinaryOp::Sub, BP_TERM, false),
        Token::Star => (BinaryOp::Mul, BP_FACTOR, false),
        Token::Slash => (BinaryOp::Div, BP_FACTOR, false),
        Token::Percent => (BinaryOp::Rem, BP_FACTOR, false),
        Token::StarStar => (BinaryOp::Pow, BP_EXPONENT, true),
        _ => return None,
    };
    Some(binding)
}

fn unexpected(token: &Token) -> Value {
    syntax_error(format!("Unexpected {}", token.describe()))
}

fn end_of_input() -> Value {
    syntax_error("Unexpected end of input")
}

fn too_deep() -> Value {
    Value::error("RangeError", "Maximum call stack size exceeded")
}
