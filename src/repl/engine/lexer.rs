//! Tokenizer for the default evaluator

use std::iter::Peekable;
use std::str::CharIndices;

use crate::repl::value::Value;

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    BigInt(i128),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    AndAnd,
    OrOr,
}

impl Token {
    /// Source text used in `Unexpected token` diagnostics
    pub fn describe(&self) -> String {
        let text = match self {
            Token::Number(_) | Token::BigInt(_) => return "number".to_string(),
            Token::Str(_) => return "string".to_string(),
            Token::Ident(name) => return format!("identifier '{}'", name),
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::StarStar => "**",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::EqEqEq => "===",
            Token::NotEqEq => "!==",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
        };
        format!("token '{}'", text)
    }
}

/// `SyntaxError` value
pub fn syntax_error(message: impl Into<String>) -> Value {
    Value::error("SyntaxError", message)
}

/// Lexer over one input line
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    /// Tokenize the whole input
    pub fn tokenize(mut self) -> Result<Vec<Token>, Value> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn eat(
        &mut self,
        expected: char,
    ) -> bool {
        if self.peek_char() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Value> {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.chars.next();
        }

        let Some((start, c)) = self.chars.next() else {
            return Ok(None);
        };

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '*' => {
                if self.eat('*') {
                    Token::StarStar
                } else {
                    Token::Star
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
            '=' => {
                if !self.eat('=') {
                    return Err(syntax_error("Invalid left-hand side in assignment"));
                }
                if self.eat('=') {
                    Token::EqEqEq
                } else {
                    Token::EqEq
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        Token::NotEqEq
                    } else {
                        Token::NotEq
                    }
                } else {
                    Token::Bang
                }
            }
            '&' if self.eat('&') => Token::AndAnd,
            '|' if self.eat('|') => Token::OrOr,
            '\'' | '"' => Token::Str(self.scan_string(c)?),
            '.' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => self.scan_number(start)?,
            c if c.is_ascii_digit() => self.scan_number(start)?,
            c if is_identifier_start(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, c)) = self.chars.peek() {
                    if !is_identifier_char(c) {
                        break;
                    }
                    end = i + c.len_utf8();
                    self.chars.next();
                }
                Token::Ident(self.source[start..end].to_string())
            }
            _ => return Err(syntax_error("Invalid or unexpected token")),
        };
        Ok(Some(token))
    }

    fn scan_string(
        &mut self,
        quote: char,
    ) -> Result<String, Value> {
        let mut out = String::new();
        loop {
            let Some((_, c)) = self.chars.next() else {
                return Err(syntax_error("Invalid or unexpected token"));
            };
            match c {
                c if c == quote => return Ok(out),
                '\\' => {
                    let Some((_, escaped)) = self.chars.next() else {
                        return Err(syntax_error("Invalid or unexpected token"));
                    };
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                c => out.push(c),
            }
        }
    }

    fn scan_number(
        &mut self,
        start: usize,
    ) -> Result<Token, Value> {
        let mut end = start + 1;
        while let Some(&(i, c)) = self.chars.peek() {
            let continues = c.is_ascii_alphanumeric()
                || c == '_'
                || c == '.'
                || ((c == '+' || c == '-') && matches!(self.source[..i].chars().last(), Some('e' | 'E')));
            if !continues {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }

        let text: String = self.source[start..end].chars().filter(|&c| c != '_').collect();
        let is_radix = text.len() > 1 && text.starts_with('0') && text[1..].starts_with(['x', 'X', 'o', 'O', 'b', 'B']);

        if let Some(digits) = text.strip_suffix('n') {
            if digits.contains(['.', 'e', 'E']) && !is_radix {
                return Err(syntax_error("Invalid or unexpected token"));
            }
            return match super::numeric::string_to_number(digits) {
                Some(n) if n.fract() == 0.0 && n.abs() < i128::MAX as f64 => Ok(Token::BigInt(n as i128)),
                _ => Err(syntax_error("Invalid or unexpected token")),
            };
        }

        match super::numeric::string_to_number(&text) {
            Some(n) if !text.starts_with(['+', '-']) => Ok(Token::Number(n)),
            _ => Err(syntax_error("Invalid or unexpected token")),
        }
    }
}

pub fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

pub fn is_identifier_char(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}
