//! Human-readable dumps of the token stream and the parse tree.

use crate::ast::{Node, Visitor};
use crate::token::{Token, TokenType};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display;

/// Numeric token codes shown in token listings.
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive, IntoPrimitive, Display)]
#[repr(u8)]
pub enum TokenCode {
    If = 1,
    Else = 2,
    While = 3,
    For = 4,
    Read = 5,
    Write = 6,
    Int = 7,
    Real = 8,
    Bool = 9,
    String = 10,
    True = 11,
    False = 12,
    Plus = 13,
    Minus = 14,
    Star = 15,
    Slash = 16,
    Assign = 17,
    EqualEqual = 18,
    NotEqual = 19,
    Less = 20,
    Greater = 21,
    LeftParen = 22,
    RightParen = 23,
    LeftBrace = 24,
    RightBrace = 25,
    LeftBracket = 26,
    RightBracket = 27,
    Semicolon = 28,
    Comma = 29,
    Quote = 30,
    IntLiteral = 31,
    RealLiteral = 32,
    StringLiteral = 33,
    Identifier = 34,
}

impl From<TokenType> for TokenCode {
    fn from(tokentype: TokenType) -> TokenCode {
        match tokentype {
            TokenType::If => TokenCode::If,
            TokenType::Else => TokenCode::Else,
            TokenType::While => TokenCode::While,
            TokenType::For => TokenCode::For,
            TokenType::Read => TokenCode::Read,
            TokenType::Write => TokenCode::Write,
            TokenType::Int => TokenCode::Int,
            TokenType::Real => TokenCode::Real,
            TokenType::Bool => TokenCode::Bool,
            TokenType::String => TokenCode::String,
            TokenType::True => TokenCode::True,
            TokenType::False => TokenCode::False,
            TokenType::Plus => TokenCode::Plus,
            TokenType::Minus => TokenCode::Minus,
            TokenType::Star => TokenCode::Star,
            TokenType::Slash => TokenCode::Slash,
            TokenType::Assign => TokenCode::Assign,
            TokenType::EqualEqual => TokenCode::EqualEqual,
            TokenType::NotEqual => TokenCode::NotEqual,
            TokenType::Less => TokenCode::Less,
            TokenType::Greater => TokenCode::Greater,
            TokenType::LeftParen => TokenCode::LeftParen,
            TokenType::RightParen => TokenCode::RightParen,
            TokenType::LeftBrace => TokenCode::LeftBrace,
            TokenType::RightBrace => TokenCode::RightBrace,
            TokenType::LeftBracket => TokenCode::LeftBracket,
            TokenType::RightBracket => TokenCode::RightBracket,
            TokenType::Semicolon => TokenCode::Semicolon,
            TokenType::Comma => TokenCode::Comma,
            TokenType::Quote => TokenCode::Quote,
            TokenType::IntLiteral => TokenCode::IntLiteral,
            TokenType::RealLiteral => TokenCode::RealLiteral,
            TokenType::StringLiteral => TokenCode::StringLiteral,
            TokenType::Identifier => TokenCode::Identifier,
        }
    }
}

pub fn code_of(token: &Token) -> u8 {
    TokenCode::from(token.tokentype).into()
}

/// One row per token: position, code, category and text.
pub fn format_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&format!(
            "{:>4}:{:<4} {:>3}  {:<16} {}\n",
            token.line,
            token.column,
            code_of(token),
            token.tokentype.category().to_string(),
            token.lexeme
        ));
    }
    out
}

/// Renders a tree one node per line, indented four spaces per level.
pub struct TreePrinter {
    depth: usize,
}

impl TreePrinter {
    pub fn new() -> TreePrinter {
        TreePrinter { depth: 0 }
    }
}

impl Visitor<String> for TreePrinter {
    fn visit(&mut self, n: &Node) -> String {
        let mut out = "    ".repeat(self.depth);
        if n.text.is_empty() {
            out.push_str(&n.kind.to_string());
        } else {
            out.push_str(&format!("{} [{}]", n.kind, n.text));
        }
        out.push('\n');
        self.depth += 1;
        for child in &n.children {
            let rendered: String = child.accept(self);
            out.push_str(&rendered);
        }
        self.depth -= 1;
        out
    }
}

pub fn format_tree(root: &Node) -> String {
    root.accept(&mut TreePrinter::new())
}
