use phf::phf_map;
use strum_macros::Display;

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenType {
    // Delimiters.
    LeftParen, RightParen, LeftBrace, RightBrace,
    LeftBracket, RightBracket, Comma, Semicolon, Quote,

    // One or two character operators.
    Plus, Minus, Star, Slash,
    Assign, EqualEqual, NotEqual, Less, Greater,

    // Literals.
    Identifier, IntLiteral, RealLiteral, StringLiteral,

    // Keywords.
    If, Else, While, For, Read, Write,
    Int, Real, Bool, String, True, False,
}

/// The coarse token classes reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenCategory {
    #[strum(serialize = "keyword")]
    Keyword,
    #[strum(serialize = "identifier")]
    Identifier,
    #[strum(serialize = "integer")]
    IntegerLiteral,
    #[strum(serialize = "real")]
    RealLiteral,
    #[strum(serialize = "string")]
    StringLiteral,
    #[strum(serialize = "operator")]
    Operator,
    #[strum(serialize = "delimiter")]
    Delimiter,
}

impl TokenType {
    pub fn category(self) -> TokenCategory {
        match self {
            TokenType::LeftParen
            | TokenType::RightParen
            | TokenType::LeftBrace
            | TokenType::RightBrace
            | TokenType::LeftBracket
            | TokenType::RightBracket
            | TokenType::Comma
            | TokenType::Semicolon
            | TokenType::Quote => TokenCategory::Delimiter,
            TokenType::Plus
            | TokenType::Minus
            | TokenType::Star
            | TokenType::Slash
            | TokenType::Assign
            | TokenType::EqualEqual
            | TokenType::NotEqual
            | TokenType::Less
            | TokenType::Greater => TokenCategory::Operator,
            TokenType::Identifier => TokenCategory::Identifier,
            TokenType::IntLiteral => TokenCategory::IntegerLiteral,
            TokenType::RealLiteral => TokenCategory::RealLiteral,
            TokenType::StringLiteral => TokenCategory::StringLiteral,
            _ => TokenCategory::Keyword,
        }
    }

    /// Type keywords that open a declaration.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            TokenType::Int | TokenType::Real | TokenType::Bool | TokenType::String
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TokenType::EqualEqual | TokenType::NotEqual | TokenType::Less | TokenType::Greater
        )
    }

    /// Whether a `-` following this token is a binary minus.
    pub fn ends_value(self) -> bool {
        matches!(
            self,
            TokenType::Identifier
                | TokenType::IntLiteral
                | TokenType::RealLiteral
                | TokenType::RightParen
                | TokenType::RightBracket
        )
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "if" => TokenType::If,
    "else" => TokenType::Else,
    "while" => TokenType::While,
    "for" => TokenType::For,
    "read" => TokenType::Read,
    "write" => TokenType::Write,
    "int" => TokenType::Int,
    "real" => TokenType::Real,
    "bool" => TokenType::Bool,
    "string" => TokenType::String,
    "true" => TokenType::True,
    "false" => TokenType::False,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tokentype: TokenType,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(tokentype: TokenType, lexeme: &str, line: usize, column: usize) -> Token {
        Token {
            tokentype,
            lexeme: lexeme.to_string(),
            line,
            column,
        }
    }
}
