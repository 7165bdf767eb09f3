use crate::token::{Token, TokenType, KEYWORDS};
use std::error::Error;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ScanErrorKind {
    #[strum(serialize = "illegal character")]
    IllegalCharacter,
    #[strum(serialize = "malformed identifier")]
    MalformedIdentifier,
    #[strum(serialize = "malformed number")]
    MalformedNumber,
    #[strum(serialize = "unterminated string")]
    UnterminatedString,
    #[strum(serialize = "misused operator")]
    MisusedOperator,
    #[strum(serialize = "unterminated comment")]
    UnterminatedComment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}, column {}] Error: {}",
            self.line, self.column, self.message
        )
    }
}

impl Error for ScanError {}

/// State carried from one line to the next. Only an open block comment
/// survives a line break; it remembers where the comment was opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexState {
    comment: Option<(usize, usize)>,
}

// Note: `column` is the 1-based column of the next unread character.
struct Scanner<'a, 'b> {
    source: &'a str,
    iter: Peekable<CharIndices<'a>>,
    start: usize,
    start_column: usize,
    line: usize,
    column: usize,
    comment: Option<(usize, usize)>,
    tokens: &'b mut Vec<Token>,
    errors: &'b mut Vec<ScanError>,
}

pub fn scan_tokens(source: &str) -> (Vec<Token>, Vec<ScanError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<ScanError> = Vec::new();
    let mut state = LexState::default();
    for (idx, text) in source.lines().enumerate() {
        state = scan_line(text, idx + 1, state, &mut tokens, &mut errors);
    }
    if let Some((line, column)) = state.comment {
        errors.push(ScanError {
            kind: ScanErrorKind::UnterminatedComment,
            line,
            column,
            message: "comment opened here is never closed".to_string(),
        });
    }
    (tokens, errors)
}

/// Scans one line of text, appending to `tokens` and `errors`, and returns
/// the state the next line must start in.
pub fn scan_line(
    text: &str,
    line: usize,
    state: LexState,
    tokens: &mut Vec<Token>,
    errors: &mut Vec<ScanError>,
) -> LexState {
    let mut scanner = Scanner {
        source: text,
        iter: text.char_indices().peekable(),
        start: 0,
        start_column: 1,
        line,
        column: 1,
        comment: state.comment,
        tokens,
        errors,
    };
    while let Some(&(idx, _)) = scanner.iter.peek() {
        if scanner.comment.is_some() {
            scanner.skip_comment();
            continue;
        }
        scanner.start = idx;
        scanner.start_column = scanner.column;
        scanner.scan_token();
    }
    LexState {
        comment: scanner.comment,
    }
}

impl<'a, 'b> Scanner<'a, 'b> {
    fn scan_token(&mut self) {
        let c = match self.advance() {
            Some(c) => c,
            None => return,
        };
        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            '[' => self.add_token(TokenType::LeftBracket),
            ']' => self.add_token(TokenType::RightBracket),
            ',' => self.add_token(TokenType::Comma),
            ';' => self.add_token(TokenType::Semicolon),
            '+' => self.add_token(TokenType::Plus),
            '-' => self.minus(),
            '*' => {
                if self.next_if('/') {
                    self.error(
                        ScanErrorKind::MisusedOperator,
                        "'*/' has no matching '/*'".to_string(),
                    );
                } else {
                    self.add_token(TokenType::Star);
                }
            }
            '/' => {
                if self.next_if('/') {
                    while self.advance().is_some() {}
                } else if self.next_if('*') {
                    self.comment = Some((self.line, self.start_column));
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            '=' => {
                if self.next_if('=') {
                    self.add_token(TokenType::EqualEqual);
                } else {
                    self.add_token(TokenType::Assign);
                }
            }
            '<' => {
                if self.next_if('>') {
                    self.add_token(TokenType::NotEqual);
                } else {
                    self.add_token(TokenType::Less);
                }
            }
            '>' => self.add_token(TokenType::Greater),
            '"' => self.string(),
            ' ' | '\r' | '\t' => (),
            '0'..='9' => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            c => self.error(
                ScanErrorKind::IllegalCharacter,
                format!("'{}' is not a recognised character", c),
            ),
        }
    }
    fn skip_comment(&mut self) {
        while let Some(c) = self.advance() {
            if c == '*' && self.next_if('/') {
                self.comment = None;
                return;
            }
        }
    }
    fn minus(&mut self) {
        let binary = self
            .tokens
            .last()
            .map_or(false, |t| t.tokentype.ends_value());
        if binary {
            self.add_token(TokenType::Minus);
        } else if let Some('0'..='9') = self.peek() {
            self.number();
        } else {
            self.error(
                ScanErrorKind::MisusedOperator,
                "'-' must be followed by a number here".to_string(),
            );
        }
    }
    fn number(&mut self) {
        self.digits();
        let mut malformed = false;
        let mut real = false;
        if let Some('.') = self.peek() {
            self.advance();
            real = true;
            if let Some('0'..='9') = self.peek() {
                self.digits();
            } else {
                malformed = true;
            }
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.advance();
                malformed = true;
            } else {
                break;
            }
        }
        let text = self.lexeme();
        let integral = text
            .trim_start_matches('-')
            .split('.')
            .next()
            .unwrap_or("");
        if malformed || (integral.len() > 1 && integral.starts_with('0')) {
            self.error(
                ScanErrorKind::MalformedNumber,
                format!("'{}' is not a valid number", text),
            );
        } else if real {
            self.add_token(TokenType::RealLiteral);
        } else if text.parse::<i64>().is_err() {
            self.error(
                ScanErrorKind::MalformedNumber,
                format!("integer '{}' is out of range", text),
            );
        } else {
            self.add_token(TokenType::IntLiteral);
        }
    }
    fn digits(&mut self) {
        while let Some('0'..='9') = self.peek() {
            self.advance();
        }
    }
    fn identifier(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = self.lexeme();
        match KEYWORDS.get(text) {
            Some(keyword) => self.add_token(*keyword),
            None => {
                let starts_with_letter = text.starts_with(|c: char| c.is_ascii_alphabetic());
                if starts_with_letter && !text.ends_with('_') {
                    self.add_token(TokenType::Identifier);
                } else {
                    self.error(
                        ScanErrorKind::MalformedIdentifier,
                        format!("'{}' is not a valid identifier", text),
                    );
                }
            }
        }
    }
    fn string(&mut self) {
        self.add_token(TokenType::Quote);
        let open_column = self.start_column;
        self.start = self.current();
        self.start_column = self.column;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.advance();
        }
        if let Some('"') = self.peek() {
            self.add_token(TokenType::StringLiteral);
            self.start = self.current();
            self.start_column = self.column;
            self.advance();
            self.add_token(TokenType::Quote);
        } else {
            let message = format!("string \"{}\" is missing its closing quote", self.lexeme());
            self.errors.push(ScanError {
                kind: ScanErrorKind::UnterminatedString,
                line: self.line,
                column: open_column,
                message,
            });
        }
    }
    fn current(&mut self) -> usize {
        match self.iter.peek() {
            None => self.source.len(),
            Some((idx, _)) => *idx,
        }
    }
    fn lexeme(&mut self) -> &'a str {
        let source = self.source;
        let current = self.current();
        &source[self.start..current]
    }
    fn add_token(&mut self, token_type: TokenType) {
        let lexeme = self.lexeme();
        self.tokens
            .push(Token::new(token_type, lexeme, self.line, self.start_column));
    }
    fn error(&mut self, kind: ScanErrorKind, message: String) {
        self.errors.push(ScanError {
            kind,
            line: self.line,
            column: self.start_column,
            message,
        });
    }
    fn peek(&mut self) -> Option<char> {
        self.iter.peek().map(|&(_, c)| c)
    }
    fn next_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            return true;
        }
        false
    }
    fn advance(&mut self) -> Option<char> {
        let next = self.iter.next().map(|(_, c)| c);
        if next.is_some() {
            self.column += 1;
        }
        next
    }
}
