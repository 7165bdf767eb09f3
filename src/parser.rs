use super::ast::{Node, NodeKind};
use super::token::{Token, TokenType};
use std::error::Error;
use std::fmt;
use std::fmt::Formatter;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ParseErrorKind {
    #[strum(serialize = "missing delimiter")]
    MissingDelimiter,
    #[strum(serialize = "missing token")]
    MissingToken,
    #[strum(serialize = "invalid statement start")]
    InvalidStatementStart,
    #[strum(serialize = "malformed factor")]
    MalformedFactor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}, column {}] Error: {}",
            self.line, self.column, self.message
        )
    }
}

impl Error for ParseError {}

/// Parses a whole program. Always yields a tree; malformed regions show up
/// as `Error` leaves alongside an entry in the returned diagnostics.
pub fn parse(tokens: &[Token]) -> (Node, Vec<ParseError>) {
    let mut parser = Parser::new(tokens);
    let program = parser.program();
    (program, parser.errors)
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        Parser {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }
    pub fn program(&mut self) -> Node {
        let mut program = Node::new(NodeKind::Program, "", 1);
        while !self.is_at_end() {
            program.push(self.statement());
        }
        program
    }
    fn statement(&mut self) -> Node {
        let token = match self.peek() {
            Some(token) => token,
            None => return self.fail(ParseErrorKind::MissingToken, "expected a statement"),
        };
        match token.tokentype {
            TokenType::Identifier => self.assignment(false),
            TokenType::If => self.if_statement(token),
            TokenType::While => self.while_statement(token),
            TokenType::For => self.for_statement(token),
            TokenType::Read => self.read_statement(token),
            TokenType::Write => self.write_statement(token),
            t if t.is_type() => self.declaration(token),
            _ => {
                let node = self.fail(
                    ParseErrorKind::InvalidStatementStart,
                    &format!("a statement cannot start with '{}'", token.lexeme),
                );
                self.advance();
                node
            }
        }
    }
    fn declaration(&mut self, keyword: &'a Token) -> Node {
        self.advance();
        let mut node = Node::new(NodeKind::Declare, &keyword.lexeme, keyword.line);
        self.declarator(&mut node);
        while self.advance_if(TokenType::Comma) {
            self.declarator(&mut node);
        }
        self.expect(
            &mut node,
            TokenType::Semicolon,
            ParseErrorKind::MissingDelimiter,
            "declaration is missing ';'",
        );
        node
    }
    fn declarator(&mut self, declare: &mut Node) {
        let name = match self.peek() {
            Some(token) if token.tokentype == TokenType::Identifier => token,
            _ => {
                declare.push(self.fail(
                    ParseErrorKind::MissingToken,
                    "declaration expects a variable name",
                ));
                self.advance();
                return;
            }
        };
        self.advance();
        let mut item = Node::new(NodeKind::Declarator, &name.lexeme, name.line);
        if self.check(TokenType::LeftBracket) {
            item.push(self.subscript());
        } else if let Some(next) = self.peek() {
            match next.tokentype {
                TokenType::Assign | TokenType::Semicolon | TokenType::Comma => (),
                _ => {
                    item.push(self.fail(
                        ParseErrorKind::MissingDelimiter,
                        &format!("unexpected '{}' after '{}'", next.lexeme, name.lexeme),
                    ));
                    self.advance();
                }
            }
        }
        if self.advance_if(TokenType::Assign) {
            let line = self.line();
            item.push(Node::new(NodeKind::Initializer, "=", line).with(self.condition()));
        }
        declare.push(item);
    }
    fn assignment(&mut self, in_for: bool) -> Node {
        let name = match self.peek() {
            Some(token) if token.tokentype == TokenType::Identifier => token,
            _ => return self.fail(ParseErrorKind::MissingToken, "expected a variable to assign"),
        };
        self.advance();
        let target = self.identifier(name);
        if !self.advance_if(TokenType::Assign) {
            return self.fail(
                ParseErrorKind::MissingToken,
                &format!("assignment to '{}' is missing '='", name.lexeme),
            );
        }
        let mut node = Node::new(NodeKind::Assign, "=", name.line)
            .with(target)
            .with(self.condition());
        if !in_for {
            self.expect(
                &mut node,
                TokenType::Semicolon,
                ParseErrorKind::MissingDelimiter,
                "assignment is missing ';'",
            );
        }
        node
    }
    fn if_statement(&mut self, keyword: &'a Token) -> Node {
        self.advance();
        let mut node = Node::new(NodeKind::If, &keyword.lexeme, keyword.line);
        self.expect(
            &mut node,
            TokenType::LeftParen,
            ParseErrorKind::MissingDelimiter,
            "'if' is missing '('",
        );
        let line = self.line();
        node.push(Node::new(NodeKind::Condition, "", line).with(self.condition()));
        self.expect(
            &mut node,
            TokenType::RightParen,
            ParseErrorKind::MissingDelimiter,
            "'if' condition is missing ')'",
        );
        node.push(self.block());
        if let Some(token) = self.peek() {
            if token.tokentype == TokenType::Else {
                self.advance();
                let else_branch = Node::new(NodeKind::Else, &token.lexeme, token.line);
                node.push(else_branch.with(self.block()));
            }
        }
        node
    }
    fn while_statement(&mut self, keyword: &'a Token) -> Node {
        self.advance();
        let mut node = Node::new(NodeKind::While, &keyword.lexeme, keyword.line);
        self.expect(
            &mut node,
            TokenType::LeftParen,
            ParseErrorKind::MissingDelimiter,
            "'while' is missing '('",
        );
        let line = self.line();
        node.push(Node::new(NodeKind::Condition, "", line).with(self.condition()));
        self.expect(
            &mut node,
            TokenType::RightParen,
            ParseErrorKind::MissingDelimiter,
            "'while' condition is missing ')'",
        );
        node.push(self.block());
        node
    }
    fn for_statement(&mut self, keyword: &'a Token) -> Node {
        self.advance();
        let mut node = Node::new(NodeKind::For, &keyword.lexeme, keyword.line);
        self.expect(
            &mut node,
            TokenType::LeftParen,
            ParseErrorKind::MissingDelimiter,
            "'for' is missing '('",
        );
        let line = self.line();
        node.push(Node::new(NodeKind::Init, "", line).with(self.assignment(true)));
        if !self.advance_if(TokenType::Semicolon) {
            return self.fail(
                ParseErrorKind::MissingDelimiter,
                "'for' header is missing ';' after the initializer",
            );
        }
        let line = self.line();
        node.push(Node::new(NodeKind::Condition, "", line).with(self.condition()));
        if !self.advance_if(TokenType::Semicolon) {
            return self.fail(
                ParseErrorKind::MissingDelimiter,
                "'for' header is missing ';' after the condition",
            );
        }
        let line = self.line();
        node.push(Node::new(NodeKind::Step, "", line).with(self.assignment(true)));
        self.expect(
            &mut node,
            TokenType::RightParen,
            ParseErrorKind::MissingDelimiter,
            "'for' header is missing ')'",
        );
        node.push(self.block());
        node
    }
    fn read_statement(&mut self, keyword: &'a Token) -> Node {
        self.advance();
        if !self.advance_if(TokenType::LeftParen) {
            return self.fail(ParseErrorKind::MissingDelimiter, "'read' is missing '('");
        }
        let target = match self.peek() {
            Some(token) if token.tokentype == TokenType::Identifier => {
                self.advance();
                self.identifier(token)
            }
            _ => {
                let node = self.fail(ParseErrorKind::MissingToken, "'read' expects a variable");
                self.advance();
                return node;
            }
        };
        if !self.advance_if(TokenType::RightParen) {
            return self.fail(ParseErrorKind::MissingDelimiter, "'read' is missing ')'");
        }
        if !self.advance_if(TokenType::Semicolon) {
            return self.fail(ParseErrorKind::MissingDelimiter, "'read' is missing ';'");
        }
        Node::new(NodeKind::Read, &keyword.lexeme, keyword.line).with(target)
    }
    fn write_statement(&mut self, keyword: &'a Token) -> Node {
        self.advance();
        if !self.advance_if(TokenType::LeftParen) {
            return self.fail(ParseErrorKind::MissingDelimiter, "'write' is missing '('");
        }
        let value = self.expression();
        if !self.advance_if(TokenType::RightParen) {
            return self.fail(ParseErrorKind::MissingDelimiter, "'write' is missing ')'");
        }
        if !self.advance_if(TokenType::Semicolon) {
            return self.fail(ParseErrorKind::MissingDelimiter, "'write' is missing ';'");
        }
        Node::new(NodeKind::Write, &keyword.lexeme, keyword.line).with(value)
    }
    /// `{ statement* }`, or a single statement without braces.
    fn block(&mut self) -> Node {
        let mut block = Node::new(NodeKind::Block, "", self.line());
        if self.advance_if(TokenType::LeftBrace) {
            while let Some(token) = self.peek() {
                if token.tokentype == TokenType::RightBrace {
                    break;
                }
                block.push(self.statement());
            }
            self.expect(
                &mut block,
                TokenType::RightBrace,
                ParseErrorKind::MissingDelimiter,
                "block is missing '}'",
            );
        } else if self.is_at_end() {
            block.push(self.fail(ParseErrorKind::MissingToken, "expected a statement body"));
        } else {
            block.push(self.statement());
        }
        block
    }
    fn condition(&mut self) -> Node {
        let left = self.expression();
        match self.peek() {
            Some(op) if op.tokentype.is_comparison() => {
                self.advance();
                let right = self.expression();
                Node::new(NodeKind::Comparison, &op.lexeme, op.line)
                    .with(left)
                    .with(right)
            }
            _ => left,
        }
    }
    fn expression(&mut self) -> Node {
        let mut expr = self.term();
        while let Some(op) = self.peek() {
            match op.tokentype {
                TokenType::Plus | TokenType::Minus => {
                    self.advance();
                    let right = self.term();
                    expr = Node::new(NodeKind::Arithmetic, &op.lexeme, op.line)
                        .with(expr)
                        .with(right);
                }
                _ => break,
            }
        }
        expr
    }
    fn term(&mut self) -> Node {
        let mut expr = self.factor();
        while let Some(op) = self.peek() {
            match op.tokentype {
                TokenType::Star | TokenType::Slash => {
                    self.advance();
                    let right = self.factor();
                    expr = Node::new(NodeKind::Arithmetic, &op.lexeme, op.line)
                        .with(expr)
                        .with(right);
                }
                _ => break,
            }
        }
        expr
    }
    fn factor(&mut self) -> Node {
        let token = match self.peek() {
            Some(token) => token,
            None => return self.fail(ParseErrorKind::MalformedFactor, "expected a value"),
        };
        match token.tokentype {
            TokenType::IntLiteral => {
                self.advance();
                Node::new(NodeKind::IntLiteral, &token.lexeme, token.line)
            }
            TokenType::RealLiteral => {
                self.advance();
                Node::new(NodeKind::RealLiteral, &token.lexeme, token.line)
            }
            TokenType::True | TokenType::False => {
                self.advance();
                Node::new(NodeKind::BoolLiteral, &token.lexeme, token.line)
            }
            TokenType::Identifier => {
                self.advance();
                self.identifier(token)
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression();
                if self.advance_if(TokenType::RightParen) {
                    expr
                } else {
                    self.fail(ParseErrorKind::MissingDelimiter, "expression is missing ')'")
                }
            }
            TokenType::Quote => {
                self.advance();
                match self.peek() {
                    Some(text) if text.tokentype == TokenType::StringLiteral => {
                        self.advance();
                        let mut node = Node::new(NodeKind::StringLiteral, &text.lexeme, text.line);
                        self.expect(
                            &mut node,
                            TokenType::Quote,
                            ParseErrorKind::MissingDelimiter,
                            "string is missing its closing quote",
                        );
                        node
                    }
                    _ => self.fail(ParseErrorKind::MalformedFactor, "expected string contents"),
                }
            }
            _ => {
                let node = self.fail(
                    ParseErrorKind::MalformedFactor,
                    &format!("'{}' cannot start a value", token.lexeme),
                );
                if token.tokentype != TokenType::Semicolon {
                    self.advance();
                }
                node
            }
        }
    }
    fn identifier(&mut self, name: &'a Token) -> Node {
        let mut node = Node::new(NodeKind::Identifier, &name.lexeme, name.line);
        if self.check(TokenType::LeftBracket) {
            node.push(self.subscript());
        }
        node
    }
    fn subscript(&mut self) -> Node {
        let line = self.line();
        self.advance();
        let index = self.expression();
        if self.advance_if(TokenType::RightBracket) {
            Node::new(NodeKind::Subscript, "[]", line).with(index)
        } else {
            self.fail(ParseErrorKind::MissingDelimiter, "index is missing ']'")
        }
    }
    /// Consumes `expected`, or records the failure as an error leaf in `node`.
    fn expect(
        &mut self,
        node: &mut Node,
        expected: TokenType,
        kind: ParseErrorKind,
        message: &str,
    ) -> bool {
        if self.advance_if(expected) {
            true
        } else {
            node.push(self.fail(kind, message));
            false
        }
    }
    fn fail(&mut self, kind: ParseErrorKind, message: &str) -> Node {
        let (line, column) = self.location();
        self.errors.push(ParseError {
            kind,
            line,
            column,
            message: message.to_string(),
        });
        Node::error(message, line)
    }
    /// Where to blame a failure: the current token if it sits on the same
    /// line as the previous one, otherwise the previous token.
    fn location(&self) -> (usize, usize) {
        match (self.peek(), self.previous()) {
            (Some(cur), Some(prev)) if cur.line != prev.line => (prev.line, prev.column),
            (Some(cur), _) => (cur.line, cur.column),
            (None, Some(prev)) => (prev.line, prev.column),
            (None, None) => (1, 1),
        }
    }
    fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.previous())
            .map_or(1, |t| t.line)
    }
    fn check(&self, expected: TokenType) -> bool {
        self.peek().map_or(false, |t| t.tokentype == expected)
    }
    fn advance_if(&mut self, expected: TokenType) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }
    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.current);
        if token.is_some() {
            self.current += 1;
        }
        token
    }
    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.current)
    }
    fn previous(&self) -> Option<&'a Token> {
        self.current
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
    }
}

#[cfg(test)]
mod parser_tests {
    use crate::ast::{Node, NodeKind};
    use crate::parser::{self, ParseError, ParseErrorKind};
    use crate::scanner;

    fn parse(source: &str) -> (Node, Vec<ParseError>) {
        let (tokens, errors) = scanner::scan_tokens(source);
        assert!(errors.is_empty(), "scan errors: {:?}", errors);
        parser::parse(&tokens)
    }

    fn kinds(nodes: &[Node]) -> Vec<NodeKind> {
        nodes.iter().map(|n| n.kind).collect()
    }

    #[test]
    fn well_formed_program_has_no_errors() {
        let source = "int a = 1, b[3];\n\
                      a = a + 2 * 3;\n\
                      if (a > 1) { write(a); } else write(0);\n\
                      while (a < 10) a = a + 1;\n\
                      for (i = 0; i < 3; i = i + 1) { read(b[i]); }\n\
                      string s = \"hi\";";
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(!program.contains_error());
        assert_eq!(
            kinds(&program.children),
            vec![
                NodeKind::Declare,
                NodeKind::Assign,
                NodeKind::If,
                NodeKind::While,
                NodeKind::For,
                NodeKind::Declare,
            ]
        );
        let declare = &program.children[0];
        assert_eq!(declare.text, "int");
        assert_eq!(kinds(&declare.children), vec![NodeKind::Declarator, NodeKind::Declarator]);
        assert_eq!(declare.children[1].children[0].kind, NodeKind::Subscript);
        let branch = &program.children[2];
        assert_eq!(
            kinds(&branch.children),
            vec![NodeKind::Condition, NodeKind::Block, NodeKind::Else]
        );
        let header = &program.children[4];
        assert_eq!(
            kinds(&header.children),
            vec![NodeKind::Init, NodeKind::Condition, NodeKind::Step, NodeKind::Block]
        );
        let string = &program.children[5].children[0].children[0].children[0];
        assert_eq!(string.kind, NodeKind::StringLiteral);
        assert_eq!(string.text, "hi");
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let (program, errors) = parse("x = 1 - 2 - 3;");
        assert!(errors.is_empty());
        let value = &program.children[0].children[1];
        assert_eq!(value.kind, NodeKind::Arithmetic);
        assert_eq!(value.children[0].kind, NodeKind::Arithmetic);
        assert_eq!(value.children[0].children[0].text, "1");
        assert_eq!(value.children[1].text, "3");
    }

    #[test]
    fn term_binds_tighter_than_expression() {
        let (program, _) = parse("x = 1 + 2 * 3;");
        let value = &program.children[0].children[1];
        assert_eq!(value.text, "+");
        assert_eq!(value.children[1].text, "*");
    }

    #[test]
    fn parentheses_group() {
        let (program, _) = parse("x = (1 + 2) * 3;");
        let value = &program.children[0].children[1];
        assert_eq!(value.text, "*");
        assert_eq!(value.children[0].text, "+");
    }

    #[test]
    fn missing_semicolon_is_soft() {
        let (program, errors) = parse("int a = 1\nint b;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::MissingDelimiter);
        assert_eq!(errors[0].line, 1);
        assert_eq!(program.children.len(), 2);
        assert!(program.children[0].children.last().map_or(false, Node::is_error));
        assert!(!program.children[1].contains_error());
    }

    #[test]
    fn invalid_statement_start_is_hard_and_advances() {
        let (program, errors) = parse("; ) x = 1;");
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ParseErrorKind::InvalidStatementStart));
        assert_eq!(
            kinds(&program.children),
            vec![NodeKind::Error, NodeKind::Error, NodeKind::Assign]
        );
    }

    #[test]
    fn missing_paren_in_if_is_soft() {
        let (program, errors) = parse("if a > 1) write(a);");
        assert_eq!(errors.len(), 1);
        let branch = &program.children[0];
        assert_eq!(branch.kind, NodeKind::If);
        assert_eq!(branch.children[0].kind, NodeKind::Error);
        assert!(branch.child(NodeKind::Block).is_some());
    }

    #[test]
    fn missing_for_semicolon_abandons_the_loop() {
        let (program, errors) = parse("for (i = 0 i < 3; i = i + 1) write(i);");
        assert_eq!(errors[0].kind, ParseErrorKind::MissingDelimiter);
        assert!(program.children[0].is_error());
    }

    #[test]
    fn malformed_factor() {
        let (program, errors) = parse("x = * 2;");
        assert_eq!(errors[0].kind, ParseErrorKind::MalformedFactor);
        assert!(program.children[0].contains_error());
    }

    #[test]
    fn read_without_paren_is_hard() {
        let (program, errors) = parse("read x;");
        assert_eq!(errors[0].kind, ParseErrorKind::MissingDelimiter);
        assert!(program.children[0].is_error());
    }

    #[test]
    fn unbraced_body_takes_one_statement() {
        let (program, errors) = parse("for (i = 0; i < 3; i = i + 1) write(i); write(9);");
        assert!(errors.is_empty());
        assert_eq!(program.children.len(), 2);
        let body = program.children[0].child(NodeKind::Block).map(|b| b.children.len());
        assert_eq!(body, Some(1));
    }

    #[test]
    fn missing_body_at_end_of_input() {
        let (program, errors) = parse("while (true)");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::MissingToken);
        assert!(program.children[0].contains_error());
    }

    #[test]
    fn unclosed_block_reports_missing_brace() {
        let (_, errors) = parse("if (true) { write(1);");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "block is missing '}'");
    }

    #[test]
    fn garbage_always_terminates() {
        let (program, errors) = parse("} } ) ( if while for read write int = == [ ] , else");
        assert!(!errors.is_empty());
        assert!(program.contains_error());
    }

    #[test]
    fn empty_input_gives_empty_program() {
        let (program, errors) = parser::parse(&[]);
        assert!(errors.is_empty());
        assert_eq!(program.kind, NodeKind::Program);
        assert!(program.children.is_empty());
    }
}
