pub mod ast;
pub mod channel;
pub mod debug;
pub mod environment;
pub mod interpreter;
pub mod numeric;
pub mod parser;
pub mod scanner;
pub mod token;

use crate::ast::Node;
use crate::channel::{InputProvider, OutputSink};
use crate::interpreter::{Interpreter, RuntimeError};
use crate::parser::ParseError;
use crate::scanner::ScanError;
use crate::token::Token;

pub use crate::interpreter::spawn;

pub fn lex(text: &str) -> (Vec<Token>, Vec<ScanError>) {
    scanner::scan_tokens(text)
}

pub fn parse(tokens: &[Token]) -> (Node, Vec<ParseError>) {
    parser::parse(tokens)
}

/// Runs `program` on the calling thread and returns its runtime diagnostics.
pub fn run(
    program: &Node,
    input: &mut dyn InputProvider,
    output: &mut dyn OutputSink,
) -> Vec<RuntimeError> {
    let mut interpreter = Interpreter::new(input, output);
    interpreter.interpret(program);
    interpreter.into_errors()
}
