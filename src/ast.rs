use crate::numeric;
use std::fmt;
use std::fmt::Formatter;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NodeKind {
    Program,
    Declare,
    Declarator,
    Initializer,
    Assign,
    If,
    Else,
    While,
    For,
    Init,
    Step,
    Condition,
    Block,
    Read,
    Write,
    Identifier,
    Subscript,
    IntLiteral,
    RealLiteral,
    BoolLiteral,
    StringLiteral,
    Arithmetic,
    Comparison,
    Error,
}

/// A parse tree node. Each node owns its children outright.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub text: String,
    pub line: usize,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, text: &str, line: usize) -> Node {
        Node {
            kind,
            text: text.to_string(),
            line,
            children: Vec::new(),
        }
    }
    pub fn error(message: &str, line: usize) -> Node {
        Node::new(NodeKind::Error, message, line)
    }
    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }
    pub fn with(mut self, child: Node) -> Node {
        self.children.push(child);
        self
    }
    pub fn is_error(&self) -> bool {
        self.kind == NodeKind::Error
    }
    /// First child of the given kind.
    pub fn child(&self, kind: NodeKind) -> Option<&Node> {
        self.children.iter().find(|c| c.kind == kind)
    }
    /// First child that is not an error leaf.
    pub fn operand(&self) -> Option<&Node> {
        self.children.iter().find(|c| !c.is_error())
    }
    pub fn contains_error(&self) -> bool {
        self.is_error() || self.children.iter().any(Node::contains_error)
    }
    pub fn accept<T>(&self, v: &mut dyn Visitor<T>) -> T {
        v.visit(self)
    }
}

pub trait Visitor<Output> {
    fn visit(&mut self, n: &Node) -> Output;
}

/// Declared type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Kind {
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "real")]
    Real,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "string")]
    Text,
}

impl Kind {
    pub fn from_keyword(keyword: &str) -> Option<Kind> {
        match keyword {
            "int" => Some(Kind::Int),
            "real" => Some(Kind::Real),
            "bool" => Some(Kind::Bool),
            "string" => Some(Kind::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Real(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int(_) => Kind::Int,
            Value::Real(_) => Kind::Real,
            Value::Bool(_) => Kind::Bool,
            Value::Text(_) => Kind::Text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(x) => write!(f, "{}", x),
            Value::Real(x) => write!(f, "{}", numeric::format_real(*x)),
            Value::Bool(x) => write!(f, "{}", x),
            Value::Text(x) => write!(f, "{}", x),
        }
    }
}

#[cfg(test)]
mod ast_tests {
    use crate::ast::{Kind, Node, NodeKind, Value};

    #[test]
    fn child_lookup_skips_error_leaves() {
        let node = Node::new(NodeKind::While, "while", 1)
            .with(Node::error("missing '('", 1))
            .with(Node::new(NodeKind::Condition, "", 1))
            .with(Node::new(NodeKind::Block, "", 1));
        assert!(node.child(NodeKind::Condition).is_some());
        assert_eq!(node.operand().map(|n| n.kind), Some(NodeKind::Condition));
        assert!(node.contains_error());
        assert!(!node.children[2].contains_error());
    }

    #[test]
    fn values_display_like_the_language_prints_them() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Real(3.0).to_string(), "3.0");
        assert_eq!(Value::Real(0.25).to_string(), "0.25");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Text("hi".to_string()).to_string(), "hi");
        assert_eq!(Value::Text(String::new()).kind(), Kind::Text);
    }

    #[test]
    fn kinds_from_type_keywords() {
        assert_eq!(Kind::from_keyword("string"), Some(Kind::Text));
        assert_eq!(Kind::from_keyword("real"), Some(Kind::Real));
        assert_eq!(Kind::from_keyword("while"), None);
        assert_eq!(Kind::Text.to_string(), "string");
    }
}
