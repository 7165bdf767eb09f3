use crate::ast::{Kind, Node, NodeKind, Value, Visitor};
use crate::channel::{InputProvider, OutputSink};
use crate::environment::{element_name, Entry, SymbolTable};
use crate::numeric::{self, ArithmeticError, Operator};
use rust_decimal::Decimal;
use std::convert::TryFrom;
use std::error::Error;
use std::fmt;
use std::fmt::Formatter;
use std::thread;
use strum_macros::Display;

/// Largest number of elements an array declaration may allocate.
pub const MAX_ARRAY_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RuntimeErrorKind {
    #[strum(serialize = "redeclaration")]
    Redeclaration,
    #[strum(serialize = "undeclared")]
    Undeclared,
    #[strum(serialize = "uninitialized")]
    Uninitialized,
    #[strum(serialize = "type mismatch")]
    TypeMismatch,
    #[strum(serialize = "index out of bounds")]
    IndexOutOfBounds,
    #[strum(serialize = "negative index")]
    NegativeIndex,
    #[strum(serialize = "non-integer index")]
    NonIntegerIndex,
    #[strum(serialize = "divide by zero")]
    DivideByZero,
    #[strum(serialize = "invalid array size")]
    InvalidArraySize,
    #[strum(serialize = "overflow")]
    Overflow,
    #[strum(serialize = "invalid input")]
    InvalidInput,
    #[strum(serialize = "malformed tree")]
    MalformedTree,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    fn new(kind: RuntimeErrorKind, line: usize, message: String) -> RuntimeError {
        RuntimeError {
            kind,
            line,
            message,
        }
    }
    fn arithmetic(err: ArithmeticError, line: usize) -> RuntimeError {
        match err {
            ArithmeticError::DivideByZero => RuntimeError::new(
                RuntimeErrorKind::DivideByZero,
                line,
                "divisor cannot be zero".to_string(),
            ),
            ArithmeticError::Overflow => RuntimeError::new(
                RuntimeErrorKind::Overflow,
                line,
                "arithmetic result is out of range".to_string(),
            ),
        }
    }
    fn malformed(node: &Node) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::MalformedTree,
            node.line,
            format!("unexpected {} node", node.kind),
        )
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error: {}", self.line, self.message)
    }
}

impl Error for RuntimeError {}

type Exec = Result<(), RuntimeError>;

/// A resolved variable or array element.
struct Slot {
    name: String,
    kind: Kind,
}

pub struct Interpreter<'a> {
    environment: SymbolTable,
    level: usize,
    input: &'a mut dyn InputProvider,
    output: &'a mut dyn OutputSink,
    errors: Vec<RuntimeError>,
}

impl<'a> Visitor<Exec> for Interpreter<'a> {
    fn visit(&mut self, stmt: &Node) -> Exec {
        match stmt.kind {
            NodeKind::Declare => self.declare(stmt),
            NodeKind::Assign => self.assign(stmt),
            NodeKind::If => self.if_statement(stmt),
            NodeKind::While => self.while_statement(stmt),
            NodeKind::For => self.for_statement(stmt),
            NodeKind::Read => self.read(stmt),
            NodeKind::Write => self.write(stmt),
            _ => Err(RuntimeError::malformed(stmt)),
        }
    }
}

impl<'a> Interpreter<'a> {
    pub fn new(input: &'a mut dyn InputProvider, output: &'a mut dyn OutputSink) -> Interpreter<'a> {
        Interpreter {
            environment: SymbolTable::new(),
            level: 0,
            input,
            output,
            errors: Vec::new(),
        }
    }
    /// Runs a whole program from a clean symbol table. Top-level statements
    /// carrying syntax errors are reported and skipped.
    pub fn interpret(&mut self, program: &Node) {
        self.environment.reset();
        self.level = 0;
        for stmt in &program.children {
            if stmt.contains_error() {
                self.errors.push(RuntimeError::new(
                    RuntimeErrorKind::MalformedTree,
                    stmt.line,
                    "statement contains a syntax error and was skipped".to_string(),
                ));
                continue;
            }
            self.execute(stmt);
        }
    }
    pub fn execute(&mut self, stmt: &Node) {
        let result: Exec = stmt.accept(self);
        if let Err(err) = result {
            self.errors.push(err);
        }
    }
    /// The binding `name` resolves to at the current scope level.
    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        self.environment.resolve(name, self.level)
    }
    pub fn errors(&self) -> &[RuntimeError] {
        &self.errors
    }
    pub fn into_errors(self) -> Vec<RuntimeError> {
        self.errors
    }

    fn declare(&mut self, stmt: &Node) -> Exec {
        let kind = Kind::from_keyword(&stmt.text).ok_or_else(|| RuntimeError::malformed(stmt))?;
        for item in &stmt.children {
            let result = match item.kind {
                NodeKind::Declarator => self.declarator(kind, item),
                _ => Err(RuntimeError::malformed(item)),
            };
            if let Err(err) = result {
                self.errors.push(err);
            }
        }
        Ok(())
    }
    fn declarator(&mut self, kind: Kind, item: &Node) -> Exec {
        let name = &item.text;
        if self.environment.declared_at_level(name, self.level).is_some() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Redeclaration,
                item.line,
                format!("'{}' is already declared in this block, please rename it", name),
            ));
        }
        let initializer = item.child(NodeKind::Initializer);
        if let Some(subscript) = item.child(NodeKind::Subscript) {
            if initializer.is_some() {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch,
                    item.line,
                    format!("array '{}' cannot have an initializer", name),
                ));
            }
            let size = self.array_size(subscript)?;
            let mut header = Entry::new(name, kind, item.line, self.level);
            header.array_size = Some(size);
            self.environment.insert(header);
            for index in 0..size {
                let element = Entry::new(&element_name(name, index), kind, item.line, self.level);
                self.environment.insert(element);
            }
            return Ok(());
        }
        self.environment
            .insert(Entry::new(name, kind, item.line, self.level));
        if let Some(initializer) = initializer {
            let source = initializer
                .operand()
                .ok_or_else(|| RuntimeError::malformed(initializer))?;
            let value = self.evaluate(source)?;
            let value = coerce(kind, value, name, item.line)?;
            self.store(name, value);
        }
        Ok(())
    }
    fn array_size(&mut self, subscript: &Node) -> Result<usize, RuntimeError> {
        let source = subscript
            .operand()
            .ok_or_else(|| RuntimeError::malformed(subscript))?;
        match self.evaluate(source)? {
            Value::Int(size) if size < 0 => Err(RuntimeError::new(
                RuntimeErrorKind::InvalidArraySize,
                subscript.line,
                format!("array size {} is negative", size),
            )),
            Value::Int(size) => match usize::try_from(size) {
                Ok(size) if size <= MAX_ARRAY_SIZE => Ok(size),
                _ => Err(RuntimeError::new(
                    RuntimeErrorKind::InvalidArraySize,
                    subscript.line,
                    format!("array size {} exceeds the limit of {}", size, MAX_ARRAY_SIZE),
                )),
            },
            other => Err(RuntimeError::new(
                RuntimeErrorKind::InvalidArraySize,
                subscript.line,
                format!("array size must be an int, found {}", other.kind()),
            )),
        }
    }
    fn assign(&mut self, stmt: &Node) -> Exec {
        let (target, source) = operands(stmt)?;
        let slot = self.locate(target)?;
        let value = self.evaluate(source)?;
        let value = coerce(slot.kind, value, &slot.name, stmt.line)?;
        self.store(&slot.name, value);
        Ok(())
    }
    fn if_statement(&mut self, stmt: &Node) -> Exec {
        let condition = stmt
            .child(NodeKind::Condition)
            .ok_or_else(|| RuntimeError::malformed(stmt))?;
        let branch = if self.condition(condition) {
            stmt.child(NodeKind::Block)
        } else {
            stmt.child(NodeKind::Else)
                .and_then(|e| e.child(NodeKind::Block))
        };
        if let Some(block) = branch {
            self.scoped(block);
        }
        Ok(())
    }
    fn while_statement(&mut self, stmt: &Node) -> Exec {
        let condition = stmt
            .child(NodeKind::Condition)
            .ok_or_else(|| RuntimeError::malformed(stmt))?;
        let body = stmt
            .child(NodeKind::Block)
            .ok_or_else(|| RuntimeError::malformed(stmt))?;
        while self.condition(condition) {
            self.scoped(body);
        }
        Ok(())
    }
    fn for_statement(&mut self, stmt: &Node) -> Exec {
        let part = |kind| {
            stmt.child(kind)
                .ok_or_else(|| RuntimeError::malformed(stmt))
        };
        let (init, condition, step, body) = (
            part(NodeKind::Init)?,
            part(NodeKind::Condition)?,
            part(NodeKind::Step)?,
            part(NodeKind::Block)?,
        );
        self.level += 1;
        let result = self.run_for(init, condition, step, body);
        self.level -= 1;
        self.environment.discard_above(self.level);
        result
    }
    fn run_for(&mut self, init: &Node, condition: &Node, step: &Node, body: &Node) -> Exec {
        self.assign(init.operand().ok_or_else(|| RuntimeError::malformed(init))?)?;
        let step = step.operand().ok_or_else(|| RuntimeError::malformed(step))?;
        while self.condition(condition) {
            self.scoped(body);
            self.assign(step)?;
        }
        Ok(())
    }
    fn read(&mut self, stmt: &Node) -> Exec {
        let target = stmt.operand().ok_or_else(|| RuntimeError::malformed(stmt))?;
        let slot = self.locate(target)?;
        let text = self.input.next_value();
        let value = parse_input(slot.kind, &text).ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::InvalidInput,
                stmt.line,
                format!("'{}' is not a valid {} value for '{}'", text, slot.kind, target.text),
            )
        })?;
        self.store(&slot.name, value);
        Ok(())
    }
    fn write(&mut self, stmt: &Node) -> Exec {
        let source = stmt.operand().ok_or_else(|| RuntimeError::malformed(stmt))?;
        let value = self.evaluate(source)?;
        self.output.emit(&value.to_string());
        Ok(())
    }

    /// Runs a block body one level deeper, dropping its declarations after.
    fn scoped(&mut self, block: &Node) {
        self.level += 1;
        for stmt in &block.children {
            self.execute(stmt);
        }
        self.level -= 1;
        self.environment.discard_above(self.level);
    }
    /// A condition that cannot be evaluated is reported and counts as false.
    fn condition(&mut self, condition: &Node) -> bool {
        let result = condition
            .operand()
            .ok_or_else(|| RuntimeError::malformed(condition))
            .and_then(|source| match self.evaluate(source)? {
                Value::Bool(b) => Ok(b),
                other => Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch,
                    condition.line,
                    format!("condition must be bool, found {}", other.kind()),
                )),
            });
        match result {
            Ok(b) => b,
            Err(err) => {
                self.errors.push(err);
                false
            }
        }
    }

    fn evaluate(&mut self, node: &Node) -> Result<Value, RuntimeError> {
        match node.kind {
            NodeKind::IntLiteral => node.text.parse::<i64>().map(Value::Int).map_err(|_| {
                RuntimeError::new(
                    RuntimeErrorKind::Overflow,
                    node.line,
                    format!("integer literal {} is out of range", node.text),
                )
            }),
            NodeKind::RealLiteral => node
                .text
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|_| RuntimeError::malformed(node)),
            NodeKind::BoolLiteral => Ok(Value::Bool(node.text == "true")),
            NodeKind::StringLiteral => Ok(Value::Text(node.text.clone())),
            NodeKind::Identifier => self.load(node),
            NodeKind::Arithmetic => self.arithmetic(node),
            NodeKind::Comparison => self.comparison(node),
            _ => Err(RuntimeError::malformed(node)),
        }
    }
    /// Integer arithmetic when both operands are ints, otherwise one decimal
    /// operation reduced to single precision.
    fn arithmetic(&mut self, node: &Node) -> Result<Value, RuntimeError> {
        let op = operator(node)?;
        let (left, right) = operands(node)?;
        let l = self.evaluate(left)?;
        let r = self.evaluate(right)?;
        let result = match (&l, &r) {
            (Value::Int(a), Value::Int(b)) => numeric::integer(op, *a, *b).map(Value::Int),
            _ => {
                let (a, b) = (to_decimal(&l, left)?, to_decimal(&r, right)?);
                numeric::decimal(op, a, b).map(Value::Real)
            }
        };
        result.map_err(|e| RuntimeError::arithmetic(e, node.line))
    }
    fn comparison(&mut self, node: &Node) -> Result<Value, RuntimeError> {
        let (left, right) = operands(node)?;
        let l = self.evaluate(left)?;
        let l = to_decimal(&l, left)?;
        let r = self.evaluate(right)?;
        let r = to_decimal(&r, right)?;
        let result = match node.text.as_str() {
            "==" => l == r,
            "<>" => l != r,
            "<" => l < r,
            ">" => l > r,
            _ => return Err(RuntimeError::malformed(node)),
        };
        Ok(Value::Bool(result))
    }

    /// Resolves an identifier, with its subscript if any, to a storage slot.
    fn locate(&mut self, ident: &Node) -> Result<Slot, RuntimeError> {
        let (kind, size) = match self.environment.resolve(&ident.text, self.level) {
            Some(entry) => (entry.kind, entry.array_size),
            None => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::Undeclared,
                    ident.line,
                    format!("'{}' is not declared", ident.text),
                ))
            }
        };
        match (ident.children.first(), size) {
            (None, None) => Ok(Slot {
                name: ident.text.clone(),
                kind,
            }),
            (None, Some(_)) => Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch,
                ident.line,
                format!("array '{}' is used without an index", ident.text),
            )),
            (Some(subscript), None) if subscript.kind == NodeKind::Subscript => {
                Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch,
                    ident.line,
                    format!("'{}' is not an array", ident.text),
                ))
            }
            (Some(subscript), Some(size)) if subscript.kind == NodeKind::Subscript => {
                let index = self.index(subscript, &ident.text, size)?;
                Ok(Slot {
                    name: element_name(&ident.text, index),
                    kind,
                })
            }
            (Some(other), _) => Err(RuntimeError::malformed(other)),
        }
    }
    fn index(&mut self, subscript: &Node, base: &str, size: usize) -> Result<usize, RuntimeError> {
        let source = subscript
            .operand()
            .ok_or_else(|| RuntimeError::malformed(subscript))?;
        match self.evaluate(source)? {
            Value::Int(index) if index < 0 => Err(RuntimeError::new(
                RuntimeErrorKind::NegativeIndex,
                subscript.line,
                format!("index {} of '{}' is negative", index, base),
            )),
            Value::Int(index) if index as u64 >= size as u64 => Err(RuntimeError::new(
                RuntimeErrorKind::IndexOutOfBounds,
                subscript.line,
                format!("index {} is out of bounds for '{}' of size {}", index, base, size),
            )),
            Value::Int(index) => Ok(index as usize),
            other => Err(RuntimeError::new(
                RuntimeErrorKind::NonIntegerIndex,
                subscript.line,
                format!("index of '{}' must be an int, found {}", base, other.kind()),
            )),
        }
    }
    /// Reads a variable: it must be declared, visible and initialized.
    fn load(&mut self, ident: &Node) -> Result<Value, RuntimeError> {
        let slot = self.locate(ident)?;
        self.environment
            .resolve(&slot.name, self.level)
            .and_then(|entry| entry.value.clone())
            .ok_or_else(|| {
                RuntimeError::new(
                    RuntimeErrorKind::Uninitialized,
                    ident.line,
                    format!("'{}' is used before initialization", ident.text),
                )
            })
    }
    fn store(&mut self, name: &str, value: Value) {
        if let Some(entry) = self.environment.resolve_mut(name, self.level) {
            entry.value = Some(value);
        }
    }
}

/// Runs `program` on its own thread. The handle yields the runtime
/// diagnostics once the program finishes.
pub fn spawn<I, O>(program: Node, mut input: I, mut output: O) -> thread::JoinHandle<Vec<RuntimeError>>
where
    I: InputProvider + Send + 'static,
    O: OutputSink + Send + 'static,
{
    thread::spawn(move || {
        let mut interpreter = Interpreter::new(&mut input, &mut output);
        interpreter.interpret(&program);
        interpreter.into_errors()
    })
}

/// Applies the assignment rules for a `target` variable.
fn coerce(target: Kind, value: Value, name: &str, line: usize) -> Result<Value, RuntimeError> {
    match (target, value) {
        (Kind::Int, Value::Int(x)) => Ok(Value::Int(x)),
        (Kind::Real, Value::Int(x)) => Ok(Value::Real(x as f64)),
        (Kind::Real, Value::Real(x)) => Ok(Value::Real(x)),
        (Kind::Bool, Value::Int(x)) => Ok(Value::Bool(x > 0)),
        (Kind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
        (Kind::Text, Value::Text(s)) => Ok(Value::Text(s)),
        (target, value) => Err(RuntimeError::new(
            RuntimeErrorKind::TypeMismatch,
            line,
            format!(
                "cannot assign a {} value to {} variable '{}'",
                value.kind(),
                target,
                name
            ),
        )),
    }
}

fn parse_input(kind: Kind, text: &str) -> Option<Value> {
    match kind {
        Kind::Int if numeric::is_integer(text) => text.parse().ok().map(Value::Int),
        Kind::Real if numeric::is_real(text) || numeric::is_integer(text) => {
            text.parse().ok().map(Value::Real)
        }
        Kind::Bool if text == "true" || text == "false" => Some(Value::Bool(text == "true")),
        Kind::Text => Some(Value::Text(text.to_string())),
        _ => None,
    }
}

fn to_decimal(value: &Value, node: &Node) -> Result<Decimal, RuntimeError> {
    match value {
        Value::Int(x) => Ok(Decimal::from(*x)),
        Value::Real(x) => numeric::to_decimal(*x).map_err(|e| RuntimeError::arithmetic(e, node.line)),
        other => Err(not_numeric(other, node)),
    }
}

fn not_numeric(value: &Value, node: &Node) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::TypeMismatch,
        node.line,
        format!("expected an int or real, found {}", value.kind()),
    )
}

fn operator(node: &Node) -> Result<Operator, RuntimeError> {
    Operator::from_symbol(&node.text).ok_or_else(|| RuntimeError::malformed(node))
}

fn operands(node: &Node) -> Result<(&Node, &Node), RuntimeError> {
    match node.children.as_slice() {
        [left, right] => Ok((left, right)),
        _ => Err(RuntimeError::malformed(node)),
    }
}
