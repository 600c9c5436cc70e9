//! Tree‑walking evaluator.
//!
//! The interpreter owns the global frame, a pointer to the frame currently in
//! scope and the resolver's `ExprId → distance` table.  `print` writes through
//! a pluggable sink so embedders and tests can capture program output.

use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::ops::Range;
use std::rc::Rc;

use log::{debug, info};

use crate::callable::{Callable, Class, Function, Instance, NativeFunction};
use crate::environment::Environment;
use crate::error::{LoxError, Result, RunError};
use crate::expr::{Expr, ExprId, ExprKind};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.  `Return` unwinds to the nearest function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal(Value),
    Return(Value),
}

/// Destination of `print` statements.
pub type OutputSink = Box<dyn FnMut(&Value)>;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    next_expr_id: u32,
    /// Expression ids of every program that went through the resolver.  A
    /// name from these without a recorded distance is a global; names from
    /// unresolved code are looked up through the current frame chain.
    resolved: Vec<Range<u32>>,
    output: OutputSink,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with `clock` defined.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::Native(Rc::new(NativeFunction::clock()))),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            next_expr_id: 0,
            resolved: Vec::new(),
            output: Box::new(|value: &Value| println!("{}", value)),
        }
    }

    /// Replace the `print` sink.
    pub fn with_output<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&Value) + 'static,
    {
        self.output = Box::new(sink);
        self
    }

    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        Rc::clone(&self.globals)
    }

    // ───────────────────────────── entry points ─────────────────────────────

    /// Scan, parse, resolve and execute a whole program, yielding the value
    /// of its last statement.
    pub fn run(&mut self, source: &str) -> std::result::Result<Value, RunError> {
        info!("Running program of {} byte(s)", source.len());

        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();

        if !scan_errors.is_empty() {
            return Err(RunError::Syntax(scan_errors));
        }

        let first_id = self.next_expr_id;
        let mut parser = Parser::starting_at(tokens, first_id);
        let (statements, parse_errors) = parser.parse();
        self.next_expr_id = parser.next_id();

        if !parse_errors.is_empty() {
            return Err(RunError::Syntax(parse_errors));
        }

        Resolver::new(self)
            .resolve(&statements)
            .map_err(RunError::Resolve)?;

        self.resolved.push(first_id..self.next_expr_id);
        self.interpret(&statements).map_err(RunError::Runtime)
    }

    /// Evaluate a single expression without a resolver pass.
    pub fn run_expression(&mut self, source: &str) -> Result<Value> {
        let tokens = scan_strict(source)?;

        let mut parser = Parser::starting_at(tokens, self.next_expr_id);
        let parsed = parser.parse_expression();
        self.next_expr_id = parser.next_id();

        self.evaluate(&parsed?)
    }

    /// Execute a single declaration or statement without a resolver pass.
    pub fn run_statement(&mut self, source: &str) -> Result<Value> {
        let tokens = scan_strict(source)?;

        let mut parser = Parser::starting_at(tokens, self.next_expr_id);
        let parsed = parser.parse_statement();
        self.next_expr_id = parser.next_id();

        match self.execute(&parsed?)? {
            Completion::Normal(value) | Completion::Return(value) => Ok(value),
        }
    }

    /// Record that the variable reference `id` lives `depth` frames out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local {} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    // ─────────────────────────────── statements ─────────────────────────────

    /// Execute statements in order; stops at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<Value> {
        debug!("Interpreting {} statement(s)", statements.len());

        let mut last = Value::Nil;

        for stmt in statements {
            match self.execute(stmt)? {
                Completion::Normal(value) => last = value,
                Completion::Return(value) => return Ok(value),
            }
        }

        info!("Interpretation completed successfully");

        Ok(last)
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Completion> {
        match stmt {
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr)?;
                Ok(Completion::Normal(value))
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                debug!("Printing a {}", value.type_name());
                (self.output)(&value);

                Ok(Completion::Normal(Value::Nil))
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Completion::Normal(Value::Nil))
            }

            Stmt::Block(statements) => {
                let env = Environment::child_of(&self.environment);
                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let completion = if self.condition(condition)? {
                    self.execute(then_branch)?
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?
                } else {
                    Completion::Normal(Value::Nil)
                };

                match completion {
                    Completion::Return(value) => Ok(Completion::Return(value)),
                    Completion::Normal(_) => Ok(Completion::Normal(Value::Nil)),
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while self.condition(condition)? {
                    if let Completion::Return(value) = self.execute(body)? {
                        return Ok(Completion::Return(value));
                    }
                }

                Ok(Completion::Normal(Value::Nil))
            }

            Stmt::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                info!("Function '{}' defined with {} parameter(s)", decl.name(), decl.params.len());

                self.environment.borrow_mut().define(
                    decl.name(),
                    Value::Callable(Callable::Function(Rc::new(function))),
                );

                Ok(Completion::Normal(Value::Nil))
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Completion::Return(value))
            }

            Stmt::Class { name, methods } => {
                let methods: HashMap<String, Rc<Function>> = methods
                    .iter()
                    .map(|decl| {
                        let is_initializer = decl.name() == "init";
                        let method =
                            Function::new(Rc::clone(decl), Rc::clone(&self.environment), is_initializer);

                        (decl.name().to_string(), Rc::new(method))
                    })
                    .collect();

                let class = Class::new(name.lexeme.clone(), methods);

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Callable(Callable::Class(Rc::new(class))));

                Ok(Completion::Normal(Value::Nil))
            }
        }
    }

    /// Run `statements` with `env` as the current frame, restoring the
    /// previous frame afterwards whether or not execution succeeded.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<Completion> {
        debug!("Entering block with {} statement(s)", statements.len());

        let previous = mem::replace(&mut self.environment, env);
        let result = self.execute_sequence(statements);
        self.environment = previous;

        result
    }

    fn execute_sequence(&mut self, statements: &[Stmt]) -> Result<Completion> {
        for stmt in statements {
            if let Completion::Return(value) = self.execute(stmt)? {
                return Ok(Completion::Return(value));
            }
        }

        Ok(Completion::Normal(Value::Nil))
    }

    // ────────────────────────────── expressions ─────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(Value::from(literal)),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator.line, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!self.truthy(&right, operator.line)?)),
                    _ => Err(unexpected_operator(operator)),
                }
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                binary(operator, left, right)
            }

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let left = self.truthy(&left, operator.line)?;

                let result = match operator.token_type {
                    TokenType::OR if left => true,
                    TokenType::AND if !left => false,
                    TokenType::OR | TokenType::AND => {
                        let right = self.evaluate(right)?;
                        self.truthy(&right, operator.line)?
                    }
                    _ => return Err(unexpected_operator(operator)),
                };

                Ok(Value::Bool(result))
            }

            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(condition)? {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            ExprKind::List(items) => {
                let mut last = Value::Nil;

                for item in items {
                    last = self.evaluate(item)?;
                }

                Ok(last)
            }

            ExprKind::Variable(name) => self.lookup_variable(name, expr.id),

            ExprKind::This(keyword) => self.lookup_variable(keyword, expr.id),

            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(&expr.id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None if self.is_resolved(expr.id) => {
                        self.globals.borrow_mut().assign(name, value.clone())?
                    }
                    None => self.environment.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(LoxError::runtime(
                        paren.line,
                        "Can only call functions and classes.",
                    ));
                };

                if values.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            values.len()
                        ),
                    ));
                }

                debug!("Calling '{}'", callable.name());

                callable.call(self, values)
            }

            ExprKind::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                Ok(Value::Callable(Callable::Function(Rc::new(function))))
            }

            ExprKind::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }
        }
    }

    fn lookup_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None if self.is_resolved(id) => self.globals.borrow().get(name),
            None => self.environment.borrow().get(name),
        }
    }

    fn is_resolved(&self, id: ExprId) -> bool {
        self.resolved.iter().any(|range| range.contains(&id.0))
    }

    fn condition(&mut self, expr: &Expr) -> Result<bool> {
        let value = self.evaluate(expr)?;
        self.truthy(&value, expr.line())
    }

    fn truthy(&self, value: &Value, line: usize) -> Result<bool> {
        value.truthiness().ok_or_else(|| {
            LoxError::runtime(
                line,
                format!("Cannot evaluate truthiness of {}.", value.type_name()),
            )
        })
    }
}

/// Arithmetic, comparison and equality operators.
fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    let line = operator.line;

    if operator.token_type == TokenType::PLUS {
        return match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (left @ Value::String(_), right) | (left, right @ Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            _ => Err(LoxError::runtime(
                line,
                "Operands must be two numbers or at least one string.",
            )),
        };
    }

    match operator.token_type {
        TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(LoxError::runtime(line, "Operands must be numbers."));
    };

    match operator.token_type {
        TokenType::MINUS => Ok(Value::Number(a - b)),
        TokenType::STAR => Ok(Value::Number(a * b)),
        TokenType::SLASH => Ok(Value::Number(a / b)),
        TokenType::GREATER => Ok(Value::Bool(a > b)),
        TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
        TokenType::LESS => Ok(Value::Bool(a < b)),
        TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
        _ => Err(unexpected_operator(operator)),
    }
}

fn unexpected_operator(operator: &Token) -> LoxError {
    LoxError::internal(format!(
        "'{}' is not an operator here (line {})",
        operator.lexeme, operator.line
    ))
}

/// Scan `source`, failing with the first lexical error.
fn scan_strict(source: &str) -> Result<Vec<Token>> {
    let (tokens, errors) = Scanner::new(source).scan_tokens();

    match errors.into_iter().next() {
        Some(error) => Err(error),
        None => Ok(tokens),
    }
}
