use std::fmt;
use std::rc::Rc;

use crate::stmt::FunctionDecl;
use crate::token::Token;

/// Identity of an expression node, assigned by the parser.
///
/// The resolver records scope distances against this id rather than against
/// the node itself, so tree copies keep their bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// An expression node: a stable id plus the node variant.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        /// Operand to which the operator is applied.
        right: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        /// Operator token such as `+`, `*`, `==`, …
        operator: Token,
        right: Box<Expr>,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Variable access ‑ resolves to the identifier's current value at runtime.
    Variable(Token),

    /// Assignment expression: `identifier "=" expression`
    Assign { name: Token, value: Box<Expr> },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Comma operator: `a, b, c`.  Always holds at least two items.
    List(Vec<Expr>),

    /// Function‑ or method‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        /// Expression that evaluates to a callable (variable, property, etc.).
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        /// Argument list (may be empty).
        arguments: Vec<Expr>,
    },

    /// Anonymous function expression: `fun (a, b) { … }`
    Function(Rc<FunctionDecl>),

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The 'this' keyword inside a method.
    This(Token),
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    /// Best‑effort source line of the expression, for diagnostics.
    pub fn line(&self) -> usize {
        match &self.kind {
            ExprKind::Literal(_) => 0,
            ExprKind::Unary { operator, .. } => operator.line,
            ExprKind::Binary { operator, .. } => operator.line,
            ExprKind::Logical { operator, .. } => operator.line,
            ExprKind::Grouping(expr) => expr.line(),
            ExprKind::Variable(token) => token.line,
            ExprKind::Assign { name, .. } => name.line,
            ExprKind::Ternary { condition, .. } => condition.line(),
            ExprKind::List(items) => items.first().map_or(0, Expr::line),
            ExprKind::Call { paren, .. } => paren.line,
            ExprKind::Function(decl) => decl.line,
            ExprKind::Get { name, .. } => name.line,
            ExprKind::Set { name, .. } => name.line,
            ExprKind::This(keyword) => keyword.line,
        }
    }
}
