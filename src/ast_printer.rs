use crate::expr::{Expr, ExprKind, LiteralValue};
use crate::token::format_number;

/// Converts an expression to a canonical, fully parenthesised prefix form,
/// e.g. `1 + 2 * 3` → `(+ 1.0 (* 2.0 3.0))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match &expr.kind {
            // ── literals ────────────────────────────────────────────────
            ExprKind::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => format_number(*n),
            },

            // ── grouping ────────────────────────────────────────────────
            ExprKind::Grouping(inner) => Self::parenthesize("group", &[inner.as_ref()]),

            // ── operators ───────────────────────────────────────────────
            ExprKind::Unary { operator, right } => {
                Self::parenthesize(&operator.lexeme, &[right.as_ref()])
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            }
            | ExprKind::Logical {
                left,
                operator,
                right,
            } => Self::parenthesize(&operator.lexeme, &[left.as_ref(), right.as_ref()]),

            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => Self::parenthesize(
                "?:",
                &[condition.as_ref(), then_branch.as_ref(), else_branch.as_ref()],
            ),

            ExprKind::List(items) => {
                let items: Vec<&Expr> = items.iter().collect();
                Self::parenthesize("list", &items)
            }

            // ── variables ───────────────────────────────────────────────
            ExprKind::Variable(name) => name.lexeme.clone(),

            ExprKind::Assign { name, value } => {
                Self::parenthesize(&format!("= {}", name.lexeme), &[value.as_ref()])
            }

            ExprKind::This(_) => "this".into(),

            // ── calls and properties ────────────────────────────────────
            ExprKind::Call {
                callee, arguments, ..
            } => {
                let mut parts: Vec<&Expr> = vec![callee.as_ref()];
                parts.extend(arguments.iter());
                Self::parenthesize("call", &parts)
            }

            ExprKind::Get { object, name } => {
                Self::parenthesize(&format!(". {}", name.lexeme), &[object.as_ref()])
            }

            ExprKind::Set {
                object,
                name,
                value,
            } => Self::parenthesize(
                &format!("=. {}", name.lexeme),
                &[object.as_ref(), value.as_ref()],
            ),

            ExprKind::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                format!("(fun ({}) ...)", params.join(" "))
            }
        }
    }

    fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
        let mut s = format!("({}", name);

        for expr in exprs {
            s.push(' ');
            s.push_str(&Self::print(expr));
        }

        s.push(')');
        s
    }
}
