//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! The module **does not** print diagnostics itself; callers decide where
//! errors are reported.

use std::io;
use thiserror::Error;

use log::debug;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error raised by a user program.
    #[error("[line {line}] Runtime error: {message}")]
    Runtime { message: String, line: usize },

    /// Broken interpreter invariant, e.g. a resolver distance that does not
    /// match the environment chain.  Never expected in correct programs.
    #[error("Bad interpreter: {0}")]
    Internal(String),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve { message, line }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Internal error: {}", message);

        LoxError::Internal(message)
    }

    /// Source line the error is attached to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. }
            | LoxError::Runtime { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Outcome of a failed [`Interpreter::run`](crate::interpreter::Interpreter::run),
/// grouped by the pipeline stage that stopped the run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Scan and parse errors, collected as a batch.  Nothing was executed.
    #[error("{}", join_lines(.0))]
    Syntax(Vec<LoxError>),

    /// First resolver error.  Nothing was executed.
    #[error("{0}")]
    Resolve(LoxError),

    /// First runtime error.  Statements before it have taken effect.
    #[error("{0}")]
    Runtime(LoxError),
}

impl RunError {
    /// Conventional process exit code for the failing stage (sysexits style).
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Syntax(_) | RunError::Resolve(_) => 65,
            RunError::Runtime(_) => 70,
        }
    }

    /// Every underlying error, in report order.
    pub fn errors(&self) -> Vec<&LoxError> {
        match self {
            RunError::Syntax(errors) => errors.iter().collect(),
            RunError::Resolve(e) | RunError::Runtime(e) => vec![e],
        }
    }
}

fn join_lines(errors: &[LoxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
