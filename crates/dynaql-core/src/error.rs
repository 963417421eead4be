//! Error taxonomy for lexing, parsing, and evaluation.

use std::fmt;

/// A structural grammar violation found by the parser.
///
/// Parse errors are collected rather than raised one at a time, so a single
/// parse can report every independent problem in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset of the offending token.
    pub offset: usize,
    /// What the parser was looking for.
    pub expected: String,
    /// What it found instead.
    pub found: String,
}

impl ParseError {
    pub(crate) fn new(offset: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            offset,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at offset {}: expected {}, found {}",
            self.offset, self.expected, self.found
        )
    }
}

impl std::error::Error for ParseError {}

/// The number of arguments a built-in function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity(pub usize);

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1 => f.write_str("1 argument"),
            n => write!(f, "{n} arguments"),
        }
    }
}

/// Errors produced while compiling or evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    /// The lexer met a character it cannot classify.
    #[error("Unrecognized character {found:?} at offset {offset}")]
    Lex {
        /// Byte offset of the character.
        offset: usize,
        /// The character itself.
        found: char,
    },
    /// A string literal was opened but never closed.
    #[error("Unterminated string literal starting at offset {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },
    /// A single grammar violation.
    #[error("Syntax error {0}")]
    Parse(ParseError),
    /// Every grammar violation found in one parse, in source order.
    #[error("{} syntax error(s), first {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    Diagnostics(Vec<ParseError>),
    /// Nesting exceeded the configured recursion limit.
    #[error("Expression nesting exceeds the maximum depth of {limit} at offset {offset}")]
    TooDeep {
        /// The configured limit.
        limit: usize,
        /// Where the limit was crossed.
        offset: usize,
    },
    /// More syntax errors than the configured maximum were found.
    #[error("Too many syntax errors (limit {limit})")]
    TooManyErrors {
        /// The configured limit.
        limit: usize,
        /// The diagnostics collected before giving up.
        errors: Vec<ParseError>,
    },
    /// Operand types are incompatible with the operator.
    #[error("Type mismatch: {message}")]
    TypeMismatch {
        /// Explanation.
        message: String,
    },
    /// A call named a function outside the built-in registry.
    #[error("Unknown function: {name}")]
    UnknownFunction {
        /// The function name as written.
        name: String,
    },
    /// A built-in was called with the wrong number of arguments.
    #[error("Function {function} expects {expected}, got {found}")]
    Arity {
        /// The function name.
        function: String,
        /// Accepted argument count.
        expected: Arity,
        /// Supplied argument count.
        found: usize,
    },
    /// A `#name` placeholder has no substitution.
    #[error("Unresolved expression attribute name: {name}")]
    UnresolvedName {
        /// The placeholder, including `#`.
        name: String,
    },
    /// A `:value` placeholder has no substitution.
    #[error("Unresolved expression attribute value: {name}")]
    UnresolvedValue {
        /// The placeholder, including `:`.
        name: String,
    },
    /// An operand has the wrong shape for the operation.
    #[error("Invalid operand for {operation}: {message}")]
    InvalidOperand {
        /// The operation that failed.
        operation: String,
        /// Explanation.
        message: String,
    },
}

impl ExpressionError {
    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_operand(operation: &str, message: impl Into<String>) -> Self {
        Self::InvalidOperand {
            operation: operation.to_owned(),
            message: message.into(),
        }
    }

    /// The individual syntax errors carried by this error, if any.
    #[must_use]
    pub fn parse_errors(&self) -> &[ParseError] {
        match self {
            Self::Parse(e) => std::slice::from_ref(e),
            Self::Diagnostics(errors) | Self::TooManyErrors { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Convenience result type for expression operations.
pub type ExpressionResult<T> = Result<T, ExpressionError>;
