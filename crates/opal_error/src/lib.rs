//! Shared error type for the opal crates.
//!
//! Every stage of the query pipeline reports failures through [`OpalError`].
//! Variants map to the stage that raised them: syntax errors come out of the
//! parser, resolution and type errors out of the binder, plan errors out of
//! the optimizer, and evaluation errors out of the interpreter. All of them
//! are terminal for the query that raised them.

use std::fmt;

/// Location of a token within the original SQL text.
///
/// Lines and columns are zero-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpalError {
    /// The SQL text failed to tokenize or parse.
    #[error("syntax error at {location}: {message}")]
    Syntax {
        message: String,
        location: SourceLocation,
    },

    /// A table reference did not resolve against the catalog.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A column reference did not resolve against any in-scope table.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// An unqualified column name resolved in more than one in-scope table.
    #[error("ambiguous column reference: {0}")]
    AmbiguousColumn(String),

    /// An expression's operand types are not valid for its operator.
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    /// The optimizer found no physical plan reaching the target convention.
    #[error("no plan found for convention {convention}")]
    NoPlanFound { convention: String },

    /// A runtime expression failure, e.g. arithmetic overflow.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A bug: a stage received input its contract says cannot occur.
    #[error("internal: {0}")]
    Internal(String),
}

impl OpalError {
    pub fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        OpalError::Syntax {
            message: message.into(),
            location,
        }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        OpalError::TypeMismatch {
            message: message.into(),
        }
    }
}

pub type Result<T, E = OpalError> = std::result::Result<T, E>;

/// Construct an `OpalError::Internal` from format args.
#[macro_export]
macro_rules! internal {
    ($($arg:tt)*) => {
        $crate::OpalError::Internal(std::format!($($arg)*))
    };
}
