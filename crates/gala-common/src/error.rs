use std::fmt;

use serde::Serialize;

/// The two failure classes of the pipeline.
///
/// Syntax errors are raised by the parser collaborator and passed through
/// unchanged; semantic errors are produced inside the analyzer and the
/// transformer. Both are fatal for the current file: there is no recovery
/// and no partial output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Syntax,
    Semantic,
}

/// A structured error pointing into Gala source.
///
/// `file` may be empty and `line`/`column` zero for errors that originate
/// in scope or type resolution, where no parse-tree context is available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceError {
    pub kind: ErrorKind,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl SourceError {
    /// A semantic error with full position information.
    pub fn semantic(
        file: impl Into<String>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::Semantic,
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// A semantic error with no position (scope and resolver failures).
    pub fn bare(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Semantic,
            file: String::new(),
            line: 0,
            column: 0,
            message: message.into(),
        }
    }

    /// A syntax error passed through from the parser.
    pub fn syntax(
        file: impl Into<String>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Whether the error carries a usable source position.
    pub fn has_position(&self) -> bool {
        !self.file.is_empty() && self.line > 0
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_position() {
            write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positioned_error_display() {
        let err = SourceError::semantic("main.gala", 3, 7, "cannot assign to immutable variable x");
        assert_eq!(
            err.to_string(),
            "main.gala:3:7: cannot assign to immutable variable x"
        );
        assert!(err.has_position());
    }

    #[test]
    fn bare_error_display() {
        let err = SourceError::bare("unknown variable y");
        assert_eq!(err.to_string(), "unknown variable y");
        assert!(!err.has_position());
    }
}
