//! Template error type.

use std::path::PathBuf;

/// Errors raised while loading, compiling or rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template source could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An output or code span was opened but never closed.
    #[error("unterminated `{span}` span opened on line {line}")]
    Unterminated { span: &'static str, line: usize },
    /// The compiled script does not parse.
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },
    /// Evaluation failed.
    #[error("template error: {0}")]
    Runtime(String),
}

impl TemplateError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }
}
