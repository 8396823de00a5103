use thiserror::Error;

/// Structural errors in inventory text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextError {
    #[error("line {line}: expected '{{' after {tag}, found {found:?}")]
    ExpectedOpenBrace {
        line: usize,
        tag: String,
        found: String,
    },

    #[error("input ended inside {tag} block opened at line {line}")]
    UnexpectedEof { line: usize, tag: String },
}

pub type TextResult<T> = Result<T, TextError>;
