use thiserror::Error;

/// Errors produced when converting wire codes into typed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown {kind} code: {code}")]
    UnknownCode { kind: &'static str, code: i32 },
}

pub type TypeResult<T> = Result<T, TypeError>;
