use thiserror::Error;

/// Canonical error type shared across the engine's layers.
///
/// Each layer builds its own kind at the failure site and re-wraps
/// lower-layer errors with added context before propagating, so a
/// message read at the top level names the full path to the fault.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("lexical error: {0}")]
    Lexical(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("code generation error: {0}")]
    CodeGen(String),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("b-tree error: {0}")]
    BTree(String),
}

pub type Result<T> = std::result::Result<T, Error>;
