//! Error type for the QASM lexer/parser/emitter.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("lexer error at position {position}: {message}")]
    LexerError { position: usize, message: String },

    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),

    #[error("unknown register: {0}")]
    UndefinedRegister(String),

    #[error("duplicate register declaration: {0}")]
    DuplicateDeclaration(String),

    #[error("index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        register: String,
        index: u32,
        size: u32,
    },

    #[error("parse error: {0}")]
    Generic(String),
}

pub type ParseResult<T> = Result<T, ParseError>;
