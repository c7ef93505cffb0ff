//! Error types shared by every shape module.

/// Errors produced while sampling, indexing, aligning or fingerprinting.
#[derive(thiserror::Error, Debug)]
pub enum ShapeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Atom vector length {atoms} must equal atom centers length {centers}")]
    LengthMismatch { atoms: usize, centers: usize },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShapeError>;
