use std::path::PathBuf;

use thiserror::Error;

pub type TunkRankResult<T> = Result<T, TunkRankError>;

#[derive(Debug, Error)]
pub enum TunkRankError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no input: either a graph path or a powerlaw vertex count must be given")]
    MissingInput,

    #[error("parse error in {}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
