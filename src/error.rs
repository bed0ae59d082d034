use std::io;
use thiserror::Error;

/// Errors returned by the query core.
#[derive(Debug, Error)]
pub enum Error {
    /// Content search needs at least one full ngram.
    #[error("pattern {pattern:?} less than {min} bytes")]
    PatternTooShort { pattern: String, min: usize },
    /// A posting or content section could not be read.
    #[error("reader failure: {0}")]
    ReaderFailure(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
