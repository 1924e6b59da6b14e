use thiserror::Error;

/// Errors surfaced to hosts embedding the analyzer.
#[derive(Error, Debug)]
pub enum CommentmapError {
    #[error("failed to parse source: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = CommentmapError> = std::result::Result<T, E>;
