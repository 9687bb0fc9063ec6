use thiserror::Error;

use crate::config::ConfigError;
use crate::feed_parser::ParseError;
use crate::model::FeedShape;

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed {url} answered with HTTP {status}")]
    RemoteFetch { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed feed: {0}")]
    Parse(#[from] ParseError),

    #[error("feed {url} did not resolve to a {expected}")]
    UnexpectedEntity { url: String, expected: FeedShape },

    #[error("gallery lists no albums")]
    EmptyGallery,

    #[error("parse worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<tokio::task::JoinError> for FeedError {
    fn from(err: tokio::task::JoinError) -> Self {
        FeedError::Worker(err.to_string())
    }
}
