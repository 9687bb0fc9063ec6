use std::io::{self, BufReader};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::TryStreamExt;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::{info, warn};

use crate::feed_error::{FeedError, FeedResult};
use crate::feed_parser::{AtomFeedParser, FeedParser};
use crate::model::{Feed, FeedShape};

/// Fetches one feed URL and turns it into an entity. One attempt, no caching.
#[async_trait]
pub trait FeedLoader: Send + Sync {
    async fn load(&self, url: &str, shape: FeedShape) -> FeedResult<Feed>;
}

#[derive(Clone)]
pub struct HttpFeedLoader {
    inner: reqwest::Client,
    parser: Arc<dyn FeedParser>,
}

impl HttpFeedLoader {
    pub fn new() -> FeedResult<HttpFeedLoader> {
        HttpFeedLoader::with_parser(Arc::new(AtomFeedParser))
    }

    pub fn with_parser(parser: Arc<dyn FeedParser>) -> FeedResult<HttpFeedLoader> {
        let inner = reqwest::Client::builder().build()?;
        Ok(HttpFeedLoader { inner, parser })
    }
}

#[async_trait]
impl FeedLoader for HttpFeedLoader {
    async fn load(&self, url: &str, shape: FeedShape) -> FeedResult<Feed> {
        let started = Instant::now();
        let response = self.inner.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "feed request rejected");
            return Err(FeedError::RemoteFetch {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        info!(
            url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "feed response"
        );

        // The parser pulls the body chunk by chunk; the stream is dropped with
        // the parse task on every exit path.
        let body = StreamReader::new(Box::pin(response.bytes_stream().map_err(io::Error::other)));
        let body = SyncIoBridge::new(body);
        let parser = Arc::clone(&self.parser);
        let feed = tokio::task::spawn_blocking(move || {
            let mut reader = BufReader::new(body);
            parser.parse(&mut reader, shape)
        })
        .await??;

        info!(url, elapsed_ms = started.elapsed().as_millis() as u64, "parsed feed");
        Ok(feed)
    }
}
