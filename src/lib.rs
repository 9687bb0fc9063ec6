//! Cached access to paginated photo-gallery feeds.

pub mod config;
pub mod feed_cache;
pub mod feed_error;
pub mod feed_loader;
pub mod feed_parser;
pub mod feed_request;
pub mod gallery_client;
pub mod model;
pub mod paginator;
pub mod random_selector;
mod utils;

pub use config::{ConfigError, GalleryConfig};
pub use feed_cache::{CacheStats, CacheStore, FeedCache, MemoryStore};
pub use feed_error::{FeedError, FeedResult};
pub use feed_loader::{FeedLoader, HttpFeedLoader};
pub use feed_parser::{AtomFeedParser, FeedParser, ParseError};
pub use feed_request::{AlbumSelector, EntryKind, FeedEndpoint, FeedPath, FeedRequest};
pub use gallery_client::GalleryClient;
pub use model::{Album, Feed, FeedEntity, FeedShape, Gallery, GeoPoint, Photo, RandomPhotos};
pub use paginator::AlbumPaginator;
pub use random_selector::{log_weight, OsRandom, RandomSelector, RandomSource, WeightFn};
