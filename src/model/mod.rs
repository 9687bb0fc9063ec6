pub mod gallery;
pub mod photo;
pub mod photo_album;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

pub use gallery::Gallery;
pub use photo::{GeoPoint, Photo};
pub use photo_album::Album;

/// Which entity a feed URL is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    Gallery,
    Album,
}

impl fmt::Display for FeedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedShape::Gallery => write!(f, "gallery"),
            FeedShape::Album => write!(f, "album"),
        }
    }
}

/// A resolved feed. Entities are shared read-only once parsed.
#[derive(Debug, Clone)]
pub enum Feed {
    Gallery(Arc<Gallery>),
    Album(Arc<Album>),
}

impl Feed {
    pub fn shape(&self) -> FeedShape {
        match self {
            Feed::Gallery(_) => FeedShape::Gallery,
            Feed::Album(_) => FeedShape::Album,
        }
    }
}

/// Typed access to the variants of [`Feed`].
pub trait FeedEntity: Sized {
    const SHAPE: FeedShape;

    fn from_feed(feed: Feed) -> Option<Arc<Self>>;
}

impl FeedEntity for Gallery {
    const SHAPE: FeedShape = FeedShape::Gallery;

    fn from_feed(feed: Feed) -> Option<Arc<Self>> {
        match feed {
            Feed::Gallery(gallery) => Some(gallery),
            Feed::Album(_) => None,
        }
    }
}

impl FeedEntity for Album {
    const SHAPE: FeedShape = FeedShape::Album;

    fn from_feed(feed: Feed) -> Option<Arc<Self>> {
        match feed {
            Feed::Album(album) => Some(album),
            Feed::Gallery(_) => None,
        }
    }
}

/// Result of a random highlight pick.
#[derive(Debug, Clone, Serialize)]
pub struct RandomPhotos {
    pub photos: Vec<Photo>,
    pub author: Option<String>,
    pub title: String,
}
