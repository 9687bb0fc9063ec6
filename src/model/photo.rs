use std::fmt;
use std::fmt::Formatter;

use serde::Serialize;

/// Latitude/longitude pair taken from a `georss:where` element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Photo {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Milliseconds since the epoch, as reported by `gphoto:timestamp`.
    pub timestamp: i64,
    pub content_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub comment_count: u32,
    pub location: Option<GeoPoint>,
}

impl fmt::Display for Photo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "(id={}, title={}, {}x{})", self.id, self.title, self.width, self.height)
    }
}
