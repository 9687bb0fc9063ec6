use std::collections::HashSet;
use std::fmt;
use std::fmt::Formatter;

use serde::Serialize;

use crate::model::photo::{GeoPoint, Photo};

/// `size` is the declared photo count; `photos` never holds more than that.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Album {
    pub id: String,
    /// URL-safe album name (`gphoto:name`), used to address the album feed.
    pub name: Option<String>,
    pub title: String,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub size: usize,
    pub timestamp: i64,
    pub thumbnail_url: Option<String>,
    pub location: Option<GeoPoint>,
    pub photos: Vec<Photo>,
}

impl Album {
    /// Selector the album feed should be requested with: the name when the
    /// gallery listed one, the numeric id otherwise.
    pub fn selector(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.photos.len() >= self.size
    }

    /// Appends the photos of `page` not already present, keeping first-seen
    /// order and stopping at `size`. Returns how many photos were added.
    pub fn merge_page(&mut self, page: &Album) -> usize {
        let room = self.size.saturating_sub(self.photos.len());
        let fresh: Vec<Photo> = {
            let mut seen: HashSet<&str> = self
                .photos
                .iter()
                .filter(|p| !p.id.is_empty())
                .map(|p| p.id.as_str())
                .collect();

            page.photos
                .iter()
                .filter(|p| p.id.is_empty() || seen.insert(p.id.as_str()))
                .take(room)
                .cloned()
                .collect()
        };

        let added = fresh.len();
        self.photos.extend(fresh);
        added
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "(id={}, title={}, photos={}/{})", self.id, self.title, self.photos.len(), self.size)
    }
}
