use serde::Serialize;

use crate::model::photo_album::Album;

/// One user's album listing. The albums carry their declared `size` but no
/// photos.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Gallery {
    pub id: String,
    pub user: Option<String>,
    pub author: Option<String>,
    pub albums: Vec<Album>,
}
