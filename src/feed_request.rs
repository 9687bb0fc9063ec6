use std::collections::BTreeSet;
use std::fmt;

use crate::utils::{is_all_digits, url_encode};

pub const GALLERY_FIELDS: &str =
    "id,updated,gphoto:*,entry(title,summary,updated,content,category,gphoto:*,media:*,georss:*)";
pub const ALBUM_FIELDS: &str = "id,updated,title,subtitle,icon,gphoto:*,georss:where(gml:Point),\
entry(title,summary,content,author,category,gphoto:id,gphoto:photoid,gphoto:width,gphoto:height,\
gphoto:commentCount,gphoto:timestamp,exif:*,media:*,georss:where(gml:Point))";

const GALLERY_THUMBSIZE: &str = "212c";
const PHOTO_THUMBSIZE: &str = "144c";
const ALBUM_IMGMAX: u32 = 1600;
const SEARCH_IMGMAX: u32 = 1024;

/// Entry types a feed may be filtered to. Declaration order is render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    Album,
    Photo,
    Comment,
}

impl EntryKind {
    fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Album => "album",
            EntryKind::Photo => "photo",
            EntryKind::Comment => "comment",
        }
    }
}

/// How an album is addressed: by numeric id or by its URL name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlbumSelector {
    Id(String),
    Name(String),
}

impl AlbumSelector {
    pub fn parse(selector: &str) -> Self {
        if is_all_digits(selector) {
            AlbumSelector::Id(selector.to_owned())
        } else {
            AlbumSelector::Name(selector.to_owned())
        }
    }
}

impl fmt::Display for AlbumSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlbumSelector::Id(id) => write!(f, "{}", id),
            AlbumSelector::Name(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FeedPath {
    #[default]
    User,
    Album(AlbumSelector),
}

impl FeedPath {
    fn render(&self) -> String {
        match self {
            FeedPath::User => String::new(),
            FeedPath::Album(AlbumSelector::Id(id)) => format!("/albumid/{}", id),
            FeedPath::Album(AlbumSelector::Name(name)) => format!("/album/{}", url_encode(name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedRequest {
    path: FeedPath,
    kinds: BTreeSet<EntryKind>,
    query: Option<String>,
    imgmax: Option<u32>,
    thumbsize: Option<String>,
    max_results: Option<usize>,
    start_index: Option<usize>,
    by: Option<String>,
    fields: Option<String>,
}

impl FeedRequest {
    pub fn new(path: FeedPath) -> Self {
        FeedRequest { path, ..FeedRequest::default() }
    }

    /// The album listing of a user.
    pub fn gallery() -> Self {
        FeedRequest::new(FeedPath::User)
            .kind(EntryKind::Album)
            .thumbsize(GALLERY_THUMBSIZE)
            .fields(GALLERY_FIELDS)
    }

    /// First page of an album; later pages add [`FeedRequest::start_index`].
    pub fn album(selector: AlbumSelector, page_size: usize) -> Self {
        FeedRequest::new(FeedPath::Album(selector))
            .kind(EntryKind::Photo)
            .kind(EntryKind::Comment)
            .imgmax(ALBUM_IMGMAX)
            .thumbsize(PHOTO_THUMBSIZE)
            .max_results(page_size)
            .fields(ALBUM_FIELDS)
    }

    /// Photo search across the user's albums. Single page.
    pub fn search(query: &str) -> Self {
        FeedRequest::new(FeedPath::User)
            .kind(EntryKind::Photo)
            .query(query)
            .imgmax(SEARCH_IMGMAX)
            .thumbsize(PHOTO_THUMBSIZE)
    }

    pub fn kind(mut self, kind: EntryKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn imgmax(mut self, imgmax: u32) -> Self {
        self.imgmax = Some(imgmax);
        self
    }

    pub fn thumbsize(mut self, thumbsize: impl Into<String>) -> Self {
        self.thumbsize = Some(thumbsize.into());
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// 1-based offset of the first entry to return.
    pub fn start_index(mut self, start_index: usize) -> Self {
        self.start_index = Some(start_index);
        self
    }

    pub fn by(mut self, user: impl Into<String>) -> Self {
        self.by = Some(user.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Renders the query string without the leading `?`.
    ///
    /// Order: `kind, q, imgmax, thumbsize, max-results, start-index, by, fields`.
    /// `kind` and `fields` are sent verbatim; the projection syntax relies on
    /// `(`, `*` and `:` reaching the server unescaped.
    pub fn render_query(&self) -> String {
        let mut params: Vec<String> = Vec::new();

        if !self.kinds.is_empty() {
            let kinds: Vec<&str> = self.kinds.iter().map(EntryKind::as_str).collect();
            params.push(format!("kind={}", kinds.join(",")));
        }
        if let Some(query) = &self.query {
            params.push(format!("q={}", url_encode(query)));
        }
        if let Some(imgmax) = self.imgmax {
            params.push(format!("imgmax={}", imgmax));
        }
        if let Some(thumbsize) = &self.thumbsize {
            params.push(format!("thumbsize={}", url_encode(thumbsize)));
        }
        if let Some(max_results) = self.max_results {
            params.push(format!("max-results={}", max_results));
        }
        if let Some(start_index) = self.start_index {
            params.push(format!("start-index={}", start_index));
        }
        if let Some(by) = &self.by {
            params.push(format!("by={}", url_encode(by)));
        }
        if let Some(fields) = &self.fields {
            params.push(format!("fields={}", fields));
        }

        params.join("&")
    }
}

/// Where feeds of one user live: `<base>/user/<user><path>?<query>[&authkey=<key>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEndpoint {
    base_url: String,
    user: String,
    auth_key: Option<String>,
}

impl FeedEndpoint {
    pub fn new(base_url: impl Into<String>, user: impl Into<String>, auth_key: Option<String>) -> Self {
        let base_url: String = base_url.into();
        FeedEndpoint {
            base_url: base_url.trim_end_matches('/').to_owned(),
            user: user.into(),
            auth_key,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, request: &FeedRequest) -> String {
        let mut url = format!("{}/user/{}{}", self.base_url, url_encode(&self.user), request.path.render());

        let query = request.render_query();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        if let Some(key) = &self.auth_key {
            url.push(if query.is_empty() { '?' } else { '&' });
            url.push_str("authkey=");
            url.push_str(key);
        }
        url
    }
}
