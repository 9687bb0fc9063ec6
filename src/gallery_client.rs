use std::sync::Arc;

use tracing::debug;

use crate::config::GalleryConfig;
use crate::feed_cache::FeedCache;
use crate::feed_error::{FeedError, FeedResult};
use crate::feed_loader::FeedLoader;
use crate::feed_request::{FeedEndpoint, FeedPath, FeedRequest};
use crate::model::{Album, Gallery, RandomPhotos};
use crate::paginator::AlbumPaginator;
use crate::random_selector::RandomSelector;

#[derive(Clone)]
pub struct GalleryClient {
    endpoint: FeedEndpoint,
    default_user: String,
    analytics: Option<String>,
    page_size: usize,
    cache: Arc<FeedCache>,
    loader: Arc<dyn FeedLoader>,
    selector: RandomSelector,
}

impl GalleryClient {
    pub fn new(config: &GalleryConfig, cache: Arc<FeedCache>, loader: Arc<dyn FeedLoader>) -> Self {
        GalleryClient {
            endpoint: FeedEndpoint::new(config.base_url.as_str(), config.default_user.as_str(), None),
            default_user: config.default_user.clone(),
            analytics: config.analytics.clone(),
            page_size: config.page_size,
            cache,
            loader,
            selector: RandomSelector::default(),
        }
    }

    pub fn with_selector(mut self, selector: RandomSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Client for another user (or a private album key) sharing this
    /// client's cache, loader and selector. `None` keeps the default user.
    pub fn for_user(&self, user: Option<&str>, auth_key: Option<&str>) -> Self {
        let user = user.unwrap_or(&self.default_user);
        GalleryClient {
            endpoint: FeedEndpoint::new(self.endpoint.base_url(), user, auth_key.map(str::to_owned)),
            ..self.clone()
        }
    }

    pub fn user(&self) -> &str {
        self.endpoint.user()
    }

    /// `?by=<user>` for links that must keep a non-default user, else empty.
    pub fn url_suffix(&self) -> String {
        if self.user() == self.default_user {
            String::new()
        } else {
            let query = FeedRequest::new(FeedPath::User).by(self.user()).render_query();
            format!("?{}", query)
        }
    }

    pub fn analytics(&self) -> Option<&str> {
        self.analytics.as_deref()
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub async fn gallery(&self) -> FeedResult<Arc<Gallery>> {
        let url = self.endpoint.url(&FeedRequest::gallery());
        self.cache.fetch::<Gallery>(&url, self.loader.as_ref()).await
    }

    pub async fn album(&self, selector: &str) -> FeedResult<Arc<Album>> {
        AlbumPaginator::new(&self.cache, self.loader.as_ref(), &self.endpoint, self.page_size)
            .fetch_album(selector)
            .await
    }

    /// Up to `count` consecutive photos from a weighted random album.
    pub async fn random_photos(&self, count: usize) -> FeedResult<RandomPhotos> {
        let gallery = self.gallery().await?;
        let picked = self
            .selector
            .weighted_random_album(&gallery.albums)
            .ok_or(FeedError::EmptyGallery)?;
        debug!(album = %picked.selector(), size = picked.size, "picked random album");

        let album = self.album(picked.selector()).await?;
        let photos = self.selector.pick_window(&album.photos, count).to_vec();

        Ok(RandomPhotos {
            photos,
            author: album.author.clone(),
            title: album.title.clone(),
        })
    }

    /// Single page, never paginated.
    pub async fn search(&self, query: &str) -> FeedResult<Arc<Album>> {
        let url = self.endpoint.url(&FeedRequest::search(query));
        self.cache.fetch::<Album>(&url, self.loader.as_ref()).await
    }
}
