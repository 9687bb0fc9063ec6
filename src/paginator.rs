use std::sync::Arc;

use tracing::{debug, warn};

use crate::feed_cache::FeedCache;
use crate::feed_error::FeedResult;
use crate::feed_loader::FeedLoader;
use crate::feed_request::{AlbumSelector, FeedEndpoint, FeedRequest};
use crate::model::Album;

/// Every page is cached under its own URL, `start-index` included.
pub struct AlbumPaginator<'a> {
    cache: &'a FeedCache,
    loader: &'a dyn FeedLoader,
    endpoint: &'a FeedEndpoint,
    page_size: usize,
}

impl<'a> AlbumPaginator<'a> {
    pub fn new(cache: &'a FeedCache, loader: &'a dyn FeedLoader, endpoint: &'a FeedEndpoint, page_size: usize) -> Self {
        AlbumPaginator {
            cache,
            loader,
            endpoint,
            page_size,
        }
    }

    /// A page that adds no new photo stops pagination with a partial album.
    pub async fn fetch_album(&self, selector: &str) -> FeedResult<Arc<Album>> {
        let request = FeedRequest::album(AlbumSelector::parse(selector), self.page_size);

        let first = self.page(&request).await?;
        if first.photos.len() == first.size {
            return Ok(first);
        }

        // Copy of the first page, cut down to the declared size if it overshoots.
        let mut album = Album::clone(&first);
        album.photos.clear();
        album.merge_page(&first);

        let mut pages = 1;
        while !album.is_complete() {
            let next = request.clone().start_index(album.photos.len() + 1);
            let page = self.page(&next).await?;
            pages += 1;

            if album.merge_page(&page) == 0 {
                warn!(
                    album = %selector,
                    fetched = album.photos.len(),
                    declared = album.size,
                    "pagination stalled, returning partial album"
                );
                break;
            }
        }

        debug!(album = %selector, pages, photos = album.photos.len(), "album assembled");
        Ok(Arc::new(album))
    }

    async fn page(&self, request: &FeedRequest) -> FeedResult<Arc<Album>> {
        let url = self.endpoint.url(request);
        self.cache.fetch::<Album>(&url, self.loader).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed_error::FeedError;
    use crate::model::{Feed, FeedShape, Photo};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves `served` out of `declared` photos in pages of `page_size`,
    /// reading the offset from the request URL.
    struct PagedAlbum {
        declared: usize,
        served: usize,
        page_size: usize,
        duplicate_tail: bool,
        requests: Mutex<Vec<String>>,
    }

    impl PagedAlbum {
        fn new(declared: usize, page_size: usize) -> Self {
            PagedAlbum {
                declared,
                served: declared,
                page_size,
                duplicate_tail: false,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    fn start_index(url: &str) -> usize {
        url.split(|c| c == '?' || c == '&')
            .find_map(|param| param.strip_prefix("start-index="))
            .map(|value| value.parse().unwrap())
            .unwrap_or(1)
    }

    #[async_trait]
    impl FeedLoader for PagedAlbum {
        async fn load(&self, url: &str, shape: FeedShape) -> FeedResult<Feed> {
            assert_eq!(shape, FeedShape::Album);
            self.requests.lock().unwrap().push(url.to_owned());

            let offset = start_index(url) - 1;
            let mut ids: Vec<usize> = (offset..(offset + self.page_size).min(self.served)).collect();
            if self.duplicate_tail && ids.is_empty() {
                ids = (0..self.page_size.min(self.served)).collect();
            }

            Ok(Feed::Album(Arc::new(Album {
                id: "42".to_owned(),
                title: "Paged".to_owned(),
                size: self.declared,
                photos: ids
                    .into_iter()
                    .map(|i| Photo {
                        id: format!("p{}", i),
                        ..Photo::default()
                    })
                    .collect(),
                ..Album::default()
            })))
        }
    }

    fn endpoint() -> FeedEndpoint {
        FeedEndpoint::new("http://feeds.test", "jane", None)
    }

    #[tokio::test]
    async fn collects_all_pages_in_order() {
        let cache = FeedCache::new();
        let loader = PagedAlbum::new(25, 10);
        let endpoint = endpoint();
        let paginator = AlbumPaginator::new(&cache, &loader, &endpoint, 10);

        let album = paginator.fetch_album("42").await.unwrap();

        assert_eq!(album.photos.len(), 25);
        assert!(album.is_complete());
        let expected: Vec<String> = (0..25).map(|i| format!("p{}", i)).collect();
        let ids: Vec<String> = album.photos.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, expected);
        assert_eq!(loader.request_count(), 3);

        let requests = loader.requests.lock().unwrap().clone();
        assert!(!requests[0].contains("start-index"));
        assert!(requests[1].contains("start-index=11"));
        assert!(requests[2].contains("start-index=21"));
    }

    #[tokio::test]
    async fn refetch_reuses_cached_pages() {
        let cache = FeedCache::new();
        let loader = PagedAlbum::new(25, 10);
        let endpoint = endpoint();
        let paginator = AlbumPaginator::new(&cache, &loader, &endpoint, 10);

        let first = paginator.fetch_album("42").await.unwrap();
        let second = paginator.fetch_album("42").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(loader.request_count(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn single_page_album_returns_cached_entity() {
        let cache = FeedCache::new();
        let loader = PagedAlbum::new(7, 10);
        let endpoint = endpoint();
        let paginator = AlbumPaginator::new(&cache, &loader, &endpoint, 10);

        let album = paginator.fetch_album("Summer Trip").await.unwrap();

        assert_eq!(album.photos.len(), 7);
        assert_eq!(loader.request_count(), 1);
        assert!(loader.requests.lock().unwrap()[0].contains("/album/Summer+Trip?"));
    }

    #[tokio::test]
    async fn empty_page_stops_pagination() {
        let cache = FeedCache::new();
        let mut loader = PagedAlbum::new(30, 10);
        loader.served = 12;
        let endpoint = endpoint();
        let paginator = AlbumPaginator::new(&cache, &loader, &endpoint, 10);

        let album = paginator.fetch_album("42").await.unwrap();

        assert_eq!(album.photos.len(), 12);
        assert_eq!(album.size, 30);
        assert!(!album.is_complete());
        assert_eq!(loader.request_count(), 3);
    }

    #[tokio::test]
    async fn page_of_known_photos_stops_pagination() {
        let cache = FeedCache::new();
        let mut loader = PagedAlbum::new(30, 10);
        loader.served = 10;
        loader.duplicate_tail = true;
        let endpoint = endpoint();
        let paginator = AlbumPaginator::new(&cache, &loader, &endpoint, 10);

        let album = paginator.fetch_album("42").await.unwrap();

        assert_eq!(album.photos.len(), 10);
        assert_eq!(loader.request_count(), 2);
    }

    #[tokio::test]
    async fn later_page_is_cut_at_declared_size() {
        let cache = FeedCache::new();
        let mut loader = PagedAlbum::new(5, 4);
        loader.served = 100;
        let endpoint = endpoint();
        let paginator = AlbumPaginator::new(&cache, &loader, &endpoint, 4);

        let album = paginator.fetch_album("1").await.unwrap();

        assert_eq!(album.size, 5);
        assert_eq!(album.photos.len(), 5);
        assert_eq!(album.photos.last().unwrap().id, "p4");
        assert_eq!(loader.request_count(), 2);
    }

    #[tokio::test]
    async fn oversized_first_page_is_cut_at_declared_size() {
        let cache = FeedCache::new();
        let mut loader = PagedAlbum::new(3, 10);
        loader.served = 10;
        let endpoint = endpoint();
        let paginator = AlbumPaginator::new(&cache, &loader, &endpoint, 10);

        let album = paginator.fetch_album("1").await.unwrap();

        assert_eq!(album.photos.len(), 3);
        assert!(album.is_complete());
        assert_eq!(loader.request_count(), 1);
    }

    struct Failing;

    #[async_trait]
    impl FeedLoader for Failing {
        async fn load(&self, url: &str, _shape: FeedShape) -> FeedResult<Feed> {
            Err(FeedError::RemoteFetch {
                url: url.to_owned(),
                status: 503,
            })
        }
    }

    #[tokio::test]
    async fn remote_errors_propagate() {
        let cache = FeedCache::new();
        let endpoint = endpoint();
        let paginator = AlbumPaginator::new(&cache, &Failing, &endpoint, 10);

        let err = paginator.fetch_album("42").await.unwrap_err();
        assert!(matches!(err, FeedError::RemoteFetch { status: 503, .. }));
        assert!(cache.is_empty());
    }
}
