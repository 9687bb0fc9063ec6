use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use feedcache::{
    AtomFeedParser, Feed, FeedCache, FeedError, FeedLoader, FeedShape, GalleryClient, GalleryConfig, HttpFeedLoader,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Route = Arc<dyn Fn(&str) -> (u16, String) + Send + Sync>;

/// Minimal HTTP/1.1 responder: one request per connection, answer chosen by
/// `route` from the request target.
async fn serve(route: Route) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&hits);
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let route = Arc::clone(&route);
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    request.extend_from_slice(&chunk[..n]);
                }
                counter.fetch_add(1, Ordering::SeqCst);

                let head = String::from_utf8_lossy(&request);
                let target = head.split_whitespace().nth(1).unwrap_or("/").to_owned();
                let (status, body) = route(&target);
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/atom+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            });
        }
    });

    (format!("http://{}", addr), hits)
}

fn gallery_xml() -> String {
    "<feed><id>g</id><gphoto:user>jane</gphoto:user>\
     <entry><title>Alps</title><gphoto:id>7</gphoto:id><gphoto:name>Alps</gphoto:name>\
     <gphoto:numphotos>3</gphoto:numphotos></entry></feed>"
        .to_owned()
}

fn album_page(ids: &[u32]) -> String {
    let entries: String = ids
        .iter()
        .map(|id| format!("<entry><title>IMG_{0}.jpg</title><gphoto:id>{0}</gphoto:id></entry>", id))
        .collect();
    format!(
        "<feed><title>Alps</title><author><name>Jane</name></author><gphoto:id>7</gphoto:id>\
         <gphoto:numphotos>3</gphoto:numphotos>{}</feed>",
        entries
    )
}

#[tokio::test]
async fn loader_parses_successful_response() {
    let (base, _) = serve(Arc::new(|_: &str| (200, album_page(&[1, 2, 3])))).await;
    let loader = HttpFeedLoader::new().unwrap();

    let feed = loader.load(&format!("{}/user/jane/albumid/7", base), FeedShape::Album).await.unwrap();

    match feed {
        Feed::Album(album) => {
            assert_eq!(album.title, "Alps");
            assert_eq!(album.photos.len(), 3);
        }
        Feed::Gallery(_) => panic!("expected an album"),
    }
}

#[tokio::test]
async fn non_success_status_is_a_remote_fetch_error() {
    let (base, _) = serve(Arc::new(|_: &str| (404, "gone".to_owned()))).await;
    let loader = HttpFeedLoader::with_parser(Arc::new(AtomFeedParser)).unwrap();
    let url = format!("{}/user/nobody", base);

    let err = loader.load(&url, FeedShape::Gallery).await.unwrap_err();

    match err {
        FeedError::RemoteFetch { url: failed, status } => {
            assert_eq!(status, 404);
            assert_eq!(failed, url);
        }
        other => panic!("unexpected error {}", other),
    }
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let (base, _) = serve(Arc::new(|_: &str| (200, "<html>oops</html>".to_owned()))).await;
    let loader = HttpFeedLoader::new().unwrap();

    let err = loader.load(&format!("{}/user/jane", base), FeedShape::Gallery).await.unwrap_err();

    assert!(matches!(err, FeedError::Parse(_)));
}

#[tokio::test]
async fn malformed_body_leaves_nothing_cached() {
    let (base, hits) = serve(Arc::new(|_: &str| (200, "<html>oops</html>".to_owned()))).await;
    let mut config = GalleryConfig::new("jane");
    config.base_url = base;
    let client = GalleryClient::new(&config, Arc::new(FeedCache::new()), Arc::new(HttpFeedLoader::new().unwrap()));

    let err = client.gallery().await.unwrap_err();
    assert!(matches!(err, FeedError::Parse(_)));
    assert!(client.cache().is_empty());

    // not cached, so the next call goes back to the server
    client.gallery().await.unwrap_err();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn large_body_is_parsed_in_full() {
    let ids: Vec<u32> = (1..=3000).collect();
    let body = album_page(&ids);
    assert!(body.len() > 64 * 1024);
    let (base, _) = serve(Arc::new(move |_: &str| (200, body.clone()))).await;
    let loader = HttpFeedLoader::new().unwrap();

    let feed = loader.load(&format!("{}/user/jane/albumid/7", base), FeedShape::Album).await.unwrap();

    match feed {
        Feed::Album(album) => {
            assert_eq!(album.photos.len(), 3000);
            assert_eq!(album.photos[2999].id, "3000");
        }
        Feed::Gallery(_) => panic!("expected an album"),
    }
}

#[tokio::test]
async fn client_pages_and_caches_over_http() {
    let route: Route = Arc::new(|target: &str| {
        if target.starts_with("/user/jane/album/Alps") {
            if target.contains("start-index=3") {
                (200, album_page(&[3]))
            } else {
                (200, album_page(&[1, 2]))
            }
        } else if target.starts_with("/user/jane?kind=album") {
            (200, gallery_xml())
        } else {
            (404, String::new())
        }
    });
    let (base, hits) = serve(route).await;

    let mut config = GalleryConfig::new("jane");
    config.base_url = base;
    let client = GalleryClient::new(&config, Arc::new(FeedCache::new()), Arc::new(HttpFeedLoader::new().unwrap()));

    let random = client.random_photos(10).await.unwrap();
    assert_eq!(random.title, "Alps");
    assert_eq!(random.author.as_deref(), Some("Jane"));
    assert!(!random.photos.is_empty() && random.photos.len() <= 3);

    let album = client.album("Alps").await.unwrap();
    let ids: Vec<&str> = album.photos.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    // gallery + two album pages, nothing more on repeat calls
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(client.cache().len(), 3);

    let err = client.search("nothing").await.unwrap_err();
    assert!(matches!(err, FeedError::RemoteFetch { status: 404, .. }));
    assert_eq!(client.cache().len(), 3);
}
