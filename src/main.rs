mod cli;

use std::env;
use std::process::exit;
use std::sync::Arc;

use feedcache::{Album, FeedCache, FeedError, GalleryClient, GalleryConfig, HttpFeedLoader};
use tracing_subscriber::EnvFilter;

use crate::cli::{build_cli, CliCommand, GlobalOpts};

type GenError = Box<dyn std::error::Error>;
static CONFIG_ENV: &str = "FEEDCACHE_CONFIG";
static DEFAULT_CONFIG: &str = "config.toml";

#[tokio::main]
async fn main() {
    init_logging();

    let matches = build_cli();
    let opts = GlobalOpts::build(&matches);

    let cmd = CliCommand::build(&matches).unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(1);
    });

    let client = build_client(&opts).unwrap_or_else(|err| {
        eprintln!("Failed to create gallery client due to error = {}", err);
        exit(1);
    });

    let result = match cmd {
        CliCommand::Gallery => show_gallery(&client, opts.json).await,
        CliCommand::Album { selector } => show_album(&client, &selector, opts.json).await,
        CliCommand::Random { count } => show_random(&client, count, opts.json).await,
        CliCommand::Search { query } => show_search(&client, &query, opts.json).await,
    };

    match result {
        Ok(_) => exit(0),
        Err(err) => {
            eprintln!("❌  Failed due to error='{}'", err);
            exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedcache=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(opts: &GlobalOpts) -> Result<GalleryClient, FeedError> {
    let path = opts
        .config_path
        .clone()
        .or_else(|| env::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_owned());
    let config = GalleryConfig::load(&path)?;

    let loader = HttpFeedLoader::new()?;
    let client = GalleryClient::new(&config, Arc::new(FeedCache::new()), Arc::new(loader));

    Ok(client.for_user(opts.user.as_deref(), opts.auth_key.as_deref()))
}

async fn show_gallery(client: &GalleryClient, as_json: bool) -> Result<(), GenError> {
    let gallery = client.gallery().await?;
    if as_json {
        println!("{}", json::to_string_pretty(&*gallery)?);
        return Ok(());
    }

    println!("📚 found {} albums of {}:", gallery.albums.len(), client.user());
    for album in &gallery.albums {
        println!("\t{}\t{} ({} photos)", album.selector(), album.title, album.size);
    }
    Ok(())
}

async fn show_album(client: &GalleryClient, selector: &str, as_json: bool) -> Result<(), GenError> {
    let album = client.album(selector).await?;
    print_album(&album, as_json)
}

async fn show_search(client: &GalleryClient, query: &str, as_json: bool) -> Result<(), GenError> {
    let album = client.search(query).await?;
    print_album(&album, as_json)
}

async fn show_random(client: &GalleryClient, count: usize, as_json: bool) -> Result<(), GenError> {
    let random = client.random_photos(count).await?;
    if as_json {
        println!("{}", json::to_string_pretty(&random)?);
        return Ok(());
    }

    let author = random.author.as_deref().unwrap_or("unknown");
    println!("🎲 {} by {}", random.title, author);
    for photo in &random.photos {
        println!("\t{}", photo);
    }
    Ok(())
}

fn print_album(album: &Album, as_json: bool) -> Result<(), GenError> {
    if as_json {
        println!("{}", json::to_string_pretty(album)?);
        return Ok(());
    }

    println!("{}", album);
    if !album.is_complete() {
        println!("only {} of {} photos could be fetched", album.photos.len(), album.size);
    }
    for photo in &album.photos {
        println!("\t{}", photo);
    }
    Ok(())
}
