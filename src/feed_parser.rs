use std::io::BufRead;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::model::{Album, Feed, FeedShape, Gallery, GeoPoint, Photo};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("expected a <feed> document, found <{0}>")]
    UnexpectedRoot(String),

    #[error("document is empty")]
    Empty,

    #[error("<{element}> holds {value:?}, not a number")]
    InvalidNumber { element: String, value: String },
}

/// Turns a feed body into a typed entity graph.
pub trait FeedParser: Send + Sync {
    fn parse(&self, body: &mut dyn BufRead, shape: FeedShape) -> Result<Feed, ParseError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AtomFeedParser;

impl FeedParser for AtomFeedParser {
    fn parse(&self, body: &mut dyn BufRead, shape: FeedShape) -> Result<Feed, ParseError> {
        let (header, entries) = read_feed(body)?;
        let feed = match shape {
            FeedShape::Gallery => Feed::Gallery(Arc::new(header.into_gallery(entries))),
            FeedShape::Album => Feed::Album(Arc::new(header.into_album(entries))),
        };
        Ok(feed)
    }
}

#[derive(Debug, Default)]
struct Fields {
    atom_id: String,
    gphoto_id: Option<String>,
    name: Option<String>,
    user: Option<String>,
    title: String,
    summary: Option<String>,
    author: Option<String>,
    numphotos: Option<usize>,
    total_results: Option<usize>,
    width: u32,
    height: u32,
    timestamp: i64,
    comment_count: u32,
    content_url: Option<String>,
    thumbnail_url: Option<String>,
    location: Option<GeoPoint>,
    is_comment: bool,
}

impl Fields {
    fn id(&self) -> String {
        self.gphoto_id.clone().unwrap_or_else(|| self.atom_id.clone())
    }

    fn into_album_stub(self) -> Album {
        Album {
            id: self.id(),
            name: self.name,
            title: self.title,
            subtitle: self.summary,
            author: self.author,
            size: self.numphotos.unwrap_or(0),
            timestamp: self.timestamp,
            thumbnail_url: self.thumbnail_url,
            location: self.location,
            photos: Vec::new(),
        }
    }

    fn into_photo(self) -> Photo {
        Photo {
            id: self.id(),
            title: self.title,
            summary: self.summary,
            width: self.width,
            height: self.height,
            timestamp: self.timestamp,
            content_url: self.content_url,
            thumbnail_url: self.thumbnail_url,
            comment_count: self.comment_count,
            location: self.location,
        }
    }

    fn into_gallery(self, entries: Vec<Fields>) -> Gallery {
        Gallery {
            id: self.atom_id,
            user: self.user,
            author: self.author,
            albums: entries
                .into_iter()
                .filter(|e| !e.is_comment)
                .map(Fields::into_album_stub)
                .collect(),
        }
    }

    fn into_album(self, entries: Vec<Fields>) -> Album {
        let photos: Vec<Photo> = entries
            .into_iter()
            .filter(|e| !e.is_comment)
            .map(Fields::into_photo)
            .collect();
        // Search feeds carry no gphoto:numphotos.
        let size = self.numphotos.or(self.total_results).unwrap_or(photos.len());

        let mut album = self.into_album_stub();
        album.size = size;
        album.photos = photos;
        album
    }
}

struct FeedReader {
    stack: Vec<String>,
    text: String,
    header: Fields,
    entry: Option<Fields>,
    entries: Vec<Fields>,
}

fn read_feed(body: &mut dyn BufRead) -> Result<(Fields, Vec<Fields>), ParseError> {
    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);

    let mut state = FeedReader {
        stack: Vec::new(),
        text: String::new(),
        header: Fields::default(),
        entry: None,
        entries: Vec::new(),
    };
    let mut buf = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Err(source) => return Err(xml_error(&reader, source)),
            Ok(Event::Start(ref e)) => {
                let name = element_name(e);
                if !seen_root {
                    check_root(&name)?;
                    seen_root = true;
                }
                state.text.clear();
                state.open(&name, e).map_err(|source| xml_error(&reader, source))?;
                state.stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let name = element_name(e);
                if !seen_root {
                    check_root(&name)?;
                    seen_root = true;
                }
                state.open(&name, e).map_err(|source| xml_error(&reader, source))?;
                if name == "entry" {
                    state.close(&name, String::new())?;
                }
            }
            Ok(Event::Text(ref t)) => {
                let text = t.unescape().map_err(|source| xml_error(&reader, source))?;
                state.text.push_str(&text);
            }
            Ok(Event::CData(c)) => {
                state.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::End(_)) => {
                if let Some(name) = state.stack.pop() {
                    let text = std::mem::take(&mut state.text);
                    state.close(&name, text)?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(ParseError::Empty);
    }
    Ok((state.header, state.entries))
}

fn xml_error<R>(reader: &Reader<R>, source: quick_xml::Error) -> ParseError {
    ParseError::Xml {
        position: reader.buffer_position(),
        source,
    }
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn check_root(name: &str) -> Result<(), ParseError> {
    if name == "feed" {
        Ok(())
    } else {
        Err(ParseError::UnexpectedRoot(name.to_owned()))
    }
}

fn parse_number<T: std::str::FromStr>(element: &str, value: &str) -> Result<T, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        element: element.to_owned(),
        value: value.to_owned(),
    })
}

impl FeedReader {
    fn current(&mut self) -> &mut Fields {
        match self.entry {
            Some(ref mut entry) => entry,
            None => &mut self.header,
        }
    }

    fn parent(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    /// Handles a start or empty-element tag; attributes carry media URLs and
    /// the comment category.
    fn open(&mut self, name: &str, e: &BytesStart) -> Result<(), quick_xml::Error> {
        match name {
            "entry" => self.entry = Some(Fields::default()),
            "media:content" | "media:thumbnail" | "category" => {
                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?.into_owned();
                    let fields = self.current();
                    match (name, attr.key.as_ref()) {
                        ("media:content", b"url") if fields.content_url.is_none() => {
                            fields.content_url = Some(value)
                        }
                        ("media:thumbnail", b"url") if fields.thumbnail_url.is_none() => {
                            fields.thumbnail_url = Some(value)
                        }
                        ("category", b"term") if value.ends_with("#comment") => fields.is_comment = true,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &str, text: String) -> Result<(), ParseError> {
        if name == "entry" {
            if let Some(entry) = self.entry.take() {
                self.entries.push(entry);
            }
            return Ok(());
        }

        let in_author = self.parent() == Some("author");
        let direct_child = matches!(self.parent(), Some("feed") | Some("entry"));
        let fields = self.current();

        match name {
            "id" if direct_child => fields.atom_id = text,
            "title" if direct_child => fields.title = text,
            "summary" | "subtitle" if direct_child => fields.summary = Some(text).filter(|s| !s.is_empty()),
            "name" if in_author => fields.author = Some(text),
            "gphoto:id" => fields.gphoto_id = Some(text),
            "gphoto:name" => fields.name = Some(text),
            "gphoto:user" => fields.user = Some(text),
            "gphoto:numphotos" => fields.numphotos = Some(parse_number(name, &text)?),
            "openSearch:totalResults" => fields.total_results = Some(parse_number(name, &text)?),
            "gphoto:width" => fields.width = parse_number(name, &text)?,
            "gphoto:height" => fields.height = parse_number(name, &text)?,
            "gphoto:timestamp" => fields.timestamp = parse_number(name, &text)?,
            "gphoto:commentCount" => fields.comment_count = parse_number(name, &text)?,
            "gml:pos" => {
                let mut parts = text.split_whitespace();
                if let (Some(lat), Some(lon)) = (parts.next(), parts.next()) {
                    fields.location = Some(GeoPoint {
                        lat: parse_number(name, lat)?,
                        lon: parse_number(name, lon)?,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}
