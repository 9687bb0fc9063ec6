use clap::{App, Arg, ArgMatches};
use thiserror::Error;

static VERSION: &str = "0.1.0";
static AUTHOR: &str = "apmaros";
static DESCRIPTION: &str = "Browse albums and photos of a remote gallery feed";
const GALLERY: &str = "gallery";
const ALBUM: &str = "album";
const RANDOM: &str = "random";
const SEARCH: &str = "search";
const SELECTOR: &str = "selector";
const QUERY: &str = "query";
const COUNT: &str = "count";
const COUNT_SHORT: &str = "n";
const CONFIG: &str = "config";
const CONFIG_SHORT: &str = "c";
const USER: &str = "user";
const USER_SHORT: &str = "u";
const AUTHKEY: &str = "authkey";
const AUTHKEY_SHORT: &str = "k";
const JSON: &str = "json";
const DEFAULT_COUNT: usize = 6;

#[derive(Debug, Error)]
#[error("{0}")]
pub(crate) struct CliError(pub(crate) String);

pub(crate) fn build_cli<'a>() -> ArgMatches<'a> {
    App::new("feedcache")
        .version(VERSION)
        .author(AUTHOR)
        .about(DESCRIPTION)
        .arg(Arg::with_name(CONFIG)
            .short(CONFIG_SHORT)
            .long(CONFIG)
            .takes_value(true)
            .help("Config file (defaults to $FEEDCACHE_CONFIG, then config.toml)"))
        .arg(Arg::with_name(USER)
            .short(USER_SHORT)
            .long(USER)
            .takes_value(true)
            .help("Gallery owner, instead of the configured default user"))
        .arg(Arg::with_name(AUTHKEY)
            .short(AUTHKEY_SHORT)
            .long(AUTHKEY)
            .takes_value(true)
            .help("Access key of a private album"))
        .arg(Arg::with_name(JSON)
            .long(JSON)
            .takes_value(false)
            .help("Print results as JSON"))
        .subcommand(App::new(GALLERY)
            .about("Lists the albums of the gallery"))
        .subcommand(App::new(ALBUM)
            .about("Lists every photo of an album")
            .arg(Arg::with_name(SELECTOR)
                .index(1)
                .required(true)
                .help("Numeric album id or album name")))
        .subcommand(App::new(RANDOM)
            .about("Picks consecutive photos from a random album")
            .arg(Arg::with_name(COUNT)
                .short(COUNT_SHORT)
                .long(COUNT)
                .takes_value(true)
                .help("How many photos to pick")))
        .subcommand(App::new(SEARCH)
            .about("Searches photos of the gallery")
            .arg(Arg::with_name(QUERY)
                .index(1)
                .required(true)
                .multiple(true)
                .help("Search terms")))
        .get_matches()
}

pub(crate) struct GlobalOpts {
    pub(crate) config_path: Option<String>,
    pub(crate) user: Option<String>,
    pub(crate) auth_key: Option<String>,
    pub(crate) json: bool,
}

impl GlobalOpts {
    pub(crate) fn build(matches: &ArgMatches) -> Self {
        GlobalOpts {
            config_path: matches.value_of(CONFIG).map(String::from),
            user: matches.value_of(USER).map(String::from),
            auth_key: matches.value_of(AUTHKEY).map(String::from),
            json: matches.is_present(JSON),
        }
    }
}

pub(crate) enum CliCommand {
    Gallery,
    Album { selector: String },
    Random { count: usize },
    Search { query: String },
}

impl CliCommand {
    pub(crate) fn build(matches: &ArgMatches) -> Result<Self, CliError> {
        match matches.subcommand() {
            (GALLERY, _) => Ok(CliCommand::Gallery),
            (ALBUM, Some(sub)) => {
                let selector = required(sub, SELECTOR)?;
                Ok(CliCommand::Album { selector })
            }
            (RANDOM, Some(sub)) => {
                let count = match sub.value_of(COUNT) {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| CliError(format!("--count expects a number, got '{}'", raw)))?,
                    None => DEFAULT_COUNT,
                };
                Ok(CliCommand::Random { count })
            }
            (SEARCH, Some(sub)) => {
                let terms: Vec<&str> = sub.values_of(QUERY).map(|v| v.collect()).unwrap_or_default();
                if terms.is_empty() {
                    return Err(CliError("search needs a query".to_owned()));
                }
                Ok(CliCommand::Search { query: terms.join(" ") })
            }
            ("", _) => Err(CliError("No command was provided, run `feedcache help` to learn more".to_owned())),
            (other, _) => Err(CliError(format!("Command {} is not valid", other))),
        }
    }
}

fn required(matches: &ArgMatches, name: &str) -> Result<String, CliError> {
    matches
        .value_of(name)
        .map(String::from)
        .ok_or_else(|| CliError(format!("missing <{}>", name)))
}
