// File: ./src/cli.rs
//! Command-line interface of the `cake` binary.
use crate::config::Config;
use crate::server::DEFAULT_LISTEN;
use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

const LONG_ABOUT: &str = "\
Reads a Confluence page holding an on-call schedule and prints it as a table or
JSON, or serves it over HTTP.

The page must contain two kinds of tables. The first lists the people on duty,
one row each, with the name and an optional e-mail address and Slack link:

    +--------+--------------------------------------------+
    | <name> | email@example.com / @link.to.slack.contact |
    +--------+--------------------------------------------+

Every row must have its own background colour. It is followed by one or more
calendar tables, each optionally headed by \"<Month>, <Year>\". Day cells are
coloured like the roster row of the person on duty that day.";

/// Where the page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource<'a> {
    Url(&'a str),
    Id(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    List,
    Daemon,
}

/// Confluence schedule table reader.
#[derive(Parser, Debug)]
#[command(name = "cake", version, about = "Confluence schedule table reader", long_about = LONG_ABOUT)]
#[command(group(ArgGroup::new("source").required(true).args(["id", "url"])))]
#[command(group(ArgGroup::new("mode").required(true).args(["list", "daemon"])))]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// List mode: print the schedule and exit.
    #[arg(short = 'L', long)]
    pub list: bool,

    /// Dump JSON instead of a text table (list mode).
    #[arg(short, long, requires = "list")]
    pub json: bool,

    /// Print only the person currently on duty (list mode).
    #[arg(short, long, requires = "list")]
    pub current: bool,

    /// Daemon mode: serve the schedule as JSON over HTTP.
    #[arg(short = 'D', long)]
    pub daemon: bool,

    /// Listen address and port for daemon mode.
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Page URL, used as-is.
    #[arg(long)]
    pub url: Option<String>,

    /// Article ID, expanded through the config URL template.
    #[arg(long)]
    pub id: Option<String>,

    /// Confluence user login.
    #[arg(long, requires = "password")]
    pub login: Option<String>,

    /// Confluence user password.
    #[arg(long, requires = "login")]
    pub password: Option<String>,

    /// Path to the TOML config file [default: <config dir>/cake.conf].
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.daemon { Mode::Daemon } else { Mode::List }
    }

    pub fn source(&self) -> PageSource<'_> {
        match (&self.url, &self.id) {
            (Some(url), _) => PageSource::Url(url),
            (None, Some(id)) => PageSource::Id(id),
            // clap enforces the group; treat a bare call as an empty ID.
            (None, None) => PageSource::Id(""),
        }
    }

    /// Loads the config file and applies credentials from the command line.
    ///
    /// The file is required when no `--login` is given or when `--config`
    /// names it explicitly; otherwise it is read only if it exists.
    pub fn resolve_config(&self) -> Result<Config> {
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => Config::default_path().ok(),
        };
        let required = self.config.is_some() || self.login.is_none();

        let config = match path {
            Some(path) if required || path.exists() => {
                Config::load(&path).context("can't load config")?
            }
            Some(_) => Config::default(),
            None if required => anyhow::bail!("can't load config: no config directory"),
            None => Config::default(),
        };

        let config = match (&self.login, &self.password) {
            (Some(login), Some(password)) => config.with_credentials(login, password),
            _ => config,
        };
        config.ensure_credentials()?;
        Ok(config)
    }

    /// The URL to fetch, from `--url` or the config template and `--id`.
    pub fn page_url(&self, config: &Config) -> Result<String> {
        match self.source() {
            PageSource::Url(url) => Ok(url.to_string()),
            PageSource::Id(id) => config.article_url(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("cake").chain(args.iter().copied()))
    }

    #[test]
    fn test_list_json_current() {
        let cli = parse(&["-L", "-j", "-c", "--id", "42"]).unwrap();
        assert_eq!(cli.mode(), Mode::List);
        assert!(cli.json && cli.current);
        assert_eq!(cli.source(), PageSource::Id("42"));
        assert_eq!(cli.listen, ":8080");
    }

    #[test]
    fn test_daemon_with_url() {
        let cli = parse(&["-D", "--listen", "127.0.0.1:9000", "--url", "http://w/p"]).unwrap();
        assert_eq!(cli.mode(), Mode::Daemon);
        assert_eq!(cli.source(), PageSource::Url("http://w/p"));
        assert_eq!(cli.listen, "127.0.0.1:9000");
    }

    #[test]
    fn test_mode_and_source_required() {
        assert!(parse(&["--id", "1"]).is_err());
        assert!(parse(&["-L"]).is_err());
        assert!(parse(&["-L", "-D", "--id", "1"]).is_err());
        assert!(parse(&["-L", "--id", "1", "--url", "http://w"]).is_err());
    }

    #[test]
    fn test_json_needs_list_mode() {
        assert!(parse(&["-D", "-j", "--id", "1"]).is_err());
    }

    #[test]
    fn test_login_needs_password() {
        assert!(parse(&["-L", "--id", "1", "--login", "bot"]).is_err());
        let cli = parse(&["-L", "--id", "1", "--login", "bot", "--password", "pw"]).unwrap();
        assert_eq!(cli.login.as_deref(), Some("bot"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let cli = parse(&[
            "-L",
            "--id",
            "1",
            "--config",
            "/nonexistent/cake/cake.conf",
        ])
        .unwrap();
        let err = cli.resolve_config().unwrap_err();
        assert!(Config::is_missing_config_error(&err));
    }

    #[test]
    fn test_url_source_ignores_template() {
        let cli = parse(&["-L", "--url", "https://wiki/x"]).unwrap();
        assert_eq!(cli.page_url(&Config::default()).unwrap(), "https://wiki/x");
    }
}
