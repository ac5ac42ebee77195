// File: ./src/server.rs
//! Daemon mode: serves the parsed roster as JSON over HTTP.
//!
//! Every request parses the latest page snapshot from scratch, so the
//! "on duty" flag follows the wall clock without restarting the daemon.
use crate::client::ConfluenceClient;
use crate::render;
use crate::schedule::ScheduleParser;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

pub const DEFAULT_LISTEN: &str = ":8080";

/// Pause after a failed `accept`, e.g. while out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Shared state of the daemon: the parser and the latest page text.
pub struct ServerState {
    parser: ScheduleParser,
    document: RwLock<Arc<String>>,
    clock: Clock,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    pub fn new(parser: ScheduleParser, document: String) -> Self {
        Self::with_clock(parser, document, || Local::now().date_naive())
    }

    /// Like [`ServerState::new`] with a fixed source for "today".
    pub fn with_clock<F>(parser: ScheduleParser, document: String, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        Self {
            parser,
            document: RwLock::new(Arc::new(document)),
            clock: Box::new(clock),
        }
    }

    pub async fn snapshot(&self) -> Arc<String> {
        self.document.read().await.clone()
    }

    pub async fn replace(&self, document: String) {
        *self.document.write().await = Arc::new(document);
    }

    /// Builds the answer for `path`: `/current` yields only the person on
    /// duty, any other path the whole roster.
    pub async fn respond(&self, path: &str) -> Response<Full<Bytes>> {
        let document = self.snapshot().await;
        let roster = self.parser.parse(&document, (self.clock)());
        let current_only = path.trim_end_matches('/') == "/current";

        match render::to_json(&roster, current_only) {
            Ok(json) => json_response(StatusCode::OK, json),
            Err(e) => {
                log::error!("Failed to encode roster: {}", e);
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    r#"{"error":"encoding failed"}"#.to_string(),
                )
            }
        }
    }
}

fn json_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Turns a Go-style `:8080` into a bindable `0.0.0.0:8080`.
pub fn normalize_listen_addr(listen: &str) -> String {
    let listen = listen.trim();
    if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    }
}

pub async fn bind(listen: &str) -> Result<TcpListener> {
    let addr = normalize_listen_addr(listen);
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Can't start daemon on {}", addr))
}

/// Source of incoming connections for [`serve_on`].
pub trait Accept: Send {
    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl Accept for TcpListener {
    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        TcpListener::accept(self)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}

/// Serves the roster on `listener` forever.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> Result<()> {
    serve_on(listener, state).await
}

/// Accepts connections from `acceptor` forever. Failed accepts are logged
/// and retried after a short pause.
pub async fn serve_on<A: Accept>(mut acceptor: A, state: Arc<ServerState>) -> Result<()> {
    log::info!("Serving schedule at {}", acceptor.local_addr()?);

    loop {
        let (stream, peer) = match acceptor.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                log::warn!("Accept failed: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let state = state.clone();
                async move {
                    log::debug!("{} {} from {}", req.method(), req.uri(), peer);
                    Ok::<_, Infallible>(state.respond(req.uri().path()).await)
                }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                log::warn!("Connection from {} failed: {}", peer, e);
            }
        });
    }
}

/// Refetches the page every `every`, keeping the old snapshot on failure.
pub fn spawn_refresh(
    state: Arc<ServerState>,
    client: ConfluenceClient,
    url: String,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately; the page was just fetched.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match client.fetch_page(&url).await {
                Ok(page) => {
                    state.replace(page).await;
                    log::info!("Schedule refreshed from {}", url);
                }
                Err(e) => log::warn!("Refresh failed, keeping previous schedule: {:#}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::MonthTable;
    use http_body_util::BodyExt;

    const PAGE: &str = r#"<table><tr><td style="background-color: rgb(1,1,1);">Alice</td></tr></table><p>January, 2024</p><table><tr><td style="background-color: rgb(1,1,1);">15</td></tr></table>"#;

    fn state() -> ServerState {
        ServerState::with_clock(
            ScheduleParser::new(MonthTable::english()),
            PAGE.to_string(),
            || NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_listen_addr() {
        assert_eq!(normalize_listen_addr(":8080"), "0.0.0.0:8080");
        assert_eq!(normalize_listen_addr("127.0.0.1:9000"), "127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_respond_full_roster() {
        let response = state().respond("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let json = body_json(response).await;
        assert_eq!(json[0]["Name"], "Alice");
        assert_eq!(json[0]["Current"], true);
    }

    #[tokio::test]
    async fn test_respond_current_follows_snapshot() {
        let state = state();
        let json = body_json(state.respond("/current").await).await;
        assert_eq!(json["Name"], "Alice");

        state.replace("<p>nothing here</p>".to_string()).await;
        let json = body_json(state.respond("/current/").await).await;
        assert!(json.is_null());
    }
}
