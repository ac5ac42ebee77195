// File: src/client/core.rs
use crate::client::redirect::{FollowRedirectLayer, FollowRedirectService};

use anyhow::{Context, Result, anyhow, bail};
use http::{Request, Uri, header};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use std::time::Duration;
use tower::ServiceExt;
use tower_http::auth::AddAuthorization;
use tower_layer::Layer;

pub const MAX_REDIRECTS: usize = 10;
const USER_AGENT: &str = concat!("cake/", env!("CARGO_PKG_VERSION"));

type HttpsClient = AddAuthorization<
    FollowRedirectService<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>,
>;

/// Subset of the Confluence content API answer we care about.
#[derive(Debug, Deserialize)]
struct ContentResponse {
    body: ContentBody,
}

#[derive(Debug, Deserialize)]
struct ContentBody {
    storage: StorageBody,
}

#[derive(Debug, Deserialize)]
struct StorageBody {
    value: String,
}

/// Appends the `expand=body.storage` query the content API needs to
/// include the page markup.
pub fn storage_url(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}expand=body.storage", url, sep)
}

/// Fetches wiki pages over HTTP(S) with basic authentication.
#[derive(Clone, Debug)]
pub struct ConfluenceClient {
    http: HttpsClient,
    timeout: Duration,
}

impl ConfluenceClient {
    pub fn new(login: &str, password: &str, timeout: Duration) -> Result<Self> {
        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() {
            // Plain HTTP still works; HTTPS handshakes will fail with a clear error.
            log::warn!("No valid system certificates found");
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let redirecting = FollowRedirectLayer::new(MAX_REDIRECTS).layer(http_client);
        let http = AddAuthorization::basic(redirecting, login, password);

        Ok(Self { http, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Downloads the page at `url` and returns its storage-format markup.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let full = storage_url(url);
        let uri: Uri = full
            .parse()
            .with_context(|| format!("Invalid page URL: {}", full))?;

        log::info!("Fetching {}", full);
        tokio::time::timeout(self.timeout, self.request_page(uri))
            .await
            .map_err(|_| anyhow!("Timed out after {:?} fetching {}", self.timeout, full))?
    }

    async fn request_page(&self, uri: Uri) -> Result<String> {
        let label = uri.to_string();
        let request = Request::get(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .body(String::new())?;

        let response = self
            .http
            .clone()
            .oneshot(request)
            .await
            .with_context(|| format!("Request to {} failed", label))?;

        let status = response.status();
        log::debug!("{} answered {}", label, status);

        let body = response
            .into_body()
            .collect()
            .await
            .with_context(|| format!("Failed to read response from {}", label))?
            .to_bytes();

        if !status.is_success() {
            bail!("{} answered {}", label, status);
        }

        let content: ContentResponse = serde_json::from_slice(&body)
            .with_context(|| format!("Unexpected page payload from {}", label))?;
        Ok(content.body.storage.value)
    }
}
