// File: ./src/client/redirect.rs
// Tower layer that follows HTTP redirects for page fetches.
use http::header::{AUTHORIZATION, LOCATION};
use http::{Request, Response, Uri};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

#[derive(Clone, Debug)]
pub struct FollowRedirectLayer {
    max_redirects: usize,
}

impl FollowRedirectLayer {
    pub fn new(max_redirects: usize) -> Self {
        Self { max_redirects }
    }
}

impl<S> Layer<S> for FollowRedirectLayer {
    type Service = FollowRedirectService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FollowRedirectService {
            inner,
            max_redirects: self.max_redirects,
        }
    }
}

/// Re-issues the request against `Location` on 3xx answers.
///
/// Credentials are only forwarded while the redirect stays on the same
/// authority. After `max_redirects` hops the last 3xx is returned as-is.
#[derive(Clone, Debug)]
pub struct FollowRedirectService<S> {
    inner: S,
    max_redirects: usize,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for FollowRedirectService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
    ReqBody: Clone + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut inner = self.inner.clone();
        let max_redirects = self.max_redirects;

        Box::pin(async move {
            let mut req = req;
            let mut hops = 0;

            loop {
                let retry = req.clone();
                let response = inner.call(req).await?;

                if hops >= max_redirects || !response.status().is_redirection() {
                    return Ok(response);
                }

                let next = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|loc| resolve_location(retry.uri(), loc));
                let Some(next) = next else {
                    return Ok(response);
                };

                log::debug!("Redirect {} -> {}", retry.uri(), next);
                req = retry;
                if req.uri().authority() != next.authority() {
                    req.headers_mut().remove(AUTHORIZATION);
                }
                *req.uri_mut() = next;
                hops += 1;
            }
        })
    }
}

/// Resolves a `Location` header value against the URI that produced it.
///
/// Handles absolute URLs, scheme-relative (`//host/path`), root-relative
/// (`/path`) and document-relative (`path`) forms.
pub fn resolve_location(base: &Uri, location: &str) -> Option<Uri> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }

    if let Ok(absolute) = location.parse::<Uri>()
        && absolute.scheme().is_some()
    {
        return Some(absolute);
    }

    let scheme = base.scheme_str().unwrap_or("http");

    if let Some(rest) = location.strip_prefix("//") {
        return format!("{}://{}", scheme, rest).parse().ok();
    }

    let authority = base.authority()?;
    let path = if location.starts_with('/') {
        location.to_string()
    } else {
        let dir = match base.path().rfind('/') {
            Some(i) => &base.path()[..=i],
            None => "/",
        };
        format!("{}{}", dir, location)
    };

    Uri::builder()
        .scheme(scheme)
        .authority(authority.as_str())
        .path_and_query(path)
        .build()
        .ok()
}
