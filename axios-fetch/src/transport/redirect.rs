//! Redirect policy for the hyper transport.
//!
//! Follows redirects the way a fetch primitive does in its default `follow`
//! mode: up to [`MAX_REDIRECTS`] hops, request bodies replayed for 307/308,
//! and credentials dropped once the chain leaves the original origin.
//! Method rewriting for 301/302/303 is handled by `tower_http` itself.

use http::{Request, Uri, header};
use tower_http::follow_redirect::policy::{Action, Attempt, Policy};

/// Redirect limit of a fetch primitive.
pub const MAX_REDIRECTS: usize = 20;

const CREDENTIAL_HEADERS: &[header::HeaderName] = &[
    header::AUTHORIZATION,
    header::COOKIE,
    header::PROXY_AUTHORIZATION,
];

/// Per-request redirect state. Cloned fresh for every request.
#[derive(Clone, Debug)]
pub struct FetchRedirectPolicy {
    max_redirects: usize,
    followed: usize,
    cross_origin: bool,
}

impl FetchRedirectPolicy {
    pub fn new(max_redirects: usize) -> Self {
        Self {
            max_redirects,
            followed: 0,
            cross_origin: false,
        }
    }
}

impl Default for FetchRedirectPolicy {
    fn default() -> Self {
        Self::new(MAX_REDIRECTS)
    }
}

fn origin(uri: &Uri) -> (&str, &str, u16) {
    let scheme = uri.scheme_str().unwrap_or("https");
    let port = uri.port_u16().unwrap_or(match scheme {
        "http" => 80,
        "https" => 443,
        _ => 0,
    });
    (scheme, uri.host().unwrap_or(""), port)
}

fn same_origin(a: &Uri, b: &Uri) -> bool {
    origin(a) == origin(b)
}

impl<B: Clone, E> Policy<B, E> for FetchRedirectPolicy {
    fn redirect(&mut self, attempt: &Attempt<'_>) -> Result<Action, E> {
        if self.followed >= self.max_redirects {
            #[cfg(feature = "tracing")]
            tracing::debug!(max = self.max_redirects, "redirect limit reached");
            return Ok(Action::Stop);
        }
        self.followed += 1;

        if !same_origin(attempt.previous(), attempt.location()) {
            self.cross_origin = true;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            status = attempt.status().as_u16(),
            location = %attempt.location(),
            "following redirect"
        );
        Ok(Action::Follow)
    }

    fn on_request(&mut self, request: &mut Request<B>) {
        if self.cross_origin {
            let headers = request.headers_mut();
            for name in CREDENTIAL_HEADERS {
                headers.remove(name);
            }
        }
    }

    fn clone_body(&self, body: &B) -> Option<B> {
        Some(body.clone())
    }
}
