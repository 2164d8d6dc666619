//! Identity extractors.
//!
//! An extractor maps a request to the identity string it is counted against.
//! The limiter uses whatever it returns verbatim as the map key; nothing here
//! normalizes or validates identities.

use http::header::HeaderName;
use http::Request;
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared, type-erased identity extractor.
pub type Extractor<Req> = Arc<dyn Fn(&Req) -> String + Send + Sync>;

/// Identity used by [`peer_addr`] when the request carries no socket address.
pub const UNKNOWN_PEER: &str = "unknown";

/// Wrap a closure as an [`Extractor`].
pub fn from_fn<Req, F>(f: F) -> Extractor<Req>
where
    F: Fn(&Req) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Identify callers by the value of a request header.
///
/// A missing header yields the empty string, so all such requests share one
/// window. Non-UTF-8 bytes are replaced lossily.
pub fn header<B: 'static>(name: HeaderName) -> Extractor<Request<B>> {
    Arc::new(move |req: &Request<B>| {
        req.headers()
            .get(&name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default()
    })
}

/// Identify callers by the client IP of the `SocketAddr` stored in the request
/// extensions (servers insert it when accepting the connection).
pub fn peer_addr<B: 'static>() -> Extractor<Request<B>> {
    Arc::new(|req: &Request<B>| {
        req.extensions()
            .get::<SocketAddr>()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_PEER.to_string())
    })
}

/// Count every request against one shared identity.
pub fn global<Req: 'static>(key: impl Into<String>) -> Extractor<Req> {
    let key = key.into();
    Arc::new(move |_: &Req| key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_extractor_reads_value() {
        let extract = header::<()>(HeaderName::from_static("x-api-key"));
        let req = Request::builder().header("x-api-key", "abc123").body(()).unwrap();
        assert_eq!(extract(&req), "abc123");
    }

    #[test]
    fn header_extractor_missing_header_is_empty() {
        let extract = header::<()>(HeaderName::from_static("x-api-key"));
        let req = Request::builder().body(()).unwrap();
        assert_eq!(extract(&req), "");
    }

    #[test]
    fn peer_addr_uses_ip_only() {
        let extract = peer_addr::<()>();
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut().insert("10.0.0.7:5123".parse::<SocketAddr>().unwrap());
        assert_eq!(extract(&req), "10.0.0.7");
    }

    #[test]
    fn peer_addr_falls_back_to_unknown() {
        let extract = peer_addr::<()>();
        let req = Request::builder().body(()).unwrap();
        assert_eq!(extract(&req), UNKNOWN_PEER);
    }

    #[test]
    fn from_fn_wraps_closure() {
        let extract = from_fn(|req: &Request<()>| req.uri().path().trim_start_matches('/').to_string());
        let req = Request::builder().uri("/tenant-7").body(()).unwrap();
        assert_eq!(extract(&req), "tenant-7");
        let shared = extract.clone();
        assert_eq!(shared(&req), "tenant-7");
    }

    #[test]
    fn global_extractor_ignores_request() {
        let extract = global::<&str>("all");
        assert_eq!(extract(&"a"), "all");
        assert_eq!(extract(&"b"), "all");
    }
}
