use crate::constants::headers::{STRIPPED_REQUEST, STRIPPED_RESPONSE};
use http::header::{HeaderMap, ACCEPT_ENCODING, TRANSFER_ENCODING};

/// Caller headers as they should reach the upstream. The HTTP client recomputes
/// framing and negotiates only encodings it can decode, so `Transfer-Encoding` and
/// `Accept-Encoding` go as well.
pub fn outbound(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = incoming.clone();
    for name in STRIPPED_REQUEST.iter() {
        headers.remove(name);
    }
    headers.remove(TRANSFER_ENCODING);
    headers.remove(ACCEPT_ENCODING);
    headers
}

/// Upstream headers as they should reach the caller. `Set-Cookie` is dropped here
/// and re-added after rewriting.
pub fn inbound(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    for name in STRIPPED_RESPONSE.iter() {
        headers.remove(name);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{self, HeaderValue};

    #[test]
    fn outbound_drops_hop_by_hop_and_cookie() {
        let mut h = HeaderMap::new();
        h.insert(header::HOST, HeaderValue::from_static("relay.local:8080"));
        h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        h.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        h.insert(header::COOKIE, HeaderValue::from_static("a=1"));
        h.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("zstd"));
        h.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        h.insert("x-n8n-trace", HeaderValue::from_static("1"));

        let out = outbound(&h);
        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get(header::CONTENT_LENGTH).is_none());
        assert!(out.get(header::COOKIE).is_none());
        assert!(out.get(header::ACCEPT_ENCODING).is_none());
        assert_eq!(out.get(header::ACCEPT).unwrap(), "application/json");
        assert_eq!(out.get("x-n8n-trace").unwrap(), "1");
    }

    #[test]
    fn inbound_drops_framing_and_encoding() {
        let mut h = HeaderMap::new();
        h.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        h.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        h.insert(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
        h.insert(header::CONNECTION, HeaderValue::from_static("close"));
        h.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        h.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        h.insert(header::LOCATION, HeaderValue::from_static("/signin"));

        let out = inbound(&h);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(header::CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(out.get(header::LOCATION).unwrap(), "/signin");
    }

    #[test]
    fn repeated_headers_are_preserved() {
        let mut h = HeaderMap::new();
        h.append(header::VARY, HeaderValue::from_static("Accept"));
        h.append(header::VARY, HeaderValue::from_static("Origin"));

        let out = inbound(&h);
        assert_eq!(out.get_all(header::VARY).iter().count(), 2);
    }
}
