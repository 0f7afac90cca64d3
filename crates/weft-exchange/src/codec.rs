//! Envelope codec: boundary message ⇄ exchange envelope.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri};
use tracing::debug;
use weft_core::{
    BoundaryRequest, BoundaryResponse, ExchangeError, ExchangeResult, RequestEnvelope,
    ResponseEnvelope,
};

/// The fixed verb set accepted at the boundary.
const METHODS: &[Method] = &[
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
    Method::PATCH,
    Method::CONNECT,
    Method::TRACE,
];

/// Decode an inbound boundary message into a request envelope.
///
/// Fails with [`ExchangeError::Malformed`] when the method is outside
/// the fixed verb set, the URL is missing or not absolute, or a header
/// name/value cannot be represented. A body supplied alongside GET or
/// HEAD is dropped: those verbs never carry one in this protocol.
pub fn decode(msg: BoundaryRequest) -> ExchangeResult<RequestEnvelope> {
    let method = parse_method(&msg.method)?;

    let url: Uri = msg
        .url
        .parse()
        .map_err(|e| ExchangeError::Malformed(format!("invalid url {:?}: {e}", msg.url)))?;
    if url.scheme().is_none() || url.authority().is_none() {
        return Err(ExchangeError::Malformed(format!(
            "url must be absolute: {:?}",
            msg.url
        )));
    }

    let headers = headers_from_map(&msg.headers)?;

    let body = match msg.body {
        Some(_) if method == Method::GET || method == Method::HEAD => {
            debug!(method = %method, "dropping request body on bodyless verb");
            None
        }
        Some(bytes) => Some(Bytes::from(bytes)),
        None => None,
    };

    Ok(RequestEnvelope {
        method,
        url,
        headers,
        body,
    })
}

/// Encode a response envelope into an outbound boundary message.
///
/// `request_url` is echoed in the outbound `url` field — the boundary
/// contract reports the URL of the exchange, not anything the response
/// carries. Headers flatten to an ordered name/value sequence that
/// preserves the order handler-set headers were added in; on a
/// repeated name the last value wins, keeping the name's original
/// position (accepted lossy simplification — the envelope itself keeps
/// duplicates, so a multi-value wire shape would be a codec-only
/// change). The body is already fully materialized, so nothing is
/// truncated.
pub fn encode(request_url: &str, resp: ResponseEnvelope) -> BoundaryResponse {
    let mut headers: Vec<(String, String)> = Vec::with_capacity(resp.headers.keys_len());
    for (name, value) in resp.headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match headers.iter_mut().find(|(n, _)| *n == name.as_str()) {
            Some((_, existing)) => *existing = value,
            None => headers.push((name.as_str().to_string(), value)),
        }
    }

    BoundaryResponse {
        headers,
        ok: resp.ok(),
        redirected: resp.redirected,
        status: resp.status.as_u16(),
        status_text: resp.status_text,
        trailer: BTreeMap::new(),
        kind: resp.kind.as_str().to_string(),
        url: request_url.to_string(),
        body: resp.body.into(),
    }
}

fn parse_method(raw: &str) -> ExchangeResult<Method> {
    METHODS
        .iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(raw))
        .cloned()
        .ok_or_else(|| ExchangeError::Malformed(format!("unknown method {raw:?}")))
}

fn headers_from_map(map: &BTreeMap<String, String>) -> ExchangeResult<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(map.len());
    for (name, value) in map {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ExchangeError::Malformed(format!("invalid header name {name:?}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ExchangeError::Malformed(format!("invalid value for header {name}")))?;
        headers.append(name, value);
    }
    Ok(headers)
}
