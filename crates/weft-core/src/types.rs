//! Exchange envelopes and boundary messages.
//!
//! Envelopes are the live representation handled inside the worker:
//! `http` types, ordered headers, fully materialized bodies. Boundary
//! messages are the plain-data records that actually cross the isolate
//! boundary — strings, byte sequences, name/value pair sequences,
//! primitive flags. Nothing in a boundary message is live: no streams,
//! no functions, no handles.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use serde::{Deserialize, Serialize};

/// A decoded request, ready for the handler chain.
///
/// The body is always fully materialized; GET and HEAD requests never
/// carry one (the codec enforces this at decode time).
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub method: Method,
    /// Absolute URL (scheme and authority are guaranteed by the codec).
    pub url: Uri,
    /// Ordered, case-insensitive, duplicates preserved.
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RequestEnvelope {
    /// Path component of the request URL.
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// Response category, mirroring the boundary wire values.
///
/// Locally constructed responses are always `Basic`; the other variants
/// exist so a decoded upstream response can round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Basic,
    Cors,
    Opaque,
    OpaqueRedirect,
    Error,
}

impl ResponseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::Basic => "basic",
            ResponseKind::Cors => "cors",
            ResponseKind::Opaque => "opaque",
            ResponseKind::OpaqueRedirect => "opaqueredirect",
            ResponseKind::Error => "error",
        }
    }
}

/// A response produced by a handler, not yet encoded for the boundary.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub status: StatusCode,
    /// May be empty; defaults to the canonical reason phrase.
    pub status_text: String,
    pub headers: HeaderMap,
    pub kind: ResponseKind,
    /// True only if the response resulted from following a redirect.
    /// Always false for locally constructed responses.
    pub redirected: bool,
    /// Fully materialized body; empty is valid.
    pub body: Bytes,
}

impl ResponseEnvelope {
    /// A locally constructed response with the given status and body.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers: HeaderMap::new(),
            kind: ResponseKind::Basic,
            redirected: false,
            body: body.into(),
        }
    }

    /// Derived flag: status in [200, 299].
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }
}

/// Inbound boundary message: a request as plain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryRequest {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
}

/// Outbound boundary message: a response as plain data.
///
/// Field names match the wire contract (`statusText`, `type`). The
/// `headers` field is an ordered sequence of name/value pairs so the
/// order of handler-set headers survives the boundary. The `url` field
/// echoes the original request URL, and `trailer` is reserved — this
/// system never produces trailing headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryResponse {
    pub headers: Vec<(String, String)>,
    pub ok: bool,
    pub redirected: bool,
    pub status: u16,
    pub status_text: String,
    #[serde(default)]
    pub trailer: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub body: Vec<u8>,
}
