//! Built-in application handlers.
//!
//! The chain treats the application handler as opaque; these are the
//! handlers weftd mounts when no external application is supplied. The
//! kv handler exposes the worker's key/value namespace over HTTP and
//! demonstrates signed session cookies.

use std::sync::Arc;

use http::{HeaderValue, Method, StatusCode, header};
use weft_core::{RequestEnvelope, ResponseEnvelope};
use weft_exchange::AppHandler;
use weft_state::KvNamespace;

const SESSION_COOKIE: &str = "weft_session";

/// Responds 404 to everything. Used when no application is mounted.
pub fn not_found() -> AppHandler {
    Arc::new(|_req| {
        Box::pin(async { Ok(ResponseEnvelope::new(StatusCode::NOT_FOUND, "Not Found")) })
    })
}

/// An application handler backed by a kv namespace.
///
/// Routes: `GET /kv` lists entries as JSON; `GET`/`PUT`/`DELETE`
/// `/kv/{key}` operate on one key; `GET /session` issues and verifies
/// a signed session cookie. Everything else is 404.
pub fn kv_app(kv: KvNamespace, session_secret: String) -> AppHandler {
    let secret = Arc::new(session_secret);
    Arc::new(move |req| {
        let kv = kv.clone();
        let secret = secret.clone();
        Box::pin(async move { route(req, kv, &secret).await })
    })
}

async fn route(
    req: RequestEnvelope,
    kv: KvNamespace,
    secret: &str,
) -> anyhow::Result<ResponseEnvelope> {
    let path = req.path().to_string();
    match path.as_str() {
        "/session" if req.method == Method::GET => session(&req, secret),
        "/kv" if req.method == Method::GET => list_entries(&kv).await,
        _ => match path.strip_prefix("/kv/") {
            Some(key) if !key.is_empty() => kv_entry(&req, &kv, key).await,
            _ => Ok(ResponseEnvelope::new(StatusCode::NOT_FOUND, "Not Found")),
        },
    }
}

async fn list_entries(kv: &KvNamespace) -> anyhow::Result<ResponseEnvelope> {
    let entries = kv.entries().await?;
    let map: serde_json::Map<String, serde_json::Value> = entries
        .into_iter()
        .map(|(k, v)| (k, serde_json::Value::String(v)))
        .collect();
    let mut resp = ResponseEnvelope::new(StatusCode::OK, serde_json::to_vec(&map)?);
    resp.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(resp)
}

async fn kv_entry(
    req: &RequestEnvelope,
    kv: &KvNamespace,
    key: &str,
) -> anyhow::Result<ResponseEnvelope> {
    match req.method {
        Method::GET => Ok(match kv.get(key).await? {
            Some(value) => ResponseEnvelope::new(StatusCode::OK, value),
            None => ResponseEnvelope::new(StatusCode::NOT_FOUND, "Not Found"),
        }),
        Method::PUT | Method::POST => {
            let body = req.body.clone().unwrap_or_default();
            let value = String::from_utf8(body.to_vec())?;
            kv.set(key, &value).await?;
            Ok(ResponseEnvelope::new(StatusCode::NO_CONTENT, ""))
        }
        Method::DELETE => Ok(if kv.delete(key).await? {
            ResponseEnvelope::new(StatusCode::NO_CONTENT, "")
        } else {
            ResponseEnvelope::new(StatusCode::NOT_FOUND, "Not Found")
        }),
        _ => Ok(ResponseEnvelope::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
        )),
    }
}

/// Issue a signed session cookie, or greet a returning session.
fn session(req: &RequestEnvelope, secret: &str) -> anyhow::Result<ResponseEnvelope> {
    if let Some(value) = req
        .headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| cookie_value(cookies, SESSION_COOKIE))
        .and_then(|signed| weft_session::unsign(signed, secret))
    {
        return Ok(ResponseEnvelope::new(
            StatusCode::OK,
            format!("welcome back, {value}"),
        ));
    }

    let signed = weft_session::sign("guest", secret);
    let mut resp = ResponseEnvelope::new(StatusCode::OK, "session started");
    resp.headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&format!("{SESSION_COOKIE}={signed}; HttpOnly; Path=/"))?,
    );
    Ok(resp)
}

fn cookie_value<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
}
