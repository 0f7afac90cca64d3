//! Static asset handler.
//!
//! Resolves a request path under a configured public directory, reads
//! the file fully, and attaches Content-Type and Cache-Control headers.
//! A miss (no such file, or the path names a directory) is classified
//! distinctly from every other I/O failure so the handler chain can
//! fall through on exactly those two conditions.

use std::io;
use std::path::PathBuf;

use http::{HeaderValue, StatusCode, header};
use tracing::warn;
use weft_core::config::StaticFilesConfig;
use weft_core::{ExchangeError, ExchangeResult, RequestEnvelope, ResponseEnvelope};

use crate::cache::CacheControl;

/// Immutable static-file resolver, shared across concurrent exchanges.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    public_dir: PathBuf,
    assets_public_path: String,
    cache_control: CacheControl,
}

impl StaticFiles {
    pub fn new(config: &StaticFilesConfig) -> Self {
        let cache_control = match &config.cache_control {
            Some(directive) => CacheControl::Fixed(directive.clone()),
            None => CacheControl::Default,
        };
        Self {
            public_dir: config.public_dir.clone(),
            assets_public_path: config.assets_public_path.clone(),
            cache_control,
        }
    }

    /// Replace the Cache-Control behavior entirely.
    pub fn with_cache_control(mut self, cache_control: CacheControl) -> Self {
        self.cache_control = cache_control;
        self
    }

    /// Attempt to serve the request from the public directory.
    ///
    /// Returns a 200 envelope with the file's bytes on a hit. A `..`
    /// segment anywhere in the path is classified as a miss — it can
    /// never escape `public_dir`. The file handle does not outlive
    /// this call.
    pub async fn serve(&self, req: &RequestEnvelope) -> ExchangeResult<ResponseEnvelope> {
        let url_path = req.path();

        if url_path.split('/').any(|segment| segment == "..") {
            return Err(ExchangeError::AssetNotFound(url_path.to_string()));
        }

        let file_path = self.public_dir.join(url_path.trim_start_matches('/'));
        let bytes = tokio::fs::read(&file_path)
            .await
            .map_err(|e| classify_read_error(url_path, e))?;

        let mut resp = ResponseEnvelope::new(StatusCode::OK, bytes);

        // Content type is a best-effort extension lookup; no mapping
        // means no header, never a guess.
        if let Some(content_type) = mime_guess::from_path(&file_path).first_raw() {
            resp.headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        let directive = self.cache_control.directive(&req.url, &self.assets_public_path);
        match HeaderValue::from_str(&directive) {
            Ok(value) => {
                resp.headers.insert(header::CACHE_CONTROL, value);
            }
            Err(_) => {
                warn!(
                    path = url_path,
                    directive, "cache-control override is not a valid header value, omitting header"
                );
            }
        }

        Ok(resp)
    }
}

fn classify_read_error(url_path: &str, err: io::Error) -> ExchangeError {
    match err.kind() {
        io::ErrorKind::NotFound => ExchangeError::AssetNotFound(url_path.to_string()),
        io::ErrorKind::IsADirectory => ExchangeError::AssetIsDirectory(url_path.to_string()),
        _ => ExchangeError::AssetIo {
            path: url_path.to_string(),
            source: err,
        },
    }
}
