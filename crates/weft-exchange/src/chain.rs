//! Fallback handler chain: static assets first, application second.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, error};
use weft_core::{
    BoundaryRequest, BoundaryResponse, ExchangeResult, RequestEnvelope, ResponseEnvelope,
};

use crate::codec;
use crate::static_files::StaticFiles;

type BoxResponseFuture =
    Pin<Box<dyn Future<Output = anyhow::Result<ResponseEnvelope>> + Send>>;

/// The host-supplied application handler.
///
/// Opaque to the chain: it either produces a response envelope or fails
/// with any error. It never signals "miss" — there is no fallback after
/// it.
pub type AppHandler = Arc<dyn Fn(RequestEnvelope) -> BoxResponseFuture + Send + Sync>;

/// Two-stage handler chain, constructed once and reused for every
/// exchange. Holds no per-exchange state, so concurrent exchanges need
/// no coordination.
#[derive(Clone)]
pub struct HandlerChain {
    static_files: Option<StaticFiles>,
    app: AppHandler,
}

impl HandlerChain {
    /// A chain with only the application stage.
    pub fn new(app: AppHandler) -> Self {
        Self {
            static_files: None,
            app,
        }
    }

    /// Mount a static-asset stage ahead of the application stage.
    pub fn with_static_files(mut self, static_files: StaticFiles) -> Self {
        self.static_files = Some(static_files);
        self
    }

    /// Run one exchange through the chain.
    ///
    /// The static stage fully resolves before the application stage is
    /// considered. A classified miss falls through; any other static
    /// failure surfaces. The application handler receives the original
    /// envelope, and any failure from it — an error or a panic —
    /// becomes a generic 500 "Internal Error"; the failure itself is
    /// logged, never sent across the boundary. Each stage runs at most
    /// once.
    pub async fn handle(&self, req: RequestEnvelope) -> ExchangeResult<ResponseEnvelope> {
        if let Some(static_files) = &self.static_files {
            match static_files.serve(&req).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_fallback_trigger() => {
                    debug!(path = req.path(), reason = %e, "static miss, trying application handler");
                }
                Err(e) => return Err(e),
            }
        }

        // The handler runs on its own task so a panic unwinds into a
        // join error here instead of tearing down the exchange.
        match tokio::spawn((self.app)(req)).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(e)) => {
                error!(error = %e, "application handler failed");
                Ok(internal_error())
            }
            Err(e) => {
                if e.is_panic() {
                    error!(error = %e, "application handler panicked");
                } else {
                    error!(error = %e, "application handler task cancelled");
                }
                Ok(internal_error())
            }
        }
    }

    /// Full data-flow pipeline for one boundary message:
    /// decode → handle → encode.
    pub async fn handle_message(&self, msg: BoundaryRequest) -> ExchangeResult<BoundaryResponse> {
        let request_url = msg.url.clone();
        let req = codec::decode(msg)?;
        let resp = self.handle(req).await?;
        Ok(codec::encode(&request_url, resp))
    }
}

fn internal_error() -> ResponseEnvelope {
    ResponseEnvelope::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use weft_core::ExchangeError;
    use weft_core::config::StaticFilesConfig;

    fn request(url: &str) -> RequestEnvelope {
        RequestEnvelope {
            method: Method::GET,
            url: url.parse().unwrap(),
            headers: http::HeaderMap::new(),
            body: None,
        }
    }

    fn app_ok(body: &'static str) -> AppHandler {
        Arc::new(move |_req| {
            Box::pin(async move { Ok(ResponseEnvelope::new(StatusCode::OK, body)) })
        })
    }

    fn app_failing() -> AppHandler {
        Arc::new(|_req| Box::pin(async { Err(anyhow::anyhow!("boom")) }))
    }

    fn static_stage(root: &std::path::Path) -> StaticFiles {
        StaticFiles::new(&StaticFilesConfig {
            public_dir: root.to_path_buf(),
            assets_public_path: "/build/".to_string(),
            cache_control: None,
        })
    }

    #[tokio::test]
    async fn static_hit_short_circuits() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("app.css"), "css").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let app: AppHandler = Arc::new(move |_req| {
            calls2.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(ResponseEnvelope::new(StatusCode::OK, "app")) })
        });

        let chain = HandlerChain::new(app).with_static_files(static_stage(root.path()));
        let resp = chain.handle(request("http://localhost/app.css")).await.unwrap();

        assert_eq!(resp.body.as_ref(), b"css");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn static_miss_falls_through_to_app() {
        let root = tempfile::tempdir().unwrap();
        let chain = HandlerChain::new(app_ok("from app"))
            .with_static_files(static_stage(root.path()));

        let resp = chain
            .handle(request("http://localhost/missing.css"))
            .await
            .unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body.as_ref(), b"from app");
    }

    #[tokio::test]
    async fn directory_falls_through_like_not_found() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("images")).unwrap();

        let chain = HandlerChain::new(app_ok("from app"))
            .with_static_files(static_stage(root.path()));
        let resp = chain.handle(request("http://localhost/images")).await.unwrap();
        assert_eq!(resp.body.as_ref(), b"from app");
    }

    #[tokio::test]
    async fn app_receives_original_request() {
        let root = tempfile::tempdir().unwrap();
        let app: AppHandler = Arc::new(|req| {
            Box::pin(async move {
                assert_eq!(req.url.to_string(), "http://localhost/missing.css?v=1");
                assert_eq!(req.headers.get("x-proto").unwrap(), "Test");
                Ok(ResponseEnvelope::new(StatusCode::OK, "seen"))
            })
        });
        let chain = HandlerChain::new(app).with_static_files(static_stage(root.path()));

        let mut req = request("http://localhost/missing.css?v=1");
        req.headers
            .insert("x-proto", http::HeaderValue::from_static("Test"));
        let resp = chain.handle(req).await.unwrap();
        assert_eq!(resp.body.as_ref(), b"seen");
    }

    #[tokio::test]
    async fn app_failure_becomes_internal_error_500() {
        let chain = HandlerChain::new(app_failing());
        let resp = chain.handle(request("http://localhost/")).await.unwrap();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body.as_ref(), b"Internal Error");
    }

    #[tokio::test]
    async fn app_panic_becomes_internal_error_500() {
        let app: AppHandler = Arc::new(|_req| {
            Box::pin(async { panic!("handler blew up") })
        });
        let chain = HandlerChain::new(app);
        let resp = chain.handle(request("http://localhost/")).await.unwrap();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body.as_ref(), b"Internal Error");
    }

    #[tokio::test]
    async fn app_failure_after_static_miss_becomes_500() {
        let root = tempfile::tempdir().unwrap();
        let chain = HandlerChain::new(app_failing())
            .with_static_files(static_stage(root.path()));
        let resp = chain.handle(request("http://localhost/nope")).await.unwrap();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body.as_ref(), b"Internal Error");
    }

    #[tokio::test]
    async fn handle_message_round_trips_request_url() {
        let chain = HandlerChain::new(app_ok("hello"));
        let msg = BoundaryRequest {
            url: "http://localhost:8080/some/page?q=1".to_string(),
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            body: None,
        };
        let out = chain.handle_message(msg).await.unwrap();
        assert_eq!(out.url, "http://localhost:8080/some/page?q=1");
        assert_eq!(out.status, 200);
        assert!(out.ok);
        assert_eq!(out.body, b"hello");
    }

    #[tokio::test]
    async fn handle_message_rejects_malformed_url() {
        let chain = HandlerChain::new(app_ok("never"));
        let msg = BoundaryRequest {
            url: "not a url".to_string(),
            method: "GET".to_string(),
            headers: BTreeMap::new(),
            body: None,
        };
        let err = chain.handle_message(msg).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Malformed(_)));
    }

    #[tokio::test]
    async fn chain_is_shared_across_concurrent_exchanges() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a.txt"), "a").unwrap();

        let chain = Arc::new(
            HandlerChain::new(app_ok("app")).with_static_files(static_stage(root.path())),
        );

        let mut tasks = Vec::new();
        for i in 0..16 {
            let chain = chain.clone();
            tasks.push(tokio::spawn(async move {
                let url = if i % 2 == 0 {
                    "http://localhost/a.txt"
                } else {
                    "http://localhost/missing"
                };
                chain.handle(request(url)).await.unwrap()
            }));
        }
        for (i, task) in tasks.into_iter().enumerate() {
            let resp = task.await.unwrap();
            let expected: &[u8] = if i % 2 == 0 { b"a" } else { b"app" };
            assert_eq!(resp.body.as_ref(), expected);
        }
    }
}
