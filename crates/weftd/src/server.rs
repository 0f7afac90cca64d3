//! The HTTP edge of the boundary.
//!
//! `HttpBridge` accepts plain HTTP/1.1 connections, converts each
//! request into a plain-data boundary message (body collected fully —
//! nothing live crosses the channel), submits it to the worker, and
//! converts the reply back into a hyper response.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use anyhow::Context;
use bytes::Bytes;
use http::header;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info};
use weft_core::{BoundaryRequest, BoundaryResponse};

use crate::worker::ExchangeRequest;

/// HTTP server feeding the worker channel.
pub struct HttpBridge {
    listener: TcpListener,
    worker: mpsc::Sender<ExchangeRequest>,
}

impl HttpBridge {
    /// Bind the edge to the given address.
    pub async fn bind(
        addr: SocketAddr,
        worker: mpsc::Sender<ExchangeRequest>,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .context("failed to bind exchange bridge")?;
        Ok(Self { listener, worker })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the shutdown signal flips.
    ///
    /// Spawns a tokio task per connection using HTTP/1.1. Transport
    /// failures never escape a connection: anything the worker path
    /// cannot answer becomes a plain 500.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        info!(addr = %self.listener.local_addr()?, "exchange bridge listening");

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    let (stream, peer_addr) = accept_result.context("accept failed")?;
                    let worker = self.worker.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let svc = service_fn(move |req: Request<Incoming>| {
                            let worker = worker.clone();
                            async move {
                                match dispatch(worker, req).await {
                                    Ok(resp) => Ok::<_, hyper::Error>(resp),
                                    Err(e) => {
                                        error!(%peer_addr, error = %e, "exchange dispatch failed");
                                        Ok(plain_500())
                                    }
                                }
                            }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                            error!(%peer_addr, error = %e, "connection error");
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("exchange bridge shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Carry one request across the boundary and back.
async fn dispatch(
    worker: mpsc::Sender<ExchangeRequest>,
    req: Request<Incoming>,
) -> anyhow::Result<Response<Full<Bytes>>> {
    let msg = into_boundary_request(req).await?;

    let (reply_tx, reply_rx) = oneshot::channel();
    worker
        .send((msg, reply_tx))
        .await
        .map_err(|_| anyhow::anyhow!("worker unavailable"))?;
    let resp = reply_rx.await.context("worker dropped the exchange")?;

    into_hyper_response(resp)
}

/// Flatten a hyper request into the plain-data inbound message.
///
/// The boundary contract wants an absolute URL; hyper hands us the
/// origin form, so the Host header supplies the authority.
async fn into_boundary_request(req: Request<Incoming>) -> anyhow::Result<BoundaryRequest> {
    let method = req.method().as_str().to_string();

    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("http://{host}{path_and_query}");

    let mut headers = BTreeMap::new();
    for (name, value) in req.headers() {
        headers.insert(
            name.as_str().to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }

    let body = req
        .into_body()
        .collect()
        .await
        .context("failed to read request body")?
        .to_bytes();
    let body = (!body.is_empty()).then(|| body.to_vec());

    Ok(BoundaryRequest {
        url,
        method,
        headers,
        body,
    })
}

fn into_hyper_response(msg: BoundaryResponse) -> anyhow::Result<Response<Full<Bytes>>> {
    let mut builder = Response::builder().status(msg.status);
    for (name, value) in &msg.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    Ok(builder.body(Full::new(Bytes::from(msg.body)))?)
}

fn plain_500() -> Response<Full<Bytes>> {
    let resp = Response::builder()
        .status(500)
        .body(Full::new(Bytes::from("Internal Server Error")));
    match resp {
        Ok(resp) => resp,
        // Static parts, cannot fail.
        Err(_) => Response::new(Full::new(Bytes::new())),
    }
}
