//! The worker side of the boundary.
//!
//! A worker task owns the handler chain for the process lifetime and
//! consumes boundary messages from an mpsc channel. Each message comes
//! paired with a oneshot reply sender; the transport may drop its end
//! at any point, in which case the in-flight exchange runs to
//! completion and the reply is discarded.

use std::sync::Arc;

use http::StatusCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use weft_core::{BoundaryRequest, BoundaryResponse, ExchangeError, ResponseEnvelope};
use weft_exchange::{HandlerChain, codec};

/// One exchange crossing the boundary: a request message and the slot
/// its response goes back through.
pub type ExchangeRequest = (BoundaryRequest, oneshot::Sender<BoundaryResponse>);

/// Spawn the worker task. Returns the sender the transport submits
/// exchanges on; the worker stops when every sender is dropped.
pub fn spawn(chain: HandlerChain, capacity: usize) -> mpsc::Sender<ExchangeRequest> {
    let (tx, mut rx) = mpsc::channel::<ExchangeRequest>(capacity);
    let chain = Arc::new(chain);

    tokio::spawn(async move {
        while let Some((msg, reply)) = rx.recv().await {
            // Exchanges are independent; run each on its own task so a
            // slow file read does not serialize the channel.
            let chain = chain.clone();
            tokio::spawn(async move {
                let resp = run_exchange(&chain, msg).await;
                if reply.send(resp).is_err() {
                    debug!("transport discarded the exchange before the reply");
                }
            });
        }
        info!("exchange channel closed, worker stopping");
    });

    tx
}

/// Run one exchange and always produce a well-formed boundary message.
///
/// The chain never lets an application failure escape; the two error
/// outcomes left are mapped here: an undecodable request becomes a 400
/// (the only case with no better answer) and an unclassified asset
/// failure becomes a 500.
async fn run_exchange(chain: &HandlerChain, msg: BoundaryRequest) -> BoundaryResponse {
    let request_url = msg.url.clone();
    match chain.handle_message(msg).await {
        Ok(resp) => resp,
        Err(e @ ExchangeError::Malformed(_)) => {
            warn!(url = %request_url, error = %e, "rejecting malformed exchange");
            error_message(&request_url, StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            error!(url = %request_url, error = %e, "exchange failed");
            error_message(
                &request_url,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        }
    }
}

fn error_message(request_url: &str, status: StatusCode, body: String) -> BoundaryResponse {
    codec::encode(request_url, ResponseEnvelope::new(status, body))
}
