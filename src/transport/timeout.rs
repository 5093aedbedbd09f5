//! Per-request deadline for the JSON-RPC clients of a pool's chain.

use super::error::RequestTimeout;
use crate::types::ChainSelector;
use alloy::{
    rpc::json_rpc::{RequestPacket, ResponsePacket},
    transports::{Transport, TransportError, TransportErrorKind, TransportFut},
};
use futures_util::FutureExt;
use std::{
    task::{Context, Poll},
    time::Duration,
};
use tower::{Layer, Service};
use tracing::debug;

/// A [`tower::Layer`] failing requests to one chain with a [`RequestTimeout`] once they exceed
/// the deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    deadline: Deadline,
}

impl TimeoutLayer {
    /// Create a new [`TimeoutLayer`] for the chain with the given selector.
    pub const fn new(after: Duration, selector: ChainSelector) -> Self {
        Self { deadline: Deadline { selector, after } }
    }
}

impl<T> Layer<T> for TimeoutLayer {
    type Service = TimeoutService<T>;

    fn layer(&self, inner: T) -> Self::Service {
        TimeoutService { inner, deadline: self.deadline }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    selector: ChainSelector,
    after: Duration,
}

impl Deadline {
    fn expired(self, request: &RequestPacket) -> RequestTimeout {
        let method = match request {
            RequestPacket::Single(req) => req.method().to_string(),
            RequestPacket::Batch(reqs) => format!("batch({})", reqs.len()),
        };
        RequestTimeout { selector: self.selector, method, after: self.after }
    }
}

/// Service behind [`TimeoutLayer`].
#[derive(Debug, Clone)]
pub struct TimeoutService<T> {
    inner: T,
    deadline: Deadline,
}

impl<T> Service<RequestPacket> for TimeoutService<T>
where
    T: Transport + Clone,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RequestPacket) -> Self::Future {
        let deadline = self.deadline;
        let timeout = deadline.expired(&req);
        let response = self.inner.call(req);

        async move {
            tokio::time::timeout(deadline.after, response).await.unwrap_or_else(|_| {
                debug!(selector = timeout.selector, method = %timeout.method, "Deadline expired");
                Err(TransportErrorKind::custom(timeout))
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::tests::{request, request_fn, success};
    use alloy::transports::RpcError;

    fn node(delay: Duration) -> impl Transport + Clone {
        request_fn(move |packet: RequestPacket| {
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                let id = match &packet {
                    RequestPacket::Single(req) => req.id().clone(),
                    RequestPacket::Batch(reqs) => reqs[0].id().clone(),
                };
                Ok::<_, TransportError>(ResponsePacket::Single(success(id, "\"0x1\"")))
            })
        })
    }

    fn timeout_of(err: &TransportError) -> Option<&RequestTimeout> {
        match err {
            RpcError::Transport(TransportErrorKind::Custom(err)) => err.downcast_ref(),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_slow_requests() {
        let mut service =
            TimeoutLayer::new(Duration::from_secs(10), 1).layer(node(Duration::from_secs(60)));

        let err = service
            .call(RequestPacket::Single(request("eth_getLogs", 1)))
            .await
            .unwrap_err();
        assert_eq!(
            timeout_of(&err),
            Some(&RequestTimeout {
                selector: 1,
                method: "eth_getLogs".to_string(),
                after: Duration::from_secs(10),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn batches_are_labelled_by_size() {
        let mut service =
            TimeoutLayer::new(Duration::from_secs(1), 2).layer(node(Duration::from_secs(5)));

        let batch = RequestPacket::Batch(vec![request("eth_call", 1), request("eth_call", 2)]);
        let err = service.call(batch).await.unwrap_err();
        assert_eq!(timeout_of(&err).map(|timeout| timeout.method.as_str()), Some("batch(2)"));
    }

    #[tokio::test(start_paused = true)]
    async fn passes_fast_requests() {
        let mut service =
            TimeoutLayer::new(Duration::from_secs(10), 1).layer(node(Duration::from_secs(1)));

        let resp = service.call(RequestPacket::Single(request("eth_call", 3))).await.unwrap();
        assert!(resp.as_single().unwrap().is_success());
    }
}
