use crate::types::ChainSelector;
use alloy::{
    rpc::json_rpc::{RequestPacket, ResponsePacket},
    transports::{TransportError, TransportFut},
};
use futures_util::FutureExt;
use tower::{Layer, Service};
use tracing::{Instrument, Level, field, span};

/// A layer that wraps requests in spans carrying the JSON-RPC method and the pool's chain.
#[derive(Debug, Clone)]
pub struct TraceLayer {
    selector: ChainSelector,
}

impl TraceLayer {
    /// Creates a new `TraceLayer` for the chain with the given `selector`.
    pub fn new(selector: ChainSelector) -> Self {
        Self { selector }
    }
}

impl<S> Layer<S> for TraceLayer {
    type Service = TraceTransport<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceTransport { inner, selector: self.selector }
    }
}

/// A trace-instrumented transport.
#[derive(Debug, Clone)]
pub struct TraceTransport<S> {
    inner: S,
    selector: ChainSelector,
}

impl<S> Service<RequestPacket> for TraceTransport<S>
where
    S: Service<RequestPacket, Future = TransportFut<'static>, Error = TransportError>
        + Send
        + 'static
        + Clone,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: RequestPacket) -> Self::Future {
        let span = span!(
            Level::DEBUG,
            "rpc",
            rpc.method = field::Empty,
            rpc.jsonrpc.request_id = field::Empty,
            rpc.batch_size = field::Empty,
            chain_selector = self.selector,
        );

        match &request {
            RequestPacket::Single(req) => {
                span.record("rpc.method", req.method());
                span.record("rpc.jsonrpc.request_id", req.id().to_string());
            }
            RequestPacket::Batch(reqs) => {
                span.record("rpc.method", "batch");
                span.record("rpc.batch_size", reqs.len());
            }
        }

        self.inner.call(request).instrument(span).boxed()
    }
}
