//! JSON-RPC transport with locally answered methods.
//!
//! Every chain gets one HTTP client bound to one endpoint. Identity and gas estimation calls are
//! answered from configuration instead of the node: inside the execution host the answers must be
//! deterministic and fast, and node-side simulation is unreliable under its limits.

use crate::{config::TransportConfig, types::ChainSelector};
use alloy::{
    primitives::{ChainId, U64, map::HashMap},
    rpc::{
        client::{ClientBuilder, RpcClient},
        json_rpc::{Id, RequestPacket, Response, ResponsePacket, ResponsePayload, SerializedRequest},
    },
    transports::{Transport, TransportError, TransportFut, TransportResult},
};
use futures_util::FutureExt;
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::trace;
use url::Url;

pub mod error;

mod timeout;
pub use timeout::{TimeoutLayer, TimeoutService};

mod trace;
pub use trace::{TraceLayer, TraceTransport};

/// Method reporting the chain id.
pub const ETH_CHAIN_ID: &str = "eth_chainId";

/// Method estimating the gas of a transaction.
pub const ETH_ESTIMATE_GAS: &str = "eth_estimateGas";

/// Dispatch table of methods answered without a network round trip.
///
/// Every entry maps a method name to the quantity returned as its result.
#[derive(Debug, Clone, Default)]
pub struct SyntheticResponses(Arc<HashMap<&'static str, U64>>);

impl SyntheticResponses {
    /// Answers `method` with `value`.
    pub fn with_quantity(mut self, method: &'static str, value: u64) -> Self {
        Arc::make_mut(&mut self.0).insert(method, U64::from(value));
        self
    }

    /// Answers [`ETH_CHAIN_ID`] with the given chain id.
    pub fn with_chain_id(self, chain_id: ChainId) -> Self {
        self.with_quantity(ETH_CHAIN_ID, chain_id)
    }

    /// Answers [`ETH_ESTIMATE_GAS`] with a fixed gas limit.
    pub fn with_gas_estimate(self, gas: u64) -> Self {
        self.with_quantity(ETH_ESTIMATE_GAS, gas)
    }

    /// Builds the local response for a request, if its method is in the table.
    fn respond(&self, req: &SerializedRequest) -> Option<TransportResult<Response>> {
        let value = self.0.get(req.method())?;
        Some(
            serde_json::value::to_raw_value(value)
                .map(|payload| Response {
                    id: req.id().clone(),
                    payload: ResponsePayload::Success(payload),
                })
                .map_err(TransportError::ser_err),
        )
    }
}

/// A [`tower::Layer`] answering the methods of a [`SyntheticResponses`] table locally.
#[derive(Debug, Clone)]
pub struct SyntheticLayer {
    responses: SyntheticResponses,
}

impl SyntheticLayer {
    /// Create a new [`SyntheticLayer`].
    pub const fn new(responses: SyntheticResponses) -> Self {
        Self { responses }
    }
}

impl<T> Layer<T> for SyntheticLayer {
    type Service = SyntheticService<T>;

    fn layer(&self, inner: T) -> Self::Service {
        SyntheticService { inner, responses: self.responses.clone() }
    }
}

/// A [`alloy::transports::Transport`] that answers some methods itself and forwards the rest.
///
/// Batches are split: locally answered entries never reach the node and the remaining requests are
/// forwarded as one batch.
#[derive(Debug, Clone)]
pub struct SyntheticService<T> {
    /// The transport reaching the node.
    inner: T,
    /// Methods answered locally.
    responses: SyntheticResponses,
}

impl<T> Service<RequestPacket> for SyntheticService<T>
where
    T: Transport,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RequestPacket) -> Self::Future {
        match req {
            RequestPacket::Single(req) => match self.responses.respond(&req) {
                Some(resp) => {
                    trace!(method = req.method(), "Answered request locally");
                    async move { resp.map(ResponsePacket::Single) }.boxed()
                }
                None => self.inner.call(RequestPacket::Single(req)),
            },
            RequestPacket::Batch(reqs) => {
                let mut local = Vec::new();
                let mut forwarded = Vec::with_capacity(reqs.len());
                for req in reqs {
                    match self.responses.respond(&req) {
                        Some(resp) => local.push(resp),
                        None => forwarded.push(req),
                    }
                }

                let local = match local.into_iter().collect::<TransportResult<Vec<_>>>() {
                    Ok(local) => local,
                    Err(err) => return async move { Err(err) }.boxed(),
                };
                if forwarded.is_empty() {
                    return async move { Ok(ResponsePacket::Batch(local)) }.boxed();
                }

                let ids = forwarded.iter().map(|req| req.id().clone()).collect::<Vec<_>>();
                let fut = self.inner.call(RequestPacket::Batch(forwarded));
                async move {
                    let mut responses = match fut.await? {
                        ResponsePacket::Batch(responses) => responses,
                        ResponsePacket::Single(response) => vec![response],
                    };
                    correlate_by_position(&mut responses, ids);
                    responses.extend(local);
                    Ok(ResponsePacket::Batch(responses))
                }
                .boxed()
            }
        }
    }
}

/// Restores batch response ids from the request order.
///
/// Some providers answer batches in order but with ids that do not match the requests. Responses
/// whose ids all match a request are left untouched.
fn correlate_by_position(responses: &mut [Response], ids: Vec<Id>) {
    if responses.iter().all(|response| ids.contains(&response.id)) {
        return;
    }
    for (response, id) in responses.iter_mut().zip(ids) {
        response.id = id;
    }
}

/// Builds the layered HTTP client for one chain.
///
/// Layers, outermost first: tracing, request timeout, local answers, HTTP.
pub fn build_client(
    url: Url,
    selector: ChainSelector,
    responses: SyntheticResponses,
    config: &TransportConfig,
) -> RpcClient {
    ClientBuilder::default()
        .layer(TraceLayer::new(selector))
        .layer(TimeoutLayer::new(config.request_timeout, selector))
        .layer(SyntheticLayer::new(responses))
        .http(url)
}
