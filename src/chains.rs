//! The set of chains a single run operates on.

use crate::{
    config::{NetworkConfig, TransportConfig},
    error::ReconcilerError,
    pool::{PoolApi, RpcPool},
    secrets::Secrets,
    transport::{SyntheticResponses, build_client},
    types::ChainSelector,
};
use alloy::{network::EthereumWallet, primitives::ChainId};
use rand::seq::IndexedRandom;
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

/// A single participating chain.
#[derive(Debug, Clone)]
pub struct Chain {
    /// The cross-chain selector.
    pub selector: ChainSelector,
    /// The numeric chain id.
    pub chain_id: ChainId,
    /// The pool contract on this chain.
    pub pool: Arc<dyn PoolApi>,
}

impl Chain {
    /// Creates a new [`Chain`].
    pub fn new(selector: ChainSelector, chain_id: ChainId, pool: impl PoolApi + 'static) -> Self {
        Self { selector, chain_id, pool: Arc::new(pool) }
    }
}

/// The chains of one network, with its home chain.
#[derive(Debug, Clone)]
pub struct Chains {
    /// The home chain.
    home: Chain,
    /// Every chain keyed by selector, home chain included.
    chains: BTreeMap<ChainSelector, Chain>,
}

impl Chains {
    /// Creates a new instance of [`Chains`].
    ///
    /// Fails if none of the chains has the `home` selector.
    pub fn new(
        home: ChainSelector,
        chains: impl IntoIterator<Item = Chain>,
    ) -> Result<Self, ReconcilerError> {
        let chains: BTreeMap<_, _> =
            chains.into_iter().map(|chain| (chain.selector, chain)).collect();
        let home = chains.get(&home).cloned().ok_or(ReconcilerError::MissingHomeChain(home))?;
        Ok(Self { home, chains })
    }

    /// Connects to every chain of `network`.
    ///
    /// One endpoint per chain is picked at random. Pools can only write if a wallet is given.
    pub fn connect(
        network: &NetworkConfig,
        secrets: &Secrets,
        wallet: Option<EthereumWallet>,
        config: &TransportConfig,
    ) -> Result<Self, ReconcilerError> {
        let chains = network
            .chains
            .iter()
            .map(|(&selector, chain)| {
                let template = chain.endpoints.choose(&mut rand::rng()).ok_or_else(|| {
                    ReconcilerError::InvalidEndpoint {
                        template: format!("chain {selector}"),
                        reason: "no endpoints configured".to_string(),
                    }
                })?;
                let url = secrets.endpoint(template)?;
                let chain_id = network.chain_id_by_endpoint(template).unwrap_or(chain.chain_id);

                let responses = SyntheticResponses::default()
                    .with_chain_id(chain_id)
                    .with_gas_estimate(config.gas_estimate);
                let client = build_client(url, selector, responses, config);
                debug!(%selector, %chain_id, endpoint = %template, "Connected to chain");

                Ok(Chain::new(
                    selector,
                    chain_id,
                    RpcPool::new(client, chain.pool, chain.stablecoin, wallet.clone()),
                ))
            })
            .collect::<Result<Vec<_>, ReconcilerError>>()?;

        Self::new(network.home, chains)
    }

    /// The home chain.
    pub fn home(&self) -> &Chain {
        &self.home
    }

    /// Returns the chain with the given selector.
    pub fn get(&self, selector: ChainSelector) -> Option<&Chain> {
        self.chains.get(&selector)
    }

    /// Iterates over every chain in selector order, home chain included.
    pub fn iter(&self) -> impl Iterator<Item = &Chain> {
        self.chains.values()
    }

    /// Iterates over every chain except the home chain.
    pub fn remote(&self) -> impl Iterator<Item = &Chain> {
        let home = self.home.selector;
        self.chains.values().filter(move |chain| chain.selector != home)
    }
}
