//! The reconciliation use cases.
//!
//! Every run is independent: it resolves the network from the request's chain id, connects to
//! every pool of that network, does its reads and writes and returns. Nothing is persisted between
//! runs, so any run can be repeated from scratch.

use crate::{
    chains::Chains,
    config::{ReconcilerConfig, TrackerConfig},
    error::ReconcilerError,
    liquidity::{
        PendingTransfer, PendingTransferTracker, PoolLiquidity, collect_withdrawal, liquidity_of,
        redistribute, total_liquidity,
    },
    secrets::Secrets,
    types::{
        AggregationResult, RedistributionRequest, SnapshotRequest, WithdrawalCollectionRequest,
    },
};
use alloy::{
    network::EthereumWallet,
    primitives::{Bytes, ChainId},
};
use futures_util::future::try_join;
use tracing::info;

/// Output of a successful write use case.
pub const WRITE_SUCCESS: u8 = 1;

/// Runs the reconciliation use cases against the pools of one network.
#[derive(Debug)]
pub struct Reconciler {
    chains: Chains,
    tracker: TrackerConfig,
}

impl Reconciler {
    /// Creates a new [`Reconciler`] over already connected chains.
    pub fn new(chains: Chains, tracker: TrackerConfig) -> Self {
        Self { chains, tracker }
    }

    /// Connects to the network whose home chain has the numeric `chain_id`.
    ///
    /// Writes need a wallet. Read-only use cases can pass `None`.
    pub fn connect(
        config: &ReconcilerConfig,
        chain_id: ChainId,
        secrets: &Secrets,
        wallet: Option<EthereumWallet>,
    ) -> Result<Self, ReconcilerError> {
        let (network_type, network) = config.registry.resolve(chain_id)?;
        info!(
            %network_type,
            home = network.home,
            chains = network.chains.len(),
            "Resolved network"
        );
        let chains = Chains::connect(network, secrets, wallet, &config.transport)?;
        Ok(Self::new(chains, config.tracker))
    }

    /// The chains of the network.
    pub fn chains(&self) -> &Chains {
        &self.chains
    }

    /// Rejects requests addressed to another network.
    fn ensure_network(&self, chain_id: ChainId) -> Result<(), ReconcilerError> {
        if chain_id == self.chains.home().chain_id {
            Ok(())
        } else {
            Err(ReconcilerError::UnsupportedChain(chain_id))
        }
    }

    /// Aggregates the liquidity of the non-home pools and finds the finalized pending transfers.
    pub async fn liquidity_snapshot(
        &self,
        request: &SnapshotRequest,
    ) -> Result<AggregationResult, ReconcilerError> {
        self.ensure_network(request.chain_id)?;
        let home = self.chains.home();

        let (total_liquidity, deposits) = try_join(total_liquidity(&self.chains), async {
            home.pool.deposits_on_the_way().await.map_err(ReconcilerError::pool(home.selector))
        })
        .await?;

        let pending = PendingTransfer::from_deposits(&deposits);
        info!(%total_liquidity, pending = pending.len(), "Aggregated pool liquidity");

        let finalized_indices = if pending.is_empty() {
            Vec::new()
        } else {
            PendingTransferTracker::new(&self.chains, self.tracker).finalized(&pending).await?
        };

        Ok(AggregationResult { total_liquidity, finalized_indices })
    }

    /// Moves liquidity towards a joining pool.
    pub async fn redistribute(
        &self,
        request: &RedistributionRequest,
    ) -> Result<Bytes, ReconcilerError> {
        self.ensure_network(request.chain_id)?;
        redistribute(&self.chains, request).await?;
        Ok(Bytes::from(vec![WRITE_SUCCESS]))
    }

    /// Collects a withdrawal from every non-home pool.
    pub async fn collect_withdrawal(
        &self,
        request: &WithdrawalCollectionRequest,
    ) -> Result<Bytes, ReconcilerError> {
        self.ensure_network(request.chain_id)?;
        collect_withdrawal(&self.chains, request).await?;
        Ok(Bytes::from(vec![WRITE_SUCCESS]))
    }

    /// Reads balance and loans in use of every pool, home included.
    pub async fn pool_info(&self) -> Result<Vec<PoolLiquidity>, ReconcilerError> {
        liquidity_of(self.chains.iter()).await
    }
}
