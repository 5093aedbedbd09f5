//! Access to the liquidity pool contracts.

use crate::{
    error::PoolError,
    types::{ChainSelector, DepositOnTheWay, IERC20, IPool},
};
use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{
        client::RpcClient,
        types::{BlockNumberOrTag, Filter, Log},
    },
    sol_types::SolEvent,
};
use async_trait::async_trait;
use std::fmt::Debug;
use tracing::debug;

mod memory;
pub use memory::{InMemoryPool, PoolWrite, ccip_received_log};

/// Type alias for `Result<T, PoolError>`
pub type Result<T> = core::result::Result<T, PoolError>;

/// The reads and writes the reconciler performs against one pool.
#[async_trait]
pub trait PoolApi: Debug + Send + Sync {
    /// Address of the pool contract.
    fn address(&self) -> Address;

    /// Stablecoin balance held by the pool.
    async fn stablecoin_balance(&self) -> Result<U256>;

    /// Stablecoin currently lent out by the pool.
    async fn loans_in_use(&self) -> Result<U256>;

    /// The pool's deposits-on-the-way buffer, in slot order.
    ///
    /// Only meaningful on the home pool.
    async fn deposits_on_the_way(&self) -> Result<Vec<DepositOnTheWay>>;

    /// All `CCIPReceived` logs of this pool with the given message id, from genesis to latest.
    async fn ccip_received_logs(&self, message_id: B256) -> Result<Vec<Log>>;

    /// Sends `amount` to the pool on `destination`, tagged with `withdrawal_id`.
    async fn send_to_pool(
        &self,
        destination: ChainSelector,
        amount: U256,
        withdrawal_id: B256,
    ) -> Result<TxHash>;

    /// Moves `amount` of the pool's liquidity to the pool on `destination`.
    async fn distribute_liquidity(
        &self,
        destination: ChainSelector,
        amount: U256,
        request_id: B256,
    ) -> Result<TxHash>;
}

/// [`PoolApi`] backed by a JSON-RPC provider.
#[derive(Debug, Clone)]
pub struct RpcPool {
    /// The pool contract.
    address: Address,
    /// The stablecoin held by the pool.
    stablecoin: Address,
    /// Provider for the pool's chain.
    provider: DynProvider,
    /// Whether the provider signs transactions.
    can_write: bool,
}

impl RpcPool {
    /// Creates a pool on top of the given client.
    ///
    /// Without a wallet the pool is read-only and writes fail with [`PoolError::MissingSigner`].
    pub fn new(
        client: RpcClient,
        address: Address,
        stablecoin: Address,
        wallet: Option<EthereumWallet>,
    ) -> Self {
        let can_write = wallet.is_some();
        let provider = match wallet {
            Some(wallet) => ProviderBuilder::new().wallet(wallet).connect_client(client).erased(),
            None => ProviderBuilder::new().connect_client(client).erased(),
        };
        Self { address, stablecoin, provider, can_write }
    }

    fn ensure_signer(&self) -> Result<()> {
        if self.can_write { Ok(()) } else { Err(PoolError::MissingSigner) }
    }
}

#[async_trait]
impl PoolApi for RpcPool {
    fn address(&self) -> Address {
        self.address
    }

    async fn stablecoin_balance(&self) -> Result<U256> {
        Ok(IERC20::new(self.stablecoin, &self.provider).balanceOf(self.address).call().await?)
    }

    async fn loans_in_use(&self) -> Result<U256> {
        Ok(IPool::new(self.address, &self.provider).getUsdcLoansInUse().call().await?)
    }

    async fn deposits_on_the_way(&self) -> Result<Vec<DepositOnTheWay>> {
        let deposits = IPool::new(self.address, &self.provider).getDepositsOnTheWay().call().await?;
        Ok(deposits.into_iter().collect())
    }

    async fn ccip_received_logs(&self, message_id: B256) -> Result<Vec<Log>> {
        let filter = Filter::new()
            .address(self.address)
            .event_signature(IPool::CCIPReceived::SIGNATURE_HASH)
            .topic1(message_id)
            .from_block(0)
            .to_block(BlockNumberOrTag::Latest);
        Ok(self.provider.get_logs(&filter).await?)
    }

    async fn send_to_pool(
        &self,
        destination: ChainSelector,
        amount: U256,
        withdrawal_id: B256,
    ) -> Result<TxHash> {
        self.ensure_signer()?;
        let pending = IPool::new(self.address, &self.provider)
            .ccipSendToPool(destination, amount, withdrawal_id)
            .send()
            .await?;
        debug!(pool = %self.address, tx_hash = %pending.tx_hash(), "Submitted ccipSendToPool");
        Ok(*pending.tx_hash())
    }

    async fn distribute_liquidity(
        &self,
        destination: ChainSelector,
        amount: U256,
        request_id: B256,
    ) -> Result<TxHash> {
        self.ensure_signer()?;
        let pending = IPool::new(self.address, &self.provider)
            .distributeLiquidity(destination, amount, request_id)
            .send()
            .await?;
        debug!(pool = %self.address, tx_hash = %pending.tx_hash(), "Submitted distributeLiquidity");
        Ok(*pending.tx_hash())
    }
}

/// Returns `true` if `log` is a `CCIPReceived` event emitted by `pool` for `message_id`.
///
/// Nodes do not always honor every filter field, so fetched logs are checked again.
pub fn is_ccip_received(log: &Log, pool: Address, message_id: B256) -> bool {
    let topics = log.topics();
    log.address() == pool
        && topics.first() == Some(&IPool::CCIPReceived::SIGNATURE_HASH)
        && topics.get(1) == Some(&message_id)
}
