//! [`PoolApi`] implementation in-memory. For testing only.

use super::{PoolApi, Result};
use crate::{
    error::PoolError,
    types::{ChainSelector, DepositOnTheWay, IPool},
};
use alloy::{
    primitives::{Address, B256, TxHash, U256, map::HashMap},
    rpc::types::Log,
    sol_types::SolEvent,
    transports::TransportErrorKind,
};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// A write recorded by [`InMemoryPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolWrite {
    /// `ccipSendToPool`
    SendToPool {
        /// Destination chain.
        destination: ChainSelector,
        /// Amount sent.
        amount: U256,
        /// Withdrawal id.
        withdrawal_id: B256,
    },
    /// `distributeLiquidity`
    DistributeLiquidity {
        /// Destination chain.
        destination: ChainSelector,
        /// Amount moved.
        amount: U256,
        /// Redistribution request id.
        request_id: B256,
    },
}

/// [`PoolApi`] implementation in-memory. Used for testing
#[derive(Debug, Default)]
pub struct InMemoryPool {
    address: Address,
    balance: U256,
    loans: U256,
    deposits: Vec<DepositOnTheWay>,
    logs: HashMap<B256, Vec<Log>>,
    read_error: Option<String>,
    write_error: Option<(i64, String)>,
    log_queries: RwLock<Vec<B256>>,
    writes: RwLock<Vec<PoolWrite>>,
}

impl InMemoryPool {
    /// Creates an empty pool at `address`.
    pub fn new(address: Address) -> Self {
        Self { address, ..Default::default() }
    }

    /// Sets the stablecoin balance.
    pub fn with_balance(mut self, balance: impl Into<U256>) -> Self {
        self.balance = balance.into();
        self
    }

    /// Sets the loans in use.
    pub fn with_loans(mut self, loans: impl Into<U256>) -> Self {
        self.loans = loans.into();
        self
    }

    /// Sets the deposits-on-the-way buffer.
    pub fn with_deposits(mut self, deposits: Vec<DepositOnTheWay>) -> Self {
        self.deposits = deposits;
        self
    }

    /// Adds a `CCIPReceived` log emitted by this pool for `message_id`.
    pub fn with_received(self, message_id: B256, amount: impl Into<U256>) -> Self {
        let log = ccip_received_log(self.address, message_id, 0, amount.into());
        self.with_log(message_id, log)
    }

    /// Adds an arbitrary log to the results returned for `message_id`.
    pub fn with_log(mut self, message_id: B256, log: Log) -> Self {
        self.logs.entry(message_id).or_default().push(log);
        self
    }

    /// Makes every read fail with a transport error.
    pub fn with_read_error(mut self, message: impl Into<String>) -> Self {
        self.read_error = Some(message.into());
        self
    }

    /// Makes every write fail with the given node error response.
    pub fn with_write_error(mut self, code: i64, message: impl Into<String>) -> Self {
        self.write_error = Some((code, message.into()));
        self
    }

    /// The message ids logs were queried for, in order.
    pub async fn log_queries(&self) -> Vec<B256> {
        self.log_queries.read().await.clone()
    }

    /// The writes submitted to this pool, in order.
    pub async fn writes(&self) -> Vec<PoolWrite> {
        self.writes.read().await.clone()
    }

    fn read<T>(&self, value: T) -> Result<T> {
        match &self.read_error {
            Some(message) => Err(PoolError::Rpc(TransportErrorKind::custom_str(message))),
            None => Ok(value),
        }
    }

    async fn write(&self, write: PoolWrite) -> Result<TxHash> {
        if let Some((code, message)) = &self.write_error {
            return Err(PoolError::ErrorResp { code: *code, message: message.clone() });
        }
        let mut writes = self.writes.write().await;
        writes.push(write);
        Ok(TxHash::left_padding_from(&writes.len().to_be_bytes()))
    }
}

#[async_trait]
impl PoolApi for InMemoryPool {
    fn address(&self) -> Address {
        self.address
    }

    async fn stablecoin_balance(&self) -> Result<U256> {
        self.read(self.balance)
    }

    async fn loans_in_use(&self) -> Result<U256> {
        self.read(self.loans)
    }

    async fn deposits_on_the_way(&self) -> Result<Vec<DepositOnTheWay>> {
        self.read(self.deposits.clone())
    }

    async fn ccip_received_logs(&self, message_id: B256) -> Result<Vec<Log>> {
        self.log_queries.write().await.push(message_id);
        self.read(self.logs.get(&message_id).cloned().unwrap_or_default())
    }

    async fn send_to_pool(
        &self,
        destination: ChainSelector,
        amount: U256,
        withdrawal_id: B256,
    ) -> Result<TxHash> {
        self.write(PoolWrite::SendToPool { destination, amount, withdrawal_id }).await
    }

    async fn distribute_liquidity(
        &self,
        destination: ChainSelector,
        amount: U256,
        request_id: B256,
    ) -> Result<TxHash> {
        self.write(PoolWrite::DistributeLiquidity { destination, amount, request_id }).await
    }
}

/// Builds the `CCIPReceived` log `pool` emits when the message `message_id` arrives.
pub fn ccip_received_log(
    pool: Address,
    message_id: B256,
    source: ChainSelector,
    amount: U256,
) -> Log {
    let event = IPool::CCIPReceived {
        ccipMessageId: message_id,
        srcChainSelector: source,
        sender: Address::ZERO,
        token: Address::ZERO,
        amount,
    };
    Log {
        inner: alloy::primitives::Log { address: pool, data: event.encode_log_data() },
        ..Default::default()
    }
}
