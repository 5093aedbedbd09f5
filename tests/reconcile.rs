#![allow(missing_docs)]

//! End-to-end reconciliation runs against in-memory pools.

use alloy::primitives::{Address, B256, U256, hex};
use reconciler::{
    chains::{Chain, Chains},
    config::{ChainRegistry, TrackerConfig},
    constants::{BASE_SEPOLIA_CHAIN_ID, BASE_SEPOLIA_CHAIN_SELECTOR},
    error::ReconcilerError,
    pool::{InMemoryPool, PoolWrite, ccip_received_log},
    reconciler::{Reconciler, WRITE_SUCCESS},
    types::{
        AggregationResult, ChainSelector, DepositOnTheWay, RedistributionRequest, SnapshotRequest,
        WithdrawalCollectionRequest,
    },
};
use std::{sync::Arc, time::Duration};

const HOME: ChainSelector = BASE_SEPOLIA_CHAIN_SELECTOR;
const B: ChainSelector = 3478487238524512106;
const C: ChainSelector = 5224473277236331295;

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn pool_address(n: u8) -> Address {
    Address::with_last_byte(n)
}

fn message(n: u64) -> B256 {
    B256::from(U256::from(n))
}

/// A home buffer with `deposits` placed at the given slots.
fn buffer(deposits: &[(usize, ChainSelector, B256)]) -> Vec<DepositOnTheWay> {
    let mut buffer = vec![DepositOnTheWay::default(); 150];
    for (slot, chain, message_id) in deposits {
        buffer[*slot] = DepositOnTheWay {
            chainSelector: *chain,
            ccipMessageId: *message_id,
            amount: U256::from(100_000),
        };
    }
    buffer
}

struct Network {
    reconciler: Reconciler,
    home: Arc<InMemoryPool>,
    b: Arc<InMemoryPool>,
    c: Arc<InMemoryPool>,
}

fn network(home: InMemoryPool, b: InMemoryPool, c: InMemoryPool) -> Network {
    let (home, b, c) = (Arc::new(home), Arc::new(b), Arc::new(c));
    let chains = Chains::new(
        HOME,
        [
            Chain { selector: HOME, chain_id: BASE_SEPOLIA_CHAIN_ID, pool: home.clone() },
            Chain { selector: B, chain_id: 421614, pool: b.clone() },
            Chain { selector: C, chain_id: 11155420, pool: c.clone() },
        ],
    )
    .unwrap();
    let tracker = TrackerConfig::default().with_round_pause(Duration::from_millis(10));
    Network { reconciler: Reconciler::new(chains, tracker), home, b, c }
}

#[tokio::test]
async fn snapshot_reports_total_and_finalized_slot() -> eyre::Result<()> {
    let landed = message(0xabc);
    let network = network(
        InMemoryPool::new(pool_address(1)).with_deposits(buffer(&[(3, B, landed)])),
        InMemoryPool::new(pool_address(2))
            .with_balance(U256::from(1_000_000u64))
            .with_received(landed, U256::from(100_000u64)),
        InMemoryPool::new(pool_address(3)).with_balance(U256::from(150_000u64)).with_loans(U256::from(50_000u64)),
    );

    let request = SnapshotRequest::parse(&args(&["0x", "0x", "0x", "0x14a34"]))?;
    let result = network.reconciler.liquidity_snapshot(&request).await?;
    let encoded = result.encode();

    assert_eq!(
        hex::encode(&encoded),
        "0000000000000000000000000000000000000000000000000000000000124f8003"
    );
    assert_eq!(AggregationResult::decode(&encoded), Some(result));
    assert_eq!(network.b.log_queries().await, [landed]);
    assert!(network.c.log_queries().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn receipt_on_wrong_chain_is_not_finalized() -> eyre::Result<()> {
    let id = message(7);
    let network = network(
        InMemoryPool::new(pool_address(1)).with_deposits(buffer(&[(0, B, id)])),
        InMemoryPool::new(pool_address(2)),
        InMemoryPool::new(pool_address(3))
            .with_log(id, ccip_received_log(pool_address(3), id, HOME, U256::from(100_000))),
    );

    let request = SnapshotRequest { chain_id: BASE_SEPOLIA_CHAIN_ID };
    let result = network.reconciler.liquidity_snapshot(&request).await?;
    assert!(result.finalized_indices.is_empty());
    assert_eq!(result.encode().len(), 32);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn full_buffer_queries_at_most_eighteen_per_chain() -> eyre::Result<()> {
    let deposits = (0..150)
        .map(|slot| (slot, if slot % 2 == 0 { B } else { C }, message(slot as u64 + 1)))
        .collect::<Vec<_>>();
    let network = network(
        InMemoryPool::new(pool_address(1)).with_deposits(buffer(&deposits)),
        InMemoryPool::new(pool_address(2)),
        InMemoryPool::new(pool_address(3)),
    );

    let request = SnapshotRequest { chain_id: BASE_SEPOLIA_CHAIN_ID };
    let result = network.reconciler.liquidity_snapshot(&request).await?;
    assert!(result.finalized_indices.is_empty());
    assert_eq!(network.b.log_queries().await.len(), 18);
    assert_eq!(network.c.log_queries().await.len(), 18);
    assert!(network.home.log_queries().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn unsupported_distribution_mode_writes_nothing() {
    let network = network(
        InMemoryPool::new(pool_address(1)).with_balance(U256::from(900_000u64)),
        InMemoryPool::new(pool_address(2)).with_balance(U256::from(900_000u64)),
        InMemoryPool::new(pool_address(3)),
    );

    let request = RedistributionRequest::parse(&args(&[
        "0x",
        "0x",
        "0x",
        "0x48470a2c0d5e641f",
        "0x01",
        "0x02",
        "0x14a34",
    ]))
    .unwrap();
    let err = network.reconciler.redistribute(&request).await.unwrap_err();
    assert!(matches!(err, ReconcilerError::UnsupportedOperation(_)));
    assert!(err.is_input_error());
    assert!(network.home.writes().await.is_empty());
    assert!(network.b.writes().await.is_empty());
}

#[tokio::test]
async fn equal_rebalance_towards_joining_pool() -> eyre::Result<()> {
    let network = network(
        InMemoryPool::new(pool_address(1)).with_balance(U256::from(600_000u64)),
        InMemoryPool::new(pool_address(2)).with_balance(U256::from(200_000u64)).with_loans(U256::from(100_000u64)),
        InMemoryPool::new(pool_address(3)).with_balance(U256::from(42u64)),
    );

    // C joins: target is (600_000 + 300_000) / 3
    let joining = format!("{C:#x}");
    let request = RedistributionRequest::parse(&args(&[
        "0x",
        "0x",
        "0x",
        &joining,
        "0x2a",
        "0x00",
        "0x14a34",
    ]))?;
    let output = network.reconciler.redistribute(&request).await?;
    assert_eq!(output.as_ref(), [WRITE_SUCCESS]);

    assert_eq!(
        network.home.writes().await,
        [PoolWrite::DistributeLiquidity {
            destination: C,
            amount: U256::from(300_000),
            request_id: B256::with_last_byte(0x2a),
        }]
    );
    assert!(network.b.writes().await.is_empty());
    assert!(network.c.writes().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn withdrawal_collected_from_every_child_pool() -> eyre::Result<()> {
    let network = network(
        InMemoryPool::new(pool_address(1)),
        InMemoryPool::new(pool_address(2)),
        InMemoryPool::new(pool_address(3)).with_write_error(-32000, "already known"),
    );

    let request = WithdrawalCollectionRequest::parse(&args(&[
        "0x",
        "0x",
        "0x",
        "0x14a34",
        "0x147b0",
        "0x3e63da41d93846072a115187efd804333da52256b8ec17e9c05163d6903d561d",
    ]))?;
    let output = network.reconciler.collect_withdrawal(&request).await?;
    assert_eq!(output.as_ref(), [WRITE_SUCCESS]);

    assert_eq!(
        network.b.writes().await,
        [PoolWrite::SendToPool {
            destination: HOME,
            amount: U256::from(83_888),
            withdrawal_id: request.withdrawal_id,
        }]
    );
    assert!(network.home.writes().await.is_empty());
    Ok(())
}

#[test]
fn unknown_chain_id_is_rejected_before_connecting() {
    let request = SnapshotRequest::parse(&args(&["0x", "0x", "0x", "0x1"])).unwrap();
    let err = ChainRegistry::default().resolve(request.chain_id).unwrap_err();
    assert!(matches!(err, ReconcilerError::UnsupportedChain(1)));
    assert!(err.is_input_error());
}
