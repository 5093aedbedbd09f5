//! Reconciler configuration.
use crate::{
    constants::{
        BASE_CHAIN_ID, BASE_CHAIN_SELECTOR, BASE_SEPOLIA_CHAIN_ID, BASE_SEPOLIA_CHAIN_SELECTOR,
        DEFAULT_REQUEST_TIMEOUT_SECS, FIXED_GAS_ESTIMATE, TRACKER_BATCH_SIZE, TRACKER_ROUNDS,
        TRACKER_ROUND_PAUSE_MS,
    },
    error::ReconcilerError,
    types::ChainSelector,
};
use alloy::primitives::{Address, ChainId, address};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, time::Duration};
use strum::Display;

/// Reconciler configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// The chain registry.
    #[serde(default)]
    pub registry: ChainRegistry,
    /// Pending transfer tracker configuration.
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// JSON-RPC transport configuration.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl ReconcilerConfig {
    /// Sets the chain registry.
    pub fn with_registry(mut self, registry: ChainRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the tracker configuration.
    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    /// Sets the timeout of a single JSON-RPC request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.transport.request_timeout = timeout;
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// The kind of network a run operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    /// Test network.
    Testnet,
    /// Main network.
    Mainnet,
}

/// Static description of a single participating chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// The numeric chain id.
    pub chain_id: ChainId,
    /// JSON-RPC endpoint templates. `${NAME}` placeholders are expanded from the secrets bag.
    pub endpoints: Vec<String>,
    /// Address of the pool contract on this chain.
    pub pool: Address,
    /// Address of the pooled stablecoin on this chain.
    pub stablecoin: Address,
}

/// All chains participating in one network, keyed by cross-chain selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Numeric chain id of the home chain. Runs are addressed to a network through it.
    pub home_chain_id: ChainId,
    /// Selector of the home chain.
    pub home: ChainSelector,
    /// The participating chains, home chain included.
    pub chains: BTreeMap<ChainSelector, ChainConfig>,
}

impl NetworkConfig {
    /// Returns the chain id served by the given endpoint template, if the network knows it.
    pub fn chain_id_by_endpoint(&self, endpoint: &str) -> Option<ChainId> {
        self.chains
            .values()
            .find(|chain| chain.endpoints.iter().any(|e| e == endpoint))
            .map(|chain| chain.chain_id)
    }
}

/// Static registry of the test and main networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRegistry {
    /// The test network.
    pub testnet: NetworkConfig,
    /// The main network.
    pub mainnet: NetworkConfig,
}

impl ChainRegistry {
    /// Returns the network of the given type.
    pub fn network(&self, network: NetworkType) -> &NetworkConfig {
        match network {
            NetworkType::Testnet => &self.testnet,
            NetworkType::Mainnet => &self.mainnet,
        }
    }

    /// Resolves a numeric chain id to its network.
    ///
    /// Only the home chain ids of the two networks are accepted.
    pub fn resolve(
        &self,
        chain_id: ChainId,
    ) -> Result<(NetworkType, &NetworkConfig), ReconcilerError> {
        [NetworkType::Testnet, NetworkType::Mainnet]
            .into_iter()
            .map(|ty| (ty, self.network(ty)))
            .find(|(_, network)| network.home_chain_id == chain_id)
            .ok_or(ReconcilerError::UnsupportedChain(chain_id))
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        let alchemy =
            |network: &str| format!("https://{network}.g.alchemy.com/v2/${{ALCHEMY_API_KEY}}");
        let infura = |network: &str| format!("https://{network}.infura.io/v3/${{INFURA_API_KEY}}");

        let testnet = NetworkConfig {
            home_chain_id: BASE_SEPOLIA_CHAIN_ID,
            home: BASE_SEPOLIA_CHAIN_SELECTOR,
            chains: BTreeMap::from([
                (
                    BASE_SEPOLIA_CHAIN_SELECTOR,
                    ChainConfig {
                        chain_id: BASE_SEPOLIA_CHAIN_ID,
                        endpoints: vec![alchemy("base-sepolia")],
                        pool: address!("0x412fDf62011abfCFD3fA9aE85bd910505C372b32"),
                        stablecoin: address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
                    },
                ),
                (
                    3478487238524512106,
                    ChainConfig {
                        chain_id: 421614,
                        endpoints: vec![infura("arbitrum-sepolia")],
                        pool: address!("0xb9fAEE3A6A70599C75761A458854ad21B384e8F9"),
                        stablecoin: address!("0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
                    },
                ),
                (
                    14767482510784806043,
                    ChainConfig {
                        chain_id: 43113,
                        endpoints: vec![infura("avalanche-fuji")],
                        pool: address!("0xDedEfCC3d91B952356e83A6246DaA08BBB824386"),
                        stablecoin: address!("0x5425890298aed601595a70AB815c96711a31Bc65"),
                    },
                ),
            ]),
        };

        let mainnet = NetworkConfig {
            home_chain_id: BASE_CHAIN_ID,
            home: BASE_CHAIN_SELECTOR,
            chains: BTreeMap::from([
                (
                    4949039107694359620,
                    ChainConfig {
                        chain_id: 42161,
                        endpoints: vec![infura("arbitrum-mainnet")],
                        pool: address!("0x164c20A4E11cBE0d8B5e23F5EE35675890BE280d"),
                        stablecoin: address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
                    },
                ),
                (
                    4051577828743386545,
                    ChainConfig {
                        chain_id: 137,
                        endpoints: vec![infura("polygon-mainnet")],
                        pool: address!("0x164c20A4E11cBE0d8B5e23F5EE35675890BE280d"),
                        stablecoin: address!("0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
                    },
                ),
                (
                    6433500567565415381,
                    ChainConfig {
                        chain_id: 43114,
                        endpoints: vec![infura("avalanche-mainnet")],
                        pool: address!("0x164c20A4E11cBE0d8B5e23F5EE35675890BE280d"),
                        stablecoin: address!("0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
                    },
                ),
                (
                    BASE_CHAIN_SELECTOR,
                    ChainConfig {
                        chain_id: BASE_CHAIN_ID,
                        endpoints: vec![infura("base-mainnet")],
                        pool: address!("0x0AE1B2730066AD46481ab0a5fd2B5893f8aBa323"),
                        stablecoin: address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
                    },
                ),
                (
                    3734403246176062136,
                    ChainConfig {
                        chain_id: 10,
                        endpoints: vec![infura("optimism-mainnet")],
                        pool: address!("0x8698c6DF1E354Ce3ED0dE508EF7AF4baB85D2F2D"),
                        stablecoin: address!("0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"),
                    },
                ),
            ]),
        };

        Self { testnet, mainnet }
    }
}

/// Pending transfer tracker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Number of log query rounds per run.
    pub rounds: usize,
    /// Maximum number of log queries per chain per round.
    pub batch_size: usize,
    /// Pause between two rounds.
    #[serde(with = "crate::serde::duration")]
    pub round_pause: Duration,
}

impl TrackerConfig {
    /// Sets the pause between two rounds.
    pub fn with_round_pause(mut self, round_pause: Duration) -> Self {
        self.round_pause = round_pause;
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            rounds: TRACKER_ROUNDS,
            batch_size: TRACKER_BATCH_SIZE,
            round_pause: Duration::from_millis(TRACKER_ROUND_PAUSE_MS),
        }
    }
}

/// JSON-RPC transport configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Timeout of a single JSON-RPC request.
    #[serde(with = "crate::serde::duration")]
    pub request_timeout: Duration,
    /// Gas limit returned for `eth_estimateGas` without asking the node.
    pub gas_estimate: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            gas_estimate: FIXED_GAS_ESTIMATE,
        }
    }
}
