//! Reconciler error types.
use crate::types::{ChainSelector, DistributionMode};
use alloy::primitives::ChainId;
use itertools::Itertools;
use std::fmt;
use thiserror::Error;

mod pool;
pub use pool::PoolError;

/// The overarching error type of a reconciliation run.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// A positional argument is missing.
    #[error("missing argument #{index} ({name})")]
    MissingArgument {
        /// Position of the argument.
        index: usize,
        /// Name of the argument.
        name: &'static str,
    },
    /// A positional argument could not be parsed.
    #[error("invalid argument #{index} ({name}): {reason}")]
    InvalidArgument {
        /// Position of the argument.
        index: usize,
        /// Name of the argument.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// The numeric chain id is neither the test nor the main network's home chain.
    #[error("unsupported chain {0}")]
    UnsupportedChain(ChainId),
    /// The requested operation is not implemented.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(DistributionMode),
    /// The network has no configuration for its own home chain.
    #[error("home chain {0} is not configured")]
    MissingHomeChain(ChainSelector),
    /// An endpoint template references a secret that was not provided.
    #[error("missing secret {0}")]
    MissingSecret(String),
    /// An endpoint template did not expand into a valid URL.
    #[error("invalid endpoint {template}: {reason}")]
    InvalidEndpoint {
        /// The endpoint template.
        template: String,
        /// Why the expanded URL was rejected.
        reason: String,
    },
    /// The pool messenger key could not be loaded.
    #[error("invalid signer key: {0}")]
    InvalidSigner(String),
    /// A pool interaction failed.
    #[error("pool on chain {selector} failed: {source}")]
    Pool {
        /// The chain the pool lives on.
        selector: ChainSelector,
        /// The pool error.
        #[source]
        source: PoolError,
    },
    /// Some writes of a fan-out failed with a non-benign error.
    #[error(transparent)]
    WriteFailures(#[from] WriteFailures),
}

impl ReconcilerError {
    /// Wraps a [`PoolError`] with the chain it happened on.
    pub fn pool(selector: ChainSelector) -> impl FnOnce(PoolError) -> Self {
        move |source| Self::Pool { selector, source }
    }

    /// Returns `true` for malformed or unsupported input. These are never worth retrying.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. }
                | Self::InvalidArgument { .. }
                | Self::UnsupportedChain(_)
                | Self::UnsupportedOperation(_)
        )
    }
}

/// Outcome of a write fan-out where at least one chain failed.
///
/// Writes that went through are not rolled back.
#[derive(Debug)]
pub struct WriteFailures {
    /// Number of writes that were submitted or classified as benign duplicates.
    pub submitted: usize,
    /// The chains whose write failed, with their errors.
    pub failures: Vec<(ChainSelector, PoolError)>,
}

impl fmt::Display for WriteFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} pool writes failed: {}",
            self.failures.len(),
            self.failures.len() + self.submitted,
            self.failures
                .iter()
                .map(|(selector, err)| format!("chain {selector}: {err}"))
                .join("; ")
        )
    }
}

impl std::error::Error for WriteFailures {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors() {
        assert!(ReconcilerError::UnsupportedChain(1).is_input_error());
        let liquidate = ReconcilerError::UnsupportedOperation(DistributionMode::Liquidate);
        assert!(liquidate.is_input_error());
        assert!(!ReconcilerError::MissingSecret("INFURA_API_KEY".into()).is_input_error());
        assert!(
            !ReconcilerError::pool(1)(PoolError::MissingSigner).is_input_error(),
            "pool failures are not input errors"
        );
    }

    #[test]
    fn write_failures_display() {
        let err = WriteFailures {
            submitted: 2,
            failures: vec![(
                7,
                PoolError::ErrorResp { code: -32000, message: "insufficient funds".into() },
            )],
        };
        assert_eq!(
            err.to_string(),
            "1 of 3 pool writes failed: chain 7: node returned error -32000: insufficient funds"
        );
    }
}
