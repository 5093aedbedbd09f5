use crate::transport::error::{RequestTimeout, SubmissionErrorKind};
use alloy::transports::{RpcError, TransportError, TransportErrorKind};

/// Errors returned by a [`PoolApi`](crate::pool::PoolApi) interaction.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The node answered with a JSON-RPC error object.
    #[error("node returned error {code}: {message}")]
    ErrorResp {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
    },
    /// The node did not answer before the request deadline.
    #[error(transparent)]
    Timeout(RequestTimeout),
    /// The request did not produce a usable response.
    #[error(transparent)]
    Rpc(RpcError<TransportErrorKind>),
    /// ABI encoding or decoding failed.
    #[error(transparent)]
    Contract(alloy::contract::Error),
    /// A write was requested from a pool without a signer.
    #[error("no signer configured for pool writes")]
    MissingSigner,
}

impl PoolError {
    /// Classifies this error as the outcome of a transaction submission.
    ///
    /// Only node error responses can be benign, everything else is fatal.
    pub fn submission_kind(&self) -> SubmissionErrorKind {
        match self {
            Self::ErrorResp { code, message } => SubmissionErrorKind::classify(*code, message),
            _ => SubmissionErrorKind::Fatal,
        }
    }
}

impl From<TransportError> for PoolError {
    fn from(err: TransportError) -> Self {
        if let Some(resp) = err.as_error_resp() {
            return Self::ErrorResp { code: resp.code, message: resp.message.to_string() };
        }
        match err {
            RpcError::Transport(TransportErrorKind::Custom(custom)) => {
                match custom.downcast::<RequestTimeout>() {
                    Ok(timeout) => Self::Timeout(*timeout),
                    Err(custom) => {
                        Self::Rpc(RpcError::Transport(TransportErrorKind::Custom(custom)))
                    }
                }
            }
            err => Self::Rpc(err),
        }
    }
}

impl From<alloy::contract::Error> for PoolError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(err) => err.into(),
            err => Self::Contract(err),
        }
    }
}
