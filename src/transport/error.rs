//! Transport-level error types.

use crate::types::ChainSelector;
use std::time::Duration;
use strum::Display;

/// A JSON-RPC request to a pool's chain that was not answered in time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{method} on chain {selector} not answered within {}ms", .after.as_millis())]
pub struct RequestTimeout {
    /// The chain the request was sent to.
    pub selector: ChainSelector,
    /// The JSON-RPC method, or `batch(n)` for a batch of `n` requests.
    pub method: String,
    /// The configured deadline.
    pub after: Duration,
}

/// What a failed transaction submission means for the caller.
///
/// Several submission failures only say that an equivalent transaction from an earlier, still
/// pending run already reached the node. Those are benign duplicates and count as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SubmissionErrorKind {
    /// The nonce was already used by a mined or pending transaction.
    NonceExpired,
    /// A transaction with the same nonce is pending and the new one does not outbid it.
    ReplacementUnderpriced,
    /// The exact transaction is already in the node's pool.
    AlreadyKnown,
    /// Anything else.
    Fatal,
}

/// Message fragments of benign rejections, matched anywhere in the lowercased message.
///
/// Clients prefix or wrap the txpool error text, e.g. `ALREADY_EXISTS: already known`.
const BENIGN_FRAGMENTS: [(&str, SubmissionErrorKind); 8] = [
    ("nonce too low", SubmissionErrorKind::NonceExpired),
    ("nonce is too low", SubmissionErrorKind::NonceExpired),
    ("nonce has already been used", SubmissionErrorKind::NonceExpired),
    ("nonce expired", SubmissionErrorKind::NonceExpired),
    ("replacement transaction underpriced", SubmissionErrorKind::ReplacementUnderpriced),
    ("replacement fee too low", SubmissionErrorKind::ReplacementUnderpriced),
    ("already known", SubmissionErrorKind::AlreadyKnown),
    ("already imported", SubmissionErrorKind::AlreadyKnown),
];

impl SubmissionErrorKind {
    /// Classifies a node error response.
    ///
    /// Pure and total: identical inputs always produce the same kind. The message decides. The
    /// only benign code is `-32010` with a nonce complaint, which is how OpenEthereum-derived
    /// clients report a stale nonce without the usual wording.
    pub fn classify(code: i64, message: &str) -> Self {
        let message = message.to_ascii_lowercase();

        if let Some((_, kind)) =
            BENIGN_FRAGMENTS.iter().find(|(fragment, _)| message.contains(fragment))
        {
            return *kind;
        }
        // geth before 1.10: `known transaction: <hash>`
        if contains_word(&message, "known transaction") {
            return Self::AlreadyKnown;
        }
        if code == STALE_NONCE_CODE && message.contains("nonce") {
            return Self::NonceExpired;
        }
        Self::Fatal
    }

    /// Returns `true` if the submission should be treated as successful.
    pub const fn is_benign(self) -> bool {
        !matches!(self, Self::Fatal)
    }
}

/// OpenEthereum's transaction error code.
const STALE_NONCE_CODE: i64 = -32010;

/// Returns `true` if `phrase` occurs in `haystack` not preceded by an alphanumeric character.
fn contains_word(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        !haystack[..start].chars().next_back().is_some_and(|c| c.is_ascii_alphanumeric())
    })
}
