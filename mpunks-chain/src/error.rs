//! Error types for the chain gateway and validation pipeline.
//!
//! A nonce failing one of its checks is not an error; that outcome is the
//! [`crate::NonceStatus`] classification. Errors here mean the system could
//! not determine an answer at all.

use thiserror::Error;

/// Aggregated error type for chain reads, writes and the pooled feed.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Missing or malformed operating configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The chain endpoint is unreachable or returned malformed data.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The pooled-miner result feed is unreachable or malformed.
    #[error("feed error: {0}")]
    Feed(String),

    /// No signing wallet available for a write operation.
    #[error("wallet error: {0}")]
    Wallet(String),

    /// The mint transaction itself was rejected by the endpoint.
    #[error("submission error: {0}")]
    Submission(String),

    /// Validation error in caller-supplied inputs.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
