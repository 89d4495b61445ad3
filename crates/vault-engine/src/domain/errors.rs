//! # Domain Errors
//!
//! Error types for the vault engine.
//!
//! Only conditions that reject an input or abort a single operation are errors.
//! Data-quality problems observed on chain are reported as
//! [`DataQualityWarning`](super::DataQualityWarning) values instead.

use thiserror::Error;

/// Vault engine error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Address text is not a structurally valid SS58 string.
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    /// Address text decoded but its embedded checksum does not match.
    #[error("Invalid address checksum: {0}")]
    InvalidChecksum(String),

    /// Threshold outside `1..=signers`.
    #[error("Invalid threshold: {threshold} of {signers} signers")]
    InvalidThreshold {
        /// Requested threshold
        threshold: u16,
        /// Number of signers
        signers: usize,
    },

    /// Multisig definition is inconsistent (duplicate signer, address mismatch).
    #[error("Invalid multisig: {0}")]
    InvalidMultisig(String),

    /// A code path that is known but not supported yet.
    #[error("Unimplemented: {0}")]
    UnimplementedPath(String),

    /// Chain storage could not be read.
    #[error("Chain unavailable: {0}")]
    ChainUnavailable(String),

    /// A suspension point exceeded its deadline.
    #[error("Timed out after {after_ms}ms: {operation}")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Deadline in milliseconds
        after_ms: u64,
    },

    /// A newer refresh started before this one completed.
    #[error("Refresh {generation} superseded by {latest}")]
    Superseded {
        /// Generation of the discarded refresh
        generation: u64,
        /// Generation that replaced it
        latest: u64,
    },

    /// Call bytes could not be decoded.
    #[error("Call decode failed: {0}")]
    CallDecode(String),

    /// Off-chain metadata service failure.
    #[error("Metadata service error: {0}")]
    MetadataService(String),

    /// Token amount arithmetic overflowed.
    #[error("Balance overflow for token {0}")]
    BalanceOverflow(String),

    /// Arithmetic between balances of different tokens.
    #[error("Token mismatch: {left} vs {right}")]
    TokenMismatch {
        /// Left-hand token id
        left: String,
        /// Right-hand token id
        right: String,
    },

    /// Call-data cache file could not be read or written.
    #[error("Cache persistence failed: {0}")]
    CachePersistence(String),

    /// Configuration value rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Errors raised by malformed user input at the boundary.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddressFormat(_)
                | Self::InvalidChecksum(_)
                | Self::InvalidThreshold { .. }
                | Self::InvalidMultisig(_)
        )
    }

    /// Errors that a reconnect might cure.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ChainUnavailable(_) | Self::Timeout { .. })
    }
}

impl From<parity_scale_codec::Error> for EngineError {
    fn from(e: parity_scale_codec::Error) -> Self {
        Self::CallDecode(e.to_string())
    }
}
