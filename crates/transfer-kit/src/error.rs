use thiserror::Error;

use crate::chain::UniversalChainId;

/// Unified error type for the transfer-kit library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("channel validation error: {0}")]
    Channel(#[from] ChannelValidationError),

    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("abi error: {0}")]
    Abi(#[from] AbiError),

    #[error("config error: {0}")]
    Config(String),
}

/// A channel lookup that did not produce a usable channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause} (source={source_chain_id}, destination={destination_chain_id})")]
pub struct ChannelValidationError {
    pub source_chain_id: UniversalChainId,
    pub destination_chain_id: UniversalChainId,
    pub cause: String,
}

/// Errors raised by a chain connection. Passed through to callers as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// Errors during signature parsing, argument encoding and return-data decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("invalid function signature: {0}")]
    InvalidSignature(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    DataTooShort { expected: usize, actual: usize },

    #[error("invalid ABI encoding: {0}")]
    InvalidEncoding(String),

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
}

/// Failure of a token-list query. Stored by the token store, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenQueryError {
    #[error("token list fetch failed: {0}")]
    Fetch(String),

    #[error("token list decode failed: {0}")]
    Decode(String),

    #[error("token list query timed out")]
    Timeout,
}
