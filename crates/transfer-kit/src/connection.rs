use std::fmt;

use async_trait::async_trait;

use crate::error::ConnectionError;

/// Block at which a read is evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockTag {
    #[default]
    Latest,
    Number(u64),
}

/// A read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub to: [u8; 20],
    pub data: Vec<u8>,
    pub block: BlockTag,
}

/// A state-changing contract call, sent from the connection's account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: [u8; 20],
    pub data: Vec<u8>,
}

/// Hash identifying a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Read side of a chain connection, for `eth_call`-style reads.
///
/// The crate never talks to an RPC endpoint itself; callers supply this, and a
/// [`WriteConnection`] bound to a signing account for transactions.
#[async_trait]
pub trait ReadConnection: Send + Sync {
    /// Execute a call and return the raw ABI-encoded return data.
    async fn call(&self, request: CallRequest) -> Result<Vec<u8>, ConnectionError>;
}

#[async_trait]
pub trait WriteConnection: Send + Sync {
    /// Address of the account that signs transactions sent through this connection.
    fn account(&self) -> [u8; 20];

    /// Sign and submit a transaction, returning its hash once accepted.
    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<TxHash, ConnectionError>;
}
