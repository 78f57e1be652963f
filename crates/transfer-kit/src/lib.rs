pub mod abi;
pub mod chain;
pub mod channel;
pub mod connection;
pub mod erc20;
pub mod error;
pub mod gas_denoms;
pub mod token;
pub mod tokens;
pub mod types;

// Re-exports for convenience
pub use chain::UniversalChainId;
pub use channel::{resolve, resolve_from, resolve_safe, ChannelSource, StaticChannelSource};
pub use connection::{BlockTag, ReadConnection, TxHash, WriteConnection};
pub use erc20::{Erc20Client, Erc20Field};
pub use error::{ChannelValidationError, ConnectionError, Error, TokenQueryError};
pub use gas_denoms::{GasDenom, GasDenomTable};
pub use token::TokenMeta;
pub use tokens::{StoreEvent, StoreEventKind, TokenQuery, TokenStore, TokenStoreConfig};
pub use types::channel::{Channel, ChannelRecord};
pub use types::token_list::{Token, TokenList};
