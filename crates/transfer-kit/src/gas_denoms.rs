use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chain::UniversalChainId;
use crate::error::Error;
use crate::token::TokenMeta;

/// Address used by EVM chains to stand for the native token.
pub const NATIVE_EVM_ADDRESS: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

/// A chain's gas-paying token, with metadata known ahead of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasDenom {
    /// Address (EVM) or hex-encoded base denom (Cosmos) the token is known by.
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl GasDenom {
    /// Whether `address` refers to this gas token. Case-insensitive.
    pub fn matches(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }

    pub fn meta(&self) -> TokenMeta {
        TokenMeta {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
        }
    }
}

/// Static table of chain id → gas denomination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GasDenomTable {
    entries: HashMap<UniversalChainId, GasDenom>,
}

impl GasDenomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the gas denominations of the supported chains.
    pub fn builtin() -> Self {
        let evm = |name: &str, symbol: &str| GasDenom {
            address: NATIVE_EVM_ADDRESS.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals: 18,
        };
        let cosmos = |denom: &str, name: &str, symbol: &str, decimals: u8| GasDenom {
            address: format!("0x{}", hex::encode(denom)),
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
        };

        let mut table = Self::new();
        table.insert("ethereum.1", evm("Ether", "ETH"));
        table.insert("ethereum.11155111", evm("Sepolia Ether", "ETH"));
        table.insert("ethereum.17000", evm("Holesky Ether", "ETH"));
        table.insert("bob.60808", evm("Ether", "ETH"));
        table.insert("bob.808813", evm("Ether", "ETH"));
        table.insert("corn.21000000", evm("Bitcorn", "BTCN"));
        table.insert("corn.21000001", evm("Bitcorn", "BTCN"));
        table.insert("arbitrum.42161", evm("Ether", "ETH"));
        table.insert("base.8453", evm("Ether", "ETH"));
        table.insert("babylon.bbn-1", cosmos("ubbn", "Babylon", "BABY", 6));
        table.insert("babylon.bbn-test-5", cosmos("ubbn", "Babylon", "BABY", 6));
        table.insert("osmosis.osmo-test-5", cosmos("uosmo", "Osmosis", "OSMO", 6));
        table.insert("stargaze.elgafar-1", cosmos("ustars", "Stargaze", "STARS", 6));
        table
    }

    /// Parse a table from JSON: `{ "<chain id>": { "address", "name", "symbol", "decimals" } }`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid gas denom table: {e}")))
    }

    pub fn insert(&mut self, chain_id: impl Into<UniversalChainId>, denom: GasDenom) {
        self.entries.insert(chain_id.into(), denom);
    }

    pub fn get(&self, chain_id: &UniversalChainId) -> Option<&GasDenom> {
        self.entries.get(chain_id)
    }

    /// The gas denomination of `chain_id`, if `address` refers to it.
    pub fn lookup(&self, chain_id: &UniversalChainId, address: &str) -> Option<&GasDenom> {
        self.get(chain_id).filter(|d| d.matches(address))
    }

    /// Merge entries from another table, overriding existing chains.
    pub fn extend(&mut self, other: GasDenomTable) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
