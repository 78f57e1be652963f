use serde::{Deserialize, Serialize};

/// Token list for a single chain, as returned by the token-list query.
pub type TokenList = Vec<Token>;

/// A token known to the indexer on a given chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// On-chain denomination: a contract address for EVM chains, a base denom
    /// for Cosmos chains.
    pub denom: String,

    /// Display representations, most preferred first.
    #[serde(default)]
    pub representations: Vec<TokenRepresentation>,

    /// Tokens this one wraps on other chains.
    #[serde(default)]
    pub wrapping: Vec<TokenWrapping>,
}

impl Token {
    /// The preferred representation, if the indexer knows one.
    pub fn primary_representation(&self) -> Option<&TokenRepresentation> {
        self.representations.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRepresentation {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWrapping {
    pub unwrapped_chain_id: String,
    pub unwrapped_denom: String,
}
