use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Chain identifier of the form `<family>.<reference>`, e.g. `ethereum.11155111`
/// or `babylon.bbn-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniversalChainId(String);

impl UniversalChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Chain family, the part before the first `.` (`ethereum`, `babylon`, ...).
    pub fn family(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(f, _)| f)
    }

    /// Family-specific reference, the part after the first `.`.
    pub fn reference(&self) -> Option<&str> {
        self.0.split_once('.').map(|(_, r)| r)
    }

    /// Numeric EVM chain id, if the reference parses as one.
    pub fn evm_chain_id(&self) -> Option<u64> {
        self.reference()?.parse().ok()
    }
}

impl fmt::Display for UniversalChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UniversalChainId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((family, reference)) if !family.is_empty() && !reference.is_empty() => {
                Ok(Self(s.to_string()))
            }
            _ => Err(Error::Config(format!("invalid universal chain id: {s}"))),
        }
    }
}

impl From<&str> for UniversalChainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
