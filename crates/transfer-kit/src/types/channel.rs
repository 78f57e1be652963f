use serde::{Deserialize, Serialize};

use crate::chain::UniversalChainId;

/// A candidate channel as returned by a channel-list provider.
///
/// Connection and channel ids may be `null` while a channel is still being
/// opened, and port ids may be missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub source_chain_id: UniversalChainId,

    #[serde(default)]
    pub source_connection_id: Option<u32>,

    #[serde(default)]
    pub source_channel_id: Option<u32>,

    #[serde(default)]
    pub source_port_id: Option<String>,

    pub destination_chain_id: UniversalChainId,

    #[serde(default)]
    pub destination_connection_id: Option<u32>,

    #[serde(default)]
    pub destination_channel_id: Option<u32>,

    #[serde(default)]
    pub destination_port_id: Option<String>,
}

/// A validated, directed transfer channel between two chains.
///
/// Only constructed by the channel resolver, so every field is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Channel {
    source_chain_id: UniversalChainId,
    source_connection_id: u32,
    source_channel_id: u32,
    source_port_id: String,
    destination_chain_id: UniversalChainId,
    destination_connection_id: u32,
    destination_channel_id: u32,
    destination_port_id: String,
}

impl Channel {
    /// Build a channel from a record, returning `None` if any required field is
    /// missing or a port id is empty.
    pub(crate) fn from_record(record: &ChannelRecord) -> Option<Self> {
        let source_port_id = record.source_port_id.as_deref().filter(|p| !p.is_empty())?;
        let destination_port_id = record
            .destination_port_id
            .as_deref()
            .filter(|p| !p.is_empty())?;

        Some(Self {
            source_chain_id: record.source_chain_id.clone(),
            source_connection_id: record.source_connection_id?,
            source_channel_id: record.source_channel_id?,
            source_port_id: source_port_id.to_string(),
            destination_chain_id: record.destination_chain_id.clone(),
            destination_connection_id: record.destination_connection_id?,
            destination_channel_id: record.destination_channel_id?,
            destination_port_id: destination_port_id.to_string(),
        })
    }

    pub fn source_chain_id(&self) -> &UniversalChainId {
        &self.source_chain_id
    }

    pub fn source_connection_id(&self) -> u32 {
        self.source_connection_id
    }

    pub fn source_channel_id(&self) -> u32 {
        self.source_channel_id
    }

    pub fn source_port_id(&self) -> &str {
        &self.source_port_id
    }

    pub fn destination_chain_id(&self) -> &UniversalChainId {
        &self.destination_chain_id
    }

    pub fn destination_connection_id(&self) -> u32 {
        self.destination_connection_id
    }

    pub fn destination_channel_id(&self) -> u32 {
        self.destination_channel_id
    }

    pub fn destination_port_id(&self) -> &str {
        &self.destination_port_id
    }
}
