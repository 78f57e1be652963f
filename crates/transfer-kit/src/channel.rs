use crate::chain::UniversalChainId;
use crate::error::{ChannelValidationError, Error};
use crate::types::channel::{Channel, ChannelRecord};

/// Cause reported for every channel that cannot be used for a transfer.
pub const MISSING_CHANNEL_INFO: &str = "Missing required channel information";

/// Trait for channel-list providers (indexer API, embedded fixtures, etc.).
pub trait ChannelSource {
    /// All candidate channel records known to this source.
    fn channels(&self) -> Result<Vec<ChannelRecord>, Error>;
}

/// Resolve the channel for a `source -> destination` transfer.
///
/// The first record matching both chain ids wins. A missing match, or a match
/// with a null connection or channel id or an empty port id on either side,
/// fails with [`MISSING_CHANNEL_INFO`].
pub fn resolve(
    source_chain_id: &UniversalChainId,
    destination_chain_id: &UniversalChainId,
    channels: &[ChannelRecord],
) -> Result<Channel, ChannelValidationError> {
    channels
        .iter()
        .find(|c| {
            &c.source_chain_id == source_chain_id && &c.destination_chain_id == destination_chain_id
        })
        .and_then(Channel::from_record)
        .ok_or_else(|| {
            tracing::debug!(
                target: "channel",
                source = %source_chain_id,
                destination = %destination_chain_id,
                "no usable channel"
            );
            ChannelValidationError {
                source_chain_id: source_chain_id.clone(),
                destination_chain_id: destination_chain_id.clone(),
                cause: MISSING_CHANNEL_INFO.to_string(),
            }
        })
}

/// Like [`resolve`], but treats a missing or incomplete channel as not-found.
pub fn resolve_safe(
    source_chain_id: &UniversalChainId,
    destination_chain_id: &UniversalChainId,
    channels: &[ChannelRecord],
) -> Option<Channel> {
    resolve(source_chain_id, destination_chain_id, channels).ok()
}

/// Fetch channels from a source and resolve against them.
pub fn resolve_from(
    source: &dyn ChannelSource,
    source_chain_id: &UniversalChainId,
    destination_chain_id: &UniversalChainId,
) -> Result<Channel, Error> {
    let channels = source.channels()?;
    Ok(resolve(source_chain_id, destination_chain_id, &channels)?)
}

/// Static in-memory channel source.
pub struct StaticChannelSource {
    channels: Vec<ChannelRecord>,
}

impl StaticChannelSource {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Load a channel list from JSON (an array of channel records).
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let channels: Vec<ChannelRecord> =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self { channels })
    }

    pub fn add(&mut self, record: ChannelRecord) {
        self.channels.push(record);
    }
}

impl Default for StaticChannelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSource for StaticChannelSource {
    fn channels(&self) -> Result<Vec<ChannelRecord>, Error> {
        Ok(self.channels.clone())
    }
}
