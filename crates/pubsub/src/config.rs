use std::num::NonZeroUsize;

use url::Url;

/// Configuration of a [PubSubClient](crate::PubSubClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubConfig {
    /// The websocket endpoint of the node.
    pub url: Url,
    /// Capacity of each subscription's event channel. A full channel stops
    /// the listener from reading further frames.
    pub channel_capacity: NonZeroUsize,
}

impl PubSubConfig {
    pub const DEFAULT_CHANNEL_CAPACITY: NonZeroUsize = match NonZeroUsize::new(128) {
        Some(capacity) => capacity,
        None => unreachable!(),
    };

    pub fn new(url: Url) -> Self {
        Self {
            url,
            channel_capacity: Self::DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(mut self, channel_capacity: NonZeroUsize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }
}
