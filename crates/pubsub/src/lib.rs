//! Push subscriptions to an Ethereum node over websockets.
//!
//! Each subscription gets its own connection which is owned by a background
//! listener task. The listener forwards decoded [Event]s to a bounded channel,
//! so a slow consumer stalls reading from the socket instead of losing events.
//!
//! ```no_run
//! # async fn run() -> Result<(), ethsub_pubsub::Error> {
//! use ethsub_pubsub::{PubSubClient, PubSubConfig, SubscriptionKind};
//!
//! let url = "wss://mainnet.infura.io/ws/v3/<project>".parse().unwrap();
//! let client = PubSubClient::new(PubSubConfig::new(url));
//!
//! let mut heads = client.subscribe(SubscriptionKind::NewHeads, None).await?;
//! while let Some(event) = heads.next().await {
//!     println!("{event:?}");
//! }
//!
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```
mod client;
mod config;
mod error;
mod event;
mod kind;
mod listener;
mod protocol;
mod registry;
#[cfg(test)]
mod test_utils;
pub mod transport;

pub use client::{CancelHandle, PubSubClient, Subscription};
pub use config::PubSubConfig;
pub use error::Error;
pub use event::Event;
pub use kind::{SubscriptionId, SubscriptionKind, UnknownSubscriptionKind};
pub use listener::ListenerExit;
