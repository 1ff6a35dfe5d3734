use ethsub_common::{BlockHeader, Log, SyncStatus, TransactionHash};
use serde_json::value::RawValue;

use crate::SubscriptionKind;

/// A decoded subscription event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NewHead(Box<BlockHeader>),
    Log(Box<Log>),
    PendingTransaction(TransactionHash),
    Syncing(SyncStatus),
}

impl Event {
    /// Decodes the `result` of a notification into the payload of `kind`.
    pub fn decode(kind: SubscriptionKind, result: &RawValue) -> Result<Self, serde_json::Error> {
        let json = result.get();
        let event = match kind {
            SubscriptionKind::NewHeads => Event::NewHead(serde_json::from_str(json)?),
            SubscriptionKind::Logs => Event::Log(serde_json::from_str(json)?),
            SubscriptionKind::NewPendingTransactions => {
                Event::PendingTransaction(serde_json::from_str(json)?)
            }
            SubscriptionKind::Syncing => Event::Syncing(serde_json::from_str(json)?),
        };
        Ok(event)
    }

    pub fn kind(&self) -> SubscriptionKind {
        match self {
            Event::NewHead(_) => SubscriptionKind::NewHeads,
            Event::Log(_) => SubscriptionKind::Logs,
            Event::PendingTransaction(_) => SubscriptionKind::NewPendingTransactions,
            Event::Syncing(_) => SubscriptionKind::Syncing,
        }
    }
}
