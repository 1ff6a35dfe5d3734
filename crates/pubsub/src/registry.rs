use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::listener::Command;
use crate::{Error, SubscriptionId, SubscriptionKind};

/// A subscription which has been acknowledged by the node.
#[derive(Debug, Clone)]
pub(crate) struct SubscriptionRecord {
    pub id: SubscriptionId,
    /// Requests for the listener which owns the connection.
    pub commands: mpsc::Sender<Command>,
}

#[derive(Debug)]
enum Slot {
    /// A subscribe request is in progress.
    Pending,
    Live(SubscriptionRecord),
}

/// Tracks at most one subscription per [SubscriptionKind].
#[derive(Debug, Default)]
pub(crate) struct Registry {
    slots: DashMap<SubscriptionKind, Slot>,
}

impl Registry {
    /// Claims the slot for `kind` until the returned reservation is either
    /// committed or dropped.
    pub fn reserve(self: &Arc<Self>, kind: SubscriptionKind) -> Result<Reservation, Error> {
        match self.slots.entry(kind) {
            Entry::Occupied(_) => Err(Error::AlreadySubscribed(kind)),
            Entry::Vacant(entry) => {
                entry.insert(Slot::Pending);
                Ok(Reservation {
                    registry: Arc::clone(self),
                    kind,
                    committed: false,
                })
            }
        }
    }

    pub fn live(&self, kind: SubscriptionKind) -> Option<SubscriptionRecord> {
        match self.slots.get(&kind)?.value() {
            Slot::Live(record) => Some(record.clone()),
            Slot::Pending => None,
        }
    }

    /// Removes the record for `kind` if it belongs to subscription `id`.
    pub fn remove(&self, kind: SubscriptionKind, id: &SubscriptionId) -> bool {
        self.slots
            .remove_if(&kind, |_, slot| matches!(slot, Slot::Live(record) if &record.id == id))
            .is_some()
    }

    pub fn is_live(&self, kind: SubscriptionKind) -> bool {
        self.slots
            .get(&kind)
            .is_some_and(|slot| matches!(slot.value(), Slot::Live(_)))
    }

    /// The number of live and pending subscriptions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

/// A claim on a registry slot. Releases the slot on drop unless committed.
#[derive(Debug)]
pub(crate) struct Reservation {
    registry: Arc<Registry>,
    kind: SubscriptionKind,
    committed: bool,
}

impl Reservation {
    pub fn commit(mut self, record: SubscriptionRecord) {
        self.registry.slots.insert(self.kind, Slot::Live(record));
        self.committed = true;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if !self.committed {
            self.registry
                .slots
                .remove_if(&self.kind, |_, slot| matches!(slot, Slot::Pending));
        }
    }
}
