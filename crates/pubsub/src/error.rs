use std::sync::Arc;

use ethsub_common::jsonrpc::ErrorObject;

use crate::transport::TransportError;
use crate::SubscriptionKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Dialing, writing to or reading from the connection failed.
    #[error("Connection failure: {0}")]
    Connection(#[source] Arc<TransportError>),
    /// The node sent a frame which is malformed or unexpected at this point.
    #[error("Protocol violation: {0}")]
    Protocol(String),
    /// The node answered with a JSON-RPC error object.
    #[error(transparent)]
    Rpc(#[from] ErrorObject),
    #[error("Already subscribed to {0}")]
    AlreadySubscribed(SubscriptionKind),
    #[error("Not subscribed to {0}")]
    NotSubscribed(SubscriptionKind),
    #[error("Node refused to unsubscribe from {0}")]
    UnsubscribeRejected(SubscriptionKind),
}

impl Error {
    pub(crate) fn protocol(message: impl std::fmt::Display) -> Self {
        Self::Protocol(message.to_string())
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Connection(Arc::new(e))
    }
}
