use std::num::NonZeroUsize;
use std::sync::Arc;

use ethsub_common::LogFilter;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use util::task::Supervisor;

use crate::listener::{Command, Listener, ListenerExit};
use crate::protocol::{self, RequestIds};
use crate::registry::{Registry, SubscriptionRecord};
use crate::transport::{Connection, Connector, WsConnector};
use crate::{Error, Event, PubSubConfig, SubscriptionId, SubscriptionKind};

/// Manages push subscriptions to a single node, at most one per
/// [SubscriptionKind].
pub struct PubSubClient<C = WsConnector> {
    connector: C,
    channel_capacity: NonZeroUsize,
    registry: Arc<Registry>,
    supervisor: Supervisor,
}

impl PubSubClient<WsConnector> {
    pub fn new(config: PubSubConfig) -> Self {
        Self::with_connector(WsConnector::new(config.url), config.channel_capacity)
    }
}

impl<C: Connector> PubSubClient<C> {
    pub fn with_connector(connector: C, channel_capacity: NonZeroUsize) -> Self {
        Self {
            connector,
            channel_capacity,
            registry: Default::default(),
            supervisor: Supervisor::new(),
        }
    }

    /// Subscribes to `kind` on a dedicated connection.
    ///
    /// `filter` is only sent for [SubscriptionKind::Logs] and ignored for
    /// every other kind. A logs subscription without a filter matches every
    /// log.
    pub async fn subscribe(
        &self,
        kind: SubscriptionKind,
        filter: Option<LogFilter>,
    ) -> Result<Subscription, Error> {
        let reservation = self.registry.reserve(kind)?;

        let filter = match (kind, filter) {
            (SubscriptionKind::Logs, filter) => filter,
            (_, Some(_)) => {
                tracing::warn!(%kind, "Ignoring log filter");
                None
            }
            (_, None) => None,
        };

        let mut connection = self.connector.connect().await?;
        let mut request_ids = RequestIds::default();

        let id = match handshake(&mut connection, &mut request_ids, kind, filter.as_ref()).await {
            Ok(id) => id,
            Err(error) => {
                tracing::debug!(%kind, %error, "Subscribing failed");
                connection.close().await;
                return Err(error);
            }
        };

        tracing::debug!(%kind, subscription_id=%id, "Subscribed");

        let (events_tx, events_rx) = mpsc::channel(self.channel_capacity.get());
        let (commands_tx, commands_rx) = mpsc::channel(1);
        let token = self.supervisor.child_token();

        reservation.commit(SubscriptionRecord {
            id: id.clone(),
            commands: commands_tx,
        });

        let listener = Listener {
            kind,
            id: id.clone(),
            connection,
            request_ids,
            events: events_tx,
            commands: commands_rx,
            registry: Arc::clone(&self.registry),
            token: token.clone(),
        };
        let handle = self
            .supervisor
            .spawn(&format!("{kind} listener"), listener.run());

        Ok(Subscription {
            kind,
            id,
            events: events_rx,
            cancel: CancelHandle { token, handle },
        })
    }

    /// Unsubscribes from `kind` and waits for the node's acknowledgement.
    ///
    /// On success the subscription's event stream ends. If the node refuses,
    /// the subscription stays in place and the call may be retried.
    pub async fn unsubscribe(&self, kind: SubscriptionKind) -> Result<(), Error> {
        let record = self
            .registry
            .live(kind)
            .ok_or(Error::NotSubscribed(kind))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        record
            .commands
            .send(Command::Unsubscribe { reply: reply_tx })
            .await
            .map_err(|_| Error::NotSubscribed(kind))?;

        // The listener exited before handling the command.
        reply_rx.await.map_err(|_| Error::NotSubscribed(kind))?
    }

    pub fn is_subscribed(&self, kind: SubscriptionKind) -> bool {
        self.registry.is_live(kind)
    }

    pub fn subscription_id(&self, kind: SubscriptionKind) -> Option<SubscriptionId> {
        self.registry.live(kind).map(|record| record.id)
    }

    /// Cancels every subscription and waits for their listeners to finish.
    pub async fn shutdown(self) {
        tracing::debug!(listeners=?self.supervisor.running(), "Shutting down");

        self.supervisor.close();
        self.supervisor.wait().await;
    }
}

async fn handshake<T: Connection>(
    connection: &mut T,
    request_ids: &mut RequestIds,
    kind: SubscriptionKind,
    filter: Option<&LogFilter>,
) -> Result<SubscriptionId, Error> {
    let request_id = request_ids.next();
    let request = protocol::subscribe_request(request_id, kind, filter)?;
    connection.send(request).await?;

    let ack = connection.recv().await?;
    protocol::decode_subscribe_ack(&ack, request_id)
}

/// An active subscription.
///
/// Dropping the subscription, or only its event receiver, cancels it.
#[derive(Debug)]
pub struct Subscription {
    kind: SubscriptionKind,
    id: SubscriptionId,
    events: mpsc::Receiver<Event>,
    cancel: CancelHandle,
}

impl Subscription {
    pub fn kind(&self) -> SubscriptionKind {
        self.kind
    }

    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// Receives the next event. Returns `None` once the subscription ended.
    pub async fn next(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub fn into_parts(self) -> (mpsc::Receiver<Event>, CancelHandle) {
        (self.events, self.cancel)
    }

    pub fn cancel(self) {
        self.cancel.cancel()
    }

    pub async fn cancel_and_wait(self) -> ListenerExit {
        self.cancel.cancel_and_wait().await
    }
}

/// Cancels a subscription. Dropping the handle does not cancel.
#[derive(Debug)]
pub struct CancelHandle {
    token: CancellationToken,
    handle: JoinHandle<ListenerExit>,
}

impl CancelHandle {
    /// Signals the listener to unsubscribe and close its connection.
    pub fn cancel(self) {
        self.token.cancel();
    }

    /// Signals the listener and waits until it has finished.
    pub async fn cancel_and_wait(self) -> ListenerExit {
        self.token.cancel();
        self.handle.await.unwrap_or_else(|error| {
            tracing::warn!(%error, "Listener task failed");
            ListenerExit::Aborted
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
