use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::protocol::{self, RequestIds, UnsubscribeFrame};
use crate::registry::Registry;
use crate::transport::{Connection, TransportError};
use crate::{Error, Event, SubscriptionId, SubscriptionKind};

/// Requests handed to a listener by the client.
#[derive(Debug)]
pub(crate) enum Command {
    Unsubscribe {
        reply: oneshot::Sender<Result<(), Error>>,
    },
}

/// Why a listener stopped.
///
/// In every case the connection has been closed, the subscription removed
/// from its client and the event channel closed.
#[derive(Debug)]
pub enum ListenerExit {
    /// An explicit unsubscribe was acknowledged by the node.
    Unsubscribed,
    /// The listener was cancelled, or the event receiver was dropped.
    /// `acknowledged` tells whether the node acknowledged the unsubscribe
    /// request sent on the way out.
    Cancelled { acknowledged: bool },
    /// The connection failed or the node violated the protocol.
    Failed(Error),
    /// The listener task panicked or was aborted by the runtime.
    Aborted,
}

/// Owns a subscription's connection and forwards its events.
pub(crate) struct Listener<C> {
    pub kind: SubscriptionKind,
    pub id: SubscriptionId,
    pub connection: C,
    pub request_ids: RequestIds,
    pub events: mpsc::Sender<Event>,
    pub commands: mpsc::Receiver<Command>,
    pub registry: Arc<Registry>,
    pub token: CancellationToken,
}

type Reply = oneshot::Sender<Result<(), Error>>;

enum Step {
    Cancelled,
    ConsumerGone,
    Command(Command),
    Frame(Result<String, TransportError>),
}

enum Delivery {
    Delivered,
    Cancelled,
    ConsumerGone,
    /// A command arrived while waiting for room. The event is handed back.
    Interrupted(Command, Event),
}

impl<C: Connection> Listener<C> {
    pub async fn run(mut self) -> ListenerExit {
        let kind = self.kind;
        let id = self.id.clone();

        let (exit, reply) = self.stream().await;

        self.connection.close().await;
        self.registry.remove(kind, &id);
        // Closes the event channel.
        drop(self);

        match &exit {
            ListenerExit::Failed(error) => {
                tracing::debug!(%kind, subscription_id=%id, %error, "Subscription terminated")
            }
            exit => tracing::debug!(%kind, subscription_id=%id, ?exit, "Subscription ended"),
        }

        if let Some(reply) = reply {
            let result = match &exit {
                ListenerExit::Failed(error) => Err(error.clone()),
                _ => Ok(()),
            };
            // The caller may have stopped waiting.
            let _ = reply.send(result);
        }

        exit
    }

    /// Forwards events until the subscription ends. Returns the reply channel
    /// of an unsubscribe command which ended the subscription, which must
    /// only be answered once the subscription has been torn down.
    async fn stream(&mut self) -> (ListenerExit, Option<Reply>) {
        // Decoded events not yet accepted by the channel. Holds at most one
        // event, plus those received while an unsubscribe is pending.
        let mut backlog = VecDeque::new();

        loop {
            let step = match backlog.pop_front() {
                Some(event) => match self.deliver(event).await {
                    Delivery::Delivered => continue,
                    Delivery::Cancelled => Step::Cancelled,
                    Delivery::ConsumerGone => Step::ConsumerGone,
                    Delivery::Interrupted(command, event) => {
                        backlog.push_front(event);
                        Step::Command(command)
                    }
                },
                None => tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Step::Cancelled,
                    Some(command) = self.commands.recv() => Step::Command(command),
                    _ = self.events.closed() => Step::ConsumerGone,
                    frame = self.connection.recv() => Step::Frame(frame),
                },
            };

            match step {
                Step::Cancelled => {
                    tracing::trace!(kind=%self.kind, "Subscription cancelled");
                    return (self.closing().await, None);
                }
                Step::ConsumerGone => {
                    tracing::trace!(kind=%self.kind, "Event receiver dropped");
                    return (self.closing().await, None);
                }
                Step::Command(Command::Unsubscribe { reply }) => {
                    match self.unsubscribe(Some(&mut backlog)).await {
                        Ok(Ok(true)) => {
                            self.flush(backlog);
                            return (ListenerExit::Unsubscribed, Some(reply));
                        }
                        Ok(Ok(false)) => {
                            let _ = reply.send(Err(Error::UnsubscribeRejected(self.kind)));
                        }
                        Ok(Err(error)) => {
                            tracing::debug!(kind=%self.kind, %error, "Unsubscribe failed");
                            let _ = reply.send(Err(error));
                        }
                        Err(error) => return (ListenerExit::Failed(error), Some(reply)),
                    }
                }
                Step::Frame(Err(error)) => return (ListenerExit::Failed(error.into()), None),
                Step::Frame(Ok(frame)) => {
                    match protocol::decode_event(&frame, self.kind, &self.id) {
                        Ok(event) => backlog.push_back(event),
                        Err(error) => return (ListenerExit::Failed(error), None),
                    }
                }
            }
        }
    }

    /// Sends `event` to the consumer, waiting for room in the channel.
    async fn deliver(&mut self, event: Event) -> Delivery {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Delivery::Cancelled,
            permit = self.events.reserve() => match permit {
                Ok(permit) => {
                    permit.send(event);
                    Delivery::Delivered
                }
                Err(_) => Delivery::ConsumerGone,
            },
            Some(command) = self.commands.recv() => Delivery::Interrupted(command, event),
        }
    }

    /// Hands the backlog over without waiting for room, as the subscription
    /// has already ended. Events which do not fit are dropped.
    fn flush(&self, backlog: VecDeque<Event>) {
        let total = backlog.len();
        let mut delivered = 0;
        for event in backlog {
            if self.events.try_send(event).is_err() {
                break;
            }
            delivered += 1;
        }

        if delivered < total {
            tracing::debug!(
                kind=%self.kind,
                dropped=total - delivered,
                "Dropping events after unsubscribing"
            );
        }
    }

    /// Unsubscribes once on the way out. The outcome only affects the
    /// reported exit since the connection is closed regardless.
    async fn closing(&mut self) -> ListenerExit {
        let acknowledged = match self.unsubscribe(None).await {
            Ok(Ok(acknowledged)) => acknowledged,
            Ok(Err(error)) | Err(error) => {
                tracing::debug!(kind=%self.kind, %error, "Unsubscribe failed while closing");
                false
            }
        };

        ListenerExit::Cancelled { acknowledged }
    }

    /// Sends `eth_unsubscribe` and returns the node's answer. Notifications
    /// which arrive in the meantime are appended to `backlog`, or dropped
    /// without one.
    ///
    /// The outer error ends the subscription: the connection failed, or a
    /// frame other than the ack or a valid notification arrived, so the ack
    /// can no longer be relied upon.
    async fn unsubscribe(
        &mut self,
        mut backlog: Option<&mut VecDeque<Event>>,
    ) -> Result<Result<bool, Error>, Error> {
        let request_id = self.request_ids.next();
        let request = protocol::unsubscribe_request(request_id, &self.id)?;
        self.connection.send(request).await?;

        loop {
            let frame = self.connection.recv().await?;

            let notification = match protocol::decode_unsubscribe_frame(&frame, request_id)? {
                UnsubscribeFrame::Ack(ack) => return Ok(ack),
                UnsubscribeFrame::Notification(notification) => notification,
            };

            let event = protocol::notification_event(notification, self.kind, &self.id)?;
            if let Some(backlog) = backlog.as_deref_mut() {
                backlog.push_back(event);
            }
        }
    }
}
