//! Frames exchanged while subscribing and unsubscribing.
//!
//! Acks and event notifications are decoded separately: the first frame after
//! `eth_subscribe` must be the ack, while the frames after it are
//! notifications until an `eth_unsubscribe` is sent.
use ethsub_common::jsonrpc::{Message, Notification, RequestId, RpcRequest};
use ethsub_common::LogFilter;
use serde_json::Value;

use crate::{Error, Event, SubscriptionId, SubscriptionKind};

/// Allocates request ids for a single connection, starting at 1.
#[derive(Debug, Default)]
pub(crate) struct RequestIds {
    last: u64,
}

impl RequestIds {
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

pub(crate) fn subscribe_request(
    id: u64,
    kind: SubscriptionKind,
    filter: Option<&LogFilter>,
) -> Result<String, Error> {
    let mut params = vec![Value::from(kind.as_str())];
    if let Some(filter) = filter {
        params.push(serde_json::to_value(filter).map_err(Error::protocol)?);
    }

    RpcRequest::new(id, "eth_subscribe", params)
        .to_json()
        .map_err(Error::protocol)
}

pub(crate) fn unsubscribe_request(id: u64, subscription: &SubscriptionId) -> Result<String, Error> {
    RpcRequest::new(id, "eth_unsubscribe", [subscription.as_str()])
        .to_json()
        .map_err(Error::protocol)
}

/// Decodes the frame answering the `eth_subscribe` request with `request_id`.
pub(crate) fn decode_subscribe_ack(frame: &str, request_id: u64) -> Result<SubscriptionId, Error> {
    let message = Message::parse(frame)
        .map_err(|e| Error::protocol(format!("Malformed subscription ack: {e}")))?;

    let Message::Response(response) = message else {
        return Err(Error::protocol(
            "Expected a subscription ack, got a notification",
        ));
    };

    if response.id != RequestId::from(request_id) {
        return Err(Error::protocol(format!(
            "Subscription ack has id {}, expected {request_id}",
            response.id
        )));
    }

    let id: String = response
        .result()
        .map_err(|e| Error::protocol(format!("Malformed subscription id: {e}")))??;

    if id.is_empty() {
        return Err(Error::protocol("Empty subscription id"));
    }

    Ok(SubscriptionId::new(id))
}

/// A frame received while waiting for an unsubscribe ack.
#[derive(Debug)]
pub(crate) enum UnsubscribeFrame<'a> {
    /// The response to the request. An error here means the node answered
    /// but the answer is an error object or not a boolean.
    Ack(Result<bool, Error>),
    Notification(Notification<'a>),
}

/// Decodes a frame received after sending the `eth_unsubscribe` request with
/// `request_id`. Notifications still in flight are passed through.
///
/// Errors are returned for frames which are neither the ack nor a
/// notification, after which the ack may still be in flight.
pub(crate) fn decode_unsubscribe_frame(
    frame: &str,
    request_id: u64,
) -> Result<UnsubscribeFrame<'_>, Error> {
    let message = Message::parse(frame)
        .map_err(|e| Error::protocol(format!("Malformed unsubscribe ack: {e}")))?;

    let response = match message {
        Message::Notification(notification) => {
            return Ok(UnsubscribeFrame::Notification(notification))
        }
        Message::Response(response) => response,
    };

    if response.id != RequestId::from(request_id) {
        return Err(Error::protocol(format!(
            "Unsubscribe ack has id {}, expected {request_id}",
            response.id
        )));
    }

    let ack = match response.result::<bool>() {
        Ok(Ok(ack)) => Ok(ack),
        Ok(Err(error)) => Err(Error::Rpc(error)),
        Err(e) => Err(Error::protocol(format!("Malformed unsubscribe ack: {e}"))),
    };

    Ok(UnsubscribeFrame::Ack(ack))
}

/// Decodes a steady state frame, which must be a notification for
/// `subscription`.
pub(crate) fn decode_event(
    frame: &str,
    kind: SubscriptionKind,
    subscription: &SubscriptionId,
) -> Result<Event, Error> {
    match Message::parse(frame) {
        Ok(Message::Notification(notification)) => {
            notification_event(notification, kind, subscription)
        }
        Ok(Message::Response(response)) => Err(Error::protocol(format!(
            "Unexpected response with id {}",
            response.id
        ))),
        Err(e) => Err(Error::protocol(format!("Malformed notification: {e}"))),
    }
}

pub(crate) fn notification_event(
    notification: Notification<'_>,
    kind: SubscriptionKind,
    subscription: &SubscriptionId,
) -> Result<Event, Error> {
    if notification.subscription != subscription.as_str() {
        return Err(Error::protocol(format!(
            "Notification for subscription {}, expected {subscription}",
            notification.subscription
        )));
    }

    Event::decode(kind, notification.result)
        .map_err(|e| Error::protocol(format!("Malformed {kind} payload: {e}")))
}
