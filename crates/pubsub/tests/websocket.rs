//! Subscriptions against a websocket server on localhost.
use std::net::SocketAddr;
use std::time::Duration;

use assert_matches::assert_matches;
use ethsub_pubsub::{Event, ListenerExit, PubSubClient, PubSubConfig, SubscriptionKind};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

const SUBSCRIPTION_ID: &str = "0xabc";

/// A node which serves exactly one websocket connection.
struct Node {
    ws: WebSocketStream<TcpStream>,
}

impl Node {
    async fn spawn<F, Fut>(script: F) -> anyhow::Result<(SocketAddr, JoinHandle<anyhow::Result<()>>)>
    where
        F: FnOnce(Node) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await?;
            let ws = tokio_tungstenite::accept_async(stream).await?;
            script(Node { ws }).await
        });

        Ok((addr, handle))
    }

    async fn expect_request(&mut self) -> anyhow::Result<Value> {
        loop {
            let message = timeout(Duration::from_secs(2), self.ws.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("Connection closed"))??;
            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => anyhow::bail!("Unexpected message {other:?}"),
            }
        }
    }

    async fn respond(&mut self, request: &Value, result: Value) -> anyhow::Result<()> {
        let response = json!({"jsonrpc": "2.0", "id": request["id"], "result": result});
        self.ws.send(Message::Text(response.to_string())).await?;
        Ok(())
    }

    async fn notify(&mut self, result: Value) -> anyhow::Result<()> {
        let notification = json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {"subscription": SUBSCRIPTION_ID, "result": result}
        });
        self.ws.send(Message::Text(notification.to_string())).await?;
        Ok(())
    }

    /// Waits for the client's close frame, or for the connection to drop.
    async fn expect_close(&mut self) -> anyhow::Result<()> {
        loop {
            match timeout(Duration::from_secs(2), self.ws.next()).await? {
                Some(Ok(Message::Close(_))) | None => return Ok(()),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(other)) => anyhow::bail!("Unexpected message {other:?}"),
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }
}

fn new_head() -> Value {
    json!({
        "difficulty": "0x15d9223a23aa",
        "extraData": "0xd983010305844765746887676f312e342e328777696e646f7773",
        "gasLimit": "0x47e7c4",
        "gasUsed": "0x38658",
        "logsBloom": "0x00",
        "miner": "0xf8b483dba2c3b7176a3da549ad41a48bb3121069",
        "nonce": "0x084149998194cc5f",
        "number": "0x1348c9",
        "parentHash": "0x7736fab79e05dc611604d22470dadad26f56fe494421b5b333de816ce1f25701",
        "receiptsRoot": "0x2fab35823ad00c7bb388595cb46652fe7886e00660a01e867824d3dceb1c8d36",
        "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
        "stateRoot": "0xb3346685172db67de536d8765c43c31009d0eb3bd9c501c9be3229203f15f378",
        "timestamp": "0x56ffeff8",
        "transactionsRoot": "0x0167ffa60e3ebc0b080cdb95f7c0087dd6c0e61413140e39d94d3468d7c9689f"
    })
}

fn client(addr: SocketAddr) -> anyhow::Result<PubSubClient> {
    let url = format!("ws://{addr}").parse()?;
    Ok(PubSubClient::new(PubSubConfig::new(url)))
}

#[test_log::test(tokio::test)]
async fn new_heads_round_trip() -> anyhow::Result<()> {
    let (addr, node) = Node::spawn(|mut node| async move {
        let subscribe = node.expect_request().await?;
        assert_eq!(subscribe["method"], "eth_subscribe");
        assert_eq!(subscribe["params"], json!(["newHeads"]));
        assert_eq!(subscribe["id"], 1);
        node.respond(&subscribe, json!(SUBSCRIPTION_ID)).await?;

        node.notify(new_head()).await?;

        let unsubscribe = node.expect_request().await?;
        assert_eq!(unsubscribe["method"], "eth_unsubscribe");
        assert_eq!(unsubscribe["params"], json!([SUBSCRIPTION_ID]));
        assert_eq!(unsubscribe["id"], 2);
        node.respond(&unsubscribe, json!(true)).await?;

        node.expect_close().await
    })
    .await?;

    let client = client(addr)?;
    let mut subscription = client.subscribe(SubscriptionKind::NewHeads, None).await?;
    assert_eq!(subscription.id().as_str(), SUBSCRIPTION_ID);

    let event = timeout(Duration::from_secs(2), subscription.next()).await?;
    assert_matches!(event, Some(Event::NewHead(header)) => {
        assert_eq!(header.number, 0x1348c9);
        assert_eq!(header.timestamp, 0x56ffeff8);
    });

    client.unsubscribe(SubscriptionKind::NewHeads).await?;
    assert!(!client.is_subscribed(SubscriptionKind::NewHeads));
    assert_matches!(
        timeout(Duration::from_secs(2), subscription.next()).await?,
        None
    );

    node.await??;
    client.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn node_closing_the_socket_ends_the_subscription() -> anyhow::Result<()> {
    let (addr, node) = Node::spawn(|mut node| async move {
        let subscribe = node.expect_request().await?;
        node.respond(&subscribe, json!(SUBSCRIPTION_ID)).await?;
        node.notify(json!(
            "0xd6fdc5cc41a9959e922f30cb772a9aef46f4daea279307bc5f7024edc4ccd7fa"
        ))
        .await?;
        node.ws.close(None).await?;
        Ok(())
    })
    .await?;

    let client = client(addr)?;
    let mut subscription = client
        .subscribe(SubscriptionKind::NewPendingTransactions, None)
        .await?;

    assert_matches!(
        timeout(Duration::from_secs(2), subscription.next()).await?,
        Some(Event::PendingTransaction(_))
    );
    assert_matches!(
        timeout(Duration::from_secs(2), subscription.next()).await?,
        None
    );
    assert!(!client.is_subscribed(SubscriptionKind::NewPendingTransactions));
    assert_matches!(
        subscription.cancel_and_wait().await,
        ListenerExit::Failed(ethsub_pubsub::Error::Connection(_))
    );

    node.await??;
    Ok(())
}

#[tokio::test]
async fn cancelling_unsubscribes_before_closing() -> anyhow::Result<()> {
    let (addr, node) = Node::spawn(|mut node| async move {
        let subscribe = node.expect_request().await?;
        assert_eq!(subscribe["params"], json!(["syncing"]));
        node.respond(&subscribe, json!(SUBSCRIPTION_ID)).await?;

        let unsubscribe = node.expect_request().await?;
        assert_eq!(unsubscribe["method"], "eth_unsubscribe");
        node.respond(&unsubscribe, json!(true)).await?;

        node.expect_close().await
    })
    .await?;

    let client = client(addr)?;
    let subscription = client.subscribe(SubscriptionKind::Syncing, None).await?;

    assert_matches!(
        timeout(Duration::from_secs(2), subscription.cancel_and_wait()).await?,
        ListenerExit::Cancelled { acknowledged: true }
    );
    assert!(!client.is_subscribed(SubscriptionKind::Syncing));

    node.await??;
    Ok(())
}

#[tokio::test]
async fn unreachable_node() -> anyhow::Result<()> {
    // Bind and drop to get a port nothing listens on.
    let addr = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;

    let client = client(addr)?;
    assert_matches!(
        client.subscribe(SubscriptionKind::NewHeads, None).await,
        Err(ethsub_pubsub::Error::Connection(_))
    );
    assert!(!client.is_subscribed(SubscriptionKind::NewHeads));
    Ok(())
}
