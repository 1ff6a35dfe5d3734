#![deny(rust_2018_idioms)]

use anyhow::Context;
use ethsub_common::{Address, Bytes, LogFilter, TransactionCall};
use ethsub_http_client::{Client, EthereumApi};
use ethsub_pubsub::{Event, ListenerExit, PubSubClient, PubSubConfig, SubscriptionKind};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::info;
use url::Url;

use crate::config::{BlockId, Command, Config, Query};

mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }

    setup_tracing();

    let config = Config::parse();

    match config.command {
        Command::Subscribe {
            pubsub,
            kinds,
            filter,
        } => subscribe(pubsub, kinds, filter).await,
        Command::Query { url, query } => run_query(url, query).await,
    }
}

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn subscribe(
    config: PubSubConfig,
    kinds: Vec<SubscriptionKind>,
    filter: Option<LogFilter>,
) -> anyhow::Result<()> {
    info!(url=%config.url, "Connecting");
    let client = PubSubClient::new(config);

    let mut printers = JoinSet::new();
    for kind in kinds {
        let subscription = client
            .subscribe(kind, filter.clone())
            .await
            .with_context(|| format!("Subscribing to {kind}"))?;
        info!(%kind, id=%subscription.id(), "Subscribed");

        let (mut events, cancel) = subscription.into_parts();
        printers.spawn(async move {
            while let Some(event) = events.recv().await {
                match event_json(&event) {
                    Ok(line) => println!("{line}"),
                    Err(error) => tracing::warn!(%kind, %error, "Failed to serialize event"),
                }
            }
            (kind, cancel.cancel_and_wait().await)
        });
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown started, waiting for subscriptions to close");
                client.shutdown().await;
                while let Some(result) = printers.join_next().await {
                    log_exit(result);
                }
                break;
            }
            result = printers.join_next() => match result {
                Some(result) => log_exit(result),
                None => {
                    info!("All subscriptions have ended");
                    break;
                }
            },
        }
    }

    Ok(())
}

fn log_exit(result: Result<(SubscriptionKind, ListenerExit), tokio::task::JoinError>) {
    match result {
        Ok((kind, ListenerExit::Failed(error))) => {
            tracing::error!(%kind, %error, "Subscription failed")
        }
        Ok((kind, exit)) => info!(%kind, ?exit, "Subscription ended"),
        Err(error) => tracing::error!(%error, "Printing events failed"),
    }
}

fn event_json(event: &Event) -> serde_json::Result<String> {
    match event {
        Event::NewHead(header) => serde_json::to_string(header),
        Event::Log(log) => serde_json::to_string(log),
        Event::PendingTransaction(hash) => serde_json::to_string(hash),
        Event::Syncing(status) => serde_json::to_string(status),
    }
}

async fn run_query(url: Url, query: Query) -> anyhow::Result<()> {
    let client = Client::new(url).context("Creating HTTP client")?;
    tracing::debug!(url=%client.url(), "Sending query");

    match query {
        Query::BlockNumber => print(client.block_number().await?),
        Query::ProtocolVersion => print(client.protocol_version().await?),
        Query::GasPrice => print(client.gas_price().await?),
        Query::Balance { address } => print(client.balance(address).await?),
        Query::Block { hash, full } => print(client.block_by_hash(hash, full).await?),
        Query::BlockTransactionCount { block } => print(match block {
            BlockId::Hash(hash) => client.block_transaction_count_by_hash(hash).await?,
            BlockId::Parameter(block) => client.block_transaction_count_by_number(block).await?,
        }),
        Query::Code { address, block } => print(client.code(address, block).await?),
        Query::Call {
            to,
            data,
            from,
            block,
        } => {
            let call = transaction_call(to, from, data);
            print(client.call(&call, block).await?)
        }
        Query::Transaction { hash } => print(client.transaction_by_hash(hash).await?),
        Query::TransactionByIndex { block, index } => print(match block {
            BlockId::Hash(hash) => {
                client
                    .transaction_by_block_hash_and_index(hash, index)
                    .await?
            }
            BlockId::Parameter(block) => {
                client
                    .transaction_by_block_number_and_index(block, index)
                    .await?
            }
        }),
        Query::TransactionCount { address, block } => {
            print(client.transaction_count(address, block).await?)
        }
        Query::Receipt { hash } => print(client.transaction_receipt(hash).await?),
        Query::UncleByIndex { block, index } => print(match block {
            BlockId::Hash(hash) => client.uncle_by_block_hash_and_index(hash, index).await?,
            BlockId::Parameter(block) => {
                client.uncle_by_block_number_and_index(block, index).await?
            }
        }),
        Query::UncleCount { block } => print(match block {
            BlockId::Hash(hash) => client.uncle_count_by_block_hash(hash).await?,
            BlockId::Parameter(block) => client.uncle_count_by_block_number(block).await?,
        }),
        Query::SendRawTransaction { transaction } => {
            print(client.send_raw_transaction(&transaction).await?)
        }
    }
}

fn transaction_call(to: Address, from: Option<Address>, data: Option<Bytes>) -> TransactionCall {
    let mut call = TransactionCall::to(to);
    if let Some(from) = from {
        call = call.with_from(from);
    }
    if let Some(data) = data {
        call = call.with_data(data);
    }
    call
}

fn print(value: impl Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&value).context("Serializing result")?;
    println!("{json}");
    Ok(())
}
