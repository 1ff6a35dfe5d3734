use std::num::NonZeroUsize;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use ethsub_common::{
    Address,
    BlockHash,
    BlockParameter,
    Bytes,
    Endpoint,
    LogFilter,
    TransactionHash,
    H256,
};
use ethsub_http_client::validation;
use ethsub_pubsub::{PubSubConfig, SubscriptionKind};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "ethsub")]
#[command(version)]
#[command(about = "Streams subscription events from an Ethereum node and queries its JSON-RPC API.")]
struct Cli {
    #[arg(
        long = "ws-url",
        long_help = "Websocket JSON-RPC endpoint used for subscriptions. Takes precedence over \
                     the endpoint derived from --network.",
        value_name = "WS(s) URL",
        value_hint = clap::ValueHint::Url,
        env = "ETHSUB_WS_URL"
    )]
    ws_url: Option<Url>,

    #[arg(
        long = "http-url",
        long_help = "HTTP JSON-RPC endpoint used for queries. Takes precedence over the \
                     endpoint derived from --network.",
        value_name = "HTTP(s) URL",
        value_hint = clap::ValueHint::Url,
        env = "ETHSUB_HTTP_URL"
    )]
    http_url: Option<Url>,

    #[arg(
        long = "network",
        long_help = r"Connect to the Infura endpoints of this network.

Examples:
    mainnet
    sepolia",
        value_name = "NAME",
        env = "ETHSUB_NETWORK"
    )]
    network: Option<String>,

    #[arg(
        long = "project-id",
        long_help = "Infura project id. Without one the unauthenticated endpoints are used.",
        value_name = "ID",
        env = "ETHSUB_PROJECT_ID",
        requires = "network"
    )]
    project_id: Option<String>,

    #[arg(
        long = "channel-capacity",
        long_help = "Number of events buffered per subscription before reading from the node \
                     pauses",
        default_value = "128",
        env = "ETHSUB_CHANNEL_CAPACITY"
    )]
    channel_capacity: NonZeroUsize,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Subscribe and print every event as a line of JSON until interrupted.
    Subscribe {
        #[arg(
            required = true,
            value_name = "KIND",
            long_help = "One or more of newHeads, logs, newPendingTransactions and syncing"
        )]
        kinds: Vec<SubscriptionKind>,

        #[arg(
            long = "address",
            long_help = "Only stream logs emitted by this contract. May be repeated.",
            value_name = "ADDRESS",
            value_parser = validation::address
        )]
        addresses: Vec<Address>,

        #[arg(
            long = "topic",
            long_help = "Only stream logs with this topic. May be repeated.",
            value_name = "HASH",
            value_parser = parse_topic
        )]
        topics: Vec<H256>,
    },
    /// Send a single JSON-RPC request over HTTP and print the result.
    #[command(subcommand)]
    Query(Query),
}

/// A single request to the HTTP JSON-RPC API.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Query {
    BlockNumber,
    ProtocolVersion,
    GasPrice,
    Balance {
        #[arg(value_parser = validation::address)]
        address: Address,
    },
    Block {
        hash: BlockHash,
        #[arg(long, long_help = "Include full transactions instead of their hashes")]
        full: bool,
    },
    /// Number of transactions in a block.
    BlockTransactionCount {
        #[arg(value_parser = parse_block_id)]
        block: BlockId,
    },
    Code {
        #[arg(value_parser = validation::address)]
        address: Address,
        #[arg(default_value = "latest", value_parser = validation::block_parameter)]
        block: BlockParameter,
    },
    Call {
        #[arg(value_parser = validation::address)]
        to: Address,
        data: Option<Bytes>,
        #[arg(long, value_parser = validation::address)]
        from: Option<Address>,
        #[arg(long, default_value = "latest", value_parser = validation::block_parameter)]
        block: BlockParameter,
    },
    Transaction {
        hash: TransactionHash,
    },
    /// The transaction at `index` within a block.
    TransactionByIndex {
        #[arg(value_parser = parse_block_id)]
        block: BlockId,
        index: u64,
    },
    /// Number of transactions sent from an address.
    TransactionCount {
        #[arg(value_parser = validation::address)]
        address: Address,
        #[arg(default_value = "latest", value_parser = validation::block_parameter)]
        block: BlockParameter,
    },
    Receipt {
        hash: TransactionHash,
    },
    /// The uncle at `index` within a block.
    UncleByIndex {
        #[arg(value_parser = parse_block_id)]
        block: BlockId,
        index: u64,
    },
    UncleCount {
        #[arg(value_parser = parse_block_id)]
        block: BlockId,
    },
    /// Submit a signed transaction.
    SendRawTransaction {
        transaction: Bytes,
    },
}

/// A block given either by hash or by number or tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    Hash(BlockHash),
    Parameter(BlockParameter),
}

fn parse_block_id(s: &str) -> Result<BlockId, ethsub_http_client::Error> {
    // A hash is the only form with 64 hex digits.
    if s.len() == 66 && s.starts_with("0x") {
        if let Ok(hash) = s.parse() {
            return Ok(BlockId::Hash(hash));
        }
    }

    validation::block_parameter(s).map(BlockId::Parameter)
}

fn parse_topic(s: &str) -> Result<H256, ethsub_common::HexParseError> {
    ethsub_common::encoding::bytes_from_hex_str::<32>(s).map(H256::from)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Subscribe {
        pubsub: PubSubConfig,
        kinds: Vec<SubscriptionKind>,
        filter: Option<LogFilter>,
    },
    Query {
        url: Url,
        query: Query,
    },
}

impl Config {
    pub fn parse() -> Self {
        let cli = Cli::parse();
        Self::from_cli(cli).unwrap_or_else(|e| e.exit())
    }

    fn from_cli(cli: Cli) -> Result<Self, clap::Error> {
        let infura = match &cli.network {
            Some(network) => Some(
                Endpoint::infura(network, cli.project_id.as_deref()).map_err(|e| {
                    Cli::command()
                        .error(ErrorKind::ValueValidation, format!("--network {network}: {e}"))
                })?,
            ),
            None => None,
        };

        let command = match cli.command {
            CliCommand::Subscribe {
                mut kinds,
                addresses,
                topics,
            } => {
                let url = cli
                    .ws_url
                    .or_else(|| infura.map(|endpoint| endpoint.ws))
                    .ok_or_else(|| {
                        Cli::command().error(
                            ErrorKind::MissingRequiredArgument,
                            "Subscribing requires either --ws-url or --network",
                        )
                    })?;

                kinds.sort();
                kinds.dedup();

                let filter = if addresses.is_empty() && topics.is_empty() {
                    None
                } else {
                    Some(LogFilter {
                        address: addresses,
                        topics,
                    })
                };

                Command::Subscribe {
                    pubsub: PubSubConfig::new(url).with_channel_capacity(cli.channel_capacity),
                    kinds,
                    filter,
                }
            }
            CliCommand::Query(query) => {
                let url = cli
                    .http_url
                    .or_else(|| infura.map(|endpoint| endpoint.http))
                    .ok_or_else(|| {
                        Cli::command().error(
                            ErrorKind::MissingRequiredArgument,
                            "Queries require either --http-url or --network",
                        )
                    })?;

                Command::Query { url, query }
            }
        };

        Ok(Config { command })
    }
}
