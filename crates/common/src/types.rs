//! Payloads returned by Ethereum nodes, both as call results and as
//! subscription events.
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::encoding::U64AsHexStr;
use crate::{Address, BlockHash, Bytes, TransactionHash, H256, U256};

/// The header of a block, as pushed by a `newHeads` subscription.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    #[serde_as(as = "U64AsHexStr")]
    pub number: u64,
    #[serde(default)]
    pub hash: Option<BlockHash>,
    pub parent_hash: BlockHash,
    #[serde(default)]
    pub nonce: Option<Bytes>,
    pub sha3_uncles: H256,
    pub logs_bloom: Bytes,
    pub transactions_root: H256,
    pub state_root: H256,
    #[serde(alias = "receiptRoot")]
    pub receipts_root: H256,
    pub miner: Address,
    pub difficulty: U256,
    pub extra_data: Bytes,
    #[serde_as(as = "U64AsHexStr")]
    pub gas_limit: u64,
    #[serde_as(as = "U64AsHexStr")]
    pub gas_used: u64,
    #[serde_as(as = "U64AsHexStr")]
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_hash: Option<H256>,
}

/// Transactions of a [Block], either as hashes only or in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Hashes(Vec<TransactionHash>),
    Full(Vec<Transaction>),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Hashes(x) => x.len(),
            BlockTransactions::Full(x) => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BlockTransactions {
    fn default() -> Self {
        Self::Hashes(Vec::new())
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(flatten)]
    pub header: BlockHeader,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_difficulty: Option<U256>,
    #[serde(default)]
    pub transactions: BlockTransactions,
    #[serde(default)]
    pub uncles: Vec<BlockHash>,
}

/// An uncle block. Uncles never carry transactions.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncleBlock {
    #[serde(flatten)]
    pub header: BlockHeader,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_difficulty: Option<U256>,
    #[serde(default)]
    pub uncles: Vec<BlockHash>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: TransactionHash,
    #[serde_as(as = "U64AsHexStr")]
    pub nonce: u64,
    /// `None` while the transaction is pending.
    #[serde(default)]
    pub block_hash: Option<BlockHash>,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default)]
    pub transaction_index: Option<u64>,
    pub from: Address,
    /// `None` for contract creation.
    #[serde(default)]
    pub to: Option<Address>,
    pub value: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde_as(as = "U64AsHexStr")]
    pub gas: u64,
    pub input: Bytes,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TransactionHash,
    #[serde_as(as = "U64AsHexStr")]
    pub transaction_index: u64,
    pub block_hash: BlockHash,
    #[serde_as(as = "U64AsHexStr")]
    pub block_number: u64,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    pub cumulative_gas_used: U256,
    pub gas_used: U256,
    #[serde(default)]
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
    pub logs_bloom: Bytes,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u64>,
}

/// An event emitted by a contract.
///
/// The block and transaction positions are `None` for logs of pending
/// transactions.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    #[serde(default)]
    pub block_hash: Option<BlockHash>,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default)]
    pub block_number: Option<u64>,
    pub data: Bytes,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default)]
    pub log_index: Option<u64>,
    /// Set when the log was reverted by a chain reorganisation.
    #[serde(default)]
    pub removed: bool,
    pub topics: Vec<H256>,
    #[serde(default)]
    pub transaction_hash: Option<TransactionHash>,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default)]
    pub transaction_index: Option<u64>,
}

/// The message call arguments of `eth_call`.
///
/// `to` is optional in the type so that a missing target can be reported as a
/// validation error instead of a serialization one.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl TransactionCall {
    pub fn to(address: Address) -> Self {
        Self {
            to: Some(address),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}

/// The filter argument of a `logs` subscription.
///
/// Both lists are always serialized, an empty list matching everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    #[serde(default)]
    pub address: Vec<Address>,
    #[serde(default)]
    pub topics: Vec<H256>,
}

impl LogFilter {
    pub fn address(mut self, address: Address) -> Self {
        self.address.push(address);
        self
    }

    pub fn topic(mut self, topic: H256) -> Self {
        self.topics.push(topic);
        self
    }
}

/// The payload of a `syncing` subscription event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    NotSyncing,
    Syncing(SyncProgress),
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    #[serde_as(as = "U64AsHexStr")]
    pub starting_block: u64,
    #[serde_as(as = "U64AsHexStr")]
    pub current_block: u64,
    #[serde_as(as = "U64AsHexStr")]
    pub highest_block: u64,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulled_states: Option<u64>,
    #[serde_as(as = "Option<U64AsHexStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_states: Option<u64>,
}

impl<'de> Deserialize<'de> for SyncStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct Envelope {
            syncing: bool,
            #[serde(default)]
            status: Option<SyncProgress>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Flag(bool),
            Envelope(Envelope),
            Progress(SyncProgress),
        }

        match Helper::deserialize(deserializer)? {
            Helper::Flag(false) => Ok(SyncStatus::NotSyncing),
            Helper::Flag(true) => Err(D::Error::custom(
                "Sync status `true` must carry progress information",
            )),
            Helper::Envelope(Envelope { syncing: false, .. }) => Ok(SyncStatus::NotSyncing),
            Helper::Envelope(Envelope {
                syncing: true,
                status: Some(progress),
            }) => Ok(SyncStatus::Syncing(progress)),
            Helper::Envelope(Envelope {
                syncing: true,
                status: None,
            }) => Err(D::Error::custom("Sync status is missing its progress")),
            Helper::Progress(progress) => Ok(SyncStatus::Syncing(progress)),
        }
    }
}

impl Serialize for SyncStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        match self {
            SyncStatus::NotSyncing => serializer.serialize_bool(false),
            SyncStatus::Syncing(progress) => {
                let mut s = serializer.serialize_struct("SyncStatus", 2)?;
                s.serialize_field("syncing", &true)?;
                s.serialize_field("status", progress)?;
                s.end()
            }
        }
    }
}
