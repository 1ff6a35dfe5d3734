//! Request/response Ethereum JSON-RPC over HTTP.
//!
//! Every call is a single `POST` without retries. Arguments are validated
//! before anything is sent.
use std::time::Duration;

use ethsub_common::jsonrpc::{Message, RequestId, RpcRequest};
use ethsub_common::{
    Address,
    Block,
    BlockHash,
    BlockParameter,
    Bytes,
    Endpoint,
    Transaction,
    TransactionCall,
    TransactionHash,
    TransactionReceipt,
    UncleBlock,
    U256,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

mod error;
pub mod validation;

pub use error::Error;

const USER_AGENT: &str = concat!("ethsub/", env!("CARGO_PKG_VERSION"));

/// Every request is sent with this id.
const REQUEST_ID: u64 = 1;

const NO_PARAMS: [(); 0] = [];

/// The JSON-RPC methods of an Ethereum node.
#[async_trait::async_trait]
pub trait EthereumApi {
    async fn block_number(&self) -> Result<u64, Error>;
    async fn protocol_version(&self) -> Result<String, Error>;
    /// Executes a message call without creating a transaction. `call.to` must
    /// be set.
    async fn call(&self, call: &TransactionCall, block: BlockParameter) -> Result<Bytes, Error>;
    async fn gas_price(&self) -> Result<U256, Error>;
    /// Balance at the latest block, in wei.
    async fn balance(&self, address: Address) -> Result<U256, Error>;
    async fn block_by_hash(&self, hash: BlockHash, full: bool) -> Result<Option<Block>, Error>;
    async fn block_transaction_count_by_hash(&self, hash: BlockHash) -> Result<Option<u64>, Error>;
    async fn block_transaction_count_by_number(
        &self,
        block: BlockParameter,
    ) -> Result<Option<u64>, Error>;
    async fn code(&self, address: Address, block: BlockParameter) -> Result<Bytes, Error>;
    async fn transaction_by_block_hash_and_index(
        &self,
        hash: BlockHash,
        index: u64,
    ) -> Result<Option<Transaction>, Error>;
    async fn transaction_by_block_number_and_index(
        &self,
        block: BlockParameter,
        index: u64,
    ) -> Result<Option<Transaction>, Error>;
    async fn transaction_by_hash(&self, hash: TransactionHash)
        -> Result<Option<Transaction>, Error>;
    async fn transaction_count(&self, address: Address, block: BlockParameter)
        -> Result<u64, Error>;
    async fn transaction_receipt(
        &self,
        hash: TransactionHash,
    ) -> Result<Option<TransactionReceipt>, Error>;
    async fn uncle_by_block_hash_and_index(
        &self,
        hash: BlockHash,
        index: u64,
    ) -> Result<Option<UncleBlock>, Error>;
    async fn uncle_by_block_number_and_index(
        &self,
        block: BlockParameter,
        index: u64,
    ) -> Result<Option<UncleBlock>, Error>;
    async fn uncle_count_by_block_hash(&self, hash: BlockHash) -> Result<Option<u64>, Error>;
    async fn uncle_count_by_block_number(&self, block: BlockParameter)
        -> Result<Option<u64>, Error>;
    async fn send_raw_transaction(&self, transaction: &Bytes) -> Result<TransactionHash, Error>;
}

/// An [EthereumApi] client for a single node.
#[derive(Debug, Clone)]
pub struct Client {
    /// This client is internally refcounted
    inner: reqwest::Client,
    url: Url,
}

impl Client {
    pub fn new(url: Url) -> Result<Self, Error> {
        Ok(Self {
            inner: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .user_agent(USER_AGENT)
                .build()?,
            url,
        })
    }

    /// Creates a [Client] for the Infura endpoint of `network`.
    pub fn infura(network: &str, project_id: Option<&str>) -> Result<Self, Error> {
        let endpoint = Endpoint::infura(network, project_id)?;
        Self::new(endpoint.http)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request<P, T>(&self, method: &str, params: P) -> Result<T, Error>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let request = RpcRequest::new(REQUEST_ID, method, params);
        tracing::trace!(%method, "Sending request");

        let response = self.inner.post(self.url.clone()).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let response = match Message::parse(&body) {
            Ok(Message::Response(response)) => response,
            Ok(Message::Notification(_)) => {
                return Err(Error::UnexpectedResponse(
                    "Notification instead of a response".to_owned(),
                ))
            }
            // Not a JSON-RPC response at all, most likely a proxy error page.
            Err(_) if !status.is_success() => return Err(Error::Status(status)),
            Err(e) => return Err(Error::Decode(e)),
        };

        if response.id != RequestId::from(REQUEST_ID) {
            return Err(Error::UnexpectedResponse(format!(
                "Response id {}, expected {REQUEST_ID}",
                response.id
            )));
        }

        let result = response.result::<T>().map_err(Error::Decode)??;
        tracing::trace!(%method, "Request succeeded");
        Ok(result)
    }
}

/// Decodes a hex quantity.
#[serde_with::serde_as]
#[derive(Deserialize)]
struct Quantity(#[serde_as(as = "ethsub_common::encoding::U64AsHexStr")] u64);

fn index(index: u64) -> String {
    format!("{index:#x}")
}

#[async_trait::async_trait]
impl EthereumApi for Client {
    async fn block_number(&self) -> Result<u64, Error> {
        let Quantity(number) = self.request("eth_blockNumber", NO_PARAMS).await?;
        Ok(number)
    }

    async fn protocol_version(&self) -> Result<String, Error> {
        self.request("eth_protocolVersion", NO_PARAMS).await
    }

    async fn call(&self, call: &TransactionCall, block: BlockParameter) -> Result<Bytes, Error> {
        validation::call_target(call)?;
        self.request("eth_call", (call, block)).await
    }

    async fn gas_price(&self) -> Result<U256, Error> {
        self.request("eth_gasPrice", NO_PARAMS).await
    }

    async fn balance(&self, address: Address) -> Result<U256, Error> {
        self.request("eth_getBalance", (address, BlockParameter::Latest))
            .await
    }

    async fn block_by_hash(&self, hash: BlockHash, full: bool) -> Result<Option<Block>, Error> {
        self.request("eth_getBlockByHash", (hash, full)).await
    }

    async fn block_transaction_count_by_hash(&self, hash: BlockHash) -> Result<Option<u64>, Error> {
        let count: Option<Quantity> = self
            .request("eth_getBlockTransactionCountByHash", [hash])
            .await?;
        Ok(count.map(|Quantity(x)| x))
    }

    async fn block_transaction_count_by_number(
        &self,
        block: BlockParameter,
    ) -> Result<Option<u64>, Error> {
        let count: Option<Quantity> = self
            .request("eth_getBlockTransactionCountByNumber", [block])
            .await?;
        Ok(count.map(|Quantity(x)| x))
    }

    async fn code(&self, address: Address, block: BlockParameter) -> Result<Bytes, Error> {
        self.request("eth_getCode", (address, block)).await
    }

    async fn transaction_by_block_hash_and_index(
        &self,
        hash: BlockHash,
        idx: u64,
    ) -> Result<Option<Transaction>, Error> {
        self.request("eth_getTransactionByBlockHashAndIndex", (hash, index(idx)))
            .await
    }

    async fn transaction_by_block_number_and_index(
        &self,
        block: BlockParameter,
        idx: u64,
    ) -> Result<Option<Transaction>, Error> {
        self.request(
            "eth_getTransactionByBlockNumberAndIndex",
            (block, index(idx)),
        )
        .await
    }

    async fn transaction_by_hash(
        &self,
        hash: TransactionHash,
    ) -> Result<Option<Transaction>, Error> {
        self.request("eth_getTransactionByHash", [hash]).await
    }

    async fn transaction_count(
        &self,
        address: Address,
        block: BlockParameter,
    ) -> Result<u64, Error> {
        let Quantity(count) = self
            .request("eth_getTransactionCount", (address, block))
            .await?;
        Ok(count)
    }

    async fn transaction_receipt(
        &self,
        hash: TransactionHash,
    ) -> Result<Option<TransactionReceipt>, Error> {
        self.request("eth_getTransactionReceipt", [hash]).await
    }

    async fn uncle_by_block_hash_and_index(
        &self,
        hash: BlockHash,
        idx: u64,
    ) -> Result<Option<UncleBlock>, Error> {
        self.request("eth_getUncleByBlockHashAndIndex", (hash, index(idx)))
            .await
    }

    async fn uncle_by_block_number_and_index(
        &self,
        block: BlockParameter,
        idx: u64,
    ) -> Result<Option<UncleBlock>, Error> {
        self.request("eth_getUncleByBlockNumberAndIndex", (block, index(idx)))
            .await
    }

    async fn uncle_count_by_block_hash(&self, hash: BlockHash) -> Result<Option<u64>, Error> {
        let count: Option<Quantity> = self
            .request("eth_getUncleCountByBlockHash", [hash])
            .await?;
        Ok(count.map(|Quantity(x)| x))
    }

    async fn uncle_count_by_block_number(
        &self,
        block: BlockParameter,
    ) -> Result<Option<u64>, Error> {
        let count: Option<Quantity> = self
            .request("eth_getUncleCountByBlockNumber", [block])
            .await?;
        Ok(count.map(|Quantity(x)| x))
    }

    async fn send_raw_transaction(&self, transaction: &Bytes) -> Result<TransactionHash, Error> {
        self.request("eth_sendRawTransaction", [transaction]).await
    }
}
