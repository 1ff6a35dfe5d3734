use ethsub_common::jsonrpc::ErrorObject;
use ethsub_common::InvalidBlockParameter;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Input is not an ethereum address: {0:?}")]
    InvalidAddress(String),
    #[error(transparent)]
    InvalidBlockParameter(#[from] InvalidBlockParameter),
    #[error("Must define `to` field")]
    MissingCallTarget,
    /// The node answered with a JSON-RPC error object.
    #[error(transparent)]
    Rpc(#[from] ErrorObject),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("Malformed response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),
}
