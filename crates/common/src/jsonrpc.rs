//! Client side of the JSON-RPC 2.0 envelope.
//!
//! Requests are always sent with a numeric id. Incoming messages are either a
//! [Response] to one of those requests or a server pushed [Notification].

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(RequestId::Number)
            .unwrap_or_else(|_| RequestId::String(value.to_string()))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s:?}"),
            RequestId::Null => f.write_str("null"),
        }
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IdHelper {
            Number(i64),
            String(String),
        }

        Ok(match Option::<IdHelper>::deserialize(deserializer)? {
            Some(IdHelper::Number(x)) => RequestId::Number(x),
            Some(IdHelper::String(x)) => RequestId::String(x),
            None => RequestId::Null,
        })
    }
}

/// An outgoing JSON-RPC request.
///
/// Fields serialize in the order `jsonrpc`, `method`, `params`, `id`.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    pub method: &'a str,
    pub params: P,
    pub id: u64,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The error object carried by a failed JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, thiserror::Error)]
#[error("JSON-RPC error {code}: {message}")]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A response to a request made by this client.
#[derive(Debug)]
pub struct Response<'a> {
    pub id: RequestId,
    pub output: Result<&'a RawValue, ErrorObject>,
}

impl Response<'_> {
    /// Decodes the successful `result` into `T`.
    pub fn result<T: DeserializeOwned>(&self) -> Result<Result<T, ErrorObject>, serde_json::Error> {
        match &self.output {
            Ok(raw) => serde_json::from_str(raw.get()).map(Ok),
            Err(e) => Ok(Err(e.clone())),
        }
    }
}

/// A server pushed subscription notification.
#[derive(Debug)]
pub struct Notification<'a> {
    pub method: Cow<'a, str>,
    pub subscription: Cow<'a, str>,
    pub result: &'a RawValue,
}

/// A message received from a JSON-RPC server.
#[derive(Debug)]
pub enum Message<'a> {
    Response(Response<'a>),
    Notification(Notification<'a>),
}

impl<'a> Message<'a> {
    /// Parses a single JSON-RPC text frame, borrowing from it where possible.
    pub fn parse(frame: &'a str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

impl<'de> Deserialize<'de> for Message<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct ParamsHelper<'a> {
            #[serde(borrow)]
            subscription: Cow<'a, str>,
            #[serde(borrow)]
            result: &'a RawValue,
        }

        #[derive(Deserialize)]
        struct Helper<'a> {
            #[serde(borrow)]
            jsonrpc: Cow<'a, str>,
            // Double-bag the ID and the result. This is required because serde maps both
            // None and Null to None.
            #[serde(default, deserialize_with = "deserialize_some")]
            id: Option<RequestId>,
            #[serde(default, borrow)]
            method: Option<Cow<'a, str>>,
            #[serde(default, borrow)]
            params: Option<ParamsHelper<'a>>,
            #[serde(default, borrow, deserialize_with = "deserialize_some")]
            result: Option<&'a RawValue>,
            #[serde(default)]
            error: Option<ErrorObject>,
        }

        // Any value that is present is considered Some value, including null.
        fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
        where
            T: Deserialize<'de>,
            D: serde::Deserializer<'de>,
        {
            Deserialize::deserialize(deserializer).map(Some)
        }

        let helper = Helper::deserialize(deserializer)?;

        if helper.jsonrpc != "2.0" {
            return Err(D::Error::custom("Jsonrpc version must be 2.0"));
        }

        if let Some(method) = helper.method {
            let params = helper
                .params
                .ok_or_else(|| D::Error::custom("Notification is missing params"))?;
            return Ok(Message::Notification(Notification {
                method,
                subscription: params.subscription,
                result: params.result,
            }));
        }

        let id = helper
            .id
            .ok_or_else(|| D::Error::custom("Response is missing an id"))?;

        let output = match (helper.result, helper.error) {
            (Some(result), None) => Ok(result),
            (None, Some(error)) => Err(error),
            (Some(_), Some(_)) => {
                return Err(D::Error::custom(
                    "Response contains both a result and an error",
                ))
            }
            (None, None) => {
                return Err(D::Error::custom(
                    "Response contains neither a result nor an error",
                ))
            }
        };

        Ok(Message::Response(Response { id, output }))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn request_field_order() {
        let request = RpcRequest::new(1, "eth_subscribe", ["newHeads"]);
        assert_eq!(
            request.to_json().unwrap(),
            r#"{"jsonrpc":"2.0","method":"eth_subscribe","params":["newHeads"],"id":1}"#
        );
    }

    mod message {
        use super::*;

        #[test]
        fn successful_response() {
            let frame = json!({"jsonrpc": "2.0", "id": 1, "result": "0xabc"}).to_string();
            let message = Message::parse(&frame).unwrap();
            assert_matches!(message, Message::Response(response) => {
                assert_eq!(response.id, RequestId::Number(1));
                assert_eq!(response.result::<String>().unwrap(), Ok("0xabc".to_owned()));
            });
        }

        #[test]
        fn null_result_is_a_result() {
            let frame = json!({"jsonrpc": "2.0", "id": "a", "result": null}).to_string();
            let message = Message::parse(&frame).unwrap();
            assert_matches!(message, Message::Response(response) => {
                assert_eq!(response.id, RequestId::String("a".to_owned()));
                assert_eq!(response.result::<Option<String>>().unwrap(), Ok(None));
            });
        }

        #[test]
        fn error_response() {
            let frame = json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32602, "message": "invalid params"}
            })
            .to_string();
            let message = Message::parse(&frame).unwrap();
            assert_matches!(message, Message::Response(response) => {
                assert_eq!(response.id, RequestId::Null);
                assert_matches!(response.output, Err(ErrorObject { code: -32602, .. }));
            });
        }

        #[test]
        fn notification() {
            let frame = json!({
                "jsonrpc": "2.0",
                "method": "eth_subscription",
                "params": {"subscription": "0xabc", "result": {"number": "0x1"}}
            })
            .to_string();
            let message = Message::parse(&frame).unwrap();
            assert_matches!(message, Message::Notification(notification) => {
                assert_eq!(notification.method, "eth_subscription");
                assert_eq!(notification.subscription, "0xabc");
                assert_eq!(notification.result.get(), r#"{"number":"0x1"}"#);
            });
        }

        #[test]
        fn response_without_id() {
            let frame = json!({"jsonrpc": "2.0", "result": true}).to_string();
            Message::parse(&frame).unwrap_err();
        }

        #[test]
        fn jsonrpc_version_is_not_2() {
            let frame = json!({"jsonrpc": "1.0", "id": 1, "result": true}).to_string();
            Message::parse(&frame).unwrap_err();
        }

        #[test]
        fn result_and_error() {
            let frame = json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": true,
                "error": {"code": 1, "message": "both"}
            })
            .to_string();
            Message::parse(&frame).unwrap_err();
        }
    }
}
