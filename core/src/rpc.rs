//! JSON-RPC envelope construction and result extraction.
//!
//! # Design
//! `RpcRequest` is only reachable through `RpcRequestBuilder::build`, which
//! checks the required members in wire order and names the first one that is
//! missing. `extract_result` is the single place where a parsed response is
//! classified as remote error, malformed, or success.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Protocol version sent in every envelope.
pub const JSON_RPC_VERSION: &str = "2.0";

/// Methods the client issues, with the fixed request id used for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    UserLogin,
    HostGroupCreate,
    HostCreate,
    HttpTestCreate,
}

impl RpcMethod {
    pub fn name(self) -> &'static str {
        match self {
            RpcMethod::UserLogin => "user.login",
            RpcMethod::HostGroupCreate => "hostgroup.create",
            RpcMethod::HostCreate => "host.create",
            RpcMethod::HttpTestCreate => "httptest.create",
        }
    }

    /// Request id by convention. Ids are never used for correlation.
    pub fn request_id(self) -> u64 {
        match self {
            RpcMethod::UserLogin => 1,
            RpcMethod::HostGroupCreate => 2,
            RpcMethod::HostCreate => 4,
            RpcMethod::HttpTestCreate => 5,
        }
    }
}

/// A JSON-RPC request envelope.
///
/// `auth` serializes as `null` when absent, which is what `user.login` sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub id: u64,
    pub auth: Option<String>,
    pub params: Value,
}

impl RpcRequest {
    pub fn builder() -> RpcRequestBuilder {
        RpcRequestBuilder::default()
    }
}

/// Collects envelope members and validates them on `build`.
#[derive(Debug, Clone, Default)]
pub struct RpcRequestBuilder {
    version: Option<String>,
    method: Option<String>,
    id: Option<u64>,
    params: Option<Value>,
    auth: Option<String>,
}

impl RpcRequestBuilder {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Validate and produce the envelope.
    ///
    /// Empty strings, a zero id and blank params (see `is_blank`) count as
    /// missing. An empty `auth` is normalized to `null`.
    pub fn build(self) -> Result<RpcRequest, ApiError> {
        let jsonrpc = non_empty(self.version).ok_or(ApiError::missing("version"))?;
        let method = non_empty(self.method).ok_or(ApiError::missing("method"))?;
        let id = self
            .id
            .filter(|id| *id != 0)
            .ok_or(ApiError::missing("requestId"))?;
        let params = self
            .params
            .filter(|p| !is_blank(p))
            .ok_or(ApiError::missing("params"))?;

        Ok(RpcRequest {
            jsonrpc,
            method,
            id,
            auth: non_empty(self.auth),
            params,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `null`, `false`, `0` and `""` carry nothing. Empty objects and arrays do.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

pub(crate) fn no_result() -> ApiError {
    ApiError::Protocol("No result was found in body response".to_string())
}

/// A JSON-RPC response as received. Either member may be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// Pull `result` out of a parsed response.
///
/// A non-null `error` wins over everything else and is returned as-is. A blank
/// `result` (`null`, `false`, `0`, `""`) counts as no result.
pub fn extract_result(response: RpcResponse) -> Result<Value, ApiError> {
    if let Some(error) = response.error.filter(|e| !e.is_null()) {
        return Err(ApiError::Remote(error));
    }
    response.result.filter(|r| !is_blank(r)).ok_or_else(no_result)
}
