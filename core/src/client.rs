//! Request builder, response parser and async operations for the Zabbix API.
//!
//! # Design
//! `ZabbixClient` holds an immutable `Endpoint` and a transport, and nothing
//! else. Each operation has three faces:
//! - `build_*` validates arguments and produces an `HttpRequest`;
//! - `parse_*` turns an `HttpResponse` into the operation's value;
//! - the plain operation (`create_host_group`, ...) runs `build_*` right away
//!   and returns a future that does the POST and `parse_*`.
//!
//! The outer `Result` of an operation carries validation failures, so misuse
//! is reported before a future even exists. The future carries everything
//! that can go wrong once the request is on its way.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::rpc::{
    extract_result, is_blank, no_result, RpcMethod, RpcRequest, RpcResponse, JSON_RPC_VERSION,
};
use crate::session::Session;
use crate::transport::UreqTransport;
use crate::types::{HostGroupIds, HostGroupParams, HostIds, HttpTestIds, LoginParams};

/// Path of the JSON-RPC entry point, relative to the server base URL.
pub const RPC_PATH: &str = "/api_jsonrpc.php";

/// Content type sent with every request.
pub const CONTENT_TYPE: &str = "application/json-rpc";

/// Where and how requests are sent. Fixed at client construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
    url: String,
    version: &'static str,
    headers: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(server_url: &str) -> Result<Self, ApiError> {
        let base_url = server_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::Configuration("url must be specified".to_string()));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            url: format!("{base_url}{RPC_PATH}"),
            version: JSON_RPC_VERSION,
            headers: vec![("Content-Type".to_string(), CONTENT_TYPE.to_string())],
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the JSON-RPC entry point.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// Client for one Zabbix server.
#[derive(Debug, Clone)]
pub struct ZabbixClient<T = UreqTransport> {
    endpoint: Endpoint,
    transport: T,
}

impl ZabbixClient<UreqTransport> {
    /// Client for `server_url` using the default `ureq` transport.
    pub fn for_server(server_url: &str) -> Result<Self, ApiError> {
        Self::with_transport(server_url, UreqTransport::new())
    }
}

impl<T> ZabbixClient<T> {
    pub fn with_transport(server_url: &str, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            endpoint: Endpoint::new(server_url)?,
            transport,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_login(&self, username: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let params = LoginParams {
            user: required("username", username)?.to_string(),
            password: required("password", password)?.to_string(),
        };
        self.build_request(RpcMethod::UserLogin, to_params("params", &params)?, None)
    }

    pub fn build_create_host_group(
        &self,
        auth: &str,
        group_name: &str,
    ) -> Result<HttpRequest, ApiError> {
        let params = HostGroupParams {
            name: required("groupName", group_name)?.to_string(),
        };
        let params = to_params("params", &params)?;
        let auth = required("authToken", auth)?;
        self.build_request(RpcMethod::HostGroupCreate, params, Some(auth))
    }

    /// `params` is sent verbatim: host name, interfaces, groups and so on are
    /// the caller's business. Params that serialize to `null`, `false`, `0` or
    /// `""` are rejected as missing.
    pub fn build_create_host<P>(&self, auth: &str, params: &P) -> Result<HttpRequest, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let params = to_params("params", params)?;
        let auth = required("authToken", auth)?;
        self.build_request(RpcMethod::HostCreate, params, Some(auth))
    }

    /// `checks` is a single web scenario object or an array of them.
    pub fn build_create_web_scenarios<C>(
        &self,
        auth: &str,
        checks: &C,
    ) -> Result<HttpRequest, ApiError>
    where
        C: Serialize + ?Sized,
    {
        let params = to_params("checks", checks)?;
        let auth = required("authToken", auth)?;
        self.build_request(RpcMethod::HttpTestCreate, params, Some(auth))
    }

    fn build_request(
        &self,
        method: RpcMethod,
        params: Value,
        auth: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let envelope = RpcRequest::builder()
            .version(self.endpoint.version)
            .method(method.name())
            .id(method.request_id())
            .params(params);
        let envelope = match auth {
            Some(auth) => envelope.auth(auth),
            None => envelope,
        }
        .build()?;
        let body = serde_json::to_string(&envelope)
            .map_err(|e| ApiError::Serialization(e.to_string()))?;

        Ok(HttpRequest {
            url: self.endpoint.url.clone(),
            headers: self.endpoint.headers.clone(),
            body,
        })
    }

    /// The raw `result` of `user.login` is the token.
    pub fn parse_login(&self, response: HttpResponse) -> Result<String, ApiError> {
        let result = parse_result(RpcMethod::UserLogin, response)?;
        match result {
            Value::String(token) => Ok(token),
            other => Err(ApiError::Protocol(format!(
                "user.login result is not a token: {other}"
            ))),
        }
    }

    /// Id of the first created host group.
    pub fn parse_create_host_group(&self, response: HttpResponse) -> Result<String, ApiError> {
        let ids: HostGroupIds = parse_typed(RpcMethod::HostGroupCreate, response)?;
        first_id(RpcMethod::HostGroupCreate, "groupids", ids.groupids)
    }

    /// Id of the first created host.
    pub fn parse_create_host(&self, response: HttpResponse) -> Result<String, ApiError> {
        let ids: HostIds = parse_typed(RpcMethod::HostCreate, response)?;
        first_id(RpcMethod::HostCreate, "hostids", ids.hostids)
    }

    /// Ids of every created web scenario, in server order.
    pub fn parse_create_web_scenarios(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<String>, ApiError> {
        let ids: HttpTestIds = parse_typed(RpcMethod::HttpTestCreate, response)?;
        Ok(ids.httptestids)
    }
}

impl<T: Transport> ZabbixClient<T> {
    /// Log in and return the session token.
    pub fn get_auth_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<impl Future<Output = Result<String, ApiError>> + Send + '_, ApiError> {
        let request = self.build_login(username, password)?;
        Ok(async move {
            let response = self.dispatch(RpcMethod::UserLogin, request).await?;
            self.parse_login(response)
        })
    }

    /// Log in and bind the token to a `Session`.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<impl Future<Output = Result<Session<'_, T>, ApiError>> + Send + '_, ApiError> {
        let login = self.get_auth_token(username, password)?;
        Ok(async move {
            let auth = login.await?;
            debug!("authenticated against {}", self.endpoint.base_url);
            Ok(Session::new(self, auth))
        })
    }

    pub fn create_host_group(
        &self,
        auth: &str,
        group_name: &str,
    ) -> Result<impl Future<Output = Result<String, ApiError>> + Send + '_, ApiError> {
        let request = self.build_create_host_group(auth, group_name)?;
        Ok(async move {
            let response = self.dispatch(RpcMethod::HostGroupCreate, request).await?;
            self.parse_create_host_group(response)
        })
    }

    pub fn create_host<P>(
        &self,
        auth: &str,
        params: &P,
    ) -> Result<impl Future<Output = Result<String, ApiError>> + Send + '_, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let request = self.build_create_host(auth, params)?;
        Ok(async move {
            let response = self.dispatch(RpcMethod::HostCreate, request).await?;
            self.parse_create_host(response)
        })
    }

    pub fn create_web_scenarios<C>(
        &self,
        auth: &str,
        checks: &C,
    ) -> Result<impl Future<Output = Result<Vec<String>, ApiError>> + Send + '_, ApiError>
    where
        C: Serialize + ?Sized,
    {
        let request = self.build_create_web_scenarios(auth, checks)?;
        Ok(async move {
            let response = self.dispatch(RpcMethod::HttpTestCreate, request).await?;
            self.parse_create_web_scenarios(response)
        })
    }

    async fn dispatch(
        &self,
        method: RpcMethod,
        request: HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        debug!(
            method = method.name(),
            id = method.request_id(),
            url = %request.url,
            "sending json-rpc request"
        );
        self.transport.post(request).await
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ApiError> {
    if value.is_empty() {
        return Err(ApiError::missing(field));
    }
    Ok(value)
}

fn to_params<P>(field: &'static str, params: &P) -> Result<Value, ApiError>
where
    P: Serialize + ?Sized,
{
    let value =
        serde_json::to_value(params).map_err(|e| ApiError::Serialization(e.to_string()))?;
    if is_blank(&value) {
        return Err(ApiError::missing(field));
    }
    Ok(value)
}

/// Status check, JSON decode and `result` extraction shared by every parser.
fn parse_result(method: RpcMethod, response: HttpResponse) -> Result<Value, ApiError> {
    if response.status != 200 {
        warn!(
            method = method.name(),
            status = response.status,
            "unexpected status code"
        );
        return Err(ApiError::HttpStatus {
            status: response.status,
            body: response.body,
        });
    }
    let body: Value = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::Deserialization(e.to_string()))?;
    if !body.is_object() {
        return Err(no_result());
    }
    let envelope: RpcResponse =
        serde_json::from_value(body).map_err(|e| ApiError::Protocol(e.to_string()))?;
    extract_result(envelope).inspect_err(|err| {
        if let ApiError::Remote(remote) = err {
            warn!(method = method.name(), error = %remote, "server returned an error");
        }
    })
}

fn parse_typed<R: DeserializeOwned>(
    method: RpcMethod,
    response: HttpResponse,
) -> Result<R, ApiError> {
    let result = parse_result(method, response)?;
    serde_json::from_value(result).map_err(|e| {
        ApiError::Protocol(format!("unexpected {} result: {e}", method.name()))
    })
}

fn first_id(method: RpcMethod, key: &str, ids: Vec<String>) -> Result<String, ApiError> {
    ids.into_iter().next().ok_or_else(|| {
        ApiError::Protocol(format!("{} result has an empty {key} list", method.name()))
    })
}
