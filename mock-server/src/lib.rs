use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const RPC_PATH: &str = "/api_jsonrpc.php";
pub const CONTENT_TYPE: &str = "application/json-rpc";

#[derive(Clone, Debug)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            user: "Admin".to_string(),
            password: "zabbix".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HostGroup {
    pub groupid: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Host {
    pub hostid: String,
    pub host: String,
    pub groupids: Vec<String>,
    pub params: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WebScenario {
    pub httptestid: String,
    pub name: String,
    pub hostid: String,
    pub params: Value,
}

/// Everything the server has been told so far.
#[derive(Debug, Default)]
pub struct Store {
    credentials: Credentials,
    sessions: HashSet<String>,
    groups: Vec<HostGroup>,
    hosts: Vec<Host>,
    web_scenarios: Vec<WebScenario>,
    next_ids: HashMap<&'static str, u64>,
}

impl Store {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    pub fn groups(&self) -> &[HostGroup] {
        &self.groups
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn web_scenarios(&self) -> &[WebScenario] {
        &self.web_scenarios
    }

    fn next_id(&mut self, kind: &'static str) -> String {
        let next = self.next_ids.entry(kind).or_insert(0);
        *next += 1;
        next.to_string()
    }
}

pub type Db = Arc<RwLock<Store>>;

/// A JSON-RPC error object as the server sends it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RpcFault {
    pub code: i64,
    pub message: String,
    pub data: String,
}

impl RpcFault {
    fn parse_error() -> Self {
        Self::new(-32700, "Parse error.", "Invalid JSON. An error occurred on the server while parsing the JSON text.")
    }

    fn invalid_request(data: impl Into<String>) -> Self {
        Self::new(-32600, "Invalid request.", data)
    }

    fn method_not_found(method: &str) -> Self {
        Self::new(-32601, "Method not found.", format!("Incorrect API \"{method}\"."))
    }

    fn invalid_params(data: impl Into<String>) -> Self {
        Self::new(-32602, "Invalid params.", data)
    }

    fn new(code: i64, message: &str, data: impl Into<String>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcCall {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    id: Value,
    #[serde(default)]
    auth: Option<String>,
}

pub fn app() -> Router {
    app_with_store(Arc::new(RwLock::new(Store::default())))
}

/// Router sharing `db` with the caller, so tests can inspect what was stored.
pub fn app_with_store(db: Db) -> Router {
    Router::new().route(RPC_PATH, post(rpc)).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_store(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_store(db)).await
}

async fn rpc(State(db): State<Db>, headers: HeaderMap, body: String) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with(CONTENT_TYPE) {
        return (StatusCode::PRECONDITION_FAILED, "Precondition Failed").into_response();
    }

    let raw: Value = match serde_json::from_str(&body) {
        Ok(raw) => raw,
        Err(_) => return reply(Value::Null, Err(RpcFault::parse_error())),
    };
    let call: RpcCall = match serde_json::from_value(raw) {
        Ok(call) => call,
        Err(e) => return reply(Value::Null, Err(RpcFault::invalid_request(e.to_string()))),
    };
    if call.jsonrpc != "2.0" {
        return reply(
            call.id,
            Err(RpcFault::invalid_request("Invalid parameter \"/jsonrpc\": value must be \"2.0\".")),
        );
    }

    debug!(method = %call.method, id = %call.id, "json-rpc call");
    let mut store = db.write().await;
    let outcome = dispatch(&mut store, &call);
    reply(call.id, outcome)
}

fn reply(id: Value, outcome: Result<Value, RpcFault>) -> Response {
    let body = match outcome {
        Ok(result) => json!({"jsonrpc": "2.0", "result": result, "id": id}),
        Err(fault) => json!({"jsonrpc": "2.0", "error": fault, "id": id}),
    };
    Json(body).into_response()
}

fn dispatch(store: &mut Store, call: &RpcCall) -> Result<Value, RpcFault> {
    if call.method == "user.login" {
        return login(store, &call.params);
    }
    let known = matches!(
        call.method.as_str(),
        "hostgroup.create" | "host.create" | "httptest.create"
    );
    if !known {
        return Err(RpcFault::method_not_found(&call.method));
    }
    match call.auth.as_deref() {
        Some(token) if store.sessions.contains(token) => {}
        _ => return Err(RpcFault::invalid_params("Session terminated, re-login, please.")),
    }
    match call.method.as_str() {
        "hostgroup.create" => create_host_group(store, &call.params),
        "host.create" => create_host(store, &call.params),
        _ => create_web_scenarios(store, &call.params),
    }
}

fn login(store: &mut Store, params: &Value) -> Result<Value, RpcFault> {
    let user = params
        .get("user")
        .or_else(|| params.get("username"))
        .and_then(Value::as_str);
    let password = params.get("password").and_then(Value::as_str);
    match (user, password) {
        (Some(user), Some(password))
            if user == store.credentials.user && password == store.credentials.password =>
        {
            let token = Uuid::new_v4().simple().to_string();
            store.sessions.insert(token.clone());
            info!(user, "session opened");
            Ok(Value::String(token))
        }
        _ => Err(RpcFault::invalid_params(
            "Incorrect user name or password or account is temporarily blocked.",
        )),
    }
}

fn create_host_group(store: &mut Store, params: &Value) -> Result<Value, RpcFault> {
    let name = required_str(params, "name")?;
    if store.groups.iter().any(|g| g.name == name) {
        return Err(RpcFault::invalid_params(format!(
            "Host group \"{name}\" already exists."
        )));
    }
    let groupid = store.next_id("group");
    store.groups.push(HostGroup {
        groupid: groupid.clone(),
        name: name.to_string(),
    });
    Ok(json!({"groupids": [groupid]}))
}

fn create_host(store: &mut Store, params: &Value) -> Result<Value, RpcFault> {
    let host = required_str(params, "host")?;
    if store.hosts.iter().any(|h| h.host == host) {
        return Err(RpcFault::invalid_params(format!(
            "Host with the same name \"{host}\" already exists."
        )));
    }
    let groupids: Vec<String> = params
        .get("groups")
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .filter_map(|g| g.get("groupid").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if groupids.is_empty() {
        return Err(RpcFault::invalid_params(
            "Invalid parameter \"/1\": the parameter \"groups\" is missing.",
        ));
    }
    if groupids
        .iter()
        .any(|id| !store.groups.iter().any(|g| &g.groupid == id))
    {
        return Err(RpcFault::invalid_params(
            "No permissions to referred object or it does not exist!",
        ));
    }

    let hostid = store.next_id("host");
    store.hosts.push(Host {
        hostid: hostid.clone(),
        host: host.to_string(),
        groupids,
        params: params.clone(),
    });
    Ok(json!({"hostids": [hostid]}))
}

fn create_web_scenarios(store: &mut Store, params: &Value) -> Result<Value, RpcFault> {
    let checks = match params {
        Value::Array(checks) => checks.clone(),
        Value::Object(_) => vec![params.clone()],
        _ => return Err(RpcFault::invalid_params("Incorrect arguments passed to function.")),
    };

    // Validate the whole batch before storing any of it.
    let mut pending = Vec::with_capacity(checks.len());
    for check in &checks {
        let name = required_str(check, "name")?;
        let hostid = required_str(check, "hostid")?;
        if !store.hosts.iter().any(|h| h.hostid == hostid) {
            return Err(RpcFault::invalid_params(
                "No permissions to referred object or it does not exist!",
            ));
        }
        pending.push((name.to_string(), hostid.to_string(), check.clone()));
    }

    let mut ids = Vec::with_capacity(pending.len());
    for (name, hostid, check) in pending {
        let httptestid = store.next_id("httptest");
        store.web_scenarios.push(WebScenario {
            httptestid: httptestid.clone(),
            name,
            hostid,
            params: check,
        });
        ids.push(httptestid);
    }
    Ok(json!({"httptestids": ids}))
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, RpcFault> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            RpcFault::invalid_params(format!(
                "Invalid parameter \"/1\": the parameter \"{key}\" is missing."
            ))
        })
}
