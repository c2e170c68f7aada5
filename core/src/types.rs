//! Typed params and results for the calls the client knows about.
//!
//! # Design
//! Only the shapes the client itself touches are typed: login credentials,
//! the host group name, and the id lists returned by the `*.create` methods.
//! Host and web scenario payloads stay opaque and are passed through as
//! whatever the caller serializes.

use serde::{Deserialize, Serialize};

/// Params for `user.login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginParams {
    pub user: String,
    pub password: String,
}

/// Params for `hostgroup.create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostGroupParams {
    pub name: String,
}

/// `result` of `hostgroup.create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostGroupIds {
    pub groupids: Vec<String>,
}

/// `result` of `host.create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostIds {
    pub hostids: Vec<String>,
}

/// `result` of `httptest.create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpTestIds {
    pub httptestids: Vec<String>,
}
