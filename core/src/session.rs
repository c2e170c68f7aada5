//! Token-bound view of a client, returned by `ZabbixClient::authenticate`.

use std::future::Future;

use serde::Serialize;

use crate::client::ZabbixClient;
use crate::error::ApiError;
use crate::http::Transport;

/// The authenticated operations with the token already filled in.
///
/// There is no expiry tracking; once the server drops the session every call
/// fails with the server's `ApiError::Remote`.
#[derive(Debug)]
pub struct Session<'a, T> {
    client: &'a ZabbixClient<T>,
    auth: String,
}

impl<'a, T> Session<'a, T> {
    pub(crate) fn new(client: &'a ZabbixClient<T>, auth: String) -> Self {
        Self { client, auth }
    }

    pub fn auth_token(&self) -> &str {
        &self.auth
    }
}

impl<'a, T: Transport> Session<'a, T> {
    pub fn create_host_group(
        &self,
        group_name: &str,
    ) -> Result<impl Future<Output = Result<String, ApiError>> + Send + 'a, ApiError> {
        self.client.create_host_group(&self.auth, group_name)
    }

    pub fn create_host<P>(
        &self,
        params: &P,
    ) -> Result<impl Future<Output = Result<String, ApiError>> + Send + 'a, ApiError>
    where
        P: Serialize + ?Sized,
    {
        self.client.create_host(&self.auth, params)
    }

    pub fn create_web_scenarios<C>(
        &self,
        checks: &C,
    ) -> Result<impl Future<Output = Result<Vec<String>, ApiError>> + Send + 'a, ApiError>
    where
        C: Serialize + ?Sized,
    {
        self.client.create_web_scenarios(&self.auth, checks)
    }
}
