//! Async client core for the Zabbix JSON-RPC API.
//!
//! # Overview
//! Logs in, threads the session token through later calls, and provisions
//! host groups, hosts and web scenarios. Every operation is exactly one
//! `POST <server>/api_jsonrpc.php`.
//!
//! # Design
//! - `ZabbixClient` holds an immutable `Endpoint` plus a `Transport`; it has
//!   no other state and can be shared freely between tasks.
//! - Each operation is split into `build_*` (validates, produces the request)
//!   and `parse_*` (consumes the response). The async operations glue the two
//!   around a transport call, so the I/O boundary stays explicit.
//! - Argument validation happens before a future is returned; the future
//!   only ever fails for reasons found after the request was sent.
//! - Host and web scenario payloads are opaque; callers pass any `Serialize`.
//!
//! ```no_run
//! # async fn run() -> Result<(), zabbix_core::ApiError> {
//! use zabbix_core::ZabbixClient;
//!
//! let client = ZabbixClient::for_server("http://zabbix.example.com")?;
//! let session = client.authenticate("Admin", "zabbix")?.await?;
//! let group_id = session.create_host_group("web servers")?.await?;
//! # let _ = group_id;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod rpc;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{Endpoint, ZabbixClient};
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse, Transport};
pub use rpc::{RpcMethod, RpcRequest, RpcResponse, JSON_RPC_VERSION};
pub use session::Session;
pub use transport::UreqTransport;
pub use types::{HostGroupIds, HostGroupParams, HostIds, HttpTestIds, LoginParams};
