use std::sync::Arc;

use mock_server::{Credentials, Store};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "mock_server=info".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let defaults = Credentials::default();
    let credentials = Credentials {
        user: std::env::var("ZABBIX_USER").unwrap_or(defaults.user),
        password: std::env::var("ZABBIX_PASSWORD").unwrap_or(defaults.password),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on http://{addr}{}", mock_server::RPC_PATH);
    let db = Arc::new(RwLock::new(Store::new(credentials)));
    mock_server::run_with_store(listener, db).await
}
