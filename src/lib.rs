// Allow non-snake_case names for JSON serialization compatibility with the tool consumers
#![allow(non_snake_case)]

pub mod commands;
pub mod error;
pub mod filesystem;
pub mod mcp;
pub mod models;
pub mod paths;
pub mod storage;
pub mod tree;

pub use error::{FolderError, Result};
pub use filesystem::{FileSystem, MemoryFs, TokioFs};
pub use models::{Folder, FolderItem, FolderTree, FolderTreeDocument, ItemType, ProjectMatch, Settings};
pub use tree::{deserializeFolderTree, serializeFolderTree};

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Serve the MCP tools over streamable HTTP until `ct` is cancelled
pub async fn serveMcp(storage: storage::StorageState, bindAddress: &str, ct: CancellationToken) -> Result<()> {
    use rmcp::transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    };

    info!("[MCP] Starting server on {}...", bindAddress);

    let service = StreamableHttpService::new(
        move || Ok(mcp::FolderTreeServer::new(storage.clone())),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );

    let router = axum::Router::new().fallback_service(service);

    let tcp_listener = tokio::net::TcpListener::bind(bindAddress).await.map_err(|e| {
        error!("[MCP] Failed to bind: {}", e);
        FolderError::Io { path: bindAddress.to_string(), source: e }
    })?;

    info!("[MCP] Server started successfully on {}", bindAddress);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async move {
            ct.cancelled().await;
        })
        .await
        .map_err(|e| FolderError::Io { path: bindAddress.to_string(), source: e })?;

    info!("[MCP] Server stopped");
    Ok(())
}

/// Load settings, reconcile the tree with disk, and serve until Ctrl-C
pub async fn run(settings: Settings) -> Result<()> {
    let storage = storage::initStorage(settings.clone()).await?;

    let ct = CancellationToken::new();
    let shutdown = ct.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("[run] Ctrl-C received, shutting down");
        }
        shutdown.cancel();
    });

    serveMcp(storage.clone(), &settings.bindAddress, ct).await?;
    storage.persist().await
}
