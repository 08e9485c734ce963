//! JSON-RPC Server
//!
//! Serves the JSON-RPC 2.0 API over HTTP on a localhost TCP port.

use crate::handler::RpcHandler;
use crate::types::{StatusRequest, SubmitRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use transflow_core::error::{AppError, Result};

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9527;

/// Method names
pub mod method {
    pub const SUBMIT: &str = "translation.submit.v1";
    pub const STATUS: &str = "translation.status.v1";
    pub const LIST: &str = "translation.list.v1";
    pub const QUEUE: &str = "translation.queue.v1";
    pub const STATS: &str = "admin.stats.v1";
}

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Start the JSON-RPC server; returns the bound address (useful with port 0)
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle)> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to build server on {}: {}", addr, e)))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| AppError::Internal(format!("Failed to read bound address: {}", e)))?;

        let module = build_module(self.handler)?;

        let handle = server.start(module);
        info!(addr = %local_addr, "JSON-RPC server started successfully");
        Ok((local_addr, handle))
    }
}

/// Register every method on a fresh module
pub fn build_module(handler: Arc<RpcHandler>) -> Result<RpcModule<()>> {
    let mut module = RpcModule::new(());

    let h = handler.clone();
    module.register_async_method(method::SUBMIT, move |params, _, _| {
        let handler = h.clone();
        async move {
            let req: SubmitRequest = params.parse()?;
            handler.submit(req).await
        }
    })
    .map_err(register_error)?;

    let h = handler.clone();
    module.register_async_method(method::STATUS, move |params, _, _| {
        let handler = h.clone();
        async move {
            let req: StatusRequest = params.parse()?;
            handler.status(req).await
        }
    })
    .map_err(register_error)?;

    let h = handler.clone();
    module.register_async_method(method::LIST, move |_, _, _| {
        let handler = h.clone();
        async move { handler.list().await }
    })
    .map_err(register_error)?;

    let h = handler.clone();
    module
        .register_method(method::QUEUE, move |_, _, _| {
            Ok::<_, ErrorObjectOwned>(h.queue())
        })
        .map_err(register_error)?;

    let h = handler;
    module.register_async_method(method::STATS, move |_, _, _| {
        let handler = h.clone();
        async move { handler.stats().await }
    })
    .map_err(register_error)?;

    Ok(module)
}

fn register_error(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Failed to register method: {}", e))
}
