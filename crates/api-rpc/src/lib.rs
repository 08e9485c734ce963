//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for Transflow: job submission,
//! status polling and queue/admin introspection.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
