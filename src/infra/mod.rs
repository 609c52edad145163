//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod discovery;
pub mod error;
pub mod grpc;
pub mod http;
pub mod memory;
pub mod telemetry;
