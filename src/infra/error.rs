use std::net::SocketAddr;

use thiserror::Error;

/// Failures while wiring the process together: stores, listeners, telemetry.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to bind {transport} listener on {addr}: {source}")]
    Bind {
        transport: &'static str,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("{transport} server stopped: {message}")]
    Serve {
        transport: &'static str,
        message: String,
    },
    #[error("database unavailable: {0}")]
    Database(#[from] sqlx::Error),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl InfraError {
    pub fn bind(transport: &'static str, addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind {
            transport,
            addr,
            source,
        }
    }

    pub fn serve(transport: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Serve {
            transport,
            message: err.to_string(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
