use thiserror::Error;
use wacore::frame::FrameError;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to accept consumer connection: {0}")]
    Accept(#[source] std::io::Error),
    #[error("Failed to connect to bridge at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read from bridge: {0}")]
    Read(#[source] std::io::Error),
    #[error("Failed to write to bridge: {0}")]
    Write(#[source] std::io::Error),
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
