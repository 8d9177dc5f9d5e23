use thiserror::Error;

/// SDK Error type
#[derive(Error, Debug)]
pub enum Error {
    /// JSON-RPC transport or node error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The wallet declined to sign, or the node refused the submission
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The transaction was mined but reverted
    #[error("Transaction {hash} reverted")]
    Reverted { hash: String },

    /// Waiting for confirmations took longer than allowed
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// Contract interaction error
    #[error("Contract error: {0}")]
    Contract(String),

    /// Call data encoding or return data decoding error
    #[error("ABI error: {0}")]
    Abi(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
