use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DnsError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid DNS packet: {0}")]
    InvalidPacket(String),

    #[error("Query timed out after {attempts} attempt(s)")]
    Timeout { attempts: u8 },

    #[error("Response id {got} does not match query id {expected}")]
    IdMismatch { expected: u16, got: u16 },

    #[error("Server answered with rcode {rcode}")]
    ServerFailure { rcode: u8 },

    #[error("Response truncated and TCP fallback disabled")]
    Truncated,
}

impl From<std::io::Error> for DnsError {
    fn from(err: std::io::Error) -> Self {
        DnsError::Io(err.to_string())
    }
}

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid resolver address: {0}")]
    InvalidResolver(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid retry count: {0}")]
    InvalidRetries(String),

    #[error("Invalid UDP payload size: {0}")]
    InvalidPayloadSize(String),

    #[error("Trust anchor file error: {0}")]
    TrustAnchorFile(String),
}

/// Audit-level failures. Everything that goes wrong inside a single zone or
/// key is recorded in the report instead.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot write report: {0}")]
    Output(#[from] std::io::Error),

    #[error("Cannot serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DnsError>;
