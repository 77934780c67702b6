pub mod audit;
pub mod checks;
pub mod config;
pub mod dns;
pub mod dnssec;
pub mod error;
pub mod output;
pub mod resolver;

pub use audit::{ChainWalker, Report};
pub use dns::DNSPacket;
pub use error::{AuditError, ConfigError, DnsError};
