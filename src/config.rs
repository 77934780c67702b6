use crate::error::ConfigError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const RESOLV_CONF: &str = "/etc/resolv.conf";
const DNS_PORT: u16 = 53;

#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Recursive resolver all audit queries go to
    pub resolver: SocketAddr,

    /// Timeout for a single query attempt
    pub query_timeout: Duration,

    /// Retries after the first attempt times out or fails
    pub max_retries: u8,

    /// EDNS0 UDP payload size advertised in queries
    pub udp_payload_size: u16,

    /// Whether to retry truncated UDP answers over TCP
    pub tcp_fallback: bool,

    /// Whether to query every authoritative nameserver of each zone
    pub survey_nameservers: bool,

    /// Optional TOML file with additional trust anchors
    pub trust_anchor_file: Option<PathBuf>,

    /// Report destination, stdout when unset
    pub output_path: Option<PathBuf>,

    /// Pretty-print the JSON report
    pub pretty: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            resolver: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DNS_PORT),
            query_timeout: Duration::from_secs(5),
            max_retries: 2,
            udp_payload_size: 1232,
            tcp_fallback: true,
            survey_nameservers: false,
            trust_anchor_file: None,
            output_path: None,
            pretty: false,
        }
    }
}

impl AuditConfig {
    /// Build a configuration from the system resolver configuration and
    /// `DNSSEC_AUDIT_*` environment variables, in that order of precedence.
    pub fn from_env() -> Result<Self, ConfigError> {
        let resolv_conf = std::fs::read_to_string(RESOLV_CONF).ok();
        Self::from_sources(resolv_conf.as_deref(), |key| std::env::var(key).ok())
    }

    pub(crate) fn from_sources<F>(resolv_conf: Option<&str>, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(resolver) = resolv_conf.and_then(parse_resolv_conf) {
            config.resolver = resolver;
        }

        if let Some(resolver) = var("DNSSEC_AUDIT_RESOLVER") {
            config.resolver = parse_resolver(&resolver)?;
        }

        if let Some(timeout_str) = var("DNSSEC_AUDIT_TIMEOUT") {
            let timeout_ms = timeout_str
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(timeout_str.clone()))?;
            if timeout_ms == 0 {
                return Err(ConfigError::InvalidTimeout(
                    "Timeout must be greater than 0".to_string(),
                ));
            }
            config.query_timeout = Duration::from_millis(timeout_ms);
        }

        if let Some(retries) = var("DNSSEC_AUDIT_RETRIES") {
            config.max_retries = retries
                .parse()
                .map_err(|_| ConfigError::InvalidRetries(retries.clone()))?;
        }

        if let Some(size) = var("DNSSEC_AUDIT_UDP_PAYLOAD_SIZE") {
            config.udp_payload_size = size
                .parse()
                .map_err(|_| ConfigError::InvalidPayloadSize(size.clone()))?;
        }

        if let Some(value) = var("DNSSEC_AUDIT_TCP_FALLBACK") {
            config.tcp_fallback = parse_bool(&value, config.tcp_fallback);
        }

        if let Some(value) = var("DNSSEC_AUDIT_SURVEY_NAMESERVERS") {
            config.survey_nameservers = parse_bool(&value, config.survey_nameservers);
        }

        if let Some(path) = var("DNSSEC_AUDIT_TRUST_ANCHORS") {
            config.trust_anchor_file = Some(PathBuf::from(path));
        }

        if let Some(path) = var("DNSSEC_AUDIT_OUTPUT") {
            config.output_path = Some(PathBuf::from(path));
        }

        if let Some(value) = var("DNSSEC_AUDIT_PRETTY") {
            config.pretty = parse_bool(&value, config.pretty);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.port() == 0 {
            return Err(ConfigError::InvalidResolver(
                "Resolver port must not be 0".to_string(),
            ));
        }

        if self.query_timeout.is_zero() || self.query_timeout > Duration::from_secs(60) {
            return Err(ConfigError::InvalidTimeout(
                "Timeout must be between 1ms and 60 seconds".to_string(),
            ));
        }

        if self.max_retries > 10 {
            return Err(ConfigError::InvalidRetries(
                "Retry count too large (max 10)".to_string(),
            ));
        }

        // RFC 6891 6.2.5: values below 512 are treated as 512
        if !(512..=4096).contains(&self.udp_payload_size) {
            return Err(ConfigError::InvalidPayloadSize(format!(
                "{} is outside 512..=4096",
                self.udp_payload_size
            )));
        }

        Ok(())
    }
}

/// Accept either `ip` or `ip:port` (`[v6]:port` for IPv6).
pub fn parse_resolver(s: &str) -> Result<SocketAddr, ConfigError> {
    let s = s.trim();
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    s.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| ConfigError::InvalidResolver(s.to_string()))
}

/// First usable `nameserver` entry of a resolv.conf file
pub fn parse_resolv_conf(contents: &str) -> Option<SocketAddr> {
    contents.lines().find_map(|line| {
        let line = line.trim();
        if line.starts_with('#') || line.starts_with(';') {
            return None;
        }
        let mut fields = line.split_whitespace();
        if fields.next()? != "nameserver" {
            return None;
        }
        // Scoped IPv6 addresses (fe80::1%eth0) cannot be used as-is
        fields
            .next()?
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, DNS_PORT))
    })
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}
