use crate::config::AuditConfig;
use crate::dns::DNSPacket;
use crate::dns::enums::{DNSResourceType, ResponseCode};
use crate::error::{DnsError, Result};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

/// Largest DNS message over UDP or TCP
const MAX_MESSAGE_SIZE: usize = 65_535;

/// Source of DNS answers for the auditor.
///
/// Implementations set the DNSSEC OK bit so that signatures are returned and
/// report any non-NOERROR answer as [`DnsError::ServerFailure`].
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn query(&self, name: &str, rtype: DNSResourceType) -> Result<DNSPacket>;
}

/// Minimal stub resolver: one upstream, UDP with TCP fallback
#[derive(Debug, Clone)]
pub struct StubResolver {
    server: SocketAddr,
    query_timeout: Duration,
    max_retries: u8,
    udp_payload_size: u16,
    tcp_fallback: bool,
}

impl StubResolver {
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            server: config.resolver,
            query_timeout: config.query_timeout,
            max_retries: config.max_retries,
            udp_payload_size: config.udp_payload_size,
            tcp_fallback: config.tcp_fallback,
        }
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    pub fn udp_payload_size(&self) -> u16 {
        self.udp_payload_size
    }

    /// Send `query` to `server` and return whatever it answered, whatever the
    /// rcode. Each attempt is bounded by the query timeout.
    pub async fn exchange(&self, server: SocketAddr, query: &DNSPacket) -> Result<DNSPacket> {
        let query_bytes = query
            .serialize()
            .map_err(|e| DnsError::Parse(format!("Failed to serialize query: {}", e)))?;
        let attempts = self.max_retries.saturating_add(1);

        trace!("Sending {} bytes to {}", query_bytes.len(), server);

        let mut last_error = None;
        for attempt in 1..=attempts {
            match timeout(
                self.query_timeout,
                self.send_query(&query_bytes, query.header.id, server),
            )
            .await
            {
                Ok(Ok(response)) => {
                    if attempt > 1 {
                        debug!("Query succeeded on attempt {}", attempt);
                    }
                    return Ok(response);
                }
                Ok(Err(DnsError::Truncated)) => return Err(DnsError::Truncated),
                Ok(Err(e)) => {
                    debug!("Query attempt {} to {} failed: {}", attempt, server, e);
                    last_error = Some(e);
                }
                Err(_) => {
                    debug!("Query attempt {} to {} timed out", attempt, server);
                    last_error = Some(DnsError::Timeout { attempts: attempt });
                }
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
            }
        }

        Err(last_error.unwrap_or(DnsError::Timeout { attempts }))
    }

    /// Try UDP first, fall back to TCP if truncated
    async fn send_query(
        &self,
        query_bytes: &[u8],
        id: u16,
        server: SocketAddr,
    ) -> Result<DNSPacket> {
        let response = self.send_udp_query(query_bytes, id, server).await?;
        if !response.header.tc {
            return Ok(response);
        }

        if !self.tcp_fallback {
            warn!("Truncated response from {} and TCP fallback is disabled", server);
            return Err(DnsError::Truncated);
        }

        debug!("UDP response truncated, retrying with TCP");
        self.send_tcp_query(query_bytes, id, server).await
    }

    async fn send_udp_query(
        &self,
        query_bytes: &[u8],
        id: u16,
        server: SocketAddr,
    ) -> Result<DNSPacket> {
        let local: SocketAddr = match server.ip() {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server).await?;
        socket.send(query_bytes).await?;

        let mut response_buf = vec![0u8; MAX_MESSAGE_SIZE];
        let response_len = socket.recv(&mut response_buf).await?;

        trace!(
            "Raw UDP response data ({} bytes): {:02x?}",
            response_len,
            &response_buf[..response_len.min(64)]
        );

        parse_response(&response_buf[..response_len], id, server)
    }

    async fn send_tcp_query(
        &self,
        query_bytes: &[u8],
        id: u16,
        server: SocketAddr,
    ) -> Result<DNSPacket> {
        let mut stream = TcpStream::connect(server).await?;

        let query_length = u16::try_from(query_bytes.len())
            .map_err(|_| DnsError::InvalidPacket("Query too large for TCP".to_string()))?;
        stream.write_all(&query_length.to_be_bytes()).await?;
        stream.write_all(query_bytes).await?;
        stream.flush().await?;

        let mut length_buf = [0u8; 2];
        stream.read_exact(&mut length_buf).await?;
        let response_length = u16::from_be_bytes(length_buf) as usize;

        let mut response_buf = vec![0; response_length];
        stream.read_exact(&mut response_buf).await?;

        trace!(
            "Raw TCP response data ({} bytes): {:02x?}",
            response_length,
            &response_buf[..response_length.min(64)]
        );

        parse_response(&response_buf, id, server)
    }
}

fn parse_response(buf: &[u8], id: u16, server: SocketAddr) -> Result<DNSPacket> {
    let response = DNSPacket::parse(buf).map_err(|e| {
        debug!("Failed to parse response from {}: {}", server, e);
        DnsError::Parse(format!("Failed to parse response: {}", e))
    })?;

    if response.header.id != id {
        return Err(DnsError::IdMismatch {
            expected: id,
            got: response.header.id,
        });
    }

    debug!(
        "Response from {}: rcode={}, ad={}, answers={}, authorities={}, additional={}",
        server,
        response.header.rcode,
        response.header.ad(),
        response.answers.len(),
        response.authorities.len(),
        response.resources.len()
    );
    Ok(response)
}

#[async_trait]
impl QueryTransport for StubResolver {
    async fn query(&self, name: &str, rtype: DNSResourceType) -> Result<DNSPacket> {
        let query = DNSPacket::query(name, rtype, true, Some(self.udp_payload_size), true);
        let response = self.exchange(self.server, &query).await?;

        if ResponseCode::from_u8(response.header.rcode) != ResponseCode::NoError {
            return Err(DnsError::ServerFailure {
                rcode: response.header.rcode,
            });
        }
        Ok(response)
    }
}
