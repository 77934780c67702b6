//! Shared stand-ins for the audit collaborators.

#![allow(dead_code)] // Not every test file uses every helper

use async_trait::async_trait;
use dnssec_audit::audit::{
    Nameserver, NameserverSurvey, Nsec3Probe, Nsec3Status, RrsetValidator, SectionValidation,
};
use dnssec_audit::dns::DNSPacket;
use dnssec_audit::dns::enums::DNSResourceType;
use dnssec_audit::dns::name;
use dnssec_audit::dns::rdata::{Dnskey, Ds, KSK_FLAGS, ZSK_FLAGS};
use dnssec_audit::dns::resource::DNSResource;
use dnssec_audit::dnssec::compute_ds_digest;
use dnssec_audit::error::DnsError;
use dnssec_audit::resolver::QueryTransport;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

/// RFC 3110 public key with exponent 65537 and a `bits` long modulus.
/// `seed` makes distinct keys of equal size.
pub fn rsa_key(bits: usize, seed: u8) -> Vec<u8> {
    let mut key = vec![3, 0x01, 0x00, 0x01];
    key.extend((0..bits / 8).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed) | 0x01));
    key
}

pub fn zsk(algorithm: u8, public_key: Vec<u8>) -> Dnskey {
    Dnskey {
        flags: ZSK_FLAGS,
        protocol: 3,
        algorithm,
        public_key,
    }
}

pub fn ksk(algorithm: u8, public_key: Vec<u8>) -> Dnskey {
    Dnskey {
        flags: KSK_FLAGS,
        protocol: 3,
        algorithm,
        public_key,
    }
}

/// DS record the parent of `zone` would publish for `key`
pub fn ds_for(zone: &str, key: &Dnskey, digest_type: u8) -> Ds {
    Ds {
        key_tag: key.key_tag(),
        algorithm: key.algorithm,
        digest_type,
        digest: compute_ds_digest(zone, key, digest_type).unwrap(),
    }
}

pub fn response(name: &str, rtype: DNSResourceType, answers: Vec<DNSResource>) -> DNSPacket {
    let mut packet = DNSPacket::query(name, rtype, true, Some(1232), true);
    packet.header.qr = true;
    packet.header.ra = true;
    packet.answers = answers;
    packet
}

/// In-memory transport answering from canned responses. Anything not
/// registered fails like an NXDOMAIN from a real resolver.
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<(String, DNSResourceType), Result<DNSPacket, DnsError>>,
    log: Mutex<Vec<(String, DNSResourceType)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(
        mut self,
        name: &str,
        rtype: DNSResourceType,
        result: Result<DNSPacket, DnsError>,
    ) -> Self {
        self.responses.insert((name::canonical(name), rtype), result);
        self
    }

    pub fn with_keys(self, zone: &str, keys: &[Dnskey]) -> Self {
        let answers = keys
            .iter()
            .map(|key| DNSResource::new(zone, DNSResourceType::DNSKEY, 3600, key.to_rdata()))
            .collect();
        let packet = response(zone, DNSResourceType::DNSKEY, answers);
        self.with_response(zone, DNSResourceType::DNSKEY, Ok(packet))
    }

    pub fn with_ds(self, zone: &str, ds_set: &[Ds]) -> Self {
        let answers = ds_set
            .iter()
            .map(|ds| DNSResource::new(zone, DNSResourceType::DS, 3600, ds.to_rdata()))
            .collect();
        let packet = response(zone, DNSResourceType::DS, answers);
        self.with_response(zone, DNSResourceType::DS, Ok(packet))
    }

    pub fn queries(&self) -> Vec<(String, DNSResourceType)> {
        self.log.lock().clone()
    }

    pub fn queried(&self, name: &str, rtype: DNSResourceType) -> bool {
        let name = name::canonical(name);
        self.log.lock().iter().any(|(n, t)| *n == name && *t == rtype)
    }
}

#[async_trait]
impl QueryTransport for MockTransport {
    async fn query(&self, name: &str, rtype: DNSResourceType) -> Result<DNSPacket, DnsError> {
        let key = (name::canonical(name), rtype);
        self.log.lock().push(key.clone());
        self.responses
            .get(&key)
            .cloned()
            .unwrap_or(Err(DnsError::ServerFailure { rcode: 3 }))
    }
}

/// NSEC3 probe with fixed answers per zone
#[derive(Default)]
pub struct StaticNsec3 {
    pub zones: HashMap<String, Nsec3Status>,
}

#[async_trait]
impl Nsec3Probe for StaticNsec3 {
    async fn probe_nsec3(&self, zone: &str) -> Nsec3Status {
        self.zones.get(zone).copied().unwrap_or_default()
    }
}

/// Validator returning the same verdict for every zone
pub struct StaticValidator(pub SectionValidation);

impl StaticValidator {
    pub fn passing() -> Self {
        Self(SectionValidation {
            answer_ok: true,
            ns_ok: true,
            extra_ok: true,
            ..Default::default()
        })
    }
}

#[async_trait]
impl RrsetValidator for StaticValidator {
    async fn validate_rrsets(&self, _zone: &str) -> SectionValidation {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct StaticSurvey {
    pub zones: HashMap<String, Vec<Nameserver>>,
}

#[async_trait]
impl NameserverSurvey for StaticSurvey {
    async fn survey(&self, zone: &str) -> Vec<Nameserver> {
        self.zones.get(zone).cloned().unwrap_or_default()
    }
}

/// Answer built from the parsed query; `None` drops the query unanswered
pub type Responder = dyn Fn(&DNSPacket) -> Option<DNSPacket> + Send + Sync;

/// Loopback DNS server for resolver tests
pub struct TestServer {
    pub addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
}

impl TestServer {
    /// Serve UDP with `udp` and, on the same port, TCP with `tcp`
    pub async fn start(udp: Arc<Responder>, tcp: Option<Arc<Responder>>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));

        let counter = udp_queries.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
                counter.fetch_add(1, Ordering::SeqCst);
                let Ok(query) = DNSPacket::parse(&buf[..len]) else {
                    continue;
                };
                if let Some(answer) = udp(&query) {
                    let _ = socket.send_to(&answer.serialize().unwrap(), peer).await;
                }
            }
        });

        if let Some(tcp) = tcp {
            let listener = TcpListener::bind(addr).await.unwrap();
            let counter = tcp_queries.clone();
            tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener.accept().await {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let mut len_buf = [0u8; 2];
                    if stream.read_exact(&mut len_buf).await.is_err() {
                        continue;
                    }
                    let mut buf = vec![0u8; u16::from_be_bytes(len_buf) as usize];
                    if stream.read_exact(&mut buf).await.is_err() {
                        continue;
                    }
                    let Ok(query) = DNSPacket::parse(&buf) else {
                        continue;
                    };
                    if let Some(answer) = tcp(&query) {
                        let bytes = answer.serialize().unwrap();
                        let _ = stream.write_all(&(bytes.len() as u16).to_be_bytes()).await;
                        let _ = stream.write_all(&bytes).await;
                    }
                }
            });
        }

        Self {
            addr,
            udp_queries,
            tcp_queries,
        }
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }
}

/// Reply to `query` echoing its id and question
pub fn reply_to(query: &DNSPacket, answers: Vec<DNSResource>) -> DNSPacket {
    let mut reply = query.clone();
    reply.header.qr = true;
    reply.header.ra = true;
    reply.answers = answers;
    reply
}
