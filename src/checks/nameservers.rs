use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::audit::{Nameserver, NameserverSurvey};
use crate::dns::DNSPacket;
use crate::dns::common::parse_domain_name;
use crate::dns::enums::DNSResourceType;
use crate::dns::name;
use crate::resolver::{QueryTransport, StubResolver};

/// Queries each authoritative server of a zone directly and records whether
/// it offers recursion and speaks EDNS0.
pub struct NameserverProbe {
    transport: Arc<dyn QueryTransport>,
    direct: Arc<StubResolver>,
    port: u16,
}

impl NameserverProbe {
    /// `transport` resolves NS names and addresses, `direct` talks to each
    /// nameserver on port 53.
    pub fn new(transport: Arc<dyn QueryTransport>, direct: Arc<StubResolver>) -> Self {
        Self {
            transport,
            direct,
            port: 53,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    async fn nameserver_names(&self, zone: &str) -> Vec<String> {
        let response = match self.transport.query(zone, DNSResourceType::NS).await {
            Ok(response) => response,
            Err(e) => {
                debug!("NS query for {} failed: {}", zone, e);
                return Vec::new();
            }
        };

        let mut names: Vec<String> = response
            .answers
            .iter()
            .filter(|rr| rr.rtype == DNSResourceType::NS && rr.owned_by(zone))
            .filter_map(|rr| parse_domain_name(&rr.rdata, 0).ok())
            .map(|(labels, _)| name::labels_to_fqdn(&labels))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    async fn addresses(&self, ns_name: &str) -> Vec<IpAddr> {
        let mut addresses = Vec::new();
        for rtype in [DNSResourceType::A, DNSResourceType::AAAA] {
            let Ok(response) = self.transport.query(ns_name, rtype).await else {
                continue;
            };
            for rr in response.answers.iter().filter(|rr| rr.rtype == rtype) {
                match (rtype, rr.rdata.len()) {
                    (DNSResourceType::A, 4) => {
                        let octets: [u8; 4] = [rr.rdata[0], rr.rdata[1], rr.rdata[2], rr.rdata[3]];
                        addresses.push(IpAddr::V4(Ipv4Addr::from(octets)));
                    }
                    (DNSResourceType::AAAA, 16) => {
                        let mut octets = [0u8; 16];
                        octets.copy_from_slice(&rr.rdata);
                        addresses.push(IpAddr::V6(Ipv6Addr::from(octets)));
                    }
                    _ => {}
                }
            }
        }
        addresses
    }

    async fn probe(&self, zone: &str, ns_name: &str, ip: IpAddr) -> Nameserver {
        let query = DNSPacket::query(
            zone,
            DNSResourceType::SOA,
            true,
            Some(self.direct.udp_payload_size()),
            false,
        );

        let mut nameserver = Nameserver {
            name: ns_name.to_string(),
            ip: Some(ip.to_string()),
            ..Default::default()
        };
        match self.direct.exchange(SocketAddr::new(ip, self.port), &query).await {
            Ok(response) => {
                nameserver.resolver = response.header.ra;
                nameserver.edns0 = response.edns.is_some();
            }
            Err(e) => debug!("{} ({}) did not answer for {}: {}", ns_name, ip, zone, e),
        }
        nameserver
    }
}

#[async_trait]
impl NameserverSurvey for NameserverProbe {
    async fn survey(&self, zone: &str) -> Vec<Nameserver> {
        let mut nameservers = Vec::new();

        for ns_name in self.nameserver_names(zone).await {
            let addresses = self.addresses(&ns_name).await;
            if addresses.is_empty() {
                nameservers.push(Nameserver {
                    name: ns_name,
                    ..Default::default()
                });
                continue;
            }
            for ip in addresses {
                nameservers.push(self.probe(zone, &ns_name, ip).await);
            }
        }

        debug!("Surveyed {} nameserver address(es) for {}", nameservers.len(), zone);
        nameservers
    }
}
