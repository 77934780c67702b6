//! Signature validation of the sections of a zone's NS response.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::audit::{RrsetValidator, SectionValidation};
use crate::dns::enums::DNSResourceType;
use crate::dns::rdata::Dnskey;
use crate::dns::resource::DNSResource;
use crate::dnssec::rrset::{RrSet, group_rrsets};
use crate::dnssec::signature::{unix_now, verify_rrset};
use crate::dnssec::{DnsSecError, DnskeySet};
use crate::resolver::QueryTransport;

/// Validates every RRset of the answer, authority and additional sections of
/// an NS query against the DNSKEYs of the signer.
pub struct RrsigValidator {
    transport: Arc<dyn QueryTransport>,
    /// Fixed validation time, current time when unset
    now: Option<u32>,
}

impl RrsigValidator {
    pub fn new(transport: Arc<dyn QueryTransport>) -> Self {
        Self {
            transport,
            now: None,
        }
    }

    pub fn with_time(mut self, now: u32) -> Self {
        self.now = Some(now);
        self
    }

    async fn signer_keys(
        &self,
        signer: &str,
        cache: &mut HashMap<String, Vec<Dnskey>>,
    ) -> Vec<Dnskey> {
        if let Some(keys) = cache.get(signer) {
            return keys.clone();
        }

        let keys: Vec<Dnskey> = match self.transport.query(signer, DNSResourceType::DNSKEY).await {
            Ok(response) => DnskeySet::from_packet(&response, signer).all().cloned().collect(),
            Err(e) => {
                debug!("DNSKEY query for signer {} failed: {}", signer, e);
                Vec::new()
            }
        };
        cache.insert(signer.to_string(), keys.clone());
        keys
    }

    async fn validate_rrset(
        &self,
        rrset: &RrSet<'_>,
        now: u32,
        cache: &mut HashMap<String, Vec<Dnskey>>,
    ) -> Result<(), DnsSecError> {
        if rrset.signatures.is_empty() {
            return Err(DnsSecError::NoRrsig {
                owner: rrset.owner.clone(),
                rtype: rrset.rtype.to_string(),
            });
        }

        let mut last_error = None;
        for rrsig in &rrset.signatures {
            let keys = self.signer_keys(&rrsig.signer_name, cache).await;
            match verify_rrset(rrsig, &rrset.records, &keys, now) {
                Ok(()) => {
                    trace!("{} {} validated", rrset.owner, rrset.rtype);
                    return Ok(());
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or(DnsSecError::SignatureVerificationFailed {
            owner: rrset.owner.clone(),
            rtype: rrset.rtype.to_string(),
        }))
    }

    /// An empty section validates; otherwise every RRset in it must carry a
    /// verifying signature. Reports the first failing RRset.
    async fn validate_section(
        &self,
        section: &[DNSResource],
        now: u32,
        cache: &mut HashMap<String, Vec<Dnskey>>,
    ) -> (bool, Option<String>) {
        for rrset in group_rrsets(section) {
            if let Err(e) = self.validate_rrset(&rrset, now, cache).await {
                debug!("{} {} does not validate: {}", rrset.owner, rrset.rtype, e);
                return (false, Some(format!("{} {}: {}", rrset.owner, rrset.rtype, e)));
            }
        }
        (true, None)
    }
}

#[async_trait]
impl RrsetValidator for RrsigValidator {
    async fn validate_rrsets(&self, zone: &str) -> SectionValidation {
        let response = match self.transport.query(zone, DNSResourceType::NS).await {
            Ok(response) => response,
            Err(e) => {
                let error = Some(format!("NS query failed: {}", e));
                return SectionValidation {
                    answer_error: error.clone(),
                    ns_error: error.clone(),
                    extra_error: error,
                    ..Default::default()
                };
            }
        };

        let now = self.now.unwrap_or_else(unix_now);
        let mut cache = HashMap::new();

        let (answer_ok, answer_error) = self.validate_section(&response.answers, now, &mut cache).await;
        let (ns_ok, ns_error) = self.validate_section(&response.authorities, now, &mut cache).await;
        let (extra_ok, extra_error) = self.validate_section(&response.resources, now, &mut cache).await;

        SectionValidation {
            answer_ok,
            ns_ok,
            extra_ok,
            answer_error,
            ns_error,
            extra_error,
        }
    }
}
