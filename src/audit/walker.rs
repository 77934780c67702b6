use std::sync::Arc;

use tracing::{debug, info, warn};

use super::report::{Key, KeyRole, Report, Zone};
use super::{NameserverSurvey, Nsec3Probe, RrsetValidator};
use crate::dns::enums::DNSResourceType;
use crate::dns::name;
use crate::dns::rdata::Dnskey;
use crate::dnssec::{DnsSecError, DnskeySet, DsVerifier, TrustAnchorStore, classify, key_length_for};
use crate::error::AuditError;
use crate::resolver::QueryTransport;

/// Outcome of checking a KSK against the DS records of its zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DsOutcome {
    verifiable: bool,
    trust_anchor: bool,
    error: Option<String>,
}

impl From<Result<(), DnsSecError>> for DsOutcome {
    fn from(result: Result<(), DnsSecError>) -> Self {
        match result {
            Ok(()) => Self {
                verifiable: true,
                ..Default::default()
            },
            Err(DnsSecError::NoMatchingDs { .. }) => Self {
                trust_anchor: true,
                ..Default::default()
            },
            Err(e) => Self {
                error: Some(e.to_string()),
                ..Default::default()
            },
        }
    }
}

/// Walks the chain of trust of a name from the leaf zone up to the root
pub struct ChainWalker {
    transport: Arc<dyn QueryTransport>,
    ds_verifier: DsVerifier,
    nsec3: Arc<dyn Nsec3Probe>,
    validator: Arc<dyn RrsetValidator>,
    survey: Option<Arc<dyn NameserverSurvey>>,
    anchors: Arc<TrustAnchorStore>,
}

impl ChainWalker {
    pub fn new(
        transport: Arc<dyn QueryTransport>,
        nsec3: Arc<dyn Nsec3Probe>,
        validator: Arc<dyn RrsetValidator>,
        anchors: Arc<TrustAnchorStore>,
    ) -> Self {
        Self {
            ds_verifier: DsVerifier::new(transport.clone()),
            transport,
            nsec3,
            validator,
            survey: None,
            anchors,
        }
    }

    /// Attach authoritative nameserver facts to every zone
    pub fn with_survey(mut self, survey: Arc<dyn NameserverSurvey>) -> Self {
        self.survey = Some(survey);
        self
    }

    /// Audit every zone from `domain` up to the first trust anchor.
    ///
    /// Only an invalid name fails the audit; query and verification failures
    /// are recorded in the report.
    pub async fn audit_chain(&self, domain: &str) -> Result<Report, AuditError> {
        let target = name::normalize(domain)?;
        info!("Auditing DNSSEC chain of trust for {}", target);

        let mut report = Report {
            target: target.clone(),
            ..Default::default()
        };

        for zone_name in name::zone_path(&target) {
            let (zone, keys) = self.audit_zone(&zone_name).await;

            if report.zones.is_empty() {
                report.dnssec = keys.all().next().is_some();
            }

            let anchor_reached = zone.keys.iter().any(|k| k.role == KeyRole::Ksk && k.trust_anchor);
            report.zones.push(zone);

            if anchor_reached {
                report.anchored = true;
                if !name::is_root(&zone_name) {
                    info!("Trust island anchored at {}", zone_name);
                    report.trust_island = true;
                    report.trust_island_anchor_zone = Some(zone_name);
                }
                break;
            }
        }

        if !report.anchored {
            warn!("No trust anchor reached for {}", target);
        }
        info!(
            "Audit of {} finished: {} zone(s), dnssec={}, trust_island={}",
            target,
            report.zones.len(),
            report.dnssec,
            report.trust_island
        );
        Ok(report)
    }

    async fn audit_zone(&self, zone_name: &str) -> (Zone, DnskeySet) {
        debug!("Auditing zone {}", zone_name);

        let nsec3 = self.nsec3.probe_nsec3(zone_name).await;
        let sections = self.validator.validate_rrsets(zone_name).await;
        let keys = self.fetch_keys(zone_name).await;

        let mut audited = Vec::with_capacity(keys.len());
        for key in &keys.zsk {
            audited.push(self.assess_key(zone_name, key, KeyRole::Zsk, DsOutcome::default()));
        }
        for key in &keys.ksk {
            let outcome = DsOutcome::from(self.ds_verifier.verify_ksk(zone_name, key).await);
            if let Some(error) = &outcome.error {
                warn!("KSK {} of {} not verifiable: {}", key.key_tag(), zone_name, error);
            }
            audited.push(self.assess_key(zone_name, key, KeyRole::Ksk, outcome));
        }

        let authoritative_ns = match &self.survey {
            Some(survey) => survey.survey(zone_name).await,
            None => Vec::new(),
        };

        let zone = Zone {
            fqdn: zone_name.to_string(),
            validation: sections.all_ok(),
            validates_answer: sections.answer_ok,
            validates_ns: sections.ns_ok,
            validates_extra: sections.extra_ok,
            validation_error_answer: sections.answer_error,
            validation_error_ns: sections.ns_error,
            validation_error_extra: sections.extra_error,
            nsec3: nsec3.present,
            nsec3_iterations: nsec3.iterations,
            key_count: audited.len(),
            running_rollover: keys.running_rollover(),
            keys: audited,
            authoritative_ns,
        };
        (zone, keys)
    }

    async fn fetch_keys(&self, zone_name: &str) -> DnskeySet {
        match self.transport.query(zone_name, DNSResourceType::DNSKEY).await {
            Ok(response) => {
                let keys = DnskeySet::from_packet(&response, zone_name);
                debug!(
                    "{} publishes {} ZSK(s), {} KSK(s), {} revoked",
                    zone_name,
                    keys.zsk.len(),
                    keys.ksk.len(),
                    keys.revoked.len()
                );
                keys
            }
            Err(e) => {
                warn!("DNSKEY query for {} failed: {}", zone_name, e);
                DnskeySet::default()
            }
        }
    }

    fn assess_key(&self, zone_name: &str, key: &Dnskey, role: KeyRole, ds: DsOutcome) -> Key {
        let (key_length, length_error) = match key_length_for(key.algorithm, &key.public_key) {
            Ok(bits) => (Some(bits), None),
            Err(e) => {
                debug!("Cannot decode length of key {} at {}: {}", key.key_tag(), zone_name, e);
                (None, Some(e.to_string()))
            }
        };
        let verdict = classify(key.algorithm, key_length);

        Key {
            verifiable: ds.verifiable,
            trust_anchor: ds.trust_anchor,
            configured_anchor: self.anchors.matches(zone_name, key),
            role,
            key_tag: key.key_tag(),
            algorithm: key.algorithm,
            hash: verdict.hash.to_string(),
            hash_comment: verdict.hash_comment,
            hash_until: verdict.hash_until.to_string(),
            key_length,
            algorithm_comment: verdict.algorithm_comment,
            algorithm_until: verdict.algorithm_until.to_string(),
            error: ds.error.or(length_error),
        }
    }
}
