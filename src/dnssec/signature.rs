//! RRSIG verification over canonical RRsets (RFC 4034 3.1.8.1, 6.2, 6.3).

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

use super::{DnsSecAlgorithm, DnsSecError, errors::Result};
use crate::dns::common::labels_to_wire;
use crate::dns::rdata::{Dnskey, Rrsig};
use crate::dns::resource::DNSResource;

pub fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default()
}

/// The byte string an RRSIG signs: its own RDATA minus the signature,
/// followed by every record of the set in canonical form and order.
pub fn signed_data(rrsig: &Rrsig, rrset: &[&DNSResource]) -> Result<Vec<u8>> {
    let mut data = rrsig.signed_prefix();

    let mut rdatas = Vec::with_capacity(rrset.len());
    for record in rrset {
        let rdata = record
            .canonical_rdata()
            .map_err(|_| DnsSecError::InvalidSignature)?;
        rdatas.push(rdata);
    }
    rdatas.sort();
    rdatas.dedup();

    let Some(first) = rrset.first() else {
        return Ok(data);
    };

    // Wildcard expansion: the signature covers "*." plus the rightmost
    // `labels` labels of the owner
    let owner_labels = &first.labels;
    let owner = if (rrsig.labels as usize) < owner_labels.len() {
        let mut labels = vec!["*".to_string()];
        labels.extend_from_slice(&owner_labels[owner_labels.len() - rrsig.labels as usize..]);
        labels_to_wire(&labels)
    } else {
        labels_to_wire(owner_labels)
    };

    let rtype: u16 = first.rtype.into();
    let rclass: u16 = first.rclass.into();

    for rdata in rdatas {
        data.extend_from_slice(&owner);
        data.extend_from_slice(&rtype.to_be_bytes());
        data.extend_from_slice(&rclass.to_be_bytes());
        data.extend_from_slice(&rrsig.original_ttl.to_be_bytes());
        data.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        data.extend_from_slice(&rdata);
    }

    Ok(data)
}

/// `a < b` in serial number arithmetic (RFC 1982), as RRSIG timestamps wrap
fn serial_lt(a: u32, b: u32) -> bool {
    a != b && (b.wrapping_sub(a) as i32) > 0
}

fn check_validity_period(rrsig: &Rrsig, now: u32) -> Result<()> {
    if serial_lt(now, rrsig.inception) {
        return Err(DnsSecError::SignatureNotYetValid);
    }
    if serial_lt(rrsig.expiration, now) {
        return Err(DnsSecError::SignatureExpired);
    }
    Ok(())
}

/// Verify `rrsig` over `rrset` with whichever of `keys` it names.
pub fn verify_rrset(rrsig: &Rrsig, rrset: &[&DNSResource], keys: &[Dnskey], now: u32) -> Result<()> {
    check_validity_period(rrsig, now)?;

    let algorithm = DnsSecAlgorithm::from_u8(rrsig.algorithm)
        .ok_or(DnsSecError::UnsupportedAlgorithm(rrsig.algorithm))?;

    let candidates: Vec<&Dnskey> = keys
        .iter()
        .filter(|key| {
            key.is_zone_key()
                && key.algorithm == rrsig.algorithm
                && key.key_tag() == rrsig.key_tag
        })
        .collect();
    if candidates.is_empty() {
        return Err(DnsSecError::NoDnsKey {
            signer: rrsig.signer_name.clone(),
            key_tag: rrsig.key_tag,
        });
    }

    let message = signed_data(rrsig, rrset)?;
    let mut last_error = DnsSecError::BadSignature;
    for key in candidates {
        match algorithm.verify(&key.public_key, &message, &rrsig.signature) {
            Ok(()) => {
                trace!("RRSIG by {} key {} verified", rrsig.signer_name, rrsig.key_tag);
                return Ok(());
            }
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::DNSResourceType;
    use crate::dns::name;
    use ring::rand::SystemRandom;
    use ring::signature::{Ed25519KeyPair, KeyPair};

    fn keypair() -> (Ed25519KeyPair, Dnskey) {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let key = Dnskey {
            flags: 256,
            protocol: 3,
            algorithm: 15,
            public_key: pair.public_key().as_ref().to_vec(),
        };
        (pair, key)
    }

    fn ns_set() -> Vec<DNSResource> {
        vec![
            DNSResource::new("Example.com.", DNSResourceType::NS, 300, name::to_wire("b.iana-servers.net.")),
            DNSResource::new("example.com.", DNSResourceType::NS, 300, name::to_wire("A.iana-servers.net.")),
        ]
    }

    fn sign(pair: &Ed25519KeyPair, key: &Dnskey, records: &[&DNSResource]) -> Rrsig {
        let mut rrsig = Rrsig {
            type_covered: DNSResourceType::NS.into(),
            algorithm: 15,
            labels: 2,
            original_ttl: 3600,
            expiration: 2_000_000_000,
            inception: 1_000_000_000,
            key_tag: key.key_tag(),
            signer_name: "example.com.".to_string(),
            signature: Vec::new(),
        };
        let data = signed_data(&rrsig, records).unwrap();
        rrsig.signature = pair.sign(&data).as_ref().to_vec();
        rrsig
    }

    #[test]
    fn test_verify_rrset() {
        let (pair, key) = keypair();
        let records = ns_set();
        let refs: Vec<&DNSResource> = records.iter().collect();
        let rrsig = sign(&pair, &key, &refs);

        assert!(verify_rrset(&rrsig, &refs, &[key.clone()], 1_500_000_000).is_ok());

        // canonical ordering makes the record order irrelevant
        let reversed: Vec<&DNSResource> = records.iter().rev().collect();
        assert!(verify_rrset(&rrsig, &reversed, &[key], 1_500_000_000).is_ok());
    }

    #[test]
    fn test_tampered_rrset_fails() {
        let (pair, key) = keypair();
        let records = ns_set();
        let refs: Vec<&DNSResource> = records.iter().collect();
        let rrsig = sign(&pair, &key, &refs);

        let tampered = [records[0].clone()];
        let tampered_refs: Vec<&DNSResource> = tampered.iter().collect();
        assert_eq!(
            verify_rrset(&rrsig, &tampered_refs, &[key], 1_500_000_000),
            Err(DnsSecError::BadSignature)
        );
    }

    #[test]
    fn test_validity_period_wraps() {
        let (pair, key) = keypair();
        let records = ns_set();
        let refs: Vec<&DNSResource> = records.iter().collect();
        let mut rrsig = sign(&pair, &key, &refs);
        rrsig.inception = u32::MAX - 100;
        rrsig.expiration = 1_000;

        assert!(check_validity_period(&rrsig, u32::MAX).is_ok());
        assert!(check_validity_period(&rrsig, 10).is_ok());
        assert_eq!(
            check_validity_period(&rrsig, 2_000),
            Err(DnsSecError::SignatureExpired)
        );
        assert_eq!(
            check_validity_period(&rrsig, u32::MAX - 200),
            Err(DnsSecError::SignatureNotYetValid)
        );
    }

    #[test]
    fn test_validity_period_and_missing_key() {
        let (pair, key) = keypair();
        let records = ns_set();
        let refs: Vec<&DNSResource> = records.iter().collect();
        let rrsig = sign(&pair, &key, &refs);

        assert_eq!(
            verify_rrset(&rrsig, &refs, &[key.clone()], 2_100_000_000),
            Err(DnsSecError::SignatureExpired)
        );
        assert_eq!(
            verify_rrset(&rrsig, &refs, &[key], 900_000_000),
            Err(DnsSecError::SignatureNotYetValid)
        );
        assert!(matches!(
            verify_rrset(&rrsig, &refs, &[], 1_500_000_000),
            Err(DnsSecError::NoDnsKey { .. })
        ));
    }

    #[test]
    fn test_wildcard_owner() {
        let record = DNSResource::new("a.b.example.com.", DNSResourceType::A, 60, vec![192, 0, 2, 1]);
        let rrsig = Rrsig {
            type_covered: 1,
            algorithm: 15,
            labels: 2,
            original_ttl: 60,
            expiration: 0,
            inception: 0,
            key_tag: 0,
            signer_name: "example.com.".to_string(),
            signature: Vec::new(),
        };
        let data = signed_data(&rrsig, &[&record]).unwrap();
        let owner = name::to_wire("*.example.com.");
        let prefix_len = rrsig.signed_prefix().len();
        assert_eq!(&data[prefix_len..prefix_len + owner.len()], owner.as_slice());
    }
}
