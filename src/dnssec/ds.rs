use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::rrset::ds_records;
use super::{DigestType, DnsSecError, errors::Result};
use crate::dns::enums::{DNSResourceType, ResponseCode};
use crate::dns::name;
use crate::dns::rdata::{Dnskey, Ds};
use crate::error::DnsError;
use crate::resolver::QueryTransport;

/// Digest of a DNSKEY as published in a DS record (RFC 4034 5.1.4):
/// `digest(owner name | DNSKEY RDATA)`, owner in canonical wire form.
pub fn compute_ds_digest(owner: &str, key: &Dnskey, digest_type: u8) -> Result<Vec<u8>> {
    let digest_type = DigestType::from_u8(digest_type)
        .filter(DigestType::is_supported)
        .ok_or(DnsSecError::UnsupportedDigestType(digest_type))?;

    let mut data = name::to_wire(owner);
    data.extend(key.to_rdata());

    digest_type
        .digest(&data)
        .ok_or(DnsSecError::UnsupportedDigestType(digest_type.to_u8()))
}

/// Check `key` against a DS RRset for `zone`.
///
/// Records are filtered by key tag; any record whose digest matches exactly
/// verifies the key. Digest types that cannot be computed count as a mismatch.
pub fn match_ds(zone: &str, key: &Dnskey, ds_set: &[Ds]) -> Result<()> {
    let key_tag = key.key_tag();
    let candidates: Vec<&Ds> = ds_set.iter().filter(|ds| ds.key_tag == key_tag).collect();

    if candidates.is_empty() {
        return Err(DnsSecError::NoMatchingDs {
            zone: zone.to_string(),
            key_tag,
        });
    }

    for ds in candidates {
        if let Some(expected) = DigestType::from_u8(ds.digest_type).map(|t| t.digest_len())
            && ds.digest.len() != expected
        {
            debug!(
                "DS for {} key {} carries a {} byte digest, expected {}",
                zone,
                key_tag,
                ds.digest.len(),
                expected
            );
            continue;
        }
        match compute_ds_digest(zone, key, ds.digest_type) {
            Ok(digest) if digest == ds.digest => {
                debug!("KSK {} of {} matches DS (digest type {})", key_tag, zone, ds.digest_type);
                return Ok(());
            }
            Ok(digest) => trace!(
                "DS digest type {} for {} does not match: computed {}, published {}",
                ds.digest_type,
                key_tag,
                hex::encode(&digest),
                hex::encode(&ds.digest)
            ),
            Err(e) => debug!("Cannot compare DS for {} key {}: {}", zone, key_tag, e),
        }
    }

    Err(DnsSecError::DigestMismatch {
        zone: zone.to_string(),
        key_tag,
        algorithm: key.algorithm,
    })
}

/// Verifies key-signing keys against the DS records published for their zone
pub struct DsVerifier {
    transport: Arc<dyn QueryTransport>,
}

impl DsVerifier {
    pub fn new(transport: Arc<dyn QueryTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the DS RRset for `zone`.
    ///
    /// NODATA and NXDOMAIN answers mean no DS is published and yield an empty
    /// set. Any other failure is an error, since nothing is known about the
    /// parent's delegation.
    pub async fn fetch_ds(&self, zone: &str) -> Result<Vec<Ds>> {
        match self.transport.query(zone, DNSResourceType::DS).await {
            Ok(response) => Ok(ds_records(&response, zone)),
            Err(DnsError::ServerFailure { rcode })
                if ResponseCode::from_u8(rcode) == ResponseCode::NameError =>
            {
                debug!("No DS for {}: name does not exist", zone);
                Ok(Vec::new())
            }
            Err(e) => {
                warn!("DS query for {} failed: {}", zone, e);
                Err(DnsSecError::DsQueryFailed {
                    zone: zone.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    pub async fn verify_ksk(&self, zone: &str, key: &Dnskey) -> Result<()> {
        let ds_set = self.fetch_ds(zone).await?;
        match_ds(zone, key, &ds_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    const ROOT_KSK_2017: &str = "AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3+/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kvArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+eoZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfdRUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwNR1AkUTV74bU=";

    fn root_ksk() -> Dnskey {
        Dnskey {
            flags: 257,
            protocol: 3,
            algorithm: 8,
            public_key: STANDARD.decode(ROOT_KSK_2017).unwrap(),
        }
    }

    fn root_ds() -> Ds {
        Ds {
            key_tag: 20326,
            algorithm: 8,
            digest_type: 2,
            digest: hex::decode("E06D44B80B8F1D39A95C0B0D7C65D08458E880409BBC683457104237C7F8EC8D")
                .unwrap(),
        }
    }

    #[test]
    fn test_root_ksk_digest() {
        let digest = compute_ds_digest(".", &root_ksk(), 2).unwrap();
        assert_eq!(digest, root_ds().digest);
    }

    #[test]
    fn test_match_ds() {
        assert!(match_ds(".", &root_ksk(), &[root_ds()]).is_ok());
    }

    #[test]
    fn test_no_ds_with_tag() {
        let mut other = root_ds();
        other.key_tag = 19036;
        assert_eq!(
            match_ds(".", &root_ksk(), &[other]),
            Err(DnsSecError::NoMatchingDs {
                zone: ".".to_string(),
                key_tag: 20326
            })
        );
        assert!(matches!(
            match_ds(".", &root_ksk(), &[]),
            Err(DnsSecError::NoMatchingDs { .. })
        ));
    }

    #[test]
    fn test_truncated_digest_is_a_mismatch() {
        let mut short = root_ds();
        short.digest.truncate(20);
        assert!(matches!(
            match_ds(".", &root_ksk(), &[short]),
            Err(DnsSecError::DigestMismatch { .. })
        ));
        assert_eq!(
            compute_ds_digest(".", &root_ksk(), 3),
            Err(DnsSecError::UnsupportedDigestType(3))
        );
    }

    #[test]
    fn test_any_matching_record_verifies() {
        let mut stale = root_ds();
        stale.digest[0] ^= 0xFF;
        let mut gost = root_ds();
        gost.digest_type = 3;
        assert!(match_ds(".", &root_ksk(), &[stale.clone(), gost.clone(), root_ds()]).is_ok());

        assert!(matches!(
            match_ds(".", &root_ksk(), &[stale, gost]),
            Err(DnsSecError::DigestMismatch { key_tag: 20326, algorithm: 8, .. })
        ));
    }
}
