//! Partition responses into RRsets and signing keys.

use tracing::{debug, trace};

use crate::dns::DNSPacket;
use crate::dns::enums::DNSResourceType;
use crate::dns::rdata::{Dnskey, Ds, KSK_FLAGS, Rrsig, ZSK_FLAGS};
use crate::dns::resource::DNSResource;

/// DNSKEYs published at a zone apex, split by role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnskeySet {
    pub zsk: Vec<Dnskey>,
    pub ksk: Vec<Dnskey>,
    /// Keys carrying the RFC 5011 revoke bit
    pub revoked: Vec<Dnskey>,
}

impl DnskeySet {
    /// Collect the DNSKEY answers owned by `owner`. RRSIGs and records of any
    /// other type or owner are skipped, as are keys that fail to parse.
    pub fn from_packet(packet: &DNSPacket, owner: &str) -> Self {
        let mut set = Self::default();

        for record in &packet.answers {
            if record.rtype != DNSResourceType::DNSKEY || !record.owned_by(owner) {
                continue;
            }
            let key = match Dnskey::parse(&record.rdata) {
                Ok(key) => key,
                Err(e) => {
                    debug!("Skipping unparsable DNSKEY at {}: {}", owner, e);
                    continue;
                }
            };

            if key.is_revoked() {
                trace!("Revoked key {} at {}", key.key_tag(), owner);
                set.revoked.push(key);
                continue;
            }
            match key.flags {
                ZSK_FLAGS => set.zsk.push(key),
                KSK_FLAGS => set.ksk.push(key),
                other => trace!("Ignoring DNSKEY with flags {} at {}", other, owner),
            }
        }

        set
    }

    pub fn len(&self) -> usize {
        self.zsk.len() + self.ksk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A zone is rolling keys when it publishes more than one key of a role
    /// or still carries a revoked key.
    pub fn running_rollover(&self) -> bool {
        self.zsk.len() > 1 || self.ksk.len() > 1 || !self.revoked.is_empty()
    }

    /// All published keys, revoked ones included
    pub fn all(&self) -> impl Iterator<Item = &Dnskey> {
        self.zsk.iter().chain(&self.ksk).chain(&self.revoked)
    }
}

/// DS records for `owner` in the answer section
pub fn ds_records(packet: &DNSPacket, owner: &str) -> Vec<Ds> {
    packet
        .answers
        .iter()
        .filter(|rr| rr.rtype == DNSResourceType::DS && rr.owned_by(owner))
        .filter_map(|rr| match Ds::parse(&rr.rdata) {
            Ok(ds) => Some(ds),
            Err(e) => {
                debug!("Skipping unparsable DS at {}: {}", owner, e);
                None
            }
        })
        .collect()
}

/// One RRset together with the signatures covering it
#[derive(Debug, Clone)]
pub struct RrSet<'a> {
    pub owner: String,
    pub rtype: DNSResourceType,
    pub records: Vec<&'a DNSResource>,
    pub signatures: Vec<Rrsig>,
}

/// Group a section into RRsets by owner and type, attaching the RRSIGs that
/// cover each set. Sets appear in first-seen order. RRSIGs without a matching
/// set are dropped, as is the OPT pseudo-record.
pub fn group_rrsets(section: &[DNSResource]) -> Vec<RrSet<'_>> {
    let mut sets: Vec<RrSet<'_>> = Vec::new();

    for record in section {
        if matches!(record.rtype, DNSResourceType::RRSIG | DNSResourceType::OPT) {
            continue;
        }
        let owner = record.name();
        match sets
            .iter_mut()
            .find(|set| set.owner == owner && set.rtype == record.rtype)
        {
            Some(set) => set.records.push(record),
            None => sets.push(RrSet {
                owner,
                rtype: record.rtype,
                records: vec![record],
                signatures: Vec::new(),
            }),
        }
    }

    for record in section.iter().filter(|rr| rr.rtype == DNSResourceType::RRSIG) {
        let Ok(rrsig) = Rrsig::parse(&record.rdata) else {
            debug!("Skipping unparsable RRSIG at {}", record.name());
            continue;
        };
        let covered = DNSResourceType::from(rrsig.type_covered);
        let owner = record.name();
        if let Some(set) = sets
            .iter_mut()
            .find(|set| set.owner == owner && set.rtype == covered)
        {
            set.signatures.push(rrsig);
        }
    }

    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dnskey_rr(owner: &str, flags: u16, key: &[u8]) -> DNSResource {
        let key = Dnskey {
            flags,
            protocol: 3,
            algorithm: 13,
            public_key: key.to_vec(),
        };
        DNSResource::new(owner, DNSResourceType::DNSKEY, 3600, key.to_rdata())
    }

    fn rrsig_rr(owner: &str, covered: DNSResourceType) -> DNSResource {
        let sig = Rrsig {
            type_covered: covered.into(),
            algorithm: 13,
            labels: 2,
            original_ttl: 3600,
            expiration: 0,
            inception: 0,
            key_tag: 1,
            signer_name: owner.to_string(),
            signature: vec![0; 64],
        };
        DNSResource::new(owner, DNSResourceType::RRSIG, 3600, sig.to_rdata())
    }

    #[test]
    fn test_dnskey_partition() {
        let mut packet = DNSPacket::default();
        packet.answers = vec![
            dnskey_rr("example.com.", 256, &[1]),
            dnskey_rr("example.com.", 257, &[2]),
            rrsig_rr("example.com.", DNSResourceType::DNSKEY),
            dnskey_rr("example.com.", 256, &[3]),
            dnskey_rr("other.com.", 257, &[4]),
        ];

        let set = DnskeySet::from_packet(&packet, "EXAMPLE.com");
        assert_eq!(set.zsk.len(), 2);
        assert_eq!(set.ksk.len(), 1);
        assert_eq!(set.len(), 3);
        assert!(set.running_rollover());
    }

    #[test]
    fn test_revoked_key_marks_rollover() {
        let mut packet = DNSPacket::default();
        packet.answers = vec![
            dnskey_rr("example.com.", 256, &[1]),
            dnskey_rr("example.com.", 257, &[2]),
        ];
        assert!(!DnskeySet::from_packet(&packet, "example.com.").running_rollover());

        packet.answers.push(dnskey_rr("example.com.", 257 | 0x0080, &[3]));
        let set = DnskeySet::from_packet(&packet, "example.com.");
        assert_eq!(set.len(), 2);
        assert_eq!(set.revoked.len(), 1);
        assert!(set.running_rollover());
    }

    #[test]
    fn test_ds_records() {
        let mut packet = DNSPacket::default();
        packet.answers = vec![
            DNSResource::new("example.com.", DNSResourceType::DS, 60, vec![0, 1, 8, 2, 0xAA]),
            rrsig_rr("example.com.", DNSResourceType::DS),
            DNSResource::new("example.com.", DNSResourceType::DS, 60, vec![0, 1]),
        ];
        let ds = ds_records(&packet, "example.com.");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].key_tag, 1);
    }

    #[test]
    fn test_group_rrsets() {
        let section = vec![
            DNSResource::new("example.com.", DNSResourceType::NS, 60, crate::dns::name::to_wire("a.ns.")),
            rrsig_rr("example.com.", DNSResourceType::NS),
            DNSResource::new("example.com.", DNSResourceType::NS, 60, crate::dns::name::to_wire("b.ns.")),
            DNSResource::new("a.ns.", DNSResourceType::A, 60, vec![192, 0, 2, 1]),
            rrsig_rr("orphan.com.", DNSResourceType::A),
        ];

        let sets = group_rrsets(&section);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].rtype, DNSResourceType::NS);
        assert_eq!(sets[0].records.len(), 2);
        assert_eq!(sets[0].signatures.len(), 1);
        assert_eq!(sets[1].owner, "a.ns.");
        assert!(sets[1].signatures.is_empty());
    }
}
