//! Typed views of the DNSSEC record types (RFC 4034, RFC 5155).

use super::{ParseError, common::parse_domain_name, name};
use crate::dnssec::calculate_key_tag;

/// DNSKEY flags of a zone-signing key
pub const ZSK_FLAGS: u16 = 256;
/// DNSKEY flags of a key-signing key (zone key + SEP)
pub const KSK_FLAGS: u16 = 257;

const FLAG_ZONE: u16 = 0x0100;
const FLAG_REVOKE: u16 = 0x0080;
const FLAG_SEP: u16 = 0x0001;

/// The only protocol value DNSSEC allows (RFC 4034 2.1.2)
pub const DNSSEC_PROTOCOL: u8 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dnskey {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

impl Dnskey {
    pub fn parse(rdata: &[u8]) -> Result<Self, ParseError> {
        if rdata.len() < 4 {
            return Err(ParseError::Truncated);
        }

        Ok(Self {
            flags: u16::from_be_bytes([rdata[0], rdata[1]]),
            protocol: rdata[2],
            algorithm: rdata[3],
            public_key: rdata[4..].to_vec(),
        })
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut rdata = Vec::with_capacity(4 + self.public_key.len());
        rdata.extend_from_slice(&self.flags.to_be_bytes());
        rdata.push(self.protocol);
        rdata.push(self.algorithm);
        rdata.extend_from_slice(&self.public_key);
        rdata
    }

    pub fn key_tag(&self) -> u16 {
        calculate_key_tag(self.flags, self.protocol, self.algorithm, &self.public_key)
    }

    pub fn is_zone_key(&self) -> bool {
        self.flags & FLAG_ZONE != 0
    }

    pub fn is_sep(&self) -> bool {
        self.flags & FLAG_SEP != 0
    }

    /// RFC 5011 revoke bit, set on keys being rolled out
    pub fn is_revoked(&self) -> bool {
        self.flags & FLAG_REVOKE != 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

impl Ds {
    pub fn parse(rdata: &[u8]) -> Result<Self, ParseError> {
        if rdata.len() < 4 {
            return Err(ParseError::Truncated);
        }

        Ok(Self {
            key_tag: u16::from_be_bytes([rdata[0], rdata[1]]),
            algorithm: rdata[2],
            digest_type: rdata[3],
            digest: rdata[4..].to_vec(),
        })
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut rdata = Vec::with_capacity(4 + self.digest.len());
        rdata.extend_from_slice(&self.key_tag.to_be_bytes());
        rdata.push(self.algorithm);
        rdata.push(self.digest_type);
        rdata.extend_from_slice(&self.digest);
        rdata
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rrsig {
    pub type_covered: u16,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    /// Signer's name, fully qualified and lowercased
    pub signer_name: String,
    pub signature: Vec<u8>,
}

impl Rrsig {
    pub fn parse(rdata: &[u8]) -> Result<Self, ParseError> {
        if rdata.len() < 19 {
            return Err(ParseError::Truncated);
        }

        let (signer_labels, signature_start) = parse_domain_name(rdata, 18)?;

        Ok(Self {
            type_covered: u16::from_be_bytes([rdata[0], rdata[1]]),
            algorithm: rdata[2],
            labels: rdata[3],
            original_ttl: u32::from_be_bytes([rdata[4], rdata[5], rdata[6], rdata[7]]),
            expiration: u32::from_be_bytes([rdata[8], rdata[9], rdata[10], rdata[11]]),
            inception: u32::from_be_bytes([rdata[12], rdata[13], rdata[14], rdata[15]]),
            key_tag: u16::from_be_bytes([rdata[16], rdata[17]]),
            signer_name: name::labels_to_fqdn(&signer_labels),
            signature: rdata[signature_start..].to_vec(),
        })
    }

    /// RRSIG RDATA without the signature, signer name in canonical form.
    /// This is the prefix of the data covered by the signature.
    pub fn signed_prefix(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(18 + self.signer_name.len() + 1);
        data.extend_from_slice(&self.type_covered.to_be_bytes());
        data.push(self.algorithm);
        data.push(self.labels);
        data.extend_from_slice(&self.original_ttl.to_be_bytes());
        data.extend_from_slice(&self.expiration.to_be_bytes());
        data.extend_from_slice(&self.inception.to_be_bytes());
        data.extend_from_slice(&self.key_tag.to_be_bytes());
        data.extend(name::to_wire(&self.signer_name));
        data
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut rdata = self.signed_prefix();
        rdata.extend_from_slice(&self.signature);
        rdata
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nsec3Param {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
}

impl Nsec3Param {
    pub fn parse(rdata: &[u8]) -> Result<Self, ParseError> {
        if rdata.len() < 5 {
            return Err(ParseError::Truncated);
        }

        let salt_len = rdata[4] as usize;
        let salt = rdata
            .get(5..5 + salt_len)
            .ok_or(ParseError::Truncated)?
            .to_vec();

        Ok(Self {
            hash_algorithm: rdata[0],
            flags: rdata[1],
            iterations: u16::from_be_bytes([rdata[2], rdata[3]]),
            salt,
        })
    }
}
