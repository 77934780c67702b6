//! Recover the effective key length of a DNSKEY public key blob.
//!
//! RSA keys (RFC 3110) carry an exponent length prefix followed by exponent
//! and modulus; DSA keys (RFC 2536) encode their size in the leading `T`
//! byte. Elliptic curve and EdDSA keys have a size fixed by the algorithm.

use super::{DnsSecAlgorithm, DnsSecError, errors::Result};

/// Public key encoding families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Rsa,
    Dsa,
    EcdsaP256,
    EcdsaP384,
    Ed25519,
    Ed448,
    Unknown,
}

impl KeyFamily {
    pub fn from_algorithm(algorithm: u8) -> Self {
        DnsSecAlgorithm::from_u8(algorithm)
            .map(|alg| alg.family())
            .unwrap_or(KeyFamily::Unknown)
    }
}

/// Split an RFC 3110 RSA public key into `(exponent, modulus)`.
pub fn rsa_components(raw: &[u8]) -> Result<(&[u8], &[u8])> {
    let (exponent_len, header_len) = match raw.first() {
        None => return Err(DnsSecError::MalformedKey("empty RSA key".to_string())),
        Some(0) => {
            let len = raw.get(1..3).ok_or_else(|| {
                DnsSecError::MalformedKey("RSA key too short for long exponent length".to_string())
            })?;
            (u16::from_be_bytes([len[0], len[1]]) as usize, 3)
        }
        Some(&len) => (len as usize, 1),
    };

    let modulus_start = header_len + exponent_len;
    if modulus_start >= raw.len() {
        return Err(DnsSecError::MalformedKey(format!(
            "RSA exponent of {} bytes leaves no modulus in a {} byte key",
            exponent_len,
            raw.len()
        )));
    }

    Ok((&raw[header_len..modulus_start], &raw[modulus_start..]))
}

/// Key length in bits of a DNSKEY public key of the given family.
pub fn decode_key_length(raw: &[u8], family: KeyFamily) -> Result<u32> {
    match family {
        KeyFamily::Rsa => {
            let (_, modulus) = rsa_components(raw)?;
            Ok(modulus.len() as u32 * 8)
        }
        KeyFamily::Dsa => {
            let t = *raw
                .first()
                .ok_or_else(|| DnsSecError::MalformedKey("empty DSA key".to_string()))?;
            if t > 8 {
                return Err(DnsSecError::MalformedKey(format!("DSA T value {} above 8", t)));
            }
            // T, Q (20 bytes), then P, G and Y of 64 + 8T bytes each
            let component = 64 + 8 * t as usize;
            let expected = 1 + 20 + 3 * component;
            if raw.len() < expected {
                return Err(DnsSecError::MalformedKey(format!(
                    "DSA key is {} bytes, expected {}",
                    raw.len(),
                    expected
                )));
            }
            Ok(component as u32 * 8)
        }
        KeyFamily::EcdsaP256 => Ok(256),
        KeyFamily::EcdsaP384 => Ok(384),
        KeyFamily::Ed25519 => Ok(256),
        KeyFamily::Ed448 => Ok(456),
        KeyFamily::Unknown => Err(DnsSecError::MalformedKey(
            "unknown key family, length cannot be decoded".to_string(),
        )),
    }
}

/// Key length of a DNSKEY of signing algorithm `algorithm`. Algorithms
/// without a known key encoding are reported as unsupported.
pub fn key_length_for(algorithm: u8, raw: &[u8]) -> Result<u32> {
    match KeyFamily::from_algorithm(algorithm) {
        KeyFamily::Unknown => Err(DnsSecError::UnsupportedAlgorithm(algorithm)),
        family => decode_key_length(raw, family),
    }
}
