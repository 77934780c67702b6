use std::fmt;

use ring::signature;

use super::key_length::{KeyFamily, rsa_components};
use super::{DnsSecError, errors::Result};

/// DNSSEC Algorithm numbers (RFC 4034, 5155, 5702, 5933, 6605, 8080, 8624)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DnsSecAlgorithm {
    /// Delete DS (RFC 8078)
    DeleteDS = 0,
    /// RSA/MD5 (deprecated)
    RsaMd5 = 1,
    /// Diffie-Hellman (deprecated)
    DH = 2,
    /// DSA/SHA1 (RFC 2536)
    DSA = 3,
    /// RSA/SHA-1 (RFC 3110)
    RsaSha1 = 5,
    /// DSA-NSEC3-SHA1 (RFC 5155)
    DsaNsec3Sha1 = 6,
    /// RSASHA1-NSEC3-SHA1 (RFC 5155)
    RsaSha1Nsec3Sha1 = 7,
    /// RSA/SHA-256 (RFC 5702)
    RsaSha256 = 8,
    /// RSA/SHA-512 (RFC 5702)
    RsaSha512 = 10,
    /// GOST R 34.10-2001 (RFC 5933)
    EccGost = 12,
    /// ECDSA Curve P-256 with SHA-256 (RFC 6605)
    EcdsaP256Sha256 = 13,
    /// ECDSA Curve P-384 with SHA-384 (RFC 6605)
    EcdsaP384Sha384 = 14,
    /// Ed25519 (RFC 8080)
    Ed25519 = 15,
    /// Ed448 (RFC 8080)
    Ed448 = 16,
    /// Indirect (RFC 4034)
    Indirect = 252,
    /// Private algorithm (RFC 4034)
    PrivateDNS = 253,
    /// Private algorithm OID (RFC 4034)
    PrivateOID = 254,
}

impl DnsSecAlgorithm {
    /// Create from algorithm number
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::DeleteDS),
            1 => Some(Self::RsaMd5),
            2 => Some(Self::DH),
            3 => Some(Self::DSA),
            5 => Some(Self::RsaSha1),
            6 => Some(Self::DsaNsec3Sha1),
            7 => Some(Self::RsaSha1Nsec3Sha1),
            8 => Some(Self::RsaSha256),
            10 => Some(Self::RsaSha512),
            12 => Some(Self::EccGost),
            13 => Some(Self::EcdsaP256Sha256),
            14 => Some(Self::EcdsaP384Sha384),
            15 => Some(Self::Ed25519),
            16 => Some(Self::Ed448),
            252 => Some(Self::Indirect),
            253 => Some(Self::PrivateDNS),
            254 => Some(Self::PrivateOID),
            _ => None,
        }
    }

    /// Convert to algorithm number
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Public key encoding family of this algorithm
    pub fn family(&self) -> KeyFamily {
        match self {
            Self::RsaMd5
            | Self::RsaSha1
            | Self::RsaSha1Nsec3Sha1
            | Self::RsaSha256
            | Self::RsaSha512 => KeyFamily::Rsa,
            Self::DSA | Self::DsaNsec3Sha1 => KeyFamily::Dsa,
            Self::EcdsaP256Sha256 => KeyFamily::EcdsaP256,
            Self::EcdsaP384Sha384 => KeyFamily::EcdsaP384,
            Self::Ed25519 => KeyFamily::Ed25519,
            Self::Ed448 => KeyFamily::Ed448,
            _ => KeyFamily::Unknown,
        }
    }

    /// Check if signatures of this algorithm can be verified
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::RsaSha1
                | Self::RsaSha1Nsec3Sha1
                | Self::RsaSha256
                | Self::RsaSha512
                | Self::EcdsaP256Sha256
                | Self::EcdsaP384Sha384
                | Self::Ed25519
        )
    }

    /// Verify `sig` over `message` with a DNSKEY public key blob of this
    /// algorithm.
    pub fn verify(&self, public_key: &[u8], message: &[u8], sig: &[u8]) -> Result<()> {
        let verified = match self {
            Self::RsaSha1 | Self::RsaSha1Nsec3Sha1 | Self::RsaSha256 | Self::RsaSha512 => {
                let (e, n) = rsa_components(public_key)?;
                let params = match self {
                    Self::RsaSha256 => &signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
                    Self::RsaSha512 => &signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
                    _ => &signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
                };
                signature::RsaPublicKeyComponents { n, e }.verify(params, message, sig)
            }
            Self::EcdsaP256Sha256 | Self::EcdsaP384Sha384 => {
                // DNSSEC carries the bare point; ring wants SEC1 uncompressed form
                let mut point = Vec::with_capacity(public_key.len() + 1);
                point.push(0x04);
                point.extend_from_slice(public_key);
                let alg = if *self == Self::EcdsaP256Sha256 {
                    &signature::ECDSA_P256_SHA256_FIXED
                } else {
                    &signature::ECDSA_P384_SHA384_FIXED
                };
                signature::UnparsedPublicKey::new(alg, &point).verify(message, sig)
            }
            Self::Ed25519 => {
                signature::UnparsedPublicKey::new(&signature::ED25519, public_key)
                    .verify(message, sig)
            }
            other => return Err(DnsSecError::UnsupportedAlgorithm(other.to_u8())),
        };

        verified.map_err(|_| DnsSecError::BadSignature)
    }
}

impl fmt::Display for DnsSecAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteDS => write!(f, "DELETE"),
            Self::RsaMd5 => write!(f, "RSAMD5"),
            Self::DH => write!(f, "DH"),
            Self::DSA => write!(f, "DSA"),
            Self::RsaSha1 => write!(f, "RSASHA1"),
            Self::DsaNsec3Sha1 => write!(f, "DSA-NSEC3-SHA1"),
            Self::RsaSha1Nsec3Sha1 => write!(f, "RSASHA1-NSEC3-SHA1"),
            Self::RsaSha256 => write!(f, "RSASHA256"),
            Self::RsaSha512 => write!(f, "RSASHA512"),
            Self::EccGost => write!(f, "ECC-GOST"),
            Self::EcdsaP256Sha256 => write!(f, "ECDSAP256SHA256"),
            Self::EcdsaP384Sha384 => write!(f, "ECDSAP384SHA384"),
            Self::Ed25519 => write!(f, "ED25519"),
            Self::Ed448 => write!(f, "ED448"),
            Self::Indirect => write!(f, "INDIRECT"),
            Self::PrivateDNS => write!(f, "PRIVATEDNS"),
            Self::PrivateOID => write!(f, "PRIVATEOID"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::rand::SystemRandom;
    use ring::signature::{Ed25519KeyPair, KeyPair};

    #[test]
    fn test_algorithm_conversion() {
        assert_eq!(DnsSecAlgorithm::from_u8(8), Some(DnsSecAlgorithm::RsaSha256));
        assert_eq!(DnsSecAlgorithm::from_u8(4), None);
        assert_eq!(DnsSecAlgorithm::from_u8(200), None);
        assert_eq!(DnsSecAlgorithm::Ed25519.to_u8(), 15);
        assert_eq!(DnsSecAlgorithm::DsaNsec3Sha1.to_string(), "DSA-NSEC3-SHA1");
    }

    #[test]
    fn test_families() {
        assert_eq!(DnsSecAlgorithm::RsaMd5.family(), KeyFamily::Rsa);
        assert_eq!(DnsSecAlgorithm::DsaNsec3Sha1.family(), KeyFamily::Dsa);
        assert_eq!(DnsSecAlgorithm::EcdsaP384Sha384.family(), KeyFamily::EcdsaP384);
        assert_eq!(DnsSecAlgorithm::EccGost.family(), KeyFamily::Unknown);
    }

    #[test]
    fn test_ed25519_verify() {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let sig = pair.sign(b"signed data");

        let alg = DnsSecAlgorithm::Ed25519;
        assert!(alg.verify(pair.public_key().as_ref(), b"signed data", sig.as_ref()).is_ok());
        assert!(alg.verify(pair.public_key().as_ref(), b"other data", sig.as_ref()).is_err());
    }

    #[test]
    fn test_unsupported_algorithm() {
        let err = DnsSecAlgorithm::Ed448.verify(&[0; 57], b"x", b"y").unwrap_err();
        assert_eq!(err, DnsSecError::UnsupportedAlgorithm(16));
    }
}
