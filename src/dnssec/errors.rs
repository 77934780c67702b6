use thiserror::Error;

/// DNSSEC verification errors. None of these abort an audit; the chain
/// walker records them on the affected zone or key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DnsSecError {
    #[error("No DS record with key tag {key_tag} published for {zone}")]
    NoMatchingDs { zone: String, key_tag: u16 },

    #[error(
        "DS digest mismatch for {zone} KSK (tag {key_tag}, algorithm {algorithm}): no DS record with this key tag matches the key"
    )]
    DigestMismatch {
        zone: String,
        key_tag: u16,
        algorithm: u8,
    },

    #[error("Malformed public key: {0}")]
    MalformedKey(String),

    #[error("Unsupported DNSSEC algorithm: {0}")]
    UnsupportedAlgorithm(u8),

    #[error("Unsupported digest type: {0}")]
    UnsupportedDigestType(u8),

    #[error("Invalid RRSIG record")]
    InvalidSignature,

    #[error("No RRSIG covering {rtype} at {owner}")]
    NoRrsig { owner: String, rtype: String },

    #[error("No DNSKEY with tag {key_tag} published by {signer}")]
    NoDnsKey { signer: String, key_tag: u16 },

    #[error("DNSSEC signature has expired")]
    SignatureExpired,

    #[error("DNSSEC signature is not yet valid")]
    SignatureNotYetValid,

    #[error("Signature does not verify with the given key")]
    BadSignature,

    #[error("DNSSEC signature verification failed for {rtype} at {owner}")]
    SignatureVerificationFailed { owner: String, rtype: String },

    #[error("DS query for {zone} failed: {reason}")]
    DsQueryFailed { zone: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DnsSecError>;
