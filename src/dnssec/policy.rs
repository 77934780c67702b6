//! Algorithm and key length compliance policy.
//!
//! Verdicts follow the BSI TR-02102-2 recommendations: each DNSSEC signing
//! algorithm maps to a hash family and a rule for judging the key length.
//! The table is static data; `classify` is a pure lookup over it.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Compliance {
    #[serde(rename = "COMPLIANT")]
    Compliant,
    #[serde(rename = "COMPLIANT (WEAK)")]
    CompliantWeak,
    #[serde(rename = "NON-COMPLIANT")]
    NonCompliant,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl fmt::Display for Compliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compliant => write!(f, "COMPLIANT"),
            Self::CompliantWeak => write!(f, "COMPLIANT (WEAK)"),
            Self::NonCompliant => write!(f, "NON-COMPLIANT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// How the key length of an algorithm is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    Rsa,
    Dsa,
    Ecdsa,
    /// Length fixed by the algorithm, always acceptable
    Fixed,
    /// Algorithm is unacceptable whatever the length
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyEntry {
    pub algorithm: u8,
    pub hash: &'static str,
    pub hash_comment: Compliance,
    pub hash_until: &'static str,
    pub length_rule: LengthRule,
}

/// Outcome of classifying one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub hash: &'static str,
    pub hash_comment: Compliance,
    pub hash_until: &'static str,
    pub algorithm_comment: Compliance,
    pub algorithm_until: &'static str,
}

const VALID_LONG_TERM: &str = "2030+";
const VALID_2022: &str = "2022";
const NOT_VALID: &str = "-";

const RSA_LONG_TERM_BITS: u32 = 3072;
const RSA_MIN_BITS: u32 = 2048;
const DSA_LONG_TERM_BITS: u32 = 3000;
const DSA_MIN_BITS: u32 = 2000;
const ECDSA_MIN_BITS: u32 = 250;

pub static POLICY: &[PolicyEntry] = &[
    PolicyEntry {
        algorithm: 1,
        hash: "MD5",
        hash_comment: Compliance::NonCompliant,
        hash_until: NOT_VALID,
        length_rule: LengthRule::Rejected,
    },
    PolicyEntry {
        algorithm: 3,
        hash: "SHA-1",
        hash_comment: Compliance::Compliant,
        hash_until: VALID_2022,
        length_rule: LengthRule::Dsa,
    },
    PolicyEntry {
        algorithm: 5,
        hash: "SHA-1",
        hash_comment: Compliance::CompliantWeak,
        hash_until: VALID_2022,
        length_rule: LengthRule::Rsa,
    },
    PolicyEntry {
        algorithm: 6,
        hash: "SHA-1",
        hash_comment: Compliance::CompliantWeak,
        hash_until: VALID_2022,
        length_rule: LengthRule::Dsa,
    },
    PolicyEntry {
        algorithm: 7,
        hash: "SHA-1",
        hash_comment: Compliance::CompliantWeak,
        hash_until: VALID_2022,
        length_rule: LengthRule::Rsa,
    },
    PolicyEntry {
        algorithm: 8,
        hash: "SHA-256",
        hash_comment: Compliance::Compliant,
        hash_until: VALID_LONG_TERM,
        length_rule: LengthRule::Rsa,
    },
    PolicyEntry {
        algorithm: 10,
        hash: "SHA-512",
        hash_comment: Compliance::Compliant,
        hash_until: VALID_LONG_TERM,
        length_rule: LengthRule::Rsa,
    },
    PolicyEntry {
        algorithm: 13,
        hash: "None",
        hash_comment: Compliance::Compliant,
        hash_until: VALID_LONG_TERM,
        length_rule: LengthRule::Ecdsa,
    },
    PolicyEntry {
        algorithm: 14,
        hash: "None",
        hash_comment: Compliance::Compliant,
        hash_until: VALID_LONG_TERM,
        length_rule: LengthRule::Ecdsa,
    },
    PolicyEntry {
        algorithm: 15,
        hash: "None",
        hash_comment: Compliance::Compliant,
        hash_until: VALID_LONG_TERM,
        length_rule: LengthRule::Fixed,
    },
    PolicyEntry {
        algorithm: 16,
        hash: "None",
        hash_comment: Compliance::Compliant,
        hash_until: VALID_LONG_TERM,
        length_rule: LengthRule::Fixed,
    },
];

pub fn entry(algorithm: u8) -> Option<&'static PolicyEntry> {
    POLICY.iter().find(|e| e.algorithm == algorithm)
}

impl LengthRule {
    fn judge(self, bits: Option<u32>) -> (Compliance, &'static str) {
        let tiers: &[(u32, &'static str)] = match self {
            Self::Rejected => return (Compliance::NonCompliant, NOT_VALID),
            Self::Fixed => return (Compliance::Compliant, VALID_LONG_TERM),
            Self::Rsa => &[(RSA_LONG_TERM_BITS, VALID_LONG_TERM), (RSA_MIN_BITS, VALID_2022)],
            Self::Dsa => &[(DSA_LONG_TERM_BITS, VALID_LONG_TERM), (DSA_MIN_BITS, VALID_2022)],
            Self::Ecdsa => &[(ECDSA_MIN_BITS, VALID_LONG_TERM)],
        };

        let Some(bits) = bits else {
            return (Compliance::Unknown, NOT_VALID);
        };

        tiers
            .iter()
            .find(|(min, _)| bits >= *min)
            .map(|(_, until)| (Compliance::Compliant, *until))
            .unwrap_or((Compliance::NonCompliant, NOT_VALID))
    }
}

/// Classify a signing key by algorithm number and decoded key length.
pub fn classify(algorithm: u8, bits: Option<u32>) -> Verdict {
    match entry(algorithm) {
        Some(entry) => {
            let (algorithm_comment, algorithm_until) = entry.length_rule.judge(bits);
            Verdict {
                hash: entry.hash,
                hash_comment: entry.hash_comment,
                hash_until: entry.hash_until,
                algorithm_comment,
                algorithm_until,
            }
        }
        None => Verdict {
            hash: "UNKNOWN",
            hash_comment: Compliance::Unknown,
            hash_until: NOT_VALID,
            algorithm_comment: Compliance::Unknown,
            algorithm_until: NOT_VALID,
        },
    }
}
