//! Audit result model, serialized with the field names of the original
//! `dnssec.json` report format.

use std::fmt;

use serde::Serialize;

use crate::dnssec::Compliance;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Normalized, fully qualified name that was audited
    pub target: String,
    /// The target zone publishes at least one DNSKEY
    pub dnssec: bool,
    pub trust_island: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_island_anchor_zone: Option<String>,
    /// A trust anchor was reached, at the root or below it
    pub anchored: bool,
    /// Leaf to root, in visiting order
    pub zones: Vec<Zone>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub fqdn: String,
    pub validation: bool,
    pub validates_answer: bool,
    pub validates_ns: bool,
    pub validates_extra: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error_ns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error_extra: Option<String>,
    pub nsec3: bool,
    #[serde(rename = "nsec3iter")]
    pub nsec3_iterations: u16,
    #[serde(rename = "keycount")]
    pub key_count: usize,
    pub running_rollover: bool,
    pub keys: Vec<Key>,
    #[serde(rename = "authoritativeNS", skip_serializing_if = "Vec::is_empty")]
    pub authoritative_ns: Vec<Nameserver>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyRole {
    #[serde(rename = "ZSK")]
    Zsk,
    #[serde(rename = "KSK")]
    Ksk,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zsk => write!(f, "ZSK"),
            Self::Ksk => write!(f, "KSK"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    /// KSK digest matched a DS record in the parent
    #[serde(rename = "valid")]
    pub verifiable: bool,
    /// KSK has no DS record above it
    pub trust_anchor: bool,
    /// Key matches an entry of the configured trust anchor store
    pub configured_anchor: bool,
    #[serde(rename = "type")]
    pub role: KeyRole,
    pub key_tag: u16,
    #[serde(rename = "alg")]
    pub algorithm: u8,
    pub hash: String,
    #[serde(rename = "hComment")]
    pub hash_comment: Compliance,
    #[serde(rename = "hUntil")]
    pub hash_until: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_length: Option<u32>,
    #[serde(rename = "aComment")]
    pub algorithm_comment: Compliance,
    #[serde(rename = "aUntil")]
    pub algorithm_until: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Facts about one authoritative nameserver of a zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Nameserver {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Offers recursion
    pub resolver: bool,
    /// Answers with an EDNS0 OPT record
    pub edns0: bool,
}
