use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, warn};

use super::calculate_key_tag;
use crate::dns::name;
use crate::dns::rdata::{DNSSEC_PROTOCOL, Dnskey, KSK_FLAGS};
use crate::error::ConfigError;

/// Root zone KSKs published by IANA: KSK-2017 (tag 20326) and the retired
/// KSK-2010 (tag 19036)
const ROOT_ANCHORS: &[(u8, &str)] = &[
    (
        8,
        "AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3\
         +/4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kv\
         ArMtNROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF\
         0jLHwVN8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+e\
         oZG+SrDK6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfd\
         RUfhHdY6+cn8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwN\
         R1AkUTV74bU=",
    ),
    (
        8,
        "AwEAAagAIKlVZrpC6Ia7gEzahOR+9W29euxhJhVVLOyQbSEW0O8gcCjF\
         FVQUTf6v58fLjwBd0YI0EzrAcQqBGCzh/RStIoO8g0NfnfL2MTJRkxoX\
         bfDaUeVPQuYEhg37NZWAJQ9VnMVDxP/VHL496M/QZxkjf5/Efucp2gaD\
         X6RS6CXpoY68LsvPVjR0ZSwzz1apAzvN9dlzEheX7ICJBBtuA6G3LQpz\
         W5hOA2hzCTMjJPJ8LbqF6dsV6DoBQzgul0sGIcGOYl7OyQdXfZ57relS\
         Qageu+ipAdTTJ25AsRTAoub8ONGcLmqrAmRLKBP1dfwhYB4N7knNnulq\
         QxA+Uk1ihz0=",
    ),
];

/// A configured DNSSEC trust anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    /// Zone this anchor is for, fully qualified
    pub zone: String,
    pub key_tag: u16,
    pub key: Dnskey,
}

impl TrustAnchor {
    pub fn new(zone: &str, key: Dnskey) -> Self {
        Self {
            zone: name::canonical(zone),
            key_tag: calculate_key_tag(key.flags, key.protocol, key.algorithm, &key.public_key),
            key,
        }
    }

    pub fn is_ksk(&self) -> bool {
        self.key.is_sep()
    }
}

/// Trust anchor file entry
#[derive(Debug, Deserialize)]
struct AnchorEntry {
    zone: String,
    #[serde(default = "default_flags")]
    flags: u16,
    #[serde(default = "default_protocol")]
    protocol: u8,
    algorithm: u8,
    /// Base64 public key as in a DNSKEY presentation record
    public_key: String,
}

fn default_flags() -> u16 {
    KSK_FLAGS
}

fn default_protocol() -> u8 {
    DNSSEC_PROTOCOL
}

#[derive(Debug, Deserialize)]
struct AnchorFile {
    #[serde(default)]
    anchor: Vec<AnchorEntry>,
}

/// Known-good keys per zone
pub struct TrustAnchorStore {
    anchors: RwLock<HashMap<String, Vec<TrustAnchor>>>,
}

impl TrustAnchorStore {
    /// Store holding the root zone KSKs
    pub fn new() -> Self {
        let store = Self::empty();
        store.add_root_trust_anchors();
        store
    }

    pub fn empty() -> Self {
        Self {
            anchors: RwLock::new(HashMap::new()),
        }
    }

    fn add_root_trust_anchors(&self) {
        for (algorithm, encoded) in ROOT_ANCHORS {
            let compact: String = encoded.split_whitespace().collect();
            match STANDARD.decode(compact) {
                Ok(public_key) => self.add_anchor(TrustAnchor::new(
                    name::ROOT,
                    Dnskey {
                        flags: KSK_FLAGS,
                        protocol: DNSSEC_PROTOCOL,
                        algorithm: *algorithm,
                        public_key,
                    },
                )),
                Err(e) => warn!("Skipping undecodable root trust anchor: {}", e),
            }
        }
    }

    pub fn add_anchor(&self, anchor: TrustAnchor) {
        if !anchor.is_ksk() {
            warn!(
                "Trust anchor {} for {} lacks the SEP flag (flags {})",
                anchor.key_tag, anchor.zone, anchor.key.flags
            );
        }
        debug!("Adding trust anchor {} for {}", anchor.key_tag, anchor.zone);
        self.anchors
            .write()
            .entry(anchor.zone.clone())
            .or_default()
            .push(anchor);
    }

    /// Add every anchor listed in a TOML document of `[[anchor]]` tables.
    /// Returns how many were added.
    pub fn load_toml(&self, contents: &str) -> Result<usize, ConfigError> {
        let file: AnchorFile =
            toml::from_str(contents).map_err(|e| ConfigError::TrustAnchorFile(e.to_string()))?;

        let mut anchors = Vec::with_capacity(file.anchor.len());
        for entry in file.anchor {
            let compact: String = entry.public_key.split_whitespace().collect();
            let public_key = STANDARD.decode(compact).map_err(|e| {
                ConfigError::TrustAnchorFile(format!("bad public key for {}: {}", entry.zone, e))
            })?;
            let zone = name::normalize(&entry.zone)
                .map_err(|e| ConfigError::TrustAnchorFile(e.to_string()))?;
            anchors.push(TrustAnchor::new(
                &zone,
                Dnskey {
                    flags: entry.flags,
                    protocol: entry.protocol,
                    algorithm: entry.algorithm,
                    public_key,
                },
            ));
        }

        let count = anchors.len();
        for anchor in anchors {
            self.add_anchor(anchor);
        }
        Ok(count)
    }

    pub fn load_file(&self, path: &Path) -> Result<usize, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::TrustAnchorFile(format!("{}: {}", path.display(), e)))?;
        self.load_toml(&contents)
    }

    pub fn get_anchors(&self, zone: &str) -> Vec<TrustAnchor> {
        self.anchors
            .read()
            .get(&name::canonical(zone))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `key` published at `zone` is one of the configured anchors
    pub fn matches(&self, zone: &str, key: &Dnskey) -> bool {
        let key_tag = key.key_tag();
        self.get_anchors(zone).iter().any(|anchor| {
            anchor.key_tag == key_tag
                && anchor.key.algorithm == key.algorithm
                && anchor.key.public_key == key.public_key
        })
    }

    /// Number of zones with at least one anchor
    pub fn zone_count(&self) -> usize {
        self.anchors.read().len()
    }
}

impl Default for TrustAnchorStore {
    fn default() -> Self {
        Self::new()
    }
}
