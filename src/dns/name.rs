//! Helpers for presentation-format domain names.
//!
//! Names handled by the auditor are always fully qualified, lowercased and
//! carry exactly one trailing dot; the root zone is `"."`.

use super::common::{MAX_LABEL_LEN, MAX_NAME_LEN, labels_to_wire};
use crate::error::AuditError;

pub const ROOT: &str = ".";

/// Split a presentation name into its labels, dropping empty ones.
pub fn split_labels(name: &str) -> Vec<String> {
    name.split('.')
        .filter(|label| !label.is_empty())
        .map(|label| label.to_string())
        .collect()
}

/// Join labels into a fully qualified, lowercased name.
pub fn labels_to_fqdn(labels: &[String]) -> String {
    if labels.is_empty() {
        return ROOT.to_string();
    }
    let mut fqdn = labels.join(".").to_ascii_lowercase();
    fqdn.push('.');
    fqdn
}

/// Canonical comparison form of a name. Does not validate.
pub fn canonical(name: &str) -> String {
    labels_to_fqdn(&split_labels(name))
}

pub fn is_root(fqdn: &str) -> bool {
    split_labels(fqdn).is_empty()
}

/// Uncompressed, lowercased wire encoding of a name.
pub fn to_wire(name: &str) -> Vec<u8> {
    labels_to_wire(&split_labels(name))
}

/// Validate and normalize a user supplied domain name.
///
/// Surrounding whitespace is trimmed, empty labels (repeated or trailing
/// dots) collapse, and the result is lowercased and fully qualified.
pub fn normalize(input: &str) -> Result<String, AuditError> {
    let trimmed = input.trim();
    let labels = split_labels(trimmed);

    for label in &labels {
        if label.len() > MAX_LABEL_LEN {
            return Err(AuditError::InvalidDomainName(format!(
                "label '{}' longer than {} octets",
                label, MAX_LABEL_LEN
            )));
        }
        if !label.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(AuditError::InvalidDomainName(format!(
                "label '{}' contains non-printable or non-ASCII characters",
                label
            )));
        }
    }

    let wire_len: usize = labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1;
    if wire_len > MAX_NAME_LEN {
        return Err(AuditError::InvalidDomainName(format!(
            "name is {} octets long, maximum is {}",
            wire_len, MAX_NAME_LEN
        )));
    }

    Ok(labels_to_fqdn(&labels))
}

/// Every enclosing zone of `fqdn`, from the name itself up to the root.
///
/// `www.example.com.` yields `www.example.com.`, `example.com.`, `com.`, `.`
pub fn zone_path(fqdn: &str) -> Vec<String> {
    let labels = split_labels(fqdn);
    let mut path = Vec::with_capacity(labels.len() + 1);
    for start in 0..labels.len() {
        path.push(labels_to_fqdn(&labels[start..]));
    }
    path.push(ROOT.to_string());
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Example.COM").unwrap(), "example.com.");
        assert_eq!(normalize("example.com.").unwrap(), "example.com.");
        assert_eq!(normalize(" example..com.. ").unwrap(), "example.com.");
        assert_eq!(normalize(".").unwrap(), ".");
        assert_eq!(normalize("").unwrap(), ".");
    }

    #[test]
    fn test_normalize_rejects_bad_names() {
        let long_label = "a".repeat(64);
        assert!(normalize(&format!("{}.com", long_label)).is_err());
        assert!(normalize("exa mple.com").is_err());
        assert!(normalize("bücher.de").is_err());

        let long_name = vec!["abcdefghij"; 26].join(".");
        assert!(normalize(&long_name).is_err());
    }

    #[test]
    fn test_zone_path() {
        assert_eq!(
            zone_path("www.example.com."),
            vec!["www.example.com.", "example.com.", "com.", "."]
        );
        assert_eq!(zone_path("."), vec!["."]);
    }

    #[test]
    fn test_zone_path_length_is_labels_plus_root() {
        for name in ["a.", "a.b.", "a.b.c.d.e.f."] {
            assert_eq!(zone_path(name).len(), split_labels(name).len() + 1);
        }
    }

    #[test]
    fn test_to_wire() {
        assert_eq!(to_wire("Example.com."), b"\x07example\x03com\x00".to_vec());
        assert_eq!(to_wire("."), vec![0]);
        assert!(is_root("."));
        assert!(!is_root("com."));
    }
}
