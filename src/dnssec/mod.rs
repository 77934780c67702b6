pub mod algorithm;
pub mod digest;
pub mod ds;
pub mod errors;
pub mod key_length;
pub mod key_tag;
pub mod policy;
pub mod rrset;
pub mod signature;
pub mod trust_anchor;

pub use algorithm::DnsSecAlgorithm;
pub use digest::DigestType;
pub use ds::{DsVerifier, compute_ds_digest, match_ds};
pub use errors::DnsSecError;
pub use key_length::{KeyFamily, decode_key_length, key_length_for};
pub use key_tag::calculate_key_tag;
pub use policy::{Compliance, Verdict, classify};
pub use rrset::DnskeySet;
pub use trust_anchor::{TrustAnchor, TrustAnchorStore};
