//! Chain-of-trust audit: the walker, its report model and the predicates it
//! consults for every zone.

pub mod report;
pub mod walker;

use async_trait::async_trait;

pub use report::{Key, KeyRole, Nameserver, Report, Zone};
pub use walker::ChainWalker;

/// NSEC3 use at a zone apex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nsec3Status {
    pub present: bool,
    pub iterations: u16,
}

/// Whether the signatures in each response section of a zone validate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionValidation {
    pub answer_ok: bool,
    pub ns_ok: bool,
    pub extra_ok: bool,
    pub answer_error: Option<String>,
    pub ns_error: Option<String>,
    pub extra_error: Option<String>,
}

impl SectionValidation {
    pub fn all_ok(&self) -> bool {
        self.answer_ok && self.ns_ok && self.extra_ok
    }
}

#[async_trait]
pub trait Nsec3Probe: Send + Sync {
    async fn probe_nsec3(&self, zone: &str) -> Nsec3Status;
}

#[async_trait]
pub trait RrsetValidator: Send + Sync {
    async fn validate_rrsets(&self, zone: &str) -> SectionValidation;
}

#[async_trait]
pub trait NameserverSurvey: Send + Sync {
    async fn survey(&self, zone: &str) -> Vec<Nameserver>;
}
