//! Network-backed implementations of the per-zone audit predicates.

pub mod nameservers;
pub mod nsec3;
pub mod rrsig;

pub use nameservers::NameserverProbe;
pub use nsec3::Nsec3ParamProbe;
pub use rrsig::RrsigValidator;
