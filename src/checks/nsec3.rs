use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::audit::{Nsec3Probe, Nsec3Status};
use crate::dns::enums::DNSResourceType;
use crate::dns::rdata::Nsec3Param;
use crate::resolver::QueryTransport;

/// Detects NSEC3 through the NSEC3PARAM record at the zone apex
pub struct Nsec3ParamProbe {
    transport: Arc<dyn QueryTransport>,
}

impl Nsec3ParamProbe {
    pub fn new(transport: Arc<dyn QueryTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Nsec3Probe for Nsec3ParamProbe {
    async fn probe_nsec3(&self, zone: &str) -> Nsec3Status {
        let response = match self.transport.query(zone, DNSResourceType::NSEC3PARAM).await {
            Ok(response) => response,
            Err(e) => {
                debug!("NSEC3PARAM query for {} failed: {}", zone, e);
                return Nsec3Status::default();
            }
        };

        response
            .answers
            .iter()
            .filter(|rr| rr.rtype == DNSResourceType::NSEC3PARAM && rr.owned_by(zone))
            .find_map(|rr| Nsec3Param::parse(&rr.rdata).ok())
            .map(|param| {
                debug!("{} uses NSEC3 with {} iteration(s)", zone, param.iterations);
                Nsec3Status {
                    present: true,
                    iterations: param.iterations,
                }
            })
            .unwrap_or_default()
    }
}
