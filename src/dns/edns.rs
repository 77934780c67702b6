use super::{
    ParseError,
    enums::{DNSResourceClass, DNSResourceType},
    resource::DNSResource,
};

/// DNSSEC OK flag in the OPT TTL field (RFC 3225)
const DO_FLAG: u32 = 0x0000_8000;

/// EDNS0 OPT pseudo-record (RFC 6891)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdnsOpt {
    pub udp_payload_size: u16,
    pub extended_rcode: u8,
    pub version: u8,
    pub do_flag: bool,
    /// Raw option TLVs, kept verbatim
    pub options: Vec<u8>,
}

impl EdnsOpt {
    pub fn with_payload_size(udp_payload_size: u16) -> Self {
        Self {
            udp_payload_size,
            extended_rcode: 0,
            version: 0,
            do_flag: false,
            options: Vec::new(),
        }
    }

    pub fn set_do_flag(&mut self, do_flag: bool) {
        self.do_flag = do_flag;
    }

    pub fn from_resource(resource: &DNSResource) -> Result<Self, ParseError> {
        if resource.rtype != DNSResourceType::OPT || !resource.labels.is_empty() {
            return Err(ParseError::InvalidAdditionalSection);
        }

        Ok(Self {
            udp_payload_size: u16::from(resource.rclass),
            extended_rcode: (resource.ttl >> 24) as u8,
            version: (resource.ttl >> 16) as u8,
            do_flag: resource.ttl & DO_FLAG != 0,
            options: resource.rdata.clone(),
        })
    }

    pub fn to_resource(&self) -> DNSResource {
        let mut ttl = (u32::from(self.extended_rcode) << 24) | (u32::from(self.version) << 16);
        if self.do_flag {
            ttl |= DO_FLAG;
        }

        DNSResource {
            labels: Vec::new(),
            rtype: DNSResourceType::OPT,
            rclass: DNSResourceClass::from(self.udp_payload_size),
            ttl,
            rdata: self.options.clone(),
        }
    }
}
