use bitstream_io::{BitWrite, BitWriter, Endianness};

use super::{
    ParseError,
    common::{PacketComponent, labels_to_wire, parse_domain_name, read_u16, read_u32},
    enums::{DNSResourceClass, DNSResourceType},
    name,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSResource {
    /// Owner labels, root label omitted
    pub labels: Vec<String>,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    /// RDATA with any embedded names decompressed
    pub rdata: Vec<u8>,
}

impl DNSResource {
    pub fn new(owner: &str, rtype: DNSResourceType, ttl: u32, rdata: Vec<u8>) -> Self {
        Self {
            labels: name::split_labels(owner),
            rtype,
            rclass: DNSResourceClass::IN,
            ttl,
            rdata,
        }
    }

    /// Owner name as a fully qualified, lowercased string
    pub fn name(&self) -> String {
        name::labels_to_fqdn(&self.labels)
    }

    /// Whether the owner name equals `fqdn` (case-insensitive)
    pub fn owned_by(&self, fqdn: &str) -> bool {
        self.name() == name::canonical(fqdn)
    }

    /// RDATA in canonical form: embedded names lowercased (RFC 4034 6.2)
    pub fn canonical_rdata(&self) -> Result<Vec<u8>, ParseError> {
        match self.rtype {
            DNSResourceType::NS
            | DNSResourceType::CNAME
            | DNSResourceType::PTR
            | DNSResourceType::DNAME => {
                let (labels, _) = parse_domain_name(&self.rdata, 0)?;
                Ok(labels_to_wire(&labels))
            }
            DNSResourceType::MX => {
                let preference = self.rdata.get(..2).ok_or(ParseError::Truncated)?;
                let (labels, _) = parse_domain_name(&self.rdata, 2)?;
                let mut out = preference.to_vec();
                out.extend(labels_to_wire(&labels));
                Ok(out)
            }
            DNSResourceType::SOA => {
                let (mname, offset) = parse_domain_name(&self.rdata, 0)?;
                let (rname, offset) = parse_domain_name(&self.rdata, offset)?;
                let mut out = labels_to_wire(&mname);
                out.extend(labels_to_wire(&rname));
                out.extend_from_slice(self.rdata.get(offset..).unwrap_or_default());
                Ok(out)
            }
            _ => Ok(self.rdata.clone()),
        }
    }
}

/// Rewrite RDATA so that compressed names point nowhere outside of it.
fn decompress_rdata(
    buf: &[u8],
    rtype: DNSResourceType,
    start: usize,
    end: usize,
) -> Result<Vec<u8>, ParseError> {
    let raw = buf.get(start..end).ok_or(ParseError::Truncated)?;
    if !rtype.has_embedded_names() {
        return Ok(raw.to_vec());
    }

    let uncompressed = |labels: &[String]| {
        let mut wire = Vec::new();
        for label in labels {
            wire.push(label.len() as u8);
            wire.extend_from_slice(label.as_bytes());
        }
        wire.push(0);
        wire
    };

    let mut out = Vec::with_capacity(raw.len());
    match rtype {
        DNSResourceType::MX => {
            out.extend_from_slice(raw.get(..2).ok_or(ParseError::Truncated)?);
            let (labels, _) = parse_domain_name(buf, start + 2)?;
            out.extend(uncompressed(&labels));
        }
        DNSResourceType::SOA => {
            let (mname, offset) = parse_domain_name(buf, start)?;
            let (rname, offset) = parse_domain_name(buf, offset)?;
            out.extend(uncompressed(&mname));
            out.extend(uncompressed(&rname));
            out.extend_from_slice(buf.get(offset..end).ok_or(ParseError::Truncated)?);
        }
        _ => {
            let (labels, _) = parse_domain_name(buf, start)?;
            out.extend(uncompressed(&labels));
        }
    }
    Ok(out)
}

impl PacketComponent for DNSResource {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError> {
        let rdlength = u16::try_from(self.rdata.len())
            .map_err(|_| ParseError::InvalidBitStream("RDATA too long".to_string()))?;
        self.write_labels(writer, &self.labels)?;
        writer.write_var::<u16>(16, self.rtype.into())?;
        writer.write_var::<u16>(16, self.rclass.into())?;
        writer.write_var::<u32>(32, self.ttl)?;
        writer.write_var::<u16>(16, rdlength)?;
        writer.write_bytes(&self.rdata)?;
        Ok(())
    }

    fn decode(buf: &[u8], offset: usize) -> Result<(Self, usize), ParseError> {
        let (labels, offset) = parse_domain_name(buf, offset)?;
        let rtype: DNSResourceType = read_u16(buf, offset)?.into();
        let rclass = read_u16(buf, offset + 2)?.into();
        let ttl = read_u32(buf, offset + 4)?;
        let rdlength = read_u16(buf, offset + 8)? as usize;

        let rdata_start = offset + 10;
        let rdata_end = rdata_start + rdlength;
        if rdata_end > buf.len() {
            return Err(ParseError::Truncated);
        }
        let rdata = decompress_rdata(buf, rtype, rdata_start, rdata_end)?;

        Ok((
            DNSResource {
                labels,
                rtype,
                rclass,
                ttl,
                rdata,
            },
            rdata_end,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_decompresses_ns_rdata() {
        // owner "example.com" at 0, then an NS record whose RDATA is
        // "ns1" + pointer back to the owner
        let mut buf = b"\x07example\x03com\x00".to_vec();
        let record_start = buf.len();
        buf.extend_from_slice(b"\xC0\x00"); // owner
        buf.extend_from_slice(&[0, 2, 0, 1, 0, 0, 0x0e, 0x10, 0, 6]);
        buf.extend_from_slice(b"\x03NS1\xC0\x00");

        let (record, end) = DNSResource::decode(&buf, record_start).unwrap();
        assert_eq!(end, buf.len());
        assert_eq!(record.rtype, DNSResourceType::NS);
        assert_eq!(record.ttl, 3600);
        assert_eq!(record.name(), "example.com.");
        assert_eq!(record.rdata, b"\x03NS1\x07example\x03com\x00".to_vec());
        assert_eq!(
            record.canonical_rdata().unwrap(),
            b"\x03ns1\x07example\x03com\x00".to_vec()
        );
    }

    #[test]
    fn test_truncated_rdata_rejected() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&[0, 48, 0, 1, 0, 0, 0, 60, 0, 10, 1, 1]);
        assert!(DNSResource::decode(&buf, 0).is_err());
    }
}
