use bitstream_io::{BitWrite, BitWriter, Endianness};

use super::{
    ParseError,
    common::{PacketComponent, parse_domain_name, read_u16},
    enums::{DNSResourceClass, DNSResourceType},
    name,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSQuestion {
    /// Owner labels, root label omitted
    pub labels: Vec<String>,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl DNSQuestion {
    pub fn new(fqdn: &str, qtype: DNSResourceType) -> Self {
        Self {
            labels: name::split_labels(fqdn),
            qtype,
            qclass: DNSResourceClass::IN,
        }
    }

    pub fn name(&self) -> String {
        name::labels_to_fqdn(&self.labels)
    }
}

impl PacketComponent for DNSQuestion {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError> {
        self.write_labels(writer, &self.labels)?;
        writer.write_var::<u16>(16, self.qtype.into())?;
        writer.write_var::<u16>(16, self.qclass.into())?;
        Ok(())
    }

    fn decode(buf: &[u8], offset: usize) -> Result<(Self, usize), ParseError> {
        let (labels, offset) =
            parse_domain_name(buf, offset).map_err(|_| ParseError::InvalidQuestionSection)?;
        let qtype = read_u16(buf, offset)?.into();
        let qclass = read_u16(buf, offset + 2)?.into();

        Ok((
            DNSQuestion {
                labels,
                qtype,
                qclass,
            },
            offset + 4,
        ))
    }
}
