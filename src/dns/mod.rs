pub mod common;
pub mod edns;
pub mod enums;
pub mod header;
pub mod name;
pub mod question;
pub mod rdata;
pub mod resource;

use bitstream_io::{BigEndian, BitWriter};
use common::PacketComponent;
use edns::EdnsOpt;
use enums::DNSResourceType;
use header::DNSHeader;
use question::DNSQuestion;
use resource::DNSResource;
use tracing::{debug, trace};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub resources: Vec<DNSResource>,
    /// EDNS0 OPT record if present (extracted from additional records)
    pub edns: Option<EdnsOpt>,
}

#[derive(Debug)]
pub enum ParseError {
    InvalidHeader,
    InvalidLabel,
    InvalidQuestionSection,
    InvalidAnswerSection,
    InvalidAuthoritySection,
    InvalidAdditionalSection,
    Truncated,
    InvalidBitStream(String),
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::InvalidBitStream(e.to_string())
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidHeader => write!(f, "Invalid DNS header"),
            ParseError::InvalidLabel => write!(f, "Invalid DNS label"),
            ParseError::InvalidQuestionSection => write!(f, "Invalid question section"),
            ParseError::InvalidAnswerSection => write!(f, "Invalid answer section"),
            ParseError::InvalidAuthoritySection => write!(f, "Invalid authority section"),
            ParseError::InvalidAdditionalSection => write!(f, "Invalid additional section"),
            ParseError::Truncated => write!(f, "Record data truncated"),
            ParseError::InvalidBitStream(e) => write!(f, "Invalid bit stream: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

impl DNSPacket {
    /// Build a query for `name`/`qtype` with a fresh random id.
    ///
    /// With `dnssec_ok` an OPT record advertising `udp_payload_size` and the
    /// DO bit is attached so that servers include RRSIGs.
    pub fn query(
        name: &str,
        qtype: DNSResourceType,
        recursion_desired: bool,
        udp_payload_size: Option<u16>,
        dnssec_ok: bool,
    ) -> Self {
        let edns = udp_payload_size.map(|size| {
            let mut opt = EdnsOpt::with_payload_size(size);
            opt.set_do_flag(dnssec_ok);
            opt
        });

        DNSPacket {
            header: DNSHeader {
                id: rand::random::<u16>(),
                rd: recursion_desired,
                qdcount: 1,
                ..Default::default()
            },
            questions: vec![DNSQuestion::new(name, qtype)],
            edns,
            ..Default::default()
        }
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        trace!("Parsing DNS packet, size: {} bytes", buf.len());
        let (header, mut offset) = DNSHeader::decode(buf, 0)?;
        debug!(
            "Parsed DNS header: id={}, qr={}, rcode={}, answers={}",
            header.id, header.qr, header.rcode, header.ancount
        );

        let mut packet = DNSPacket {
            header,
            ..Default::default()
        };

        for _ in 0..packet.header.qdcount {
            let (question, next) = DNSQuestion::decode(buf, offset)?;
            packet.questions.push(question);
            offset = next;
        }

        for _ in 0..packet.header.ancount {
            let (answer, next) =
                DNSResource::decode(buf, offset).map_err(|_| ParseError::InvalidAnswerSection)?;
            packet.answers.push(answer);
            offset = next;
        }

        for _ in 0..packet.header.nscount {
            let (authority, next) = DNSResource::decode(buf, offset)
                .map_err(|_| ParseError::InvalidAuthoritySection)?;
            packet.authorities.push(authority);
            offset = next;
        }

        for _ in 0..packet.header.arcount {
            let (resource, next) = DNSResource::decode(buf, offset)
                .map_err(|_| ParseError::InvalidAdditionalSection)?;
            offset = next;

            if resource.rtype == DNSResourceType::OPT && packet.edns.is_none() {
                match EdnsOpt::from_resource(&resource) {
                    Ok(opt) => {
                        packet.edns = Some(opt);
                        continue;
                    }
                    Err(e) => debug!("Failed to parse EDNS OPT record: {}", e),
                }
            }

            packet.resources.push(resource);
        }

        Ok(packet)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, ParseError> {
        let mut buf = Vec::new();
        {
            let mut writer: BitWriter<&mut Vec<u8>, BigEndian> = BitWriter::new(&mut buf);

            // Counts always reflect the sections actually written
            let mut header = self.header.clone();
            header.qdcount = self.questions.len() as u16;
            header.ancount = self.answers.len() as u16;
            header.nscount = self.authorities.len() as u16;
            header.arcount = self.resources.len() as u16 + u16::from(self.edns.is_some());
            header.write(&mut writer)?;

            for question in &self.questions {
                question.write(&mut writer)?;
            }
            for record in self
                .answers
                .iter()
                .chain(&self.authorities)
                .chain(&self.resources)
            {
                record.write(&mut writer)?;
            }
            if let Some(edns) = &self.edns {
                edns.to_resource().write(&mut writer)?;
            }
        }
        Ok(buf)
    }

    /// Check if the response was signed for us (DO bit echoed back)
    pub fn dnssec_ok(&self) -> bool {
        self.edns.as_ref().is_some_and(|edns| edns.do_flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_round_trip() {
        let query = DNSPacket::query("example.com.", DNSResourceType::DNSKEY, true, Some(1232), true);
        let bytes = query.serialize().unwrap();
        let parsed = DNSPacket::parse(&bytes).unwrap();

        assert_eq!(parsed.header.id, query.header.id);
        assert!(parsed.header.rd);
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0].name(), "example.com.");
        assert_eq!(parsed.questions[0].qtype, DNSResourceType::DNSKEY);
        assert!(parsed.dnssec_ok());
        assert_eq!(parsed.edns.unwrap().udp_payload_size, 1232);
        assert!(parsed.resources.is_empty());
    }

    #[test]
    fn test_response_sections_round_trip() {
        let mut packet = DNSPacket::query("example.com.", DNSResourceType::DS, true, None, false);
        packet.header.qr = true;
        packet.answers.push(DNSResource::new(
            "example.com.",
            DNSResourceType::DS,
            3600,
            vec![0x12, 0x34, 8, 2, 0xAA],
        ));
        packet.authorities.push(DNSResource::new(
            "com.",
            DNSResourceType::NS,
            3600,
            name::to_wire("a.gtld-servers.net."),
        ));

        let parsed = DNSPacket::parse(&packet.serialize().unwrap()).unwrap();
        assert_eq!(parsed.answers, packet.answers);
        assert_eq!(parsed.authorities, packet.authorities);
        assert!(parsed.edns.is_none());
    }

    #[test]
    fn test_truncated_packet_rejected() {
        let query = DNSPacket::query("example.com.", DNSResourceType::A, true, None, false);
        let bytes = query.serialize().unwrap();
        assert!(DNSPacket::parse(&bytes[..bytes.len() - 3]).is_err());
    }
}
