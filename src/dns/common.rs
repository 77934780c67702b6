use bitstream_io::{BitWrite, BitWriter, Endianness};

use super::ParseError;

/// Maximum number of compression pointers followed while reading one name
const MAX_POINTER_JUMPS: usize = 16;

/// Maximum length of a name in wire form (RFC 1035 2.3.4)
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of one label (RFC 1035 2.3.4)
pub const MAX_LABEL_LEN: usize = 63;

pub trait PacketComponent: Sized {
    fn write<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
    ) -> Result<(), ParseError>;

    /// Decode the component starting at `offset` of the full packet buffer,
    /// returning it together with the offset just past it.
    fn decode(buf: &[u8], offset: usize) -> Result<(Self, usize), ParseError>;

    fn write_labels<E: Endianness>(
        &self,
        writer: &mut BitWriter<&mut Vec<u8>, E>,
        labels: &[String],
    ) -> Result<(), ParseError> {
        for label in labels {
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(ParseError::InvalidLabel);
            }
            writer.write_var::<u8>(8, label.len() as u8)?;
            writer.write_bytes(label.as_bytes())?;
        }
        writer.write_var::<u8>(8, 0)?;

        Ok(())
    }
}

/// Read a possibly compressed domain name starting at `start`.
///
/// Returns the labels (without the empty root label) and the offset right
/// after the name as it appears at `start`, i.e. after the first pointer if
/// the name was compressed.
pub fn parse_domain_name(data: &[u8], start: usize) -> Result<(Vec<String>, usize), ParseError> {
    let mut labels = Vec::new();
    let mut offset = start;
    let mut end_offset = None;
    let mut jumps = 0;
    let mut wire_len = 1;

    loop {
        let len = *data.get(offset).ok_or(ParseError::InvalidLabel)?;

        if len & 0xC0 == 0xC0 {
            let low = *data.get(offset + 1).ok_or(ParseError::InvalidLabel)?;
            if end_offset.is_none() {
                end_offset = Some(offset + 2);
            }

            jumps += 1;
            if jumps > MAX_POINTER_JUMPS {
                return Err(ParseError::InvalidLabel);
            }

            let pointer = u16::from_be_bytes([len & 0x3F, low]) as usize;
            // Pointers must go backwards, otherwise they can loop forever
            if pointer >= offset {
                return Err(ParseError::InvalidLabel);
            }
            offset = pointer;
            continue;
        }

        if len & 0xC0 != 0 {
            // Extended label types (RFC 6891) are not used in practice
            return Err(ParseError::InvalidLabel);
        }

        if len == 0 {
            return Ok((labels, end_offset.unwrap_or(offset + 1)));
        }

        let label_start = offset + 1;
        let label_end = label_start + len as usize;
        let raw = data
            .get(label_start..label_end)
            .ok_or(ParseError::InvalidLabel)?;

        wire_len += len as usize + 1;
        if wire_len > MAX_NAME_LEN {
            return Err(ParseError::InvalidLabel);
        }

        // Labels are joined with '.' downstream, so one inside a label
        // would change the name
        if raw.contains(&b'.') {
            return Err(ParseError::InvalidLabel);
        }
        let label = String::from_utf8(raw.to_vec()).map_err(|_| ParseError::InvalidLabel)?;
        labels.push(label);
        offset = label_end;
    }
}

/// Encode labels as an uncompressed wire-format name, lowercased as required
/// for canonical form.
pub fn labels_to_wire(labels: &[String]) -> Vec<u8> {
    let mut wire = Vec::with_capacity(labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1);
    for label in labels {
        wire.push(label.len() as u8);
        wire.extend(label.bytes().map(|b| b.to_ascii_lowercase()));
    }
    wire.push(0);
    wire
}

/// Read a fixed-size big-endian field at `offset`.
pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16, ParseError> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(ParseError::Truncated)
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32, ParseError> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ParseError::Truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_name() {
        let data = b"\x07example\x03com\x00";
        let (labels, end) = parse_domain_name(data, 0).unwrap();
        assert_eq!(labels, vec!["example", "com"]);
        assert_eq!(end, data.len());
    }

    #[test]
    fn test_parse_compressed_name() {
        // "example.com" at 0, then "www" + pointer to 0
        let mut data = b"\x07example\x03com\x00".to_vec();
        let second = data.len();
        data.extend_from_slice(b"\x03www\xC0\x00");
        let (labels, end) = parse_domain_name(&data, second).unwrap();
        assert_eq!(labels, vec!["www", "example", "com"]);
        assert_eq!(end, data.len());
    }

    #[test]
    fn test_forward_pointer_rejected() {
        let data = b"\xC0\x02\x00";
        assert!(parse_domain_name(data, 0).is_err());
    }

    #[test]
    fn test_truncated_label_rejected() {
        let data = b"\x07exam";
        assert!(parse_domain_name(data, 0).is_err());
    }

    #[test]
    fn test_binary_label_rejected() {
        let data = b"\x01\xFF\x03com\x00";
        assert!(matches!(
            parse_domain_name(data, 0),
            Err(ParseError::InvalidLabel)
        ));
    }

    #[test]
    fn test_label_with_dot_rejected() {
        // one label "a.b" followed by "com" must not read as a.b.com.
        let data = b"\x03a.b\x03com\x00";
        assert!(matches!(
            parse_domain_name(data, 0),
            Err(ParseError::InvalidLabel)
        ));
    }

    #[test]
    fn test_labels_to_wire_lowercases() {
        let wire = labels_to_wire(&["WWW".to_string(), "Example".to_string()]);
        assert_eq!(wire, b"\x03www\x07example\x00".to_vec());
        assert_eq!(labels_to_wire(&[]), vec![0]);
    }
}
