use std::ops::Range;

use super::error::LinkError;
use super::layout;
use crate::protocols::common::reader::ByteReader;

/// Location of the network-layer bytes inside a captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFrame {
    pub header_len: usize,
    pub payload: Range<usize>,
    pub vlan: Option<u16>,
}

/// Locate the network header for the given datalink type.
///
/// Returns `Ok(None)` for unsupported datalink types and for link frames
/// that do not carry IPv4/IPv6. The returned range never extends past
/// `data.len()`.
pub fn parse_link(datalink: i32, data: &[u8]) -> Result<Option<LinkFrame>, LinkError> {
    let reader = ByteReader::new(data);
    match datalink {
        layout::DLT_EN10MB => parse_ethernet(&reader, data.len()),
        layout::DLT_LINUX_SLL => parse_cooked(
            &reader,
            data.len(),
            layout::SLL_HEADER_LEN,
            layout::SLL_PROTOCOL_OFFSET,
        ),
        layout::DLT_LINUX_SLL2 => parse_cooked(
            &reader,
            data.len(),
            layout::SLL2_HEADER_LEN,
            layout::SLL2_PROTOCOL_OFFSET,
        ),
        layout::DLT_NFLOG => parse_nflog(&reader, data.len()).map(Some),
        layout::DLT_NULL | layout::DLT_LOOP => {
            reader.require_len(layout::LOOPBACK_HEADER_LEN)?;
            Ok(Some(fixed(layout::LOOPBACK_HEADER_LEN, data.len())))
        }
        layout::DLT_RAW
        | layout::DLT_RAW_BSD
        | layout::DLT_RAW_OPENBSD
        | layout::DLT_IPV4
        | layout::DLT_IPV6 => Ok(Some(fixed(0, data.len()))),
        _ => Ok(None),
    }
}

fn fixed(header_len: usize, total: usize) -> LinkFrame {
    LinkFrame {
        header_len,
        payload: header_len..total,
        vlan: None,
    }
}

fn is_ip_ethertype(ethertype: u16) -> bool {
    ethertype == layout::ETHERTYPE_IPV4 || ethertype == layout::ETHERTYPE_IPV6
}

fn parse_ethernet(reader: &ByteReader<'_>, total: usize) -> Result<Option<LinkFrame>, LinkError> {
    reader.require_len(layout::ETHER_HEADER_LEN)?;
    let mut type_offset = layout::ETHER_TYPE_OFFSET;
    let mut ethertype = reader.read_u16_be(type_offset)?;
    let mut vlan = None;
    while ethertype == layout::ETHERTYPE_VLAN || ethertype == layout::ETHERTYPE_QINQ {
        let tci = reader.read_u16_be(type_offset + 2)?;
        vlan.get_or_insert(tci & 0x0fff);
        type_offset += layout::VLAN_TAG_LEN;
        ethertype = reader.read_u16_be(type_offset)?;
    }
    if !is_ip_ethertype(ethertype) {
        return Ok(None);
    }
    let header_len = type_offset + 2;
    Ok(Some(LinkFrame {
        header_len,
        payload: header_len..total,
        vlan,
    }))
}

fn parse_cooked(
    reader: &ByteReader<'_>,
    total: usize,
    header_len: usize,
    protocol_offset: usize,
) -> Result<Option<LinkFrame>, LinkError> {
    reader.require_len(header_len)?;
    let protocol = reader.read_u16_be(protocol_offset)?;
    if !is_ip_ethertype(protocol) {
        return Ok(None);
    }
    Ok(Some(fixed(header_len, total)))
}

fn parse_nflog(reader: &ByteReader<'_>, total: usize) -> Result<LinkFrame, LinkError> {
    reader.require_len(layout::NFLOG_HEADER_LEN)?;
    let mut offset = layout::NFLOG_HEADER_LEN;
    while offset + layout::NFLOG_TLV_HEADER_LEN <= total {
        // TLV fields are in host byte order; captures are little endian.
        let length = reader.read_u16_le(offset)?;
        let tlv_type = reader.read_u16_le(offset + 2)?;
        if (length as usize) < layout::NFLOG_TLV_HEADER_LEN {
            return Err(LinkError::InvalidNflogTlv { length });
        }
        if tlv_type == layout::NFULA_PAYLOAD {
            let start = offset + layout::NFLOG_TLV_HEADER_LEN;
            let end = (offset + length as usize).min(total);
            return Ok(LinkFrame {
                header_len: start,
                payload: start..end,
                vlan: None,
            });
        }
        offset += (length as usize + 3) & !3;
    }
    Err(LinkError::MissingNflogPayload)
}

#[cfg(test)]
mod tests {
    use super::parse_link;
    use crate::protocols::link::error::LinkError;
    use crate::protocols::link::layout;

    fn ethernet(ethertype: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(ethertype);
        frame.extend_from_slice(&[0x45; 20]);
        frame
    }

    #[test]
    fn ethernet_ipv4_header_is_14_bytes() {
        let frame = ethernet(&[0x08, 0x00]);
        let link = parse_link(layout::DLT_EN10MB, &frame).unwrap().unwrap();
        assert_eq!(link.header_len, 14);
        assert_eq!(link.payload, 14..frame.len());
        assert_eq!(link.vlan, None);
    }

    #[test]
    fn vlan_tag_is_skipped() {
        let frame = ethernet(&[0x81, 0x00, 0x00, 0x2a, 0x86, 0xdd]);
        let link = parse_link(layout::DLT_EN10MB, &frame).unwrap().unwrap();
        assert_eq!(link.header_len, 18);
        assert_eq!(link.vlan, Some(42));
    }

    #[test]
    fn non_ip_ethertype_is_declined() {
        let frame = ethernet(&[0x08, 0x06]);
        assert!(parse_link(layout::DLT_EN10MB, &frame).unwrap().is_none());
    }

    #[test]
    fn unknown_datalink_is_declined() {
        assert!(parse_link(147, &[0u8; 64]).unwrap().is_none());
    }

    #[test]
    fn truncated_ethernet_is_an_error() {
        let err = parse_link(layout::DLT_EN10MB, &[0u8; 13]).unwrap_err();
        assert!(matches!(err, LinkError::Truncated(_)));
        let tagged = [0u8; 12]
            .iter()
            .copied()
            .chain([0x81, 0x00, 0x00])
            .collect::<Vec<_>>();
        assert!(parse_link(layout::DLT_EN10MB, &tagged).is_err());
    }

    #[test]
    fn cooked_capture_headers() {
        let mut sll = vec![0u8; 16];
        sll[14] = 0x08;
        sll.extend_from_slice(&[0x45; 20]);
        let link = parse_link(layout::DLT_LINUX_SLL, &sll).unwrap().unwrap();
        assert_eq!(link.header_len, 16);

        let mut sll2 = vec![0x86, 0xdd];
        sll2.extend_from_slice(&[0u8; 18]);
        let link = parse_link(layout::DLT_LINUX_SLL2, &sll2).unwrap().unwrap();
        assert_eq!(link.header_len, 20);
        assert!(link.payload.is_empty());
    }

    #[test]
    fn nflog_payload_tlv_is_located() {
        let mut frame = vec![2, 0, 0, 0];
        // prefix TLV (type 1, 5 bytes, padded to 8)
        frame.extend_from_slice(&[5, 0, 1, 0, 0xaa, 0, 0, 0]);
        // payload TLV (type 9) with 4 bytes of data
        frame.extend_from_slice(&[8, 0, 9, 0, 0x45, 0, 0, 0]);
        let link = parse_link(layout::DLT_NFLOG, &frame).unwrap().unwrap();
        assert_eq!(link.payload, 16..20);
    }

    #[test]
    fn nflog_without_payload_is_an_error() {
        let frame = [2, 0, 0, 0, 8, 0, 1, 0, 0, 0, 0, 0];
        assert!(matches!(
            parse_link(layout::DLT_NFLOG, &frame),
            Err(LinkError::MissingNflogPayload)
        ));
        let bad = [2, 0, 0, 0, 2, 0, 1, 0];
        assert!(matches!(
            parse_link(layout::DLT_NFLOG, &bad),
            Err(LinkError::InvalidNflogTlv { length: 2 })
        ));
    }

    #[test]
    fn payload_range_never_exceeds_captured_length() {
        let datalinks = [
            layout::DLT_NULL,
            layout::DLT_EN10MB,
            layout::DLT_RAW,
            layout::DLT_LOOP,
            layout::DLT_LINUX_SLL,
            layout::DLT_NFLOG,
            layout::DLT_LINUX_SLL2,
        ];
        for len in 0..40 {
            let data: Vec<u8> = (0..len).map(|i| (i * 37 % 251) as u8).collect();
            for datalink in datalinks {
                if let Ok(Some(link)) = parse_link(datalink, &data) {
                    assert!(link.payload.end <= data.len());
                    assert!(link.payload.start <= link.payload.end);
                }
            }
        }
    }
}
