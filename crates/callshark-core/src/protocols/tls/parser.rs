use super::error::TlsRecordError;
use super::layout;
use crate::protocols::common::reader::ByteReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsRecordView<'a> {
    pub content_type: u8,
    pub version: u16,
    pub fragment: &'a [u8],
}

fn is_content_type(value: u8) -> bool {
    (layout::CONTENT_CHANGE_CIPHER_SPEC..=layout::CONTENT_APPLICATION_DATA).contains(&value)
}

/// Split a TCP payload into TLS records.
///
/// Returns `Ok(None)` when the first bytes are not a TLS record header. A
/// trailing partial record is left out of the result.
pub fn split_records(data: &[u8]) -> Result<Option<Vec<TlsRecordView<'_>>>, TlsRecordError> {
    let reader = ByteReader::new(data);
    reader.require_len(layout::RECORD_HEADER_LEN)?;

    let mut records = Vec::new();
    let mut offset = 0;
    while offset + layout::RECORD_HEADER_LEN <= data.len() {
        let content_type = reader.read_u8(offset + layout::CONTENT_TYPE_OFFSET)?;
        let major = reader.read_u8(offset + layout::VERSION_OFFSET)?;
        let minor = reader.read_u8(offset + layout::VERSION_OFFSET + 1)?;
        if !is_content_type(content_type)
            || major != layout::VERSION_MAJOR
            || minor > layout::MAX_VERSION_MINOR
        {
            if records.is_empty() {
                return Ok(None);
            }
            break;
        }
        let length = reader.read_u16_be(offset + layout::LENGTH_OFFSET)?;
        if length > layout::MAX_RECORD_LEN {
            return Err(TlsRecordError::RecordTooLong { length });
        }
        let start = offset + layout::RECORD_HEADER_LEN;
        let end = start + length as usize;
        let Ok(fragment) = reader.read_slice(start..end) else {
            break;
        };
        records.push(TlsRecordView {
            content_type,
            version: u16::from_be_bytes([major, minor]),
            fragment,
        });
        offset = end;
    }

    if records.is_empty() {
        // A single record announced but not fully captured yet.
        let content_type = reader.read_u8(layout::CONTENT_TYPE_OFFSET)?;
        let version = reader.read_u16_be(layout::VERSION_OFFSET)?;
        return Ok(Some(vec![TlsRecordView {
            content_type,
            version,
            fragment: reader.rest(layout::RECORD_HEADER_LEN)?,
        }]));
    }
    Ok(Some(records))
}

#[cfg(test)]
mod tests {
    use super::split_records;
    use crate::protocols::tls::layout;

    fn record(content_type: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![content_type, 3, 3];
        out.extend_from_slice(&(body.len() as u16).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn splits_consecutive_records() {
        let mut data = record(layout::CONTENT_HANDSHAKE, &[1, 2, 3]);
        data.extend(record(layout::CONTENT_APPLICATION_DATA, &[9; 8]));
        let records = split_records(&data).unwrap().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content_type, layout::CONTENT_HANDSHAKE);
        assert_eq!(records[0].version, 0x0303);
        assert_eq!(records[1].fragment, &[9; 8]);
    }

    #[test]
    fn sip_text_is_not_tls() {
        assert!(split_records(b"INVITE sip:bob SIP/2.0\r\n").unwrap().is_none());
    }

    #[test]
    fn partial_record_is_reported_with_available_bytes() {
        let mut data = record(layout::CONTENT_APPLICATION_DATA, &[7; 10]);
        data.truncate(9);
        let records = split_records(&data).unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fragment.len(), 4);
    }

    #[test]
    fn oversized_record_is_an_error() {
        let data = [layout::CONTENT_APPLICATION_DATA, 3, 3, 0xff, 0xff, 0];
        assert!(split_records(&data).is_err());
    }
}
