use super::error::WsError;
use super::layout;
use crate::protocols::common::reader::ByteReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsFrame {
    pub fin: bool,
    pub opcode: u8,
    pub masked: bool,
    /// Unmasked application payload.
    pub payload: Vec<u8>,
}

impl WsFrame {
    pub fn is_text(&self) -> bool {
        self.opcode == layout::OPCODE_TEXT
    }
}

fn is_known_opcode(opcode: u8) -> bool {
    matches!(
        opcode,
        layout::OPCODE_CONTINUATION
            | layout::OPCODE_TEXT
            | layout::OPCODE_BINARY
            | layout::OPCODE_CLOSE
            | layout::OPCODE_PING
            | layout::OPCODE_PONG
    )
}

/// Parse one WebSocket frame spanning exactly `data`.
pub fn parse_ws_frame(data: &[u8]) -> Result<Option<WsFrame>, WsError> {
    let reader = ByteReader::new(data);
    reader.require_len(layout::MIN_HEADER_LEN)?;

    let first = reader.read_u8(0)?;
    let second = reader.read_u8(1)?;
    let opcode = first & layout::OPCODE_MASK;
    if first & layout::RSV_MASK != 0 || !is_known_opcode(opcode) {
        return Ok(None);
    }

    let masked = second & layout::MASKED_MASK != 0;
    let mut offset = layout::MIN_HEADER_LEN;
    let length = match second & layout::LEN7_MASK {
        layout::LEN_EXT16 => {
            let length = u64::from(reader.read_u16_be(offset)?);
            offset += 2;
            length
        }
        layout::LEN_EXT64 => {
            let length = reader.read_u64_be(offset)?;
            offset += 8;
            length
        }
        short => u64::from(short),
    };
    let length = usize::try_from(length).map_err(|_| WsError::LengthOverflow { length })?;

    let key = if masked {
        let key = reader.read_slice(offset..offset + layout::MASKING_KEY_LEN)?;
        offset += layout::MASKING_KEY_LEN;
        Some([key[0], key[1], key[2], key[3]])
    } else {
        None
    };

    if offset.checked_add(length) != Some(data.len()) {
        return Ok(None);
    }

    let mut payload = reader.rest(offset)?.to_vec();
    if let Some(key) = key {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= key[i % layout::MASKING_KEY_LEN];
        }
    }

    Ok(Some(WsFrame {
        fin: first & layout::FIN_MASK != 0,
        opcode,
        masked,
        payload,
    }))
}
