use std::net::IpAddr;

use serde::Serialize;

use super::error::SdpError;
use crate::protocols::rtp::encoding_by_id;

/// One payload format offered on a media line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdpFormat {
    pub id: u8,
    /// Encoding name with clock rate (`PCMU/8000`), from `a=rtpmap` or the
    /// static table.
    pub name: Option<String>,
    /// Short alias (`g711u`, `opus`).
    pub alias: Option<String>,
}

/// Negotiated description of one media stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdpMedia {
    pub media_type: String,
    pub address: Option<IpAddr>,
    pub port: u16,
    pub rtcp_address: Option<IpAddr>,
    pub rtcp_port: u16,
    pub transport: String,
    pub formats: Vec<SdpFormat>,
}

impl SdpMedia {
    pub fn format(&self, id: u8) -> Option<&SdpFormat> {
        self.formats.iter().find(|format| format.id == id)
    }
}

fn parse_connection(value: &str) -> Result<IpAddr, SdpError> {
    // c=<nettype> <addrtype> <connection-address>[/ttl[/count]]
    let address = value
        .split_whitespace()
        .nth(2)
        .and_then(|addr| addr.split('/').next())
        .ok_or_else(|| SdpError::InvalidConnection {
            line: value.to_string(),
        })?;
    address.parse().map_err(|_| SdpError::InvalidConnection {
        line: value.to_string(),
    })
}

fn parse_media_line(value: &str, session_address: Option<IpAddr>) -> Result<SdpMedia, SdpError> {
    let invalid = || SdpError::InvalidMedia {
        line: value.to_string(),
    };
    let mut fields = value.split_whitespace();
    let media_type = fields.next().ok_or_else(invalid)?.to_string();
    let port: u16 = fields
        .next()
        .and_then(|port| port.split('/').next())
        .and_then(|port| port.parse().ok())
        .ok_or_else(invalid)?;
    let transport = fields.next().ok_or_else(invalid)?.to_string();
    let formats = fields
        .filter_map(|id| id.parse::<u8>().ok())
        .map(|id| {
            let encoding = encoding_by_id(id);
            SdpFormat {
                id,
                name: encoding.map(|e| e.name.to_string()),
                alias: encoding.map(|e| e.format.to_string()),
            }
        })
        .collect();
    Ok(SdpMedia {
        media_type,
        address: session_address,
        port,
        rtcp_address: None,
        rtcp_port: port.wrapping_add(1),
        transport,
        formats,
    })
}

fn apply_rtpmap(media: &mut SdpMedia, value: &str) {
    // a=rtpmap:<payload type> <encoding name>/<clock rate>[/<params>]
    let mut parts = value.splitn(2, ' ');
    let Some(id) = parts.next().and_then(|id| id.trim().parse::<u8>().ok()) else {
        return;
    };
    let Some(name) = parts.next().map(str::trim).filter(|n| !n.is_empty()) else {
        return;
    };
    let alias = name
        .split('/')
        .next()
        .unwrap_or(name)
        .to_ascii_lowercase();
    if let Some(format) = media.formats.iter_mut().find(|f| f.id == id) {
        let static_alias = encoding_by_id(id).map(|e| e.format.to_string());
        format.name = Some(name.to_string());
        format.alias = static_alias.or(Some(alias));
    }
}

fn apply_rtcp(media: &mut SdpMedia, value: &str) {
    // a=rtcp:<port> [<nettype> <addrtype> <connection-address>]
    let mut fields = value.splitn(2, ' ');
    if let Some(port) = fields.next().and_then(|p| p.trim().parse::<u16>().ok()) {
        media.rtcp_port = port;
    }
    if let Some(rest) = fields.next() {
        media.rtcp_address = parse_connection(rest).ok();
    }
}

/// Extract media descriptions from an SDP body.
pub fn parse_sdp(body: &[u8]) -> Result<Vec<SdpMedia>, SdpError> {
    let text = String::from_utf8_lossy(body);
    let mut session_address = None;
    let mut medias: Vec<SdpMedia> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        let Some((kind, value)) = line.split_once('=') else {
            continue;
        };
        match (kind, medias.last_mut()) {
            ("c", None) => session_address = Some(parse_connection(value)?),
            ("c", Some(media)) => media.address = Some(parse_connection(value)?),
            ("m", _) => medias.push(parse_media_line(value, session_address)?),
            ("a", Some(media)) => {
                if let Some(rtpmap) = value.strip_prefix("rtpmap:") {
                    apply_rtpmap(media, rtpmap);
                } else if let Some(rtcp) = value.strip_prefix("rtcp:") {
                    apply_rtcp(media, rtcp);
                }
            }
            _ => {}
        }
    }

    Ok(medias)
}
