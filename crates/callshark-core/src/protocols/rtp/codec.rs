use serde::Serialize;

/// Static RTP payload type assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RtpEncoding {
    pub id: u8,
    /// Encoding name with clock rate, as written in `a=rtpmap`.
    pub name: &'static str,
    /// Short codec alias.
    pub format: &'static str,
}

const fn enc(id: u8, name: &'static str, format: &'static str) -> RtpEncoding {
    RtpEncoding { id, name, format }
}

/// Static payload types from RFC 3551.
pub const STANDARD_ENCODINGS: &[RtpEncoding] = &[
    enc(0, "PCMU/8000", "g711u"),
    enc(3, "GSM/8000", "gsm"),
    enc(4, "G723/8000", "g723"),
    enc(5, "DVI4/8000", "dvi"),
    enc(6, "DVI4/16000", "dvi"),
    enc(7, "LPC/8000", "lpc"),
    enc(8, "PCMA/8000", "g711a"),
    enc(9, "G722/8000", "g722"),
    enc(10, "L16/44100", "l16"),
    enc(11, "L16/44100", "l16"),
    enc(12, "QCELP/8000", "qcelp"),
    enc(13, "CN/8000", "cn"),
    enc(14, "MPA/90000", "mpa"),
    enc(15, "G728/8000", "g728"),
    enc(16, "DVI4/11025", "dvi"),
    enc(17, "DVI4/22050", "dvi"),
    enc(18, "G729/8000", "g729"),
    enc(25, "CelB/90000", "celb"),
    enc(26, "JPEG/90000", "jpeg"),
    enc(28, "nv/90000", "nv"),
    enc(31, "H261/90000", "h261"),
    enc(32, "MPV/90000", "mpv"),
    enc(33, "MP2T/90000", "mp2t"),
    enc(34, "H263/90000", "h263"),
];

pub fn encoding_by_id(id: u8) -> Option<&'static RtpEncoding> {
    STANDARD_ENCODINGS.iter().find(|encoding| encoding.id == id)
}
