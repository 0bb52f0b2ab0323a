use super::layout;

/// Split a buffer at the end of the SIP header block.
///
/// Returns `(headers, body_offset)` where `headers` excludes the blank line.
pub fn split_head(data: &[u8]) -> Option<(&[u8], usize)> {
    if let Some(pos) = find(data, layout::HEADER_END) {
        return Some((&data[..pos], pos + layout::HEADER_END.len()));
    }
    find(data, layout::HEADER_END_LF).map(|pos| (&data[..pos], pos + layout::HEADER_END_LF.len()))
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Canonical lowercase header name, expanding compact forms.
pub fn canonical_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    layout::COMPACT_HEADERS
        .iter()
        .find(|(compact, _)| *compact == lower)
        .map(|(_, full)| full.to_string())
        .unwrap_or(lower)
}

/// Iterate header lines, joining folded continuation lines.
pub fn header_lines(head: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in head.lines().skip(1) {
        let line = line.trim_end_matches('\r');
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}
