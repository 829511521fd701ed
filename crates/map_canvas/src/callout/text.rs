//! Text extraction for callout content.
//!
//! Content is markup-light text: `<br>` variants and line feeds separate lines, other tags are
//! dropped, and a handful of common entities are decoded.

/// Split callout content into display lines.
///
/// Lines are trimmed and runs of empty lines collapse into one. The result is never empty.
pub fn normalize_lines(content: &str) -> Vec<String> {
    let plain = decode_entities(&strip_markup(content));
    let mut lines: Vec<String> = Vec::new();
    for raw in plain.split('\n') {
        let line = raw.trim();
        let previous_empty = lines.last().is_some_and(|l| l.is_empty());
        if line.is_empty() && previous_empty {
            continue;
        }
        lines.push(line.to_owned());
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Replace break markers with `\n` and drop all other tags.
fn strip_markup(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find(['<', '\r']) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix('\r') {
            out.push('\n');
            rest = after.strip_prefix('\n').unwrap_or(after);
            continue;
        }
        match tail.find('>') {
            Some(end) => {
                if is_break_tag(&tail[1..end]) {
                    out.push('\n');
                }
                rest = &tail[end + 1..];
            }
            None => {
                // Unterminated '<' is plain text.
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_break_tag(inner: &str) -> bool {
    let name = inner.trim().trim_end_matches('/').trim_end();
    name.eq_ignore_ascii_case("br")
}

fn decode_entities(text: &str) -> String {
    const ENTITIES: [(&str, &str); 6] = [
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&nbsp;", " "),
        ("&amp;", "&"),
    ];
    if !text.contains('&') {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ENTITIES.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
