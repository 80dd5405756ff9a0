//! HTML escaping for template output.

const REPLACEMENT: &str = "&#xFFFD;";

/// Escape text for use in HTML content and quoted attribute values.
///
/// Both quote styles are encoded. Characters that may not appear in an HTML
/// document are replaced with `&#xFFFD;` instead of being passed through.
///
/// # Examples
///
/// ```
/// use quire_template::escape_html;
///
/// assert_eq!(escape_html("<a href='x'>"), "&lt;a href=&#039;x&#039;&gt;");
/// assert_eq!(escape_html("bell\u{7}"), "bell&#xFFFD;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    push_escaped(&mut result, s);
    result
}

/// Escape possibly invalid UTF-8 bytes.
///
/// Invalid sequences are replaced with `&#xFFFD;`, everything else is escaped
/// as by [`escape_html`].
#[must_use]
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        push_escaped(&mut result, chunk.valid());
        if !chunk.invalid().is_empty() {
            result.push_str(REPLACEMENT);
        }
    }
    result
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c if is_disallowed(c) => out.push_str(REPLACEMENT),
            c => out.push(c),
        }
    }
}

/// Controls other than whitespace, and Unicode non-characters.
fn is_disallowed(c: char) -> bool {
    let cp = u32::from(c);
    match cp {
        0x09 | 0x0A | 0x0C | 0x0D => false,
        0x00..=0x1F | 0x7F..=0x9F | 0xFDD0..=0xFDEF => true,
        _ => cp & 0xFFFE == 0xFFFE,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_special_characters() {
        assert_eq!(
            escape_html(r#"<p class="a">Tom & 'Jerry'</p>"#),
            "&lt;p class=&quot;a&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/p&gt;"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape_html("Grüße, 世界"), "Grüße, 世界");
    }

    #[test]
    fn test_whitespace_controls_allowed() {
        assert_eq!(escape_html("a\tb\nc\r\u{c}d"), "a\tb\nc\r\u{c}d");
    }

    #[test]
    fn test_disallowed_characters_replaced() {
        assert_eq!(escape_html("\u{0}x"), "&#xFFFD;x");
        assert_eq!(escape_html("\u{7f}"), "&#xFFFD;");
        assert_eq!(escape_html("\u{85}"), "&#xFFFD;");
        assert_eq!(escape_html("\u{fdd0}"), "&#xFFFD;");
        assert_eq!(escape_html("\u{fffe}\u{1ffff}"), "&#xFFFD;&#xFFFD;");
    }

    #[test]
    fn test_escape_bytes_invalid_utf8() {
        assert_eq!(escape_bytes(b"ok \xff<"), "ok &#xFFFD;&lt;");
        assert_eq!(escape_bytes(b"\xe2\x82"), "&#xFFFD;");
    }

    #[test]
    fn test_escape_bytes_valid_utf8() {
        assert_eq!(escape_bytes("café & co".as_bytes()), "café &amp; co");
    }
}
