//! HTML cleanup for feed content
//!
//! Feed titles and summaries arrive with markup and numeric entities
//! baked in. Everything is cleaned once at ingest so no downstream step
//! ever has to patch already-written text.

/// Entity replacements, applied in order. `&amp;` is decoded last so a
/// double-encoded entity does not re-enter the table.
const ENTITY_REPLACEMENTS: &[(&str, &str)] = &[
    ("&#8216;", "\u{2018}"),
    ("&#8217;", "\u{2019}"),
    ("&#8220;", "\u{201c}"),
    ("&#8221;", "\u{201d}"),
    ("&#8230;", "\u{2026}"),
    ("&#8211;", "\u{2013}"),
    ("&#8212;", "\u{2014}"),
    ("&#039;", "'"),
    ("&#39;", "'"),
    ("&#038;", "&"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&nbsp;", " "),
    ("&amp;", "&"),
];

/// Strip HTML tags from text
pub fn strip_tags(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Decode named and numeric HTML entities
pub fn decode_entities(text: &str) -> String {
    let mut result = text.to_string();
    for (entity, replacement) in ENTITY_REPLACEMENTS {
        if result.contains(entity) {
            result = result.replace(entity, replacement);
        }
    }
    result
}

/// Full cleanup pass: strip tags, decode entities, collapse whitespace
pub fn clean_text(html: &str) -> String {
    decode_entities(&strip_tags(html))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        let html = "<p>Hello <b>world</b>!</p>";
        assert_eq!(strip_tags(html), "Hello world!");
    }

    #[test]
    fn test_decode_numeric_entities() {
        let text = "Taylor&#8217;s era &#8230; continues";
        assert_eq!(decode_entities(text), "Taylor\u{2019}s era \u{2026} continues");
    }

    #[test]
    fn test_amp_decoded_last() {
        // A double-encoded apostrophe stays an entity literal, it must
        // not be decoded twice.
        let text = "Kim &amp;#8217;s";
        assert_eq!(decode_entities(text), "Kim &#8217;s");
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        let html = "<div>Kim &amp; Kanye\n\n  split</div>";
        assert_eq!(clean_text(html), "Kim & Kanye split");
    }
}
