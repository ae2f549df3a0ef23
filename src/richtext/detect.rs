//! Facet detection: finds mentions, links and hashtags in plain text.
//!
//! Offsets are UTF-8 byte offsets into the text. Mentions come out holding
//! the handle in the `did` field; [`super::RichText::detect_facets`]
//! replaces it with the resolved DID.

use regex_lite::Regex;
use std::sync::LazyLock;

use super::facet::{Facet, FacetFeature};

/// Longest accepted hashtag, in characters (without the `#`)
pub const MAX_TAG_LENGTH: usize = 64;

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([a-zA-Z0-9.-]+)\b").expect("mention pattern is valid"));

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://\S+)|(?:(?P<domain>[a-z][a-z0-9]*(?:\.[a-z0-9]+)+)\S*)")
        .expect("link pattern is valid")
});

/// Generic TLDs accepted for bare-domain links and handles. Any two-letter
/// alphabetic label is accepted as a country code.
const GENERIC_TLDS: &[&str] = &[
    "app", "art", "bio", "biz", "blog", "cafe", "cat", "cloud", "club", "com", "community", "coop",
    "dev", "design", "digital", "edu", "email", "engineering", "events", "fun", "games", "gay",
    "gov", "group", "guru", "info", "int", "life", "link", "live", "lol", "media", "mil",
    "moe", "museum", "name", "net", "network", "news", "ninja", "one", "online", "org", "page",
    "photo", "photography", "pizza", "place", "pro", "pub", "rocks", "run", "science", "site",
    "social", "software", "space", "store", "studio", "systems", "tech", "today", "tools",
    "top", "travel", "wiki", "website", "work", "works", "world", "wtf", "xyz", "zone",
];

/// Whether `domain` looks like a registrable hostname with a known TLD
pub fn is_valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let valid_labels = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !valid_labels {
        return false;
    }

    let tld = labels[labels.len() - 1].to_ascii_lowercase();
    (tld.len() == 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        || GENERIC_TLDS.contains(&tld.as_str())
}

/// Detect all facets, sorted by start offset
pub fn detect(text: &str) -> Vec<Facet> {
    let mut facets = Vec::new();
    facets.extend(detect_mentions(text));
    facets.extend(detect_links(text));
    facets.extend(detect_tags(text));
    facets.sort_by_key(|f| f.index.byte_start);
    facets
}

/// `@handle` mentions. The `did` field holds the bare handle.
pub fn detect_mentions(text: &str) -> Vec<Facet> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            if !starts_token(text, m.start()) {
                return None;
            }
            let handle = caps.get(1)?.as_str();
            if !is_valid_domain(handle) && !handle.ends_with(".test") {
                return None;
            }
            Some(Facet::new(m.start(), m.end(), FacetFeature::Mention {
                did: handle.to_string(),
            }))
        })
        .collect()
}

/// Explicit `http(s)://` links and bare domains
pub fn detect_links(text: &str) -> Vec<Facet> {
    let mut facets = Vec::new();
    let mut pos = 0;

    while let Some(caps) = LINK_RE.captures_at(text, pos) {
        let Some(m) = caps.get(0) else { break };
        let matched = until_whitespace(m.as_str());
        pos = m.start() + matched.len();

        if !starts_token(text, m.start()) {
            continue;
        }

        let mut uri = match caps.name("domain") {
            Some(domain) => {
                if !is_valid_domain(domain.as_str()) {
                    continue;
                }
                format!("https://{matched}")
            }
            None => matched.to_string(),
        };

        let mut end = pos;
        if uri.ends_with(['.', ',', ';', ':', '!', '?']) {
            uri.pop();
            end -= 1;
        }
        if uri.ends_with(')') && !uri.contains('(') {
            uri.pop();
            end -= 1;
        }

        facets.push(Facet::new(m.start(), end, FacetFeature::Link { uri }));
    }

    facets
}

/// Whether a mention or link may start at `start`: at the beginning of the
/// text, after any Unicode whitespace, or after `(`
fn starts_token(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_none_or(|prev| prev.is_whitespace() || prev == '(')
}

/// `\S` in the link pattern only stops at ASCII whitespace
fn until_whitespace(s: &str) -> &str {
    s.find(char::is_whitespace).map_or(s, |end| &s[..end])
}

/// `#tag` hashtags (also the full-width `＃`)
pub fn detect_tags(text: &str) -> Vec<Facet> {
    let mut facets = Vec::new();

    for (start, c) in text.char_indices() {
        if c != '#' && c != '＃' {
            continue;
        }
        if text[..start]
            .chars()
            .next_back()
            .is_some_and(|prev| !prev.is_whitespace())
        {
            continue;
        }

        let body_start = start + c.len_utf8();
        let rest = &text[body_start..];
        let body_len = rest
            .find(|ch: char| ch.is_whitespace() || is_invisible(ch))
            .unwrap_or(rest.len());
        let body = &rest[..body_len];

        // Keycap sequences like #️⃣ are emoji, not tags
        if body.starts_with('\u{fe0f}') {
            continue;
        }
        if !body
            .chars()
            .any(|ch| !ch.is_ascii_digit() && !is_punctuation(ch))
        {
            continue;
        }

        let tag = body.trim_end_matches(is_punctuation);
        let tag_chars = tag.chars().count();
        if tag_chars == 0 || tag_chars > MAX_TAG_LENGTH {
            continue;
        }

        facets.push(Facet::new(start, body_start + tag.len(), FacetFeature::Tag {
            tag: tag.to_string(),
        }));
    }

    facets
}

/// Soft hyphen, joiners and zero-width spaces end a tag
const fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}' | '\u{2060}' | '\u{200A}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{20E2}'
    )
}

/// Punctuation in the Unicode sense (symbols such as `$` or `+` are not)
fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        '!' | '"'
            | '#'
            | '%'
            | '&'
            | '\''
            | '('
            | ')'
            | '*'
            | ','
            | '-'
            | '.'
            | '/'
            | ':'
            | ';'
            | '?'
            | '@'
            | '['
            | '\\'
            | ']'
            | '_'
            | '{'
            | '}'
            | '¡'
            | '§'
            | '«'
            | '»'
            | '¿'
            | '‐'..='‧'
            | '‰'..='⁞'
            | '、'..='〃'
            | '〈'..='】'
            | '！'
            | '，'
            | '．'
            | '：'
            | '；'
            | '？'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(text: &str, facets: &[Facet]) -> Vec<String> {
        facets
            .iter()
            .map(|f| text[f.index.range()].to_string())
            .collect()
    }

    #[test]
    fn test_valid_domains() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("alice.bsky.social"));
        assert!(is_valid_domain("foo.io"));
        assert!(!is_valid_domain("localhost"));
        assert!(!is_valid_domain("notes.txt"));
        assert!(!is_valid_domain("-bad.com"));
        assert!(!is_valid_domain("a..com"));
    }

    #[test]
    fn test_mentions() {
        let text = "hi @alice.bsky.social and (@bob.test) but not me@example.com";
        let facets = detect_mentions(text);
        assert_eq!(spans(text, &facets), vec!["@alice.bsky.social", "@bob.test"]);
        assert_eq!(facets[0].feature(), Some(&FacetFeature::Mention {
            did: "alice.bsky.social".to_string()
        }));
    }

    #[test]
    fn test_mention_trailing_dot_excluded() {
        let text = "thanks @carol.bsky.social.";
        let facets = detect_mentions(text);
        assert_eq!(spans(text, &facets), vec!["@carol.bsky.social"]);
    }

    #[test]
    fn test_mention_without_tld_ignored() {
        assert!(detect_mentions("ping @nobody").is_empty());
    }

    #[test]
    fn test_links() {
        let text = "see https://example.com/a?b=1, or example.org/path.";
        let facets = detect_links(text);
        assert_eq!(spans(text, &facets), vec![
            "https://example.com/a?b=1",
            "example.org/path"
        ]);
        assert_eq!(facets[1].feature(), Some(&FacetFeature::Link {
            uri: "https://example.org/path".to_string()
        }));
    }

    #[test]
    fn test_link_closing_paren() {
        let text = "(see https://example.com/x)";
        let facets = detect_links(text);
        assert_eq!(spans(text, &facets), vec!["https://example.com/x"]);

        let text = "https://en.wikipedia.org/wiki/Rust_(language)";
        let facets = detect_links(text);
        assert_eq!(spans(text, &facets), vec![text]);
    }

    #[test]
    fn test_bare_file_names_are_not_links() {
        assert!(detect_links("open notes.txt please").is_empty());
        assert!(detect_links("email me@example.com").is_empty());
    }

    #[test]
    fn test_tags() {
        let text = "#rust is fun #日本語 and #123 but not a#b, #end!";
        let facets = detect_tags(text);
        assert_eq!(spans(text, &facets), vec!["#rust", "#日本語", "#end"]);
        assert_eq!(facets[2].feature(), Some(&FacetFeature::Tag {
            tag: "end".to_string()
        }));
    }

    #[test]
    fn test_fullwidth_hash() {
        let text = "＃タグ";
        let facets = detect_tags(text);
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].index.byte_start, 0);
        assert_eq!(facets[0].index.byte_end, text.len());
    }

    #[test]
    fn test_tag_length_limit() {
        let long = format!("#{}", "a".repeat(MAX_TAG_LENGTH + 1));
        assert!(detect_tags(&long).is_empty());
        let ok = format!("#{}", "a".repeat(MAX_TAG_LENGTH));
        assert_eq!(detect_tags(&ok).len(), 1);
    }

    #[test]
    fn test_keycap_is_not_a_tag() {
        assert!(detect_tags("#\u{fe0f}\u{20e3}").is_empty());
    }

    #[test]
    fn test_detect_sorted_by_offset() {
        let text = "#first https://example.com @dan.bsky.social";
        let facets = detect(text);
        let starts: Vec<_> = facets.iter().map(|f| f.index.byte_start).collect();
        assert_eq!(starts, vec![0, 7, 27]);
    }

    #[test]
    fn test_offsets_are_bytes() {
        let text = "✨ example.com";
        let facets = detect_links(text);
        assert_eq!(facets[0].index.byte_start, "✨ ".len());
        assert_eq!(facets[0].index.byte_end, text.len());
    }

    #[test]
    fn test_http_prefixed_bare_domain() {
        let facets = detect_links("try httpbin.org");
        assert_eq!(facets[0].feature(), Some(&FacetFeature::Link {
            uri: "https://httpbin.org".to_string()
        }));

        let facets = detect_links("see http.cat");
        assert_eq!(facets[0].feature(), Some(&FacetFeature::Link {
            uri: "https://http.cat".to_string()
        }));

        assert!(detect_links("open httpnotes.txt now").is_empty());
        assert!(detect_links("xhttps://example.com").is_empty());
    }

    #[test]
    fn test_unicode_whitespace_boundaries() {
        let text = "see example.com\u{3000}next";
        let facets = detect_links(text);
        assert_eq!(spans(text, &facets), vec!["example.com"]);
        assert_eq!(facets[0].feature(), Some(&FacetFeature::Link {
            uri: "https://example.com".to_string()
        }));

        let text = "nbsp\u{a0}https://example.com";
        assert_eq!(spans(text, &detect_links(text)), vec!["https://example.com"]);

        let text = "a.io\u{3000}https://b.io";
        assert_eq!(spans(text, &detect_links(text)), vec![
            "a.io",
            "https://b.io"
        ]);

        let text = "hi\u{3000}@alice.bsky.social";
        assert_eq!(spans(text, &detect_mentions(text)), vec!["@alice.bsky.social"]);

        let text = "tag\u{3000}#rust";
        assert_eq!(spans(text, &detect_tags(text)), vec!["#rust"]);
    }
}
