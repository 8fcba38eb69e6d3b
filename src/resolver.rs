use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::MatchRef;

/// Hyphenated hex identifier, with or without the `1-` room prefix.
static MATCH_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(1-)?[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid match id pattern")
});

/// Extract a canonical match identifier from free-form input: a bare
/// identifier, or a room URL with or without scheme, host and locale
/// segments. Side-effect free; returns `None` for anything else.
pub fn resolve(input: &str) -> Option<MatchRef> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(canonical) = canonical_from_token(trimmed) {
        return Some(MatchRef {
            raw_input: input.to_string(),
            canonical_id: canonical,
        });
    }

    // URL shapes encode the identifier as a path segment, usually right
    // after a "room" segment. Scan segments rather than hard-coding hosts.
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);

    for segment in path.split('/') {
        if let Some(canonical) = canonical_from_token(segment) {
            return Some(MatchRef {
                raw_input: input.to_string(),
                canonical_id: canonical,
            });
        }
    }

    None
}

/// Canonical form: lowercase, `1-` prefix ensured.
fn canonical_from_token(token: &str) -> Option<String> {
    if !MATCH_ID.is_match(token) {
        return None;
    }
    let lower = token.to_ascii_lowercase();
    if lower.starts_with("1-") {
        Some(lower)
    } else {
        Some(format!("1-{lower}"))
    }
}
