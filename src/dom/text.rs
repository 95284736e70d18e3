//! Text extraction and value filtering
//!
//! Converts document nodes into normalized text, honoring the exclusion
//! rules for `script`/`style` subtrees and comments, and filters candidate
//! field values before they enter the extraction pipeline.

use super::{DocumentView, NodeKind};

/// Extracts text content from a node.
///
/// With `include_descendants = false` this returns the node's own rendered
/// text content unmodified. With `include_descendants = true` it performs a
/// pre-order traversal of the subtree, skipping `script`/`style` subtrees
/// and comments, collapsing internal whitespace runs and joining non-empty
/// text runs with a single space.
///
/// Pure function of the subtree; may return an empty string, never fails.
pub fn extract_text<D: DocumentView>(doc: &D, node: D::NodeId, include_descendants: bool) -> String {
    if !include_descendants {
        return doc.own_text(node);
    }

    let mut out = String::new();
    collect_text(doc, node, &mut out);
    out
}

fn collect_text<D: DocumentView>(doc: &D, node: D::NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Comment => {}
        NodeKind::Text => {
            if let Some(raw) = doc.text_value(node) {
                let text = normalize_ws(&raw);
                if !text.is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(&text);
                }
            }
        }
        NodeKind::Element | NodeKind::Other => {
            if let Some(tag) = doc.tag_name(node) {
                if tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style") {
                    return;
                }
            }
            for child in doc.children(node) {
                collect_text(doc, child, out);
            }
        }
    }
}

/// Filters a candidate field value.
///
/// Returns `None` when the value is empty or composed entirely of space,
/// newline and tab characters. Otherwise the value is optionally trimmed
/// and HTML-entity-unescaped.
pub fn filter_value(value: &str, trim: bool) -> Option<String> {
    if value.is_empty() || value.chars().all(|c| matches!(c, ' ' | '\n' | '\t')) {
        return None;
    }

    let value = if trim { value.trim() } else { value };
    Some(unescape_entities(value))
}

/// Collapse sequences of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Decodes the common HTML entities: the named ones that survive HTML
/// cleaning in practice plus numeric character references.
pub fn unescape_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        // Entity names are short; a ';' further out than 12 bytes is not
        // one. ';' is ASCII so the offset is always a char boundary.
        let Some(end) = rest.find(';').filter(|&p| p <= 12) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };

        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}
