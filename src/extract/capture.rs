//! Repeated-structure capture
//!
//! Two field kinds operate on repeated structures (listing rows, result
//! cards) instead of plain text: sub-document emission turns each matched
//! structure into a synthetic document, and outlink capture turns it into
//! an annotated outlink. Both pick a representative link from the structure
//! by running the field's rule over the links found inside it.

use tracing::debug;

use super::result::{keys, EmittedDocument, Metadata, Outlink};
use super::ExtractionContext;
use crate::dom::{extract_text, filter_value, DocumentView};
use crate::rules::{FieldSpec, Rule};
use crate::GleanError;

/// Outcome of matching a field's rule against a structure's links
struct Representative {
    /// Index of the matched candidate link
    index: usize,
    /// Captured value, promoted to a URL when the rule says so
    result_url: Option<String>,
}

/// Runs `rule` over the candidate links in order and returns the first
/// match. A matching URL rule rewrites the candidate's target in place.
fn pick_representative(candidates: &mut [Outlink], rule: &Rule) -> Option<Representative> {
    for (index, candidate) in candidates.iter_mut().enumerate() {
        if let Some(captured) = rule.apply_link(candidate) {
            let result_url = rule.is_result_url().then(|| captured.clone());
            if !rule.is_anchor_rule() {
                candidate.url = captured;
            }
            return Some(Representative { index, result_url });
        }
    }
    None
}

/// Evaluates the nested field specs of `spec` against one matched structure
/// node, invoking `sink` with each (name, value) pair produced.
fn run_nested<D, F>(
    doc: &D,
    node: D::NodeId,
    spec: &FieldSpec,
    mut sink: F,
) -> Result<(), GleanError>
where
    D: DocumentView,
    F: FnMut(&str, String),
{
    for nested in &spec.nested {
        if nested.query.is_empty() {
            continue;
        }
        let Some(inner) = doc.select_one(node, &nested.query)? else {
            debug!(field = %nested.name, query = %nested.query, "nested query matched nothing");
            continue;
        };

        let text = extract_text(doc, inner, nested.with_descendant_text);
        let Some(value) = filter_value(&text, nested.trim) else {
            continue;
        };

        let value = match &nested.rule {
            Some(rule) => match rule.apply(&value) {
                Some(value) => value,
                None => {
                    debug!(field = %nested.name, value = %value, "nested rule rejected value");
                    continue;
                }
            },
            None => value,
        };

        if !value.is_empty() {
            sink(&nested.name, value);
        }
    }
    Ok(())
}

/// Emits one synthetic document per structure node matched by `spec`.
///
/// A structure with no link the rule resolves into a result URL emits
/// nothing; the remaining structures are unaffected.
pub fn emit_sub_documents<D: DocumentView>(
    doc: &D,
    nodes: &[D::NodeId],
    spec: &FieldSpec,
    ctx: &ExtractionContext,
    documents: &mut Vec<EmittedDocument>,
) -> Result<(), GleanError> {
    let Some(rule) = &spec.rule else {
        return Ok(());
    };

    for &node in nodes {
        let mut candidates = doc.discover_links(&ctx.base_url, node)?;
        let result_url = pick_representative(&mut candidates, rule).and_then(|rep| rep.result_url);
        let Some(url) = result_url else {
            debug!(field = %spec.name, "structure has no resolvable result link, skipped");
            continue;
        };

        let mut metadata = Metadata::new();
        let mut body = String::new();
        run_nested(doc, node, spec, |name, value| {
            if !body.is_empty() {
                body.push(' ');
            }
            body.push_str(&value);
            metadata.insert(name, value);
        })?;

        for key in [
            keys::COOKIE,
            keys::COOKIE_DOMAIN,
            keys::COOKIE_PATH,
            keys::COOKIE_EXPIRY,
            keys::COOKIE_SECURE,
        ] {
            metadata.copy_from(&ctx.parent_meta, key);
        }

        documents.push(EmittedDocument {
            url,
            text: body,
            metadata,
            content_type: ctx.parent_meta.get(keys::CONTENT_TYPE).map(str::to_string),
            fetch_interval: 0,
        });
    }

    Ok(())
}

/// Captures one annotated outlink per structure node matched by `spec`.
///
/// The structure's representative link is kept (its URL rewritten when the
/// rule is a URL rule), the spec's injected metadata pair is attached, and
/// nested field values land in the link's metadata.
pub fn capture_outlinks<D: DocumentView>(
    doc: &D,
    nodes: &[D::NodeId],
    spec: &FieldSpec,
    ctx: &ExtractionContext,
    captured: &mut Vec<Outlink>,
) -> Result<(), GleanError> {
    let Some(rule) = &spec.rule else {
        return Ok(());
    };

    for &node in nodes {
        let mut candidates = doc.discover_links(&ctx.base_url, node)?;
        let Some(rep) = pick_representative(&mut candidates, rule) else {
            debug!(field = %spec.name, "structure has no link matching the capture rule");
            continue;
        };
        let mut link = candidates.swap_remove(rep.index);

        if let Some((key, value)) = &spec.inject_meta {
            link.metadata.insert(key, value);
        }

        run_nested(doc, node, spec, |name, value| {
            link.metadata.insert(name, value);
        })?;

        captured.push(link);
    }

    Ok(())
}
