//! Field spec evaluation
//!
//! Walks a rule-set's field specs over an admitted document, dispatching on
//! field kind. Plain scalar and concatenated fields produce named values;
//! the capture kinds delegate to [`super::capture`].

use tracing::debug;

use super::capture;
use super::result::{ExtractionResult, Outlink};
use super::ExtractionContext;
use crate::dom::{extract_text, filter_value, DocumentView};
use crate::rules::{FieldKind, FieldSpec};
use crate::GleanError;

/// Runs every field spec of one rule-set.
///
/// Captured outlinks accumulate in `captured` so the caller can merge them
/// past the outlink filter chain.
pub fn run_field_specs<D: DocumentView>(
    doc: &D,
    specs: &[FieldSpec],
    ctx: &ExtractionContext,
    result: &mut ExtractionResult,
    captured: &mut Vec<Outlink>,
) -> Result<(), GleanError> {
    for spec in specs {
        // Externally supplied values bypass the document entirely; only the
        // field's rule still runs over them.
        if let Some(supplied) = ctx.overrides.get(&spec.name) {
            let value = supplied.trim().to_string();
            let value = match &spec.rule {
                Some(rule) => rule.apply(&value),
                None => Some(value),
            };
            if let Some(value) = value {
                debug!(field = %spec.name, "field taken from supplied metadata");
                result.fields.add(&spec.name, value);
            }
            continue;
        }

        if spec.query.is_empty() {
            continue;
        }

        let nodes = doc.select(doc.root(), &spec.query)?;

        match spec.kind {
            FieldKind::Scalar => {
                for node in nodes {
                    let text = extract_text(doc, node, spec.with_descendant_text);
                    let Some(value) = filter_value(&text, spec.trim) else {
                        continue;
                    };
                    let value = match &spec.rule {
                        Some(rule) => rule.apply(&value),
                        None => Some(value),
                    };
                    if let Some(value) = value {
                        result.fields.add(&spec.name, value);
                    }
                }
            }
            FieldKind::Concatenated => {
                let mut joined = String::new();
                for node in nodes {
                    // Concatenated fields always read the node's own text
                    // content; the descendant-text flag does not apply.
                    let text = extract_text(doc, node, false);
                    if let Some(value) = filter_value(&text, spec.trim) {
                        if !joined.is_empty() {
                            joined.push_str(&spec.concat_delimiter);
                        }
                        joined.push_str(&value);
                    }
                }
                if !joined.is_empty() {
                    result.fields.add(&spec.name, joined);
                }
            }
            FieldKind::SubDocument => {
                capture::emit_sub_documents(doc, &nodes, spec, ctx, &mut result.documents)?;
            }
            FieldKind::OutlinkCapture => {
                capture::capture_outlinks(doc, &nodes, spec, ctx, captured)?;
            }
        }
    }

    Ok(())
}
