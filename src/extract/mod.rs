//! Extraction engine
//!
//! Orchestrates a full document pass: link discovery, rule-set admission,
//! field extraction, outlink filtering and pagination analysis. The
//! submodules hold the individual stages:
//! - `admission`: URL and content gating per rule-set
//! - `pipeline`: field spec evaluation
//! - `capture`: sub-document emission and outlink capture
//! - `outlinks`: the outlink filter chain
//! - `result`: the output data types

mod admission;
mod capture;
mod outlinks;
mod pipeline;
mod result;

pub use admission::admits;
pub use outlinks::filter_outlinks;
pub use pipeline::run_field_specs;
pub use result::{keys, EmittedDocument, ExtractionResult, FieldMap, Metadata, Outlink};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::dom::DocumentView;
use crate::pagination;
use crate::rules::{dates, RuleSet};
use crate::GleanError;

/// Default re-fetch interval for fresh content items: 90 days in seconds.
pub const DEFAULT_ITEM_FETCH_INTERVAL: u64 = 7_776_000;

/// Per-document inputs the engine needs beyond the parsed tree.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    /// The document's own URL; outlinks resolve against it
    pub base_url: String,

    /// When this URL was last fetched; enables pagination analysis
    pub last_fetch_time: Option<DateTime<Local>>,

    /// Fetch-layer metadata of the document (cookies, content type)
    pub parent_meta: Metadata,

    /// Externally supplied field values that bypass document extraction
    pub overrides: Metadata,

    /// Field name carrying the content date
    pub date_field: String,

    /// Date pattern the date field's values are formatted in
    pub date_pattern: String,

    /// Re-fetch interval assigned to freshly dated documents, in seconds
    pub item_fetch_interval: u64,
}

impl ExtractionContext {
    pub fn new(base_url: impl Into<String>) -> ExtractionContext {
        ExtractionContext {
            base_url: base_url.into(),
            last_fetch_time: None,
            parent_meta: Metadata::new(),
            overrides: Metadata::new(),
            date_field: "offerdate".to_string(),
            date_pattern: dates::DEFAULT_OUT_PATTERN.to_string(),
            item_fetch_interval: DEFAULT_ITEM_FETCH_INTERVAL,
        }
    }
}

/// Freshness verdict for the document itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Dated at or after the last fetch (or never fetched)
    New,
    /// Dated before the last fetch
    Stale,
    /// No parseable date field extracted
    Undated,
}

/// A finished extraction pass
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub result: ExtractionResult,
    pub freshness: Freshness,
}

/// Runs every rule-set over one parsed document.
///
/// Rule-sets the document is not admitted to are skipped without effect.
/// Discovered links pass through the outlink filter chains of the admitted
/// rule-sets; captured links bypass the chains. When a last fetch time is
/// known, pagination analysis replaces the outlink set with the links still
/// worth fetching.
pub fn process_document<D: DocumentView>(
    doc: &D,
    rulesets: &[RuleSet],
    ctx: &ExtractionContext,
) -> Result<ProcessOutcome, GleanError> {
    let mut links = doc.discover_links(&ctx.base_url, doc.root())?;
    let mut result = ExtractionResult::new();
    let mut captured = Vec::new();

    for ruleset in rulesets {
        if !admits(doc, ruleset, &ctx.base_url) {
            continue;
        }
        debug!(
            ruleset = ruleset.name.as_deref().unwrap_or("<unnamed>"),
            url = %ctx.base_url,
            "rule-set admitted document"
        );

        run_field_specs(doc, &ruleset.fields, ctx, &mut result, &mut captured)?;

        if !ruleset.outlink_filters.is_empty() {
            links = filter_outlinks(std::mem::take(&mut links), &ruleset.outlink_filters);
        }
    }

    // A date captured outside extraction (on the link that led here) still
    // counts when no field produced one.
    if result.fields.get(&ctx.date_field).is_none() {
        if let Some(date) = ctx.overrides.get(&ctx.date_field) {
            result.fields.add(&ctx.date_field, date);
        }
    }

    links.extend(captured);

    result.outlinks = match ctx.last_fetch_time {
        Some(last_fetch) => pagination::classify(
            &ctx.base_url,
            &ctx.parent_meta,
            links,
            last_fetch,
            &ctx.date_pattern,
            &ctx.date_field,
        ),
        None => links,
    };

    let freshness = classify_document(&mut result, ctx);
    if !result.documents.is_empty() {
        info!(
            url = %ctx.base_url,
            count = result.documents.len(),
            "emitted sub-documents"
        );
    }

    Ok(ProcessOutcome { result, freshness })
}

/// Judges the document's own freshness from its extracted date field and
/// tags fresh documents as content items.
fn classify_document(result: &mut ExtractionResult, ctx: &ExtractionContext) -> Freshness {
    let Some(date) = result.fields.first(&ctx.date_field) else {
        return Freshness::Undated;
    };
    let Some(parsed) = dates::parse_with_pattern(date, &ctx.date_pattern, Local::now()) else {
        warn!(date = %date, pattern = %ctx.date_pattern, "unparseable document date");
        return Freshness::Undated;
    };

    match ctx.last_fetch_time {
        Some(last_fetch) if parsed < last_fetch.naive_local() => Freshness::Stale,
        _ => {
            result.document_meta.insert(keys::ITEM_TYPE, "item");
            result
                .document_meta
                .insert(keys::FETCH_INTERVAL, ctx.item_fetch_interval.to_string());
            Freshness::New
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldSpecConfig, RuleSetConfig};
    use crate::dom::HtmlDocument;
    use chrono::TimeZone;

    fn ruleset_with_date_field() -> RuleSet {
        RuleSet::compile(&RuleSetConfig {
            fields: vec![
                FieldSpecConfig {
                    name: "title".to_string(),
                    query: Some("h1".to_string()),
                    ..FieldSpecConfig::default()
                },
                FieldSpecConfig {
                    name: "offerdate".to_string(),
                    query: Some("span.date".to_string()),
                    ..FieldSpecConfig::default()
                },
            ],
            ..RuleSetConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_fresh_document_tagged_as_item() {
        let doc =
            HtmlDocument::parse("<h1>Engineer</h1><span class='date'>01.06.2024</span>");
        let mut ctx = ExtractionContext::new("https://example.com/jobs/1");
        ctx.last_fetch_time = Some(Local.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        let outcome = process_document(&doc, &[ruleset_with_date_field()], &ctx).unwrap();
        assert_eq!(outcome.freshness, Freshness::New);
        assert_eq!(
            outcome.result.document_meta.get(keys::ITEM_TYPE),
            Some("item")
        );
        assert_eq!(
            outcome.result.document_meta.get(keys::FETCH_INTERVAL),
            Some("7776000")
        );
    }

    #[test]
    fn test_stale_document() {
        let doc =
            HtmlDocument::parse("<h1>Engineer</h1><span class='date'>01.06.2020</span>");
        let mut ctx = ExtractionContext::new("https://example.com/jobs/1");
        ctx.last_fetch_time = Some(Local.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        let outcome = process_document(&doc, &[ruleset_with_date_field()], &ctx).unwrap();
        assert_eq!(outcome.freshness, Freshness::Stale);
        assert!(outcome.result.document_meta.is_empty());
    }

    #[test]
    fn test_undated_document() {
        let doc = HtmlDocument::parse("<h1>Engineer</h1>");
        let ctx = ExtractionContext::new("https://example.com/jobs/1");

        let outcome = process_document(&doc, &[ruleset_with_date_field()], &ctx).unwrap();
        assert_eq!(outcome.freshness, Freshness::Undated);
        assert_eq!(outcome.result.fields.first("title"), Some("Engineer"));
    }

    #[test]
    fn test_date_supplied_externally_when_extraction_finds_none() {
        let doc = HtmlDocument::parse("<h1>Engineer</h1>");
        let mut ctx = ExtractionContext::new("https://example.com/jobs/1");
        ctx.overrides.insert("offerdate", "01.06.2024");

        let ruleset = RuleSet::compile(&RuleSetConfig {
            fields: vec![FieldSpecConfig {
                name: "title".to_string(),
                query: Some("h1".to_string()),
                ..FieldSpecConfig::default()
            }],
            ..RuleSetConfig::default()
        })
        .unwrap();

        let outcome = process_document(&doc, &[ruleset], &ctx).unwrap();
        assert_eq!(outcome.result.fields.first("offerdate"), Some("01.06.2024"));
        assert_eq!(outcome.freshness, Freshness::New);
    }

    #[test]
    fn test_unadmitted_ruleset_has_no_effect() {
        let doc = HtmlDocument::parse("<h1>Engineer</h1>");
        let ctx = ExtractionContext::new("https://example.com/other");

        let ruleset = RuleSet::compile(&RuleSetConfig {
            url_filter_regex: Some("^https://example.com/jobs/".to_string()),
            fields: vec![FieldSpecConfig {
                name: "title".to_string(),
                query: Some("h1".to_string()),
                ..FieldSpecConfig::default()
            }],
            ..RuleSetConfig::default()
        })
        .unwrap();

        let outcome = process_document(&doc, &[ruleset], &ctx).unwrap();
        assert!(outcome.result.fields.is_empty());
    }

    #[test]
    fn test_links_kept_without_filters_or_pagination() {
        let doc = HtmlDocument::parse(
            "<h1>t</h1><a href='/a'>A</a><a href='https://other.example/b'>B</a>",
        );
        let ctx = ExtractionContext::new("https://example.com/");

        let outcome = process_document(&doc, &[ruleset_with_date_field()], &ctx).unwrap();
        let urls: Vec<_> = outcome.result.outlinks.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://other.example/b"]);
    }
}
