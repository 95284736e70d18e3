//! Page admission filtering
//!
//! Decides whether a document is in scope for a rule-set before any field
//! extraction runs: the URL must match the rule-set's URL filter, and the
//! optional content filter must accept the page's text.

use tracing::{debug, warn};

use crate::dom::{extract_text, filter_value, DocumentView};
use crate::rules::RuleSet;

/// Returns true when the rule-set applies to the document at `url`.
///
/// An absent URL filter matches everything. Query evaluation errors make
/// the rule-set non-matching for this document; other rule-sets still run.
pub fn admits<D: DocumentView>(doc: &D, ruleset: &RuleSet, url: &str) -> bool {
    if let Some(url_filter) = &ruleset.url_filter {
        if !url_filter.is_match(url) {
            return false;
        }
    }

    let Some(query) = &ruleset.content_filter_query else {
        return true;
    };

    let nodes = match doc.select(doc.root(), query) {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!(query = %query, error = %e, "content filter query failed, rule-set skipped");
            return false;
        }
    };

    let Some(content_regex) = &ruleset.content_filter_regex else {
        // No content regex configured means the filter always passes
        return true;
    };

    if ruleset.content_filter_concat {
        let mut value = String::new();
        for node in nodes {
            let text = extract_text(doc, node, false);
            if let Some(text) = filter_value(&text, ruleset.content_filter_trim) {
                if !value.is_empty() {
                    value.push_str(&ruleset.content_filter_delimiter);
                }
                value.push_str(&text);
            }
        }
        let matched = content_regex.is_match(&value);
        if !matched {
            debug!(url = %url, "concatenated content filter rejected document");
        }
        matched
    } else {
        // Conjunctive: every matched node's filtered text must match
        for node in nodes {
            let text = extract_text(doc, node, false);
            if let Some(text) = filter_value(&text, ruleset.content_filter_trim) {
                if !content_regex.is_match(&text) {
                    debug!(url = %url, text = %text, "content filter rejected node text");
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSetConfig;
    use crate::dom::HtmlDocument;

    fn ruleset(config: RuleSetConfig) -> RuleSet {
        RuleSet::compile(&config).unwrap()
    }

    #[test]
    fn test_url_filter() {
        let rs = ruleset(RuleSetConfig {
            url_filter_regex: Some("^/jobs/.*".to_string()),
            ..RuleSetConfig::default()
        });
        let doc = HtmlDocument::parse("<p>x</p>");

        assert!(admits(&doc, &rs, "/jobs/123"));
        assert!(!admits(&doc, &rs, "/about"));
    }

    #[test]
    fn test_absent_url_filter_matches_everything() {
        let rs = ruleset(RuleSetConfig::default());
        let doc = HtmlDocument::parse("<p>x</p>");
        assert!(admits(&doc, &rs, "https://anything.example/"));
    }

    #[test]
    fn test_content_filter_conjunctive() {
        let rs = ruleset(RuleSetConfig {
            content_filter_query: Some("p.role".to_string()),
            content_filter_regex: Some("Engineer".to_string()),
            ..RuleSetConfig::default()
        });

        let all_match = HtmlDocument::parse(
            "<p class='role'>Software Engineer</p><p class='role'>Data Engineer</p>",
        );
        assert!(admits(&all_match, &rs, "/jobs/1"));

        // One non-matching node rejects the document even if another matches
        let one_misses = HtmlDocument::parse(
            "<p class='role'>Software Engineer</p><p class='role'>Accountant</p>",
        );
        assert!(!admits(&one_misses, &rs, "/jobs/1"));
    }

    #[test]
    fn test_content_filter_concat() {
        let rs = ruleset(RuleSetConfig {
            content_filter_query: Some("span".to_string()),
            content_filter_regex: Some("Senior Engineer".to_string()),
            content_filter_concat: Some(true),
            content_filter_concat_delimiter: Some(" ".to_string()),
            ..RuleSetConfig::default()
        });

        // Neither node matches alone; the concatenation does
        let doc = HtmlDocument::parse("<span>Senior</span><span>Engineer</span>");
        assert!(admits(&doc, &rs, "/jobs/1"));
    }

    #[test]
    fn test_content_filter_without_regex_passes() {
        let rs = ruleset(RuleSetConfig {
            content_filter_query: Some("p".to_string()),
            ..RuleSetConfig::default()
        });
        let doc = HtmlDocument::parse("<p>whatever</p>");
        assert!(admits(&doc, &rs, "/x"));
    }

    #[test]
    fn test_bad_content_query_rejects_ruleset() {
        let mut rs = ruleset(RuleSetConfig {
            content_filter_query: Some("p".to_string()),
            content_filter_regex: Some("x".to_string()),
            ..RuleSetConfig::default()
        });
        rs.content_filter_query = Some(":".to_string());
        let doc = HtmlDocument::parse("<p>x</p>");
        assert!(!admits(&doc, &rs, "/x"));
    }
}
