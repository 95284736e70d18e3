//! Outlink filter chain
//!
//! Runs a rule-set's outlink filters over the links discovered on a page.
//! Filters are ordered; within each filter the rules are ordered. The first
//! rule anywhere in the chain that matches a link decides it, and a link no
//! rule matches is dropped.

use tracing::debug;

use super::result::Outlink;
use crate::rules::{OutlinkFilter, Rule};

/// Applies the filter chain, returning the kept links in input order.
///
/// A matching URL rule rewrites the link's target to the rule's captured
/// value; a matching anchor rule keeps the link unchanged.
pub fn filter_outlinks(links: Vec<Outlink>, filters: &[OutlinkFilter]) -> Vec<Outlink> {
    let mut kept = Vec::with_capacity(links.len());

    for mut link in links {
        match first_match(filters, &link) {
            Some((rule, captured)) => {
                if !rule.is_anchor_rule() {
                    link.url = captured;
                }
                kept.push(link);
            }
            None => {
                debug!(url = %link.url, "outlink matched no filter rule, dropped");
            }
        }
    }

    kept
}

fn first_match<'a>(filters: &'a [OutlinkFilter], link: &Outlink) -> Option<(&'a Rule, String)> {
    for filter in filters {
        for rule in &filter.rules {
            if let Some(captured) = rule.apply_link(link) {
                return Some((rule, captured));
            }
        }
    }
    None
}
