//! Rule evaluation
//!
//! A `Rule` is one transformation step over a text value: a polarity-gated
//! regex match, group capture, rewrite, date normalization, and an ordered
//! chain of sub-rules applied to the running value. Rules are compiled once
//! at configuration load, immutable afterwards, and safe to share across
//! worker threads.

use chrono::{DateTime, Local};
use regex::Regex;
use tracing::debug;

use super::dates::{self, RelativeUnit};
use crate::extract::Outlink;

/// Date normalization step attached to a rule
#[derive(Debug, Clone)]
pub(crate) enum DateDecode {
    /// Value is an integer count of elapsed units before now
    Relative(RelativeUnit),
    /// Value is a calendar date in the given strftime format
    Calendar { strftime: String, has_year: bool },
}

/// A single compiled transformation rule.
///
/// Evaluation never fails: regex and date errors are swallowed (logged at
/// debug level) and produce an absent value, keeping a misbehaving rule
/// from aborting the whole document.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) pattern: Regex,
    pub(crate) accept: bool,
    pub(crate) group_index: Option<usize>,
    pub(crate) replacement: Option<String>,
    pub(crate) default_value: Option<String>,
    pub(crate) date_decode: Option<DateDecode>,
    /// strftime output format for the date step
    pub(crate) out_format: String,
    pub(crate) is_anchor_rule: bool,
    pub(crate) is_result_url: bool,
    pub(crate) sub_rules: Vec<Rule>,
}

impl Rule {
    /// Whether this rule reads an outlink's anchor text rather than its URL.
    pub fn is_anchor_rule(&self) -> bool {
        self.is_anchor_rule
    }

    /// Whether a captured value becomes the emitted result's URL.
    pub fn is_result_url(&self) -> bool {
        self.is_result_url
    }

    /// Applies the rule to a text value.
    ///
    /// Returns `None` when the polarity gate fails and no default value is
    /// configured; otherwise the transformed running value.
    pub fn apply(&self, text: &str) -> Option<String> {
        self.apply_at(text, Local::now())
    }

    /// Applies the rule against an outlink, reading either its anchor text
    /// or its target URL depending on the rule's anchor flag.
    pub fn apply_link(&self, link: &Outlink) -> Option<String> {
        let input = if self.is_anchor_rule {
            link.anchor.trim()
        } else {
            link.url.trim()
        };
        self.apply(input)
    }

    /// Applies the rule with an explicit evaluation instant, so relative
    /// date decoding is deterministic under test.
    pub fn apply_at(&self, text: &str, now: DateTime<Local>) -> Option<String> {
        let found = self.pattern.find(text);
        let gate_ok = if self.accept {
            found.is_some()
        } else {
            found.is_none()
        };

        // Only an accept rule that found nothing may fall back to the
        // default; a reject rule that matched short-circuits.
        if !gate_ok {
            if found.is_none() {
                return self.default_value.clone();
            }
            return None;
        }
        let Some(found) = found else {
            return self.default_value.clone();
        };

        let mut value = match self.group_index {
            Some(index) => self
                .pattern
                .captures(text)
                .and_then(|caps| caps.get(index))
                .map(|group| group.as_str().to_string())
                .unwrap_or_default(),
            None => found.as_str().to_string(),
        };

        if !value.is_empty() {
            if let Some(replacement) = &self.replacement {
                value = self
                    .pattern
                    .replace(&value, replacement.as_str())
                    .into_owned();
            }
        }

        if value.is_empty() {
            if let Some(default) = &self.default_value {
                value = default.clone();
            }
        }

        if !value.is_empty() {
            if let Some(decode) = &self.date_decode {
                match self.decode_date(&value, decode, now) {
                    Some(formatted) => value = formatted,
                    None => debug!(
                        pattern = %self.pattern,
                        value = %value,
                        "date normalization failed, keeping captured value"
                    ),
                }
            }
        }

        // Sub-rules run in order over the running value; a failing sub-rule
        // keeps the previous value and does not break the chain.
        for sub_rule in &self.sub_rules {
            if let Some(result) = sub_rule.apply_at(&value, now) {
                if !result.is_empty() {
                    value = result;
                }
            }
        }

        Some(value)
    }

    fn decode_date(&self, value: &str, decode: &DateDecode, now: DateTime<Local>) -> Option<String> {
        let date = match decode {
            DateDecode::Relative(unit) => dates::decode_relative(value, *unit, now)?,
            DateDecode::Calendar { strftime, has_year } => {
                dates::decode_calendar(value, strftime, *has_year, now)?
            }
        };
        dates::format_date(date, &self.out_format)
    }
}
