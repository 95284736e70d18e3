//! Rule-set compilation
//!
//! Builds the immutable engine-side types from raw configuration. All
//! derived representations (compiled regexes, strftime formats) are
//! precomputed here, once, at configuration load.

use regex::Regex;

use super::dates::{self, RelativeUnit};
use super::rule::{DateDecode, Rule};
use crate::config::{
    EngineConfig, FieldKindConfig, FieldSpecConfig, OutlinkFilterConfig, RuleConfig, RuleSetConfig,
};
use crate::{ConfigError, ConfigResult};

/// The kind of output a field spec produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// One value per matched node
    Scalar,
    /// All matched nodes joined into a single value
    Concatenated,
    /// Each matched node emits a synthetic sub-document
    SubDocument,
    /// Each matched node contributes an annotated outlink
    OutlinkCapture,
}

/// One declared output field's extraction recipe, compiled
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub query: String,
    pub kind: FieldKind,
    pub rule: Option<Rule>,
    pub with_descendant_text: bool,
    pub trim: bool,
    pub concat_delimiter: String,
    /// Declared date format, consumed by the downstream index mapper
    pub date_format: Option<String>,
    /// Metadata pair injected on captured outlinks
    pub inject_meta: Option<(String, String)>,
    pub nested: Vec<FieldSpec>,
}

/// Ordered rule chain deciding whether an outlink is kept
#[derive(Debug, Clone)]
pub struct OutlinkFilter {
    pub rules: Vec<Rule>,
}

/// The admission + extraction configuration scoped to one class of pages
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: Option<String>,
    pub url_filter: Option<Regex>,
    pub content_filter_query: Option<String>,
    pub content_filter_regex: Option<Regex>,
    pub content_filter_concat: bool,
    pub content_filter_delimiter: String,
    pub content_filter_trim: bool,
    /// Parsed for config compatibility; no behavior is attached yet
    pub refetch_outlink: Option<Regex>,
    pub fields: Vec<FieldSpec>,
    pub outlink_filters: Vec<OutlinkFilter>,
}

fn compile_regex(pattern: &str) -> ConfigResult<Regex> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

impl Rule {
    /// Compiles a raw rule configuration into an immutable rule tree.
    pub fn compile(config: &RuleConfig) -> ConfigResult<Rule> {
        let pattern_src = config.regex.as_deref().unwrap_or(".+");
        let pattern = compile_regex(pattern_src)?;

        let date_decode = config.in_date_format.as_deref().map(|format| {
            match RelativeUnit::from_format(format) {
                Some(unit) => DateDecode::Relative(unit),
                None => DateDecode::Calendar {
                    strftime: dates::convert_pattern(format),
                    has_year: dates::pattern_has_year(format),
                },
            }
        });

        let out_format = dates::convert_pattern(
            config
                .out_date_format
                .as_deref()
                .unwrap_or(dates::DEFAULT_OUT_PATTERN),
        );

        let sub_rules = config
            .subrules
            .iter()
            .map(Rule::compile)
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Rule {
            pattern,
            accept: config.accept.unwrap_or(true),
            group_index: config.group_index,
            replacement: config.replacement.clone(),
            default_value: config.default_value.clone(),
            date_decode,
            out_format,
            is_anchor_rule: config.is_anchor_rule.unwrap_or(false),
            is_result_url: config.is_result_url.unwrap_or(false),
            sub_rules,
        })
    }
}

impl FieldSpec {
    pub fn compile(config: &FieldSpecConfig) -> ConfigResult<FieldSpec> {
        let kind = match config.kind {
            FieldKindConfig::Scalar => FieldKind::Scalar,
            FieldKindConfig::Concatenated => FieldKind::Concatenated,
            FieldKindConfig::SubDocument => FieldKind::SubDocument,
            FieldKindConfig::OutlinkCapture => FieldKind::OutlinkCapture,
        };

        let rule = config.rule.as_ref().map(Rule::compile).transpose()?;

        let inject_meta = match (&config.inject_meta_key, &config.inject_meta_value) {
            (Some(key), Some(value)) => Some((key.clone(), value.clone())),
            _ => None,
        };

        let nested = config
            .nested
            .iter()
            .map(FieldSpec::compile)
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(FieldSpec {
            name: config.name.clone(),
            query: config.query.clone().unwrap_or_default(),
            kind,
            rule,
            with_descendant_text: config.with_descendant_text.unwrap_or(false),
            trim: config.trim.unwrap_or(true),
            concat_delimiter: config.concat_delimiter.clone().unwrap_or_default(),
            date_format: config.date_format.clone(),
            inject_meta,
            nested,
        })
    }
}

impl RuleSet {
    pub fn compile(config: &RuleSetConfig) -> ConfigResult<RuleSet> {
        let url_filter = config
            .url_filter_regex
            .as_deref()
            .map(compile_regex)
            .transpose()?;
        let content_filter_regex = config
            .content_filter_regex
            .as_deref()
            .map(compile_regex)
            .transpose()?;
        let refetch_outlink = config
            .refetch_outlink_regex
            .as_deref()
            .map(compile_regex)
            .transpose()?;

        let fields = config
            .fields
            .iter()
            .map(FieldSpec::compile)
            .collect::<ConfigResult<Vec<_>>>()?;

        let outlink_filters = config
            .outlink_filters
            .iter()
            .map(OutlinkFilter::compile)
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(RuleSet {
            name: config.name.clone(),
            url_filter,
            content_filter_query: config.content_filter_query.clone(),
            content_filter_regex,
            content_filter_concat: config.content_filter_concat.unwrap_or(false),
            content_filter_delimiter: config
                .content_filter_concat_delimiter
                .clone()
                .unwrap_or_default(),
            content_filter_trim: config.content_filter_trim.unwrap_or(true),
            refetch_outlink,
            fields,
            outlink_filters,
        })
    }
}

impl OutlinkFilter {
    pub fn compile(config: &OutlinkFilterConfig) -> ConfigResult<OutlinkFilter> {
        let rules = config
            .rules
            .iter()
            .map(Rule::compile)
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(OutlinkFilter { rules })
    }
}

/// Compiles every rule-set in a validated engine configuration.
pub fn compile_rulesets(config: &EngineConfig) -> ConfigResult<Vec<RuleSet>> {
    config.rulesets.iter().map(RuleSet::compile).collect()
}
