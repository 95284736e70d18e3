use regex::Regex;

use crate::config::types::{
    EngineConfig, FieldKindConfig, FieldSpecConfig, OutlinkFilterConfig, RuleConfig, RuleSetConfig,
};
use crate::ConfigError;

/// Rule trees come from TOML and cannot reference themselves, but a
/// generated config could still nest absurdly; cap the depth instead of
/// recursing unboundedly.
const MAX_RULE_DEPTH: usize = 32;

/// Validates the entire configuration
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.rulesets.is_empty() {
        return Err(ConfigError::Validation(
            "configuration declares no rule-sets".to_string(),
        ));
    }

    for ruleset in &config.rulesets {
        validate_ruleset(ruleset)?;
    }

    Ok(())
}

fn validate_ruleset(ruleset: &RuleSetConfig) -> Result<(), ConfigError> {
    validate_regex_option(&ruleset.url_filter_regex)?;
    validate_regex_option(&ruleset.content_filter_regex)?;
    validate_regex_option(&ruleset.refetch_outlink_regex)?;

    if ruleset.content_filter_regex.is_some() && ruleset.content_filter_query.is_none() {
        return Err(ConfigError::Validation(format!(
            "rule-set '{}' has a content-filter-regex but no content-filter-query",
            ruleset_label(ruleset)
        )));
    }

    if ruleset.fields.is_empty() && ruleset.outlink_filters.is_empty() {
        return Err(ConfigError::Validation(format!(
            "rule-set '{}' declares neither fields nor outlink filters",
            ruleset_label(ruleset)
        )));
    }

    for field in &ruleset.fields {
        validate_field(field)?;
    }

    for filter in &ruleset.outlink_filters {
        validate_outlink_filter(filter)?;
    }

    Ok(())
}

fn validate_field(field: &FieldSpecConfig) -> Result<(), ConfigError> {
    if field.name.is_empty() {
        return Err(ConfigError::Validation(
            "field name cannot be empty".to_string(),
        ));
    }

    let is_capture_kind = matches!(
        field.kind,
        FieldKindConfig::SubDocument | FieldKindConfig::OutlinkCapture
    );

    if !field.nested.is_empty() && !is_capture_kind {
        return Err(ConfigError::Validation(format!(
            "field '{}' declares nested fields but is not a sub-document or outlink-capture field",
            field.name
        )));
    }

    if is_capture_kind {
        if field.rule.is_none() {
            return Err(ConfigError::Validation(format!(
                "field '{}' needs a rule to select the representative link",
                field.name
            )));
        }
        if field.query.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::Validation(format!(
                "field '{}' needs a path query to locate repeated structures",
                field.name
            )));
        }
    }

    if let Some(rule) = &field.rule {
        validate_rule(rule, &field.name, 0)?;
    }

    for nested in &field.nested {
        validate_field(nested)?;
    }

    Ok(())
}

fn validate_outlink_filter(filter: &OutlinkFilterConfig) -> Result<(), ConfigError> {
    if filter.rules.is_empty() {
        return Err(ConfigError::Validation(
            "outlink filter declares no rules".to_string(),
        ));
    }
    for rule in &filter.rules {
        validate_rule(rule, "outlink-filter", 0)?;
    }
    Ok(())
}

fn validate_rule(rule: &RuleConfig, owner: &str, depth: usize) -> Result<(), ConfigError> {
    if depth > MAX_RULE_DEPTH {
        return Err(ConfigError::Validation(format!(
            "rule chain under '{}' nests deeper than {} levels",
            owner, MAX_RULE_DEPTH
        )));
    }

    if let Some(pattern) = &rule.regex {
        compile_check(pattern)?;
    }

    for subrule in &rule.subrules {
        validate_rule(subrule, owner, depth + 1)?;
    }

    Ok(())
}

fn validate_regex_option(pattern: &Option<String>) -> Result<(), ConfigError> {
    if let Some(pattern) = pattern {
        compile_check(pattern)?;
    }
    Ok(())
}

fn compile_check(pattern: &str) -> Result<(), ConfigError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

fn ruleset_label(ruleset: &RuleSetConfig) -> &str {
    ruleset
        .name
        .as_deref()
        .or(ruleset.url_filter_regex.as_deref())
        .unwrap_or("<unnamed>")
}
