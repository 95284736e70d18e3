use serde::Deserialize;

/// Top-level rule-set configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(rename = "ruleset", default)]
    pub rulesets: Vec<RuleSetConfig>,
}

/// Declarative configuration for one class of pages
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuleSetConfig {
    /// Optional label used in logging
    #[serde(default)]
    pub name: Option<String>,

    /// Regex a document URL must match for this rule-set to apply;
    /// absent means "match everything"
    #[serde(default)]
    pub url_filter_regex: Option<String>,

    /// Path query selecting the nodes whose text gates admission
    #[serde(default)]
    pub content_filter_query: Option<String>,

    /// Regex the content-filter text must match; absent means always-match
    #[serde(default)]
    pub content_filter_regex: Option<String>,

    /// Test the concatenation of all matched nodes instead of each node
    #[serde(default)]
    pub content_filter_concat: Option<bool>,

    #[serde(default)]
    pub content_filter_concat_delimiter: Option<String>,

    #[serde(default)]
    pub content_filter_trim: Option<bool>,

    /// Accepted for config compatibility; not acted on (see DESIGN.md)
    #[serde(default)]
    pub refetch_outlink_regex: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldSpecConfig>,

    #[serde(default)]
    pub outlink_filters: Vec<OutlinkFilterConfig>,
}

/// How a field's matched nodes turn into output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKindConfig {
    #[default]
    Scalar,
    Concatenated,
    SubDocument,
    OutlinkCapture,
}

/// One declared output field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FieldSpecConfig {
    pub name: String,

    /// Path query; may be empty only when the value is supplied externally
    #[serde(default)]
    pub query: Option<String>,

    #[serde(default)]
    pub kind: FieldKindConfig,

    /// Collect descendant text (skipping script/style/comments) instead of
    /// the node's raw text content
    #[serde(default)]
    pub with_descendant_text: Option<bool>,

    #[serde(default)]
    pub trim: Option<bool>,

    #[serde(default)]
    pub concat_delimiter: Option<String>,

    /// Declared date format of the field's values, for the index mapper
    #[serde(default)]
    pub date_format: Option<String>,

    #[serde(default)]
    pub inject_meta_key: Option<String>,

    #[serde(default)]
    pub inject_meta_value: Option<String>,

    #[serde(default)]
    pub rule: Option<RuleConfig>,

    /// Nested field specs, only for sub-document and outlink-capture kinds
    #[serde(default)]
    pub nested: Vec<FieldSpecConfig>,
}

/// One transformation rule in a chain
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuleConfig {
    /// Defaults to ".+" (match anything)
    #[serde(default)]
    pub regex: Option<String>,

    /// Accept polarity (default) requires a match; reject requires absence
    #[serde(default)]
    pub accept: Option<bool>,

    #[serde(default)]
    pub group_index: Option<usize>,

    #[serde(default)]
    pub replacement: Option<String>,

    #[serde(default)]
    pub default_value: Option<String>,

    /// "d"/"H"/"m" for relative values, otherwise a calendar pattern
    #[serde(default)]
    pub in_date_format: Option<String>,

    /// Output date pattern; defaults to dd.MM.yyyy
    #[serde(default)]
    pub out_date_format: Option<String>,

    /// Evaluate against an outlink's anchor text instead of its URL
    #[serde(default)]
    pub is_anchor_rule: Option<bool>,

    /// The captured value becomes the emitted result's URL
    #[serde(default)]
    pub is_result_url: Option<bool>,

    #[serde(default)]
    pub subrules: Vec<RuleConfig>,
}

/// Ordered rules deciding whether an outlink is kept
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutlinkFilterConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}
