//! Declarative rule-set configuration
//!
//! Rule-sets are declared in TOML, deserialized into the raw types here,
//! validated, then compiled into the immutable forms in [`crate::rules`].

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_rulesets, load_rulesets_with_hash};
pub use types::{
    EngineConfig, FieldKindConfig, FieldSpecConfig, OutlinkFilterConfig, RuleConfig, RuleSetConfig,
};
pub use validation::validate;
