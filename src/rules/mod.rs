//! Compiled rule-sets
//!
//! This module holds the immutable, compiled form of the declarative
//! configuration: regex patterns compiled, date formats converted, field
//! kinds resolved to a closed sum type. Compiled rule-sets have no mutable
//! state and are shared read-only across documents and worker threads.

pub mod dates;
mod rule;
mod ruleset;

pub use rule::Rule;
pub use ruleset::{compile_rulesets, FieldKind, FieldSpec, OutlinkFilter, RuleSet};
