use crate::config::types::EngineConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a rule-set configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML rule-set file
///
/// # Returns
///
/// * `Ok(EngineConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_rulesets(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: EngineConfig = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the rule-set file content
///
/// Crawlers use this to detect that extraction rules changed between runs,
/// since a rule change usually means previously extracted fields are stale.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a rule-set configuration and returns both the config and its hash
pub fn load_rulesets_with_hash(path: &Path) -> Result<(EngineConfig, String), ConfigError> {
    let config = load_rulesets(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldKindConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[[ruleset]]
name = "jobs"
url-filter-regex = "^https://example.com/jobs/.*"
content-filter-query = "div.listing"
content-filter-regex = "Engineer"

[[ruleset.fields]]
name = "title"
query = "h1.job-title"
with-descendant-text = true

[[ruleset.fields]]
name = "offerdate"
query = "span.date"

[ruleset.fields.rule]
regex = '\d+'
in-date-format = "d"

[[ruleset.outlink-filters]]

[[ruleset.outlink-filters.rules]]
regex = "jobs/detail"
"#;

        let file = create_temp_config(config_content);
        let config = load_rulesets(file.path()).unwrap();

        assert_eq!(config.rulesets.len(), 1);
        let ruleset = &config.rulesets[0];
        assert_eq!(ruleset.name.as_deref(), Some("jobs"));
        assert_eq!(ruleset.fields.len(), 2);
        assert_eq!(ruleset.fields[0].kind, FieldKindConfig::Scalar);
        assert_eq!(
            ruleset.fields[1].rule.as_ref().unwrap().in_date_format,
            Some("d".to_string())
        );
        assert_eq!(ruleset.outlink_filters.len(), 1);
    }

    #[test]
    fn test_load_sub_document_config() {
        let config_content = r#"
[[ruleset]]

[[ruleset.fields]]
name = "listing-row"
query = "tr.offer"
kind = "sub-document"

[ruleset.fields.rule]
regex = "offer/\\d+"
is-result-url = true

[[ruleset.fields.nested]]
name = "offerdate"
query = "td.date"
"#;

        let file = create_temp_config(config_content);
        let config = load_rulesets(file.path()).unwrap();
        let field = &config.rulesets[0].fields[0];
        assert_eq!(field.kind, FieldKindConfig::SubDocument);
        assert_eq!(field.nested.len(), 1);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_rulesets(Path::new("/nonexistent/rules.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(load_rulesets(file.path()).is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        // Bad regex fails validation, not deserialization
        let config_content = r#"
[[ruleset]]
url-filter-regex = "(broken"

[[ruleset.fields]]
name = "title"
query = "h1"
"#;
        let file = create_temp_config(config_content);
        let result = load_rulesets(file.path());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidRegex { .. }
        ));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
