use crate::config::Config;
use crate::error::{Result, SuiteTrimError, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem before failing
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_vectorizer(config, &mut errors);
        Self::validate_clustering(config, &mut errors);
        Self::validate_redundancy(config, &mut errors);
        Self::validate_output(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SuiteTrimError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_vectorizer(config: &Config, errors: &mut Vec<ValidationError>) {
        let weight = config.vectorizer.categorical_weight;
        if !weight.is_finite() || weight < 0.0 {
            errors.push(ValidationError::new(
                "vectorizer.categorical_weight",
                format!("Categorical weight must be a non-negative number, got {}", weight),
            ));
        }

        if let Err(e) = regex::Regex::new(&config.vectorizer.token_pattern) {
            errors.push(ValidationError::new(
                "vectorizer.token_pattern",
                format!("Invalid token pattern: {}", e),
            ));
        }

        if config.vectorizer.min_document_frequency == 0 {
            errors.push(ValidationError::new(
                "vectorizer.min_document_frequency",
                "Minimum document frequency must be at least 1",
            ));
        }
    }

    fn validate_clustering(config: &Config, errors: &mut Vec<ValidationError>) {
        let clustering = &config.clustering;

        if clustering.cluster_count == Some(0) {
            errors.push(ValidationError::new(
                "clustering.cluster_count",
                "Cluster count must be greater than 0",
            ));
        }

        if clustering.min_clusters == 0 {
            errors.push(ValidationError::new(
                "clustering.min_clusters",
                "Minimum cluster count must be greater than 0",
            ));
        }

        if clustering.max_clusters < clustering.min_clusters {
            errors.push(ValidationError::new(
                "clustering.max_clusters",
                format!(
                    "Maximum cluster count ({}) is below the minimum ({})",
                    clustering.max_clusters, clustering.min_clusters
                ),
            ));
        }

        if clustering.max_iterations == 0 {
            errors.push(ValidationError::new(
                "clustering.max_iterations",
                "Iteration bound must be greater than 0",
            ));
        }
    }

    fn validate_redundancy(config: &Config, errors: &mut Vec<ValidationError>) {
        let threshold = config.redundancy.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            errors.push(ValidationError::new(
                "redundancy.similarity_threshold",
                format!("Threshold must be between 0.0 and 1.0, got {}", threshold),
            ));
        }
    }

    fn validate_output(config: &Config, errors: &mut Vec<ValidationError>) {
        // Same case-insensitive match as ReportFormat::from_str
        let format = &config.output.format;
        let valid_formats = ["json", "table"];
        if !valid_formats.contains(&format.to_ascii_lowercase().as_str()) {
            errors.push(ValidationError::new(
                "output.format",
                format!(
                    "Format must be one of {:?}, got '{}'",
                    valid_formats, format
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = Config::default();
        config.redundancy.similarity_threshold = 1.5;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_invalid_token_pattern() {
        let mut config = Config::default();
        config.vectorizer.token_pattern = "([a-z".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_zero_cluster_count() {
        let mut config = Config::default();
        config.clustering.cluster_count = Some(0);
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.meta.schema_version = "0.1.0".to_string();
        config.clustering.max_iterations = 0;
        config.output.format = "xml".to_string();

        match ConfigValidator::validate(&config) {
            Err(SuiteTrimError::ConfigValidation { errors }) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|e| e.path == "output.format"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_output_format_case_insensitive() {
        let mut config = Config::default();
        config.output.format = "JSON".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());

        config.output.format = "Table".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());
    }
}
