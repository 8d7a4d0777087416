// src/config.rs
use log::info;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SUFFIX_TABLE_PATH: &str = "data/suffixes.csv";
pub const DEFAULT_CLASSIFIER_MODEL_PATH: &str = "models/verification_classifier.json";

#[derive(Debug, Clone, PartialEq)]
pub struct VerifierConfig {
    /// CSV of name suffixes stripped from last names.
    pub suffix_table_path: PathBuf,
    /// JSON logistic-regression artifact used to verify records.
    pub classifier_model_path: PathBuf,
    /// Whether the batch runner draws a progress bar.
    pub progress_enabled: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            suffix_table_path: PathBuf::from(DEFAULT_SUFFIX_TABLE_PATH),
            classifier_model_path: PathBuf::from(DEFAULT_CLASSIFIER_MODEL_PATH),
            progress_enabled: true,
        }
    }
}

impl VerifierConfig {
    pub fn from_env() -> Self {
        Self {
            suffix_table_path: env::var("SUFFIX_TABLE_PATH")
                .unwrap_or_else(|_| DEFAULT_SUFFIX_TABLE_PATH.to_string())
                .into(),
            classifier_model_path: env::var("CLASSIFIER_MODEL_PATH")
                .unwrap_or_else(|_| DEFAULT_CLASSIFIER_MODEL_PATH.to_string())
                .into(),
            progress_enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    pub fn log_config(&self) {
        info!("Suffix table: {}", self.suffix_table_path.display());
        info!("Classifier model: {}", self.classifier_model_path.display());
        info!(
            "Progress bars {}",
            if self.progress_enabled { "enabled" } else { "disabled" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-wide; every case stays in this one test.
    #[test]
    fn test_from_env() {
        env::remove_var("SUFFIX_TABLE_PATH");
        env::remove_var("CLASSIFIER_MODEL_PATH");
        env::remove_var("PROGRESS_ENABLED");
        assert_eq!(VerifierConfig::from_env(), VerifierConfig::default());

        env::set_var("SUFFIX_TABLE_PATH", "/tmp/suffixes.csv");
        env::set_var("CLASSIFIER_MODEL_PATH", "/tmp/model.json");
        env::set_var("PROGRESS_ENABLED", "false");
        let config = VerifierConfig::from_env();
        assert_eq!(config.suffix_table_path, PathBuf::from("/tmp/suffixes.csv"));
        assert_eq!(config.classifier_model_path, PathBuf::from("/tmp/model.json"));
        assert!(!config.progress_enabled);

        env::set_var("PROGRESS_ENABLED", "not-a-bool");
        assert!(VerifierConfig::from_env().progress_enabled);

        env::remove_var("SUFFIX_TABLE_PATH");
        env::remove_var("CLASSIFIER_MODEL_PATH");
        env::remove_var("PROGRESS_ENABLED");
    }
}
