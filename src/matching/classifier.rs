// src/matching/classifier.rs
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Length of the classifier input vector.
pub const FEATURE_VECTOR_SIZE: usize = 22;

/// Names of the classifier inputs, in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_VECTOR_SIZE] = [
    "full_name_check",
    "ssn_score",
    "dob_score",
    "n1_score",
    "n2_score",
    "n3_score",
    "n4_score",
    "n5_score",
    "n6_score",
    "n7_score",
    "n8_score",
    "n9_score",
    "n10_score",
    "n11_score",
    "n12_score",
    "n13_score",
    "n14_score",
    "ssn_match",
    "dob_match",
    "name_match",
    "failure_explanation_numeric",
    "last_name_check",
];

/// Binary verifier over the fixed 22-feature vector.
pub trait RecordClassifier: Send + Sync {
    fn predict(&self, features: &[f64; FEATURE_VECTOR_SIZE]) -> bool;
}

impl<F> RecordClassifier for F
where
    F: Fn(&[f64; FEATURE_VECTOR_SIZE]) -> bool + Send + Sync,
{
    fn predict(&self, features: &[f64; FEATURE_VECTOR_SIZE]) -> bool {
        self(features)
    }
}

/// A trained logistic regression exported as JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogisticRegressionClassifier {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LogisticRegressionClassifier {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        let model = Self {
            coefficients,
            intercept,
            version: None,
            description: None,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self =
            serde_json::from_str(json).context("Failed to deserialize classifier JSON")?;
        model.validate()?;
        Ok(model)
    }

    pub fn load_from_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading classifier from {}", path.display());
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read classifier artifact {}", path.display()))?;
        let fingerprint = hex::encode(Sha256::digest(&bytes));

        let json = std::str::from_utf8(&bytes)
            .with_context(|| format!("Classifier artifact {} is not UTF-8", path.display()))?;
        let model = Self::from_json(json)
            .with_context(|| format!("Invalid classifier artifact {}", path.display()))?;

        info!(
            "Loaded classifier version {} (sha256 {})",
            model.version.as_deref().unwrap_or("unversioned"),
            fingerprint
        );
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.coefficients.len() != FEATURE_VECTOR_SIZE {
            anyhow::bail!(
                "Expected {} coefficients, but got {}",
                FEATURE_VECTOR_SIZE,
                self.coefficients.len()
            );
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            anyhow::bail!("Classifier weights must be finite");
        }
        Ok(())
    }

    /// Log-odds of a positive verification.
    pub fn decision_function(&self, features: &[f64; FEATURE_VECTOR_SIZE]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    /// Probability of a positive verification.
    pub fn predict_probability(&self, features: &[f64; FEATURE_VECTOR_SIZE]) -> f64 {
        1.0 / (1.0 + (-self.decision_function(features)).exp())
    }
}

impl RecordClassifier for LogisticRegressionClassifier {
    fn predict(&self, features: &[f64; FEATURE_VECTOR_SIZE]) -> bool {
        let logit = self.decision_function(features);
        debug!("Classifier logit {:.4}", logit);
        logit > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ssn_only_model() -> LogisticRegressionClassifier {
        let mut coefficients = vec![0.0; FEATURE_VECTOR_SIZE];
        coefficients[17] = 2.0;
        LogisticRegressionClassifier::new(coefficients, -1.0).unwrap()
    }

    #[test]
    fn test_predict_uses_decision_boundary() {
        let model = ssn_only_model();
        let mut features = [0.0; FEATURE_VECTOR_SIZE];
        assert!(!model.predict(&features));
        assert!(model.predict_probability(&features) < 0.5);
        features[17] = 1.0;
        assert!(model.predict(&features));
        assert!((model.decision_function(&features) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_logit_is_negative() {
        let model = LogisticRegressionClassifier::new(vec![0.0; FEATURE_VECTOR_SIZE], 0.0).unwrap();
        assert!(!model.predict(&[0.0; FEATURE_VECTOR_SIZE]));
    }

    #[test]
    fn test_wrong_coefficient_count_is_rejected() {
        assert!(LogisticRegressionClassifier::new(vec![1.0; 21], 0.0).is_err());
        let json = r#"{"coefficients": [1.0, 2.0], "intercept": 0.5}"#;
        assert!(LogisticRegressionClassifier::from_json(json).is_err());
    }

    #[test]
    fn test_non_finite_weights_are_rejected() {
        assert!(LogisticRegressionClassifier::new(vec![0.0; FEATURE_VECTOR_SIZE], f64::NAN).is_err());
    }

    #[test]
    fn test_load_from_json() {
        let model = ssn_only_model();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"coefficients": {}, "intercept": -1.0, "version": "2015-07-28"}}"#,
            serde_json::to_string(&model.coefficients).unwrap()
        )
        .unwrap();
        file.flush().unwrap();

        let loaded = LogisticRegressionClassifier::load_from_json(file.path()).unwrap();
        assert_eq!(loaded.coefficients, model.coefficients);
        assert_eq!(loaded.version.as_deref(), Some("2015-07-28"));
        assert_eq!(loaded.description, None);
    }

    #[test]
    fn test_load_missing_artifact_fails() {
        assert!(LogisticRegressionClassifier::load_from_json("/nonexistent/model.json").is_err());
    }

    #[test]
    fn test_closure_is_a_classifier() {
        let always = |_: &[f64; FEATURE_VECTOR_SIZE]| true;
        assert!(always.predict(&[0.0; FEATURE_VECTOR_SIZE]));
    }
}
