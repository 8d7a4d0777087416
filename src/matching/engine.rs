// src/matching/engine.rs
use anyhow::{Context, Result};
use log::{debug, info};

use super::classifier::{LogisticRegressionClassifier, RecordClassifier};
use super::cleaners::SuffixTable;
use super::decision::{aggregate_scores, decide};
use super::features::{generate_features, FeatureVector};
use super::normalizers::{normalize_record, NormalizedRecord};
use crate::config::VerifierConfig;
use crate::models::{Decision, FieldValue, ScoreCard, VerificationInput};

/// A record once every similarity feature has been computed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturedRecord {
    pub claim_number: FieldValue,
    pub features: FeatureVector,
}

/// A record reduced to its aggregated scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub claim_number: FieldValue,
    pub scores: ScoreCard,
}

/// Runs claimant records through normalization, feature generation, scoring
/// and the final decision.
///
/// The suffix table and classifier are loaded once and never change, so one
/// engine can be shared across threads.
pub struct VerificationEngine {
    suffixes: SuffixTable,
    classifier: Box<dyn RecordClassifier>,
}

impl VerificationEngine {
    pub fn new(suffixes: SuffixTable, classifier: impl RecordClassifier + 'static) -> Self {
        Self {
            suffixes,
            classifier: Box::new(classifier),
        }
    }

    /// Loads the suffix table and the classifier artifact named by `config`.
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        let suffixes = SuffixTable::load_from_csv(&config.suffix_table_path)
            .context("Failed to load suffix table")?;
        let classifier = LogisticRegressionClassifier::load_from_json(&config.classifier_model_path)
            .context("Failed to load verification classifier")?;
        info!(
            "Verification engine ready ({} suffixes, classifier {})",
            suffixes.len(),
            config.classifier_model_path.display()
        );
        Ok(Self::new(suffixes, classifier))
    }

    pub fn suffixes(&self) -> &SuffixTable {
        &self.suffixes
    }

    pub fn normalize(&self, input: &VerificationInput) -> NormalizedRecord {
        normalize_record(input, &self.suffixes)
    }

    pub fn featurize(&self, record: &NormalizedRecord) -> FeaturedRecord {
        FeaturedRecord {
            claim_number: record.claim_number.clone(),
            features: generate_features(record),
        }
    }

    pub fn score(&self, record: FeaturedRecord) -> ScoredRecord {
        ScoredRecord {
            scores: aggregate_scores(&record.features),
            claim_number: record.claim_number,
        }
    }

    pub fn decide(&self, record: ScoredRecord) -> Decision {
        decide(record.claim_number, record.scores, self.classifier.as_ref())
    }

    /// Scores one record end to end. Malformed fields lower the scores; they
    /// never make verification fail.
    pub fn verify(&self, input: &VerificationInput) -> Decision {
        let normalized = self.normalize(input);
        debug!(
            "Claim {}: normalized full name {} (ssn {}, dob {})",
            normalized.claim_number, normalized.full_name, normalized.ssn, normalized.date_of_birth
        );
        let featured = self.featurize(&normalized);
        let scored = self.score(featured);
        self.decide(scored)
    }
}
