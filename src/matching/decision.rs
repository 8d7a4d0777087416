// src/matching/decision.rs
//! Score aggregation and the rule-based verdict for one record.

use log::debug;

use super::classifier::{RecordClassifier, FEATURE_VECTOR_SIZE};
use super::features::{FeatureVector, NAME_COMBINATION_COUNT};
use crate::models::{Decision, FailureCategory, FieldValue, ReviewType, ScoreCard};

/// Sum of the three metrics on an identical pair.
pub const PERFECT_SCORE: u32 = 300;
/// Name score at or above which a combination counts as a match.
pub const NAME_MATCH_THRESHOLD: u32 = 280;
/// Lowest name score still worth a visual review.
pub const VISUAL_REVIEW_THRESHOLD: u32 = 260;

/// First classifier slot holding a name score.
const NAME_SCORES_START: usize = 3;
/// First classifier slot after the name scores.
const FLAGS_START: usize = NAME_SCORES_START + NAME_COMBINATION_COUNT;

/// Collapses every similarity triple into its summed score.
pub fn aggregate_scores(features: &FeatureVector) -> ScoreCard {
    ScoreCard {
        full_name_check: features.full_name_check,
        last_name_check: features.last_name_check,
        ssn_score: features.ssn.total(),
        dob_score: features.dob.total(),
        name_scores: features.names.map(|triple| triple.total()),
        ssn_metrics: features.ssn,
        dob_metrics: features.dob,
        name_metrics: features.names,
    }
}

pub fn ssn_match(ssn_score: u32) -> u8 {
    u8::from(ssn_score == PERFECT_SCORE)
}

pub fn dob_match(dob_score: u32) -> u8 {
    u8::from(dob_score == PERFECT_SCORE)
}

pub fn name_match(full_name_check: u8, last_name_check: u8, name_scores: &[u32]) -> u8 {
    if full_name_check == 1 || last_name_check == 1 {
        return 1;
    }
    u8::from(name_scores.iter().any(|&score| score >= NAME_MATCH_THRESHOLD))
}

/// Names the failed checks, space separated, in SSN, DOB, NAME order.
pub fn explain_failure(ssn_match: u8, dob_match: u8, name_match: u8) -> String {
    [
        (ssn_match, FailureCategory::Ssn),
        (dob_match, FailureCategory::Dob),
        (name_match, FailureCategory::Name),
    ]
    .iter()
    .filter(|(flag, _)| *flag == 0)
    .map(|(_, category)| category.as_str())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Numeric code of a failure explanation, compared case-insensitively.
///
/// A DOB-only failure and a record with no failure both map to 0.
pub fn convert_failure_explanation_to_number(failure_explanation: &str) -> u8 {
    match failure_explanation.to_lowercase().as_str() {
        "dob" => 0,
        "name" => 1,
        "ssn dob name" => 2,
        "ssn" => 3,
        "ssn name" => 4,
        "ssn dob" => 5,
        "dob name" => 6,
        _ => 0,
    }
}

pub fn determine_review_type(full_name_check: u8, verified: u8, name_scores: &[u32]) -> ReviewType {
    if full_name_check == 1 || verified == 1 {
        return ReviewType::None;
    }
    if name_scores.iter().any(|&score| score >= NAME_MATCH_THRESHOLD) {
        return ReviewType::None;
    }
    if name_scores
        .iter()
        .any(|score| (VISUAL_REVIEW_THRESHOLD..NAME_MATCH_THRESHOLD).contains(score))
    {
        return ReviewType::Visual;
    }
    ReviewType::None
}

/// Rule outcomes that feed the classifier alongside the raw scores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFlags {
    pub ssn_match: u8,
    pub dob_match: u8,
    pub name_match: u8,
    pub failure_explanation: String,
    pub failure_explanation_numeric: u8,
}

impl MatchFlags {
    pub fn from_scores(scores: &ScoreCard) -> Self {
        let ssn_match = ssn_match(scores.ssn_score);
        let dob_match = dob_match(scores.dob_score);
        let name_match = name_match(
            scores.full_name_check,
            scores.last_name_check,
            &scores.name_scores,
        );
        let failure_explanation = explain_failure(ssn_match, dob_match, name_match);
        let failure_explanation_numeric =
            convert_failure_explanation_to_number(&failure_explanation);
        Self {
            ssn_match,
            dob_match,
            name_match,
            failure_explanation,
            failure_explanation_numeric,
        }
    }
}

/// Classifier input in its fixed training order.
pub fn classifier_features(scores: &ScoreCard, flags: &MatchFlags) -> [f64; FEATURE_VECTOR_SIZE] {
    let mut features = [0.0; FEATURE_VECTOR_SIZE];
    features[0] = f64::from(scores.full_name_check);
    features[1] = f64::from(scores.ssn_score);
    features[2] = f64::from(scores.dob_score);
    for (slot, score) in features[NAME_SCORES_START..FLAGS_START]
        .iter_mut()
        .zip(scores.name_scores.iter())
    {
        *slot = f64::from(*score);
    }
    features[FLAGS_START] = f64::from(flags.ssn_match);
    features[FLAGS_START + 1] = f64::from(flags.dob_match);
    features[FLAGS_START + 2] = f64::from(flags.name_match);
    features[FLAGS_START + 3] = f64::from(flags.failure_explanation_numeric);
    features[FLAGS_START + 4] = f64::from(scores.last_name_check);
    features
}

/// Applies the match rules, the classifier and the review rule to a score card.
pub fn decide<C>(claim_number: FieldValue, scores: ScoreCard, classifier: &C) -> Decision
where
    C: RecordClassifier + ?Sized,
{
    let flags = MatchFlags::from_scores(&scores);
    let verified = u8::from(classifier.predict(&classifier_features(&scores, &flags)));
    let review = determine_review_type(scores.full_name_check, verified, &scores.name_scores);

    debug!(
        "Claim {}: verified={} failure='{}' review='{}'",
        claim_number,
        verified,
        flags.failure_explanation,
        review.as_str()
    );

    Decision {
        claim_number,
        ssn_match: flags.ssn_match,
        dob_match: flags.dob_match,
        name_match: flags.name_match,
        failure_explanation: flags.failure_explanation,
        failure_explanation_numeric: flags.failure_explanation_numeric,
        verified,
        review,
        scores,
    }
}
