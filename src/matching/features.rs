// src/matching/features.rs
//! Candidate name combinations and the similarity features scored against them.

use log::trace;

use super::name_checks::{exact_name_check, last_name_check};
use super::normalizers::{NormalizedCandidate, NormalizedRecord};
use super::similarity::{
    fuzzy_partial_ratio, fuzzy_partial_ratio_check, fuzzy_ratio, fuzzy_ratio_check,
    fuzzy_token_sort_ratio, fuzzy_token_sort_ratio_check,
};
use crate::models::FieldValue;

pub const NAME_COMBINATION_COUNT: usize = 14;

/// One name field of one of the two candidate identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    First1,
    Middle1,
    Last1,
    First2,
    Middle2,
    Last2,
}

use NamePart::*;

/// Parts concatenated for each name combination, in scoring order.
pub const NAME_COMBINATIONS: [&[NamePart]; NAME_COMBINATION_COUNT] = [
    &[First1, Middle1],
    &[First1, Last1],
    &[First1, Middle2],
    &[First1, Last2],
    &[First2, Middle1],
    &[First2, Last1],
    &[First2, Middle2],
    &[First2, Last2],
    &[First1, Middle1, Last1],
    &[First2, Middle2, Last2],
    &[First1, Last1, Last2],
    &[First1, Last2, Last1],
    &[First2, Last1, Last2],
    &[First2, Last2, Last1],
];

impl NamePart {
    fn pick<'a>(&self, candidates: &'a [NormalizedCandidate; 2]) -> &'a FieldValue {
        match self {
            First1 => &candidates[0].first_name,
            Middle1 => &candidates[0].middle_name,
            Last1 => &candidates[0].last_name,
            First2 => &candidates[1].first_name,
            Middle2 => &candidates[1].middle_name,
            Last2 => &candidates[1].last_name,
        }
    }
}

/// The three similarity metrics for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimilarityTriple {
    pub ratio: u32,
    pub token_sort_ratio: u32,
    pub partial_ratio: u32,
}

impl SimilarityTriple {
    pub fn total(&self) -> u32 {
        self.ratio + self.token_sort_ratio + self.partial_ratio
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    pub full_name_check: u8,
    pub last_name_check: u8,
    pub ssn: SimilarityTriple,
    pub dob: SimilarityTriple,
    pub names: [SimilarityTriple; NAME_COMBINATION_COUNT],
}

/// Builds the fourteen candidate name combinations in scoring order.
pub fn name_combinations(candidates: &[NormalizedCandidate; 2]) -> [FieldValue; NAME_COMBINATION_COUNT] {
    NAME_COMBINATIONS.map(|parts| {
        let values: Vec<&FieldValue> = parts.iter().map(|part| part.pick(candidates)).collect();
        FieldValue::concat(&values)
    })
}

fn unchecked_triple(left: &FieldValue, right: &FieldValue) -> SimilarityTriple {
    SimilarityTriple {
        ratio: fuzzy_ratio(left, right),
        token_sort_ratio: fuzzy_token_sort_ratio(left, right),
        partial_ratio: fuzzy_partial_ratio(left, right),
    }
}

fn checked_triple(full_name_check: u8, left: &FieldValue, right: &FieldValue) -> SimilarityTriple {
    SimilarityTriple {
        ratio: fuzzy_ratio_check(full_name_check, left, right),
        token_sort_ratio: fuzzy_token_sort_ratio_check(full_name_check, left, right),
        partial_ratio: fuzzy_partial_ratio_check(full_name_check, left, right),
    }
}

/// Computes every feature for a normalized record.
///
/// SSN and DOB are always compared against the first candidate, which carries
/// the lookup's single SSN and DOB.
pub fn generate_features(record: &NormalizedRecord) -> FeatureVector {
    let [first, second] = &record.candidates;

    let name_parts = [
        first.first_name.clone(),
        first.middle_name.clone(),
        first.last_name.clone(),
        second.first_name.clone(),
        second.middle_name.clone(),
        second.last_name.clone(),
    ];
    let full_name_check = exact_name_check(&record.full_name, Some(name_parts.as_slice()));
    let last_name_check = last_name_check(&first.last_name, &second.last_name, &record.last_name);

    let ssn = unchecked_triple(&record.ssn, &first.ssn);
    let dob = unchecked_triple(&record.date_of_birth, &first.date_of_birth);

    let names = name_combinations(&record.candidates)
        .map(|combination| checked_triple(full_name_check, &record.full_name, &combination));

    trace!(
        "Claim {}: full_name_check={} last_name_check={} ssn={:?} dob={:?} names={:?}",
        record.claim_number,
        full_name_check,
        last_name_check,
        ssn,
        dob,
        names
    );

    FeatureVector {
        full_name_check,
        last_name_check,
        ssn,
        dob,
        names,
    }
}
