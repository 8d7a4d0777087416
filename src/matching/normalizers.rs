// src/matching/normalizers.rs
//! Canonical forms for names, SSNs and dates of birth.

use chrono::NaiveDate;
use log::{trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::cleaners::{
    remove_internal_abbreviations, remove_punctuation, remove_suffixes, remove_whitespace,
    SuffixTable,
};
use crate::models::{CandidateIdentity, FieldValue, VerificationInput, MISSING_SENTINEL};

pub const DOB_MISSING: &str = "MISSING";
pub const DOB_INCOMPLETE: &str = "INCOMPLETE";

/// Canonical output layout for every parsed date of birth.
const DOB_OUTPUT_FORMAT: &str = "%m/%d/%y";
const SSN_LENGTH: usize = 9;
const EARLIEST_DOB_YEAR: i64 = 1900;

// chrono accepts shorter or longer year fields than the layouts below allow,
// so each layout is gated on its exact digit widths first.
static SHORT_YEAR_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,2}/[0-9]{1,2}/[0-9]{2}$").expect("invalid SHORT_YEAR_DATE_RE"));
static LONG_YEAR_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,2}/[0-9]{1,2}/[0-9]{4}$").expect("invalid LONG_YEAR_DATE_RE"));
static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}$").expect("invalid ISO_DATE_RE"));

/// Upper-cases a name. Non-text values are returned unchanged.
pub fn normalize_name(name: &FieldValue) -> FieldValue {
    name.map_text(|s| s.to_uppercase())
}

/// Strips dashes and whitespace and left-pads short values with zeros.
///
/// Padding always keeps the rightmost nine characters, so a short SSN that was
/// padded upstream is cut back to its last nine digits.
pub fn normalize_ssn(ssn: &FieldValue) -> FieldValue {
    ssn.map_text(|s| {
        let stripped: String = s
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect();
        if stripped.chars().count() < SSN_LENGTH && stripped != MISSING_SENTINEL {
            let padded = format!("000000000{}", stripped);
            let skip = padded.chars().count() - SSN_LENGTH;
            padded.chars().skip(skip).collect()
        } else {
            stripped
        }
    })
}

/// Normalizes a date of birth to `MM/DD/YY`, `MISSING` or `INCOMPLETE`.
///
/// The layouts are tried in a fixed order and every successful step
/// overwrites the previous result, so the last match wins. Input that matches
/// nothing keeps the sentinel set earlier, or its raw text.
pub fn normalize_dob(dob: &FieldValue) -> FieldValue {
    let raw = match dob {
        FieldValue::Null => return FieldValue::text(DOB_MISSING),
        other => other.to_lossy_string(),
    };

    let mut formatted: Option<String> = None;

    if raw.is_empty() || raw.to_lowercase() == "missing" || raw == "nan" {
        formatted = Some(DOB_MISSING.to_string());
    }

    // Lookup results mask unknown digits with X.
    if raw.to_lowercase().contains('x') {
        formatted = Some(DOB_INCOMPLETE.to_string());
    }

    // Four-digit years keyed as "0056".
    let candidate = if raw.starts_with("00") {
        raw.replace("00", "19")
    } else {
        raw.clone()
    };

    if SHORT_YEAR_DATE_RE.is_match(&candidate) {
        if let Some(date) = parse_date(&candidate, "%m/%d/%y") {
            formatted = Some(date);
        }
    }

    if LONG_YEAR_DATE_RE.is_match(&candidate) {
        if let Some(date) = parse_date(&candidate, "%m/%d/%Y") {
            formatted = Some(date);
        }
    }

    if let Some(year) = leading_year(&candidate) {
        if year < EARLIEST_DOB_YEAR {
            formatted = Some(DOB_INCOMPLETE.to_string());
        } else if ISO_DATE_RE.is_match(&candidate) {
            if let Some(date) = parse_date(&candidate, "%Y-%m-%d") {
                formatted = Some(date);
            }
        }
    }

    let result = formatted.unwrap_or(raw);
    trace!("Normalized DOB {:?} -> {}", dob, result);
    FieldValue::Text(result)
}

/// Cleaned candidate identity. Names keep the case the lookup returned.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCandidate {
    pub first_name: FieldValue,
    pub middle_name: FieldValue,
    pub last_name: FieldValue,
    pub ssn: FieldValue,
    pub date_of_birth: FieldValue,
}

/// A verification input with every field in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub claim_number: FieldValue,
    pub first_name: FieldValue,
    pub last_name: FieldValue,
    /// First and last name concatenated without a separator.
    pub full_name: FieldValue,
    pub ssn: FieldValue,
    pub date_of_birth: FieldValue,
    pub candidates: [NormalizedCandidate; 2],
}

/// Cleans and normalizes every field of one input record.
pub fn normalize_record(input: &VerificationInput, suffixes: &SuffixTable) -> NormalizedRecord {
    let claimant = &input.claimant;

    let first_name = normalize_name(&remove_whitespace(&remove_punctuation(&claimant.first_name)));
    let last_name = {
        let cleaned = remove_internal_abbreviations(&claimant.last_name);
        let cleaned = remove_suffixes(&remove_punctuation(&cleaned), suffixes);
        normalize_name(&remove_whitespace(&cleaned))
    };
    let full_name = FieldValue::concat(&[&first_name, &last_name]);

    for (label, value) in [("first name", &first_name), ("last name", &last_name)] {
        if !value.is_text() {
            warn!("Claim {}: claimant {} is not text ({:?})", claimant.claim_number, label, value);
        }
    }

    let [first, second] = &input.candidates;
    NormalizedRecord {
        claim_number: claimant.claim_number.clone(),
        first_name,
        last_name,
        full_name,
        ssn: normalize_ssn(&claimant.ssn),
        date_of_birth: normalize_dob(&claimant.date_of_birth),
        candidates: [
            normalize_candidate(first, suffixes),
            normalize_candidate(second, suffixes),
        ],
    }
}

fn normalize_candidate(candidate: &CandidateIdentity, suffixes: &SuffixTable) -> NormalizedCandidate {
    let last_name = remove_suffixes(&remove_punctuation(&candidate.last_name), suffixes);
    NormalizedCandidate {
        first_name: remove_whitespace(&remove_punctuation(&candidate.first_name)),
        middle_name: candidate.middle_name.clone(),
        last_name: remove_whitespace(&last_name),
        ssn: normalize_ssn(&candidate.ssn),
        date_of_birth: normalize_dob(&candidate.date_of_birth),
    }
}

fn parse_date(value: &str, layout: &str) -> Option<String> {
    NaiveDate::parse_from_str(value, layout)
        .ok()
        .map(|date| date.format(DOB_OUTPUT_FORMAT).to_string())
}

/// Integer value of the first four characters, when they form one.
fn leading_year(value: &str) -> Option<i64> {
    let prefix: String = value.chars().take(4).collect();
    prefix.trim().parse::<i64>().ok()
}
