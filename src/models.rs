// src/models.rs
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::matching::features::{SimilarityTriple, NAME_COMBINATION_COUNT};

/// Literal the lookup service export uses for any absent field.
pub const MISSING_SENTINEL: &str = "Missing";

/// Shape of a single raw input field as it arrives from the export.
///
/// Claimant fields keep whatever shape they came in with; the normalizers and
/// comparison routines decide what to do with non-text values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    #[default]
    Null,
    /// Booleans, arrays and objects. Scored like numbers.
    Other(serde_json::Value),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn missing() -> Self {
        FieldValue::Text(MISSING_SENTINEL.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FieldValue::Text(_))
    }

    /// Applies `f` to text values; every other shape passes through unchanged.
    pub fn map_text<F>(&self, f: F) -> FieldValue
    where
        F: FnOnce(&str) -> String,
    {
        match self {
            FieldValue::Text(s) => FieldValue::Text(f(s)),
            other => other.clone(),
        }
    }

    /// Text rendering used where a value must be treated as a string whatever
    /// its shape (date parsing). Integral floats keep their trailing `.0`.
    pub fn to_lossy_string(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) if n.is_nan() => "nan".to_string(),
            FieldValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 => {
                format!("{:.1}", n)
            }
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Null => "nan".to_string(),
            FieldValue::Other(value) => value.to_string(),
        }
    }

    /// Null (or NaN) becomes the `"Missing"` sentinel, mirroring how the
    /// lookup export is back-filled before scoring.
    pub fn or_missing(self) -> FieldValue {
        match self {
            FieldValue::Null => FieldValue::missing(),
            FieldValue::Number(n) if n.is_nan() => FieldValue::missing(),
            other => other,
        }
    }

    /// Concatenates text values with no separator. Any non-text part makes the
    /// whole result null.
    pub fn concat(parts: &[&FieldValue]) -> FieldValue {
        let mut joined = String::new();
        for part in parts {
            match part.as_text() {
                Some(s) => joined.push_str(s),
                None => return FieldValue::Null,
            }
        }
        FieldValue::Text(joined)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Null => write!(f, "<null>"),
            FieldValue::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// One person under verification, as self-reported on the claim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClaimantRecord {
    pub claim_number: FieldValue,
    pub first_name: FieldValue,
    pub last_name: FieldValue,
    pub date_of_birth: FieldValue,
    pub ssn: FieldValue,
}

/// One identity proposed by the third-party lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateIdentity {
    pub first_name: FieldValue,
    pub middle_name: FieldValue,
    pub last_name: FieldValue,
    pub ssn: FieldValue,
    pub date_of_birth: FieldValue,
}

impl Default for CandidateIdentity {
    fn default() -> Self {
        Self {
            first_name: FieldValue::missing(),
            middle_name: FieldValue::missing(),
            last_name: FieldValue::missing(),
            ssn: FieldValue::missing(),
            date_of_birth: FieldValue::missing(),
        }
    }
}

/// A claimant together with the (up to) two identities the lookup returned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerificationInput {
    pub claimant: ClaimantRecord,
    pub candidates: [CandidateIdentity; 2],
}

/// Flat field mapping of one input row. Field names follow the scoring export;
/// the aliases accept the raw lookup column headers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FlatInputRecord {
    pub claim_number: FieldValue,
    pub first_name: FieldValue,
    pub last_name: FieldValue,
    pub date_of_birth: FieldValue,
    pub ssn: FieldValue,
    #[serde(alias = "TloName1FirstName")]
    pub tlo_first_name_1: FieldValue,
    #[serde(alias = "TloName1MiddleName")]
    pub tlo_middle_name_1: FieldValue,
    #[serde(alias = "TloName1LastName")]
    pub tlo_last_name_1: FieldValue,
    #[serde(alias = "TloName2FirstName")]
    pub tlo_first_name_2: FieldValue,
    #[serde(alias = "TloName2MiddleName")]
    pub tlo_middle_name_2: FieldValue,
    #[serde(alias = "TloName2LastName")]
    pub tlo_last_name_2: FieldValue,
    #[serde(alias = "TloSSN")]
    pub tlo_ssn: FieldValue,
    #[serde(alias = "TloDateOfBirth")]
    pub tlo_dob: FieldValue,
}

impl From<FlatInputRecord> for VerificationInput {
    fn from(row: FlatInputRecord) -> Self {
        // The lookup returns one SSN/DOB per response, shared by both identities.
        let ssn = row.tlo_ssn.or_missing();
        let dob = row.tlo_dob.or_missing();
        let first = CandidateIdentity {
            first_name: row.tlo_first_name_1.or_missing(),
            middle_name: row.tlo_middle_name_1.or_missing(),
            last_name: row.tlo_last_name_1.or_missing(),
            ssn: ssn.clone(),
            date_of_birth: dob.clone(),
        };
        let second = CandidateIdentity {
            first_name: row.tlo_first_name_2.or_missing(),
            middle_name: row.tlo_middle_name_2.or_missing(),
            last_name: row.tlo_last_name_2.or_missing(),
            ssn,
            date_of_birth: dob,
        };
        VerificationInput {
            claimant: ClaimantRecord {
                claim_number: row.claim_number,
                first_name: row.first_name,
                last_name: row.last_name,
                date_of_birth: row.date_of_birth,
                ssn: row.ssn,
            },
            candidates: [first, second],
        }
    }
}

/// Fields that can fail verification, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    Ssn,
    Dob,
    Name,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::Ssn => "SSN",
            FailureCategory::Dob => "DOB",
            FailureCategory::Name => "NAME",
        }
    }
}

/// Kind of manual review a record is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewType {
    #[default]
    None,
    Visual,
}

impl ReviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewType::None => "",
            ReviewType::Visual => "VISUAL",
        }
    }
}

impl Serialize for ReviewType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Aggregated scores for one record, with the metrics they were summed from.
///
/// Serializes as flat report columns: each metric (`ssn_ratio`,
/// `name_3_partial_ratio`, ...) followed by its summed score (`ssn_score`,
/// `n3_score`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreCard {
    pub full_name_check: u8,
    pub last_name_check: u8,
    pub ssn_score: u32,
    pub dob_score: u32,
    pub name_scores: [u32; NAME_COMBINATION_COUNT],
    pub ssn_metrics: SimilarityTriple,
    pub dob_metrics: SimilarityTriple,
    pub name_metrics: [SimilarityTriple; NAME_COMBINATION_COUNT],
}

fn serialize_metrics<M: SerializeMap>(
    map: &mut M,
    prefix: &str,
    metrics: &SimilarityTriple,
) -> Result<(), M::Error> {
    map.serialize_entry(&format!("{}_ratio", prefix), &metrics.ratio)?;
    map.serialize_entry(&format!("{}_token_sort_ratio", prefix), &metrics.token_sort_ratio)?;
    map.serialize_entry(&format!("{}_partial_ratio", prefix), &metrics.partial_ratio)
}

impl Serialize for ScoreCard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("full_name_check", &self.full_name_check)?;
        map.serialize_entry("last_name_check", &self.last_name_check)?;
        serialize_metrics(&mut map, "ssn", &self.ssn_metrics)?;
        map.serialize_entry("ssn_score", &self.ssn_score)?;
        serialize_metrics(&mut map, "dob", &self.dob_metrics)?;
        map.serialize_entry("dob_score", &self.dob_score)?;
        for (i, metrics) in self.name_metrics.iter().enumerate() {
            serialize_metrics(&mut map, &format!("name_{}", i + 1), metrics)?;
        }
        for (i, score) in self.name_scores.iter().enumerate() {
            map.serialize_entry(&format!("n{}_score", i + 1), score)?;
        }
        map.end()
    }
}

/// Terminal output of the pipeline for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub claim_number: FieldValue,
    pub ssn_match: u8,
    pub dob_match: u8,
    pub name_match: u8,
    pub failure_explanation: String,
    pub failure_explanation_numeric: u8,
    pub verified: u8,
    pub review: ReviewType,
    #[serde(flatten)]
    pub scores: ScoreCard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_record_fills_missing_lookup_fields() {
        let row: FlatInputRecord = serde_json::from_str(
            r#"{"claim_number": "C-1", "first_name": "John", "last_name": "Smith",
                "tlo_first_name_1": "JOHN", "tlo_last_name_1": null, "tlo_ssn": "123456789"}"#,
        )
        .unwrap();
        let input = VerificationInput::from(row);

        assert_eq!(input.claimant.first_name, FieldValue::text("John"));
        assert_eq!(input.claimant.ssn, FieldValue::Null);
        assert_eq!(input.candidates[0].first_name, FieldValue::text("JOHN"));
        assert_eq!(input.candidates[0].last_name, FieldValue::missing());
        assert_eq!(input.candidates[1].middle_name, FieldValue::missing());
        assert_eq!(input.candidates[1].ssn, FieldValue::text("123456789"));
        assert_eq!(input.candidates[1].date_of_birth, FieldValue::missing());
    }

    #[test]
    fn test_flat_record_accepts_lookup_headers() {
        let row: FlatInputRecord =
            serde_json::from_str(r#"{"TloName2LastName": "DOE", "TloDateOfBirth": "1956-01-01"}"#)
                .unwrap();
        assert_eq!(row.tlo_last_name_2, FieldValue::text("DOE"));
        assert_eq!(row.tlo_dob, FieldValue::text("1956-01-01"));
    }

    #[test]
    fn test_numeric_fields_keep_their_shape() {
        let row: FlatInputRecord =
            serde_json::from_str(r#"{"ssn": 123456789, "date_of_birth": 19560101}"#).unwrap();
        assert_eq!(row.ssn, FieldValue::Number(123456789.0));
        assert_eq!(row.date_of_birth.to_lossy_string(), "19560101.0");
    }

    #[test]
    fn test_concat_requires_text() {
        let first = FieldValue::text("JOHN");
        let last = FieldValue::text("SMITH");
        assert_eq!(FieldValue::concat(&[&first, &last]), FieldValue::text("JOHNSMITH"));
        assert_eq!(FieldValue::concat(&[&first, &FieldValue::Null]), FieldValue::Null);
    }

    #[test]
    fn test_other_json_shapes_are_kept() {
        let row: FlatInputRecord = serde_json::from_str(
            r#"{"first_name": true, "last_name": ["SMITH"], "ssn": {"value": 1}, "tlo_ssn": false}"#,
        )
        .unwrap();
        assert_eq!(row.first_name, FieldValue::Other(serde_json::json!(true)));
        assert!(!row.last_name.is_text());
        assert_eq!(row.ssn.to_lossy_string(), r#"{"value":1}"#);

        let input = VerificationInput::from(row);
        assert_eq!(input.candidates[0].ssn, FieldValue::Other(serde_json::json!(false)));
        assert_eq!(input.candidates[0].first_name, FieldValue::missing());
    }

    #[test]
    fn test_score_card_serializes_as_flat_columns() {
        let mut card = ScoreCard {
            full_name_check: 0,
            last_name_check: 1,
            ssn_score: 267,
            dob_score: 300,
            ssn_metrics: SimilarityTriple { ratio: 89, token_sort_ratio: 89, partial_ratio: 89 },
            dob_metrics: SimilarityTriple { ratio: 100, token_sort_ratio: 100, partial_ratio: 100 },
            ..ScoreCard::default()
        };
        card.name_scores[13] = 184;
        card.name_metrics[13] = SimilarityTriple { ratio: 60, token_sort_ratio: 62, partial_ratio: 62 };

        let json = serde_json::to_value(&card).unwrap();
        let columns = json.as_object().unwrap();
        // Two checks, four values each for SSN and DOB, four per name combination.
        assert_eq!(columns.len(), 2 + 4 + 4 + 4 * NAME_COMBINATION_COUNT);
        assert_eq!(json["last_name_check"], 1);
        assert_eq!(json["ssn_token_sort_ratio"], 89);
        assert_eq!(json["ssn_score"], 267);
        assert_eq!(json["dob_partial_ratio"], 100);
        assert_eq!(json["name_14_ratio"], 60);
        assert_eq!(json["name_14_partial_ratio"], 62);
        assert_eq!(json["n14_score"], 184);
        assert_eq!(json["n1_score"], 0);
        assert!(json.get("name_scores").is_none());
    }

    #[test]
    fn test_review_type_serializes_as_report_text() {
        assert_eq!(serde_json::to_string(&ReviewType::Visual).unwrap(), "\"VISUAL\"");
        assert_eq!(serde_json::to_string(&ReviewType::None).unwrap(), "\"\"");
    }
}
