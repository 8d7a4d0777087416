// src/matching/name_checks.rs
use crate::models::FieldValue;

/// Returns 1 when `full_name` can be rebuilt from a subset of `parts`.
///
/// Parts are consumed longest first, each removing its first occurrence only,
/// and the check succeeds as soon as nothing of the name is left. Non-text
/// parts are ignored.
pub fn exact_name_check(full_name: &FieldValue, parts: Option<&[FieldValue]>) -> u8 {
    let Some(parts) = parts else {
        return 0;
    };
    let Some(name) = full_name.as_text() else {
        return 0;
    };

    let mut text_parts: Vec<&str> = parts.iter().filter_map(FieldValue::as_text).collect();
    // Stable, so equal-length parts keep their given order.
    text_parts.sort_by_key(|part| std::cmp::Reverse(part.chars().count()));

    let mut residue = name.to_string();
    for part in text_parts {
        residue = residue.replacen(part, "", 1);
        if residue.is_empty() {
            return 1;
        }
    }
    0
}

/// Returns 1 when the claimant last name equals, contains, or is contained in
/// either candidate last name.
pub fn last_name_check(
    candidate_last_1: &FieldValue,
    candidate_last_2: &FieldValue,
    claimant_last: &FieldValue,
) -> u8 {
    let Some(claimant) = claimant_last.as_text() else {
        return 0;
    };
    let overlaps = |candidate: &FieldValue| match candidate.as_text() {
        Some(c) => c == claimant || c.contains(claimant) || claimant.contains(c),
        None => false,
    };
    u8::from(overlaps(candidate_last_1) || overlaps(candidate_last_2))
}
