//! Display labels for departments and advisers.
//!
//! Department names are reduced to short program codes, adviser names are
//! upper-cased. Both accept comma-joined tie lists for the "most active"
//! summary fields.

use crate::payload::Label;

/// Placeholder rendered for empty or non-textual labels.
pub const NOT_AVAILABLE: &str = "N/A";

/// Separator placed between the entries of a normalized tie list.
pub const TIE_SEPARATOR: &str = ", ";

const TIE_DELIMITER: char = ',';

/// Canonical department names and their program codes.
///
/// Order matters: the prefix fallback in [`normalize_department`] takes the
/// first entry whose name starts the input.
pub const DEPARTMENT_ACRONYMS: &[(&str, &str)] = &[
    ("Marine Engineering", "BSME"),
    ("Marine Transportation", "BSMT"),
    ("Criminology", "BSCRIM"),
    ("Tourism Management", "BSTM"),
    ("Technical-Vocational Teacher Education", "BTVTED"),
    ("Early Childhood Education", "EDUC"),
    ("Information System", "BSIS"),
    ("Entrepreneurship", "BSE"),
    ("Management Accounting", "BSMA"),
    ("Nursing", "BSN"),
    ("Humanities and Social Sciences", "HUMSS"),
    ("Accountancy, Business and Management", "ABM"),
    ("Science, Technology, Engineering and Mathematics", "STEM"),
    ("General Academic Strand", "GAS"),
    ("Other", "OTHER"),
];

/// Maps a department name to its display code.
pub fn normalize_department(name: &str) -> String {
    if name.is_empty() {
        return NOT_AVAILABLE.to_owned();
    }

    if let Some(code) = trailing_acronym(name) {
        return code.to_owned();
    }

    if let Some((_, code)) = DEPARTMENT_ACRONYMS.iter().find(|(full, _)| *full == name) {
        return (*code).to_owned();
    }

    DEPARTMENT_ACRONYMS
        .iter()
        .find(|(full, _)| name.starts_with(full))
        .map_or_else(|| name.to_owned(), |(_, code)| (*code).to_owned())
}

/// Upper-cases an adviser name for display.
pub fn normalize_adviser(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        NOT_AVAILABLE.to_owned()
    } else {
        name.to_uppercase()
    }
}

/// Normalizes a department value that may list several tied departments.
pub fn normalize_department_ties(raw: &str) -> String {
    join_ties(raw.split(TIE_DELIMITER).map(|piece| normalize_department(piece.trim())))
}

/// Normalizes an adviser value that may list several tied advisers.
pub fn normalize_adviser_ties(raw: &str) -> String {
    join_ties(raw.split(TIE_DELIMITER).map(normalize_adviser))
}

/// Resolves an optional payload label through `normalize`.
///
/// Absent labels become `missing`, non-string labels become `"N/A"`.
pub fn resolve_label(label: Option<&Label>, missing: &str, normalize: fn(&str) -> String) -> String {
    match label {
        None => normalize(missing),
        Some(Label::Text(text)) => normalize(text),
        Some(Label::NotText) => NOT_AVAILABLE.to_owned(),
    }
}

fn join_ties(pieces: impl Iterator<Item = String>) -> String {
    pieces.collect::<Vec<_>>().join(TIE_SEPARATOR)
}

/// Returns the `XY..` run of a name ending in `(XY..)`, ignoring trailing whitespace.
fn trailing_acronym(name: &str) -> Option<&str> {
    let inner = name.trim_end().strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let candidate = &inner[open + 1..];
    (candidate.len() >= 2 && candidate.bytes().all(|byte| byte.is_ascii_uppercase()))
        .then_some(candidate)
}
