//! Pure feature transforms shared by training and inference
//!
//! Every function here is total: malformed input resolves to a documented
//! sentinel (`-1`, `"Unknown"`, a `_TBA` slot suffix) instead of an error,
//! so downstream stages never special-case missing data. Training and
//! serving must call these exact functions; any divergence between the two
//! sides silently corrupts predictions.

use chrono::{NaiveTime, Timelike};

use crate::models::UNKNOWN;

/// Sentinel minute value for unparseable or TBA time ranges
pub const TIME_SENTINEL: i32 = -1;

/// Parse a `"H:MMam-H:MMpm"` time range into minutes since midnight.
///
/// Returns `(start, end, duration)`, or `(-1, -1, -1)` for the literal
/// `"TBA"`, a missing separator, or an unparseable half.
pub fn parse_time_range(text: &str) -> (i32, i32, i32) {
    let text = text.trim();
    if text == "TBA" || !text.contains('-') {
        return (TIME_SENTINEL, TIME_SENTINEL, TIME_SENTINEL);
    }
    let Some((start_raw, end_raw)) = text.split_once('-') else {
        return (TIME_SENTINEL, TIME_SENTINEL, TIME_SENTINEL);
    };
    match (parse_clock(start_raw), parse_clock(end_raw)) {
        (Some(start), Some(end)) => (start, end, end - start),
        _ => (TIME_SENTINEL, TIME_SENTINEL, TIME_SENTINEL),
    }
}

fn parse_clock(raw: &str) -> Option<i32> {
    let time = NaiveTime::parse_from_str(raw.trim(), "%I:%M%p").ok()?;
    Some((time.hour() * 60 + time.minute()) as i32)
}

/// Extract the building code from a location string.
///
/// `ONLINE` and `Unknown` pass through unchanged; otherwise the maximal
/// leading run of alphabetic characters, or `Unknown` when that run is
/// empty (e.g. a bare room number).
pub fn extract_building(location: &str) -> String {
    let location = location.trim();
    if location == "ONLINE" || location == UNKNOWN {
        return location.to_string();
    }
    let prefix: String = location.chars().take_while(|c| c.is_alphabetic()).collect();
    if prefix.is_empty() {
        UNKNOWN.to_string()
    } else {
        prefix
    }
}

/// Split a section code into its department and course-number tokens.
///
/// Mirrors the pattern `^(\w+)\s+(\S+)`: a leading word-character run, a
/// whitespace run, then a non-whitespace run. Both parts default to
/// `Unknown` when the pattern does not match. Anything after the second
/// token (section suffixes and the like) is dropped by design; training
/// and inference must drop it identically.
pub fn decompose_section_code(section: &str) -> (String, String) {
    let section = section.trim();

    let dept: String = section
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if dept.is_empty() {
        return (UNKNOWN.to_string(), UNKNOWN.to_string());
    }

    let rest = &section[dept.len()..];
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return (UNKNOWN.to_string(), UNKNOWN.to_string());
    }
    let number: String = rest
        .trim_start()
        .chars()
        .take_while(|c| !c.is_whitespace())
        .collect();
    if number.is_empty() {
        return (UNKNOWN.to_string(), UNKNOWN.to_string());
    }

    (dept, number)
}

/// Full course code as used for labels and feature values
pub fn course_code(dept: &str, number: &str) -> String {
    format!("{dept} {number}")
}

/// Composite "when" key: `"{days}_{start}"`, or `"{days}_TBA"` when the
/// start time carries the sentinel.
pub fn build_slot_key(days: &str, start_minutes: i32) -> String {
    let days = days.trim();
    if start_minutes == TIME_SENTINEL {
        format!("{days}_TBA")
    } else {
        format!("{days}_{start_minutes}")
    }
}

/// True iff the satisfies-requirement text starts with the `GE:` prefix
pub fn has_general_education_flag(satifies: &str) -> bool {
    satifies.starts_with("GE:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_morning_range() {
        assert_eq!(parse_time_range("09:00AM-10:15AM"), (540, 615, 75));
    }

    #[test]
    fn parses_across_noon() {
        let (start, end, duration) = parse_time_range("11:30AM-1:45PM");
        assert_eq!((start, end), (690, 825));
        assert_eq!(duration, end - start);
        assert!(end > start);
    }

    #[test]
    fn tba_and_missing_separator_yield_sentinels() {
        assert_eq!(parse_time_range("TBA"), (-1, -1, -1));
        assert_eq!(parse_time_range("whenever"), (-1, -1, -1));
        assert_eq!(parse_time_range(""), (-1, -1, -1));
    }

    #[test]
    fn half_parseable_range_yields_sentinels() {
        assert_eq!(parse_time_range("09:00AM-later"), (-1, -1, -1));
        assert_eq!(parse_time_range("junk-10:15AM"), (-1, -1, -1));
    }

    #[test]
    fn building_extraction_is_idempotent() {
        for (input, expected) in [("ENG305", "ENG"), ("ONLINE", "ONLINE"), ("123", "Unknown")] {
            let once = extract_building(input);
            assert_eq!(once, expected);
            assert_eq!(extract_building(&once), once);
        }
    }

    #[test]
    fn section_decomposition_keeps_first_two_tokens() {
        let (dept, number) = decompose_section_code("CS 146 (Section 01)");
        assert_eq!(dept, "CS");
        assert_eq!(number, "146");
        assert_eq!(course_code(&dept, &number), "CS 146");
    }

    #[test]
    fn unparseable_section_is_unknown() {
        assert_eq!(
            decompose_section_code("!!!"),
            (UNKNOWN.to_string(), UNKNOWN.to_string())
        );
        assert_eq!(
            decompose_section_code("CS146"),
            (UNKNOWN.to_string(), UNKNOWN.to_string())
        );
        assert_eq!(
            decompose_section_code(""),
            (UNKNOWN.to_string(), UNKNOWN.to_string())
        );
    }

    #[test]
    fn slot_key_uses_tba_suffix_for_sentinel() {
        assert_eq!(build_slot_key("TR", -1), "TR_TBA");
        assert_eq!(build_slot_key("TR", 540), "TR_540");
        assert_eq!(build_slot_key("MW", 0), "MW_0");
    }

    #[test]
    fn ge_flag_requires_exact_prefix() {
        assert!(has_general_education_flag("GE: B2"));
        assert!(!has_general_education_flag("MajorOnly"));
        assert!(!has_general_education_flag("ge: B2"));
    }
}
