//! Frequency spec parser.
//!
//! Handles two notations:
//! - Tablet schedules: `"1-0-1"`, `"0.5-0-0.5"` (morning-afternoon-evening)
//! - Free text: `"Twice daily"`, `"3 times a day"`, `"once"`

use serde::{Deserialize, Serialize};

/// Daily doses assumed when free text names no recognizable count.
pub const DEFAULT_DAILY_DOSES: u32 = 1;

/// Free-text keywords and the dose count they imply.
///
/// Checked top to bottom; the first rule with any matching keyword wins, so
/// `"twice, or 4 if needed"` resolves to 2.
const KEYWORD_RULES: &[(&[&str], u32)] = &[
    (&["twice", "2"], 2),
    (&["thrice", "three", "3"], 3),
    (&["four", "4"], 4),
    (&["once", "1"], 1),
];

/// A parsed frequency of administration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Frequency {
    /// Morning-afternoon-evening schedule, in units per slot
    Structured {
        morning: f64,
        afternoon: f64,
        evening: f64,
    },
    /// Times per day recovered from free text
    FreeText { daily_doses: u32 },
}

impl Frequency {
    /// Parse a frequency spec. Never fails.
    pub fn parse(spec: &str) -> Self {
        Self::parse_structured(spec).unwrap_or_else(|| Self::parse_free_text(spec))
    }

    fn parse_structured(spec: &str) -> Option<Self> {
        let segments: Vec<&str> = spec.trim().split('-').map(str::trim).collect();
        let &[morning, afternoon, evening] = segments.as_slice() else {
            return None;
        };
        if !segments.iter().all(|s| is_decimal(s)) {
            return None;
        }

        Some(Self::Structured {
            morning: parse_segment(morning),
            afternoon: parse_segment(afternoon),
            evening: parse_segment(evening),
        })
    }

    fn parse_free_text(spec: &str) -> Self {
        let lower = spec.to_lowercase();
        let daily_doses = KEYWORD_RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, doses)| *doses)
            .unwrap_or(DEFAULT_DAILY_DOSES);

        Self::FreeText { daily_doses }
    }

    /// Number of doses administered per day.
    pub fn daily_doses(&self) -> f64 {
        match self {
            Self::Structured {
                morning,
                afternoon,
                evening,
            } => morning + afternoon + evening,
            Self::FreeText { daily_doses } => f64::from(*daily_doses),
        }
    }

    /// True for schedules like `"0-0-0"` that administer nothing.
    pub fn is_zero_dose(&self) -> bool {
        self.daily_doses() <= 0.0
    }
}

/// Interpret a frequency spec as a per-day dose count.
pub fn parse_frequency(spec: &str) -> f64 {
    Frequency::parse(spec).daily_doses()
}

/// Unsigned decimal: digits with at most one point, at least one digit.
fn is_decimal(segment: &str) -> bool {
    let mut digits = 0;
    let mut points = 0;
    for c in segment.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

fn parse_segment(segment: &str) -> f64 {
    segment.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_sums_segments() {
        assert_eq!(parse_frequency("1-0-1"), 2.0);
        assert_eq!(parse_frequency("0.5-0-0.5"), 1.0);
        assert_eq!(parse_frequency("1.5-1-0"), 2.5);
        assert_eq!(parse_frequency("2-2-2"), 6.0);
        assert_eq!(parse_frequency(" 1 - 1 - 1 "), 3.0);
    }

    #[test]
    fn test_structured_variant() {
        assert_eq!(
            Frequency::parse("1-0.5-0"),
            Frequency::Structured {
                morning: 1.0,
                afternoon: 0.5,
                evening: 0.0,
            }
        );
    }

    #[test]
    fn test_zero_dose_schedule() {
        let freq = Frequency::parse("0-0-0");
        assert!(matches!(freq, Frequency::Structured { .. }));
        assert_eq!(freq.daily_doses(), 0.0);
        assert!(freq.is_zero_dose());
    }

    #[test]
    fn test_malformed_schedules_fall_back_to_free_text() {
        // Wrong segment count
        assert!(matches!(Frequency::parse("1-0"), Frequency::FreeText { .. }));
        assert!(matches!(Frequency::parse("1-0-1-1"), Frequency::FreeText { .. }));
        // Negative or non-numeric segments
        assert!(matches!(Frequency::parse("-1-0-1"), Frequency::FreeText { .. }));
        assert!(matches!(Frequency::parse("a-b-c"), Frequency::FreeText { .. }));
        assert!(matches!(Frequency::parse("1..0-0-1"), Frequency::FreeText { .. }));

        assert_eq!(parse_frequency("a-b-c"), 1.0);
        assert_eq!(parse_frequency("2-1"), 2.0);
    }

    #[test]
    fn test_free_text_keywords() {
        assert_eq!(parse_frequency("Twice daily"), 2.0);
        assert_eq!(parse_frequency("TWICE"), 2.0);
        assert_eq!(parse_frequency("thrice a day"), 3.0);
        assert_eq!(parse_frequency("Three times daily"), 3.0);
        assert_eq!(parse_frequency("3x/day"), 3.0);
        assert_eq!(parse_frequency("four times a day"), 4.0);
        assert_eq!(parse_frequency("q4h"), 4.0);
        assert_eq!(parse_frequency("once daily"), 1.0);
        assert_eq!(parse_frequency("SID"), 1.0);
        assert_eq!(parse_frequency("as directed"), 1.0);
    }

    #[test]
    fn test_keyword_precedence_first_match_wins() {
        assert_eq!(parse_frequency("2 times, every 12 hrs"), 2.0);
        assert_eq!(parse_frequency("twice, or 4 if painful"), 2.0);
        assert_eq!(parse_frequency("three or four times"), 3.0);
        assert_eq!(parse_frequency("once, then 4 later"), 4.0);
    }

    #[test]
    fn test_empty_defaults_to_one() {
        assert_eq!(parse_frequency(""), 1.0);
        assert!(!Frequency::parse("").is_zero_dose());
    }

    #[test]
    fn test_is_decimal() {
        assert!(is_decimal("1"));
        assert!(is_decimal("0.5"));
        assert!(is_decimal(".5"));
        assert!(!is_decimal(""));
        assert!(!is_decimal("."));
        assert!(!is_decimal("1.2.3"));
        assert!(!is_decimal("+1"));
    }
}
