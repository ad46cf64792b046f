//! Category matching for marker placeholders.
//!
//! Every category list is scanned once and split into two pools:
//! - matched: ordinary categories whose range contains the activity's value
//! - else: catch-all categories (null bounds / null date)
//!
//! A text is then drawn uniformly at random, first a category from the matched
//! pool (falling back to the else pool), then one of that category's strings.
//! Categories with no text for the requested slot are ignored entirely.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{DateCategory, NumericCategory, TimeCategory};
use crate::error::ResolveError;

/// Common view of the three category shapes.
pub trait Category {
    /// True for the catch-all category.
    fn is_else(&self) -> bool;

    /// Title texts, or description texts when `description` is set.
    fn texts(&self, description: bool) -> &[String];
}

impl Category for NumericCategory {
    fn is_else(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    fn texts(&self, description: bool) -> &[String] {
        if description {
            self.descriptions.as_slice()
        } else {
            self.titles.as_slice()
        }
    }
}

impl Category for TimeCategory {
    fn is_else(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    fn texts(&self, description: bool) -> &[String] {
        if description {
            self.descriptions.as_slice()
        } else {
            self.titles.as_slice()
        }
    }
}

impl Category for DateCategory {
    fn is_else(&self) -> bool {
        self.date.is_none()
    }

    fn texts(&self, description: bool) -> &[String] {
        if description {
            self.descriptions.as_slice()
        } else {
            self.titles.as_slice()
        }
    }
}

/// Pick a text from the categories that apply.
///
/// `in_range` is only called for non-else categories that carry text for the
/// requested slot. Returns `Ok(None)` when neither pool has a candidate.
pub fn choose_text<C, R, F>(
    categories: &[C],
    description: bool,
    rng: &mut R,
    mut in_range: F,
) -> Result<Option<String>, ResolveError>
where
    C: Category,
    R: Rng + ?Sized,
    F: FnMut(&C) -> Result<bool, ResolveError>,
{
    let mut matched: Vec<&[String]> = Vec::new();
    let mut fallback: Vec<&[String]> = Vec::new();

    for category in categories {
        let texts = category.texts(description);
        if texts.is_empty() {
            continue;
        }
        if category.is_else() {
            fallback.push(texts);
        } else if in_range(category)? {
            matched.push(texts);
        }
    }

    let pool = if matched.is_empty() { fallback } else { matched };
    Ok(pool
        .choose(rng)
        .and_then(|texts| texts.choose(rng))
        .cloned())
}

// ============================================================================
// Range predicates
// ============================================================================

/// Half-open `lower <= value < upper`, `upper = None` meaning unbounded.
/// An absent value never falls inside a bounded category.
pub fn numeric_in_range(lower: Option<f64>, upper: Option<f64>, value: Option<f64>) -> bool {
    let Some(value) = value else {
        return false;
    };
    lower.unwrap_or(f64::NEG_INFINITY) <= value && value < upper.unwrap_or(f64::INFINITY)
}

/// Half-open clock window in minutes since midnight. `upper < lower` wraps.
pub fn clock_in_range(lower: u32, upper: u32, minutes: u32) -> bool {
    if upper < lower {
        minutes >= lower || minutes < upper
    } else {
        lower <= minutes && minutes < upper
    }
}

/// Parse a 24-hour `HHMM` string into minutes since midnight.
pub fn parse_hhmm(hhmm: &str) -> Result<u32, ResolveError> {
    let malformed = || ResolveError::malformed("HHMM time", hhmm);
    if hhmm.len() != 4 || !hhmm.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    NaiveTime::parse_from_str(hhmm, "%H%M")
        .map(minutes_since_midnight)
        .map_err(|_| malformed())
}

pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// `YYYY-MM-DD` where any component may be the `*` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpec {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

pub const DATE_WILDCARD: &str = "*";

impl DateSpec {
    pub fn parse(spec: &str) -> Result<Self, ResolveError> {
        let malformed = || ResolveError::malformed("date specifier", spec);
        let parts: Vec<&str> = spec.split('-').collect();
        let [year, month, day] = parts.as_slice() else {
            return Err(malformed());
        };

        fn component<T: std::str::FromStr>(
            part: &str,
            width: usize,
        ) -> Result<Option<T>, ()> {
            if part == DATE_WILDCARD {
                return Ok(None);
            }
            if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(());
            }
            part.parse().map(Some).map_err(|_| ())
        }

        Ok(Self {
            year: component(year, 4).map_err(|_| malformed())?,
            month: component(month, 2).map_err(|_| malformed())?,
            day: component(day, 2).map_err(|_| malformed())?,
        })
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        self.year.map_or(true, |y| y == date.year())
            && self.month.map_or(true, |m| m == date.month())
            && self.day.map_or(true, |d| d == date.day())
    }
}

// ============================================================================
// Per-kind matchers
// ============================================================================

pub fn match_numeric<R: Rng + ?Sized>(
    categories: &[NumericCategory],
    value: Option<f64>,
    description: bool,
    rng: &mut R,
) -> Result<Option<String>, ResolveError> {
    choose_text(categories, description, rng, |c| {
        Ok(numeric_in_range(c.lower, c.upper, value))
    })
}

pub fn match_clock_time<R: Rng + ?Sized>(
    categories: &[TimeCategory],
    time: NaiveTime,
    description: bool,
    rng: &mut R,
) -> Result<Option<String>, ResolveError> {
    let minutes = minutes_since_midnight(time);
    choose_text(categories, description, rng, |c| {
        let (Some(lower), Some(upper)) = (&c.lower, &c.upper) else {
            let bound = c.lower.as_deref().or(c.upper.as_deref()).unwrap_or_default();
            return Err(ResolveError::malformed("start time window", bound));
        };
        Ok(clock_in_range(parse_hhmm(lower)?, parse_hhmm(upper)?, minutes))
    })
}

pub fn match_date<R: Rng + ?Sized>(
    categories: &[DateCategory],
    date: NaiveDate,
    description: bool,
    rng: &mut R,
) -> Result<Option<String>, ResolveError> {
    choose_text(categories, description, rng, |c| match &c.date {
        Some(spec) => Ok(DateSpec::parse(spec)?.matches(date)),
        None => Ok(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextOptions;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn numeric(lower: Option<f64>, upper: Option<f64>, title: &str) -> NumericCategory {
        NumericCategory {
            lower,
            upper,
            titles: TextOptions::from(title),
            descriptions: TextOptions::default(),
        }
    }

    fn clock(lower: &str, upper: &str, title: &str) -> TimeCategory {
        TimeCategory {
            lower: Some(lower.to_string()),
            upper: Some(upper.to_string()),
            titles: TextOptions::from(title),
            descriptions: TextOptions::default(),
        }
    }

    fn date(spec: Option<&str>, title: &str) -> DateCategory {
        DateCategory {
            date: spec.map(String::from),
            titles: TextOptions::from(title),
            descriptions: TextOptions::default(),
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_numeric_half_open_boundaries() {
        for (lower, upper) in [(0.0, 10.0), (5.0, 5.5), (100.0, 1000.0)] {
            assert!(numeric_in_range(Some(lower), Some(upper), Some(lower)));
            assert!(!numeric_in_range(Some(lower), Some(upper), Some(upper)));
            assert!(numeric_in_range(Some(lower), None, Some(lower)));
            assert!(numeric_in_range(Some(lower), None, Some(upper * 1e6)));
            assert!(!numeric_in_range(Some(lower), None, Some(lower - 0.001)));
        }
        assert!(!numeric_in_range(Some(0.0), None, None));
    }

    #[test]
    fn test_clock_wraparound_boundaries() {
        // 2300 -> 0100
        let (lower, upper) = (23 * 60, 60);
        assert!(clock_in_range(lower, upper, lower));
        assert!(!clock_in_range(lower, upper, upper));
        assert!(clock_in_range(lower, upper, 0));
        assert!(clock_in_range(lower, upper, 59));
        for minutes in (upper + 1)..lower {
            assert!(!clock_in_range(lower, upper, minutes));
        }

        // Ordinary window 0600 -> 0900
        assert!(clock_in_range(360, 540, 360));
        assert!(!clock_in_range(360, 540, 540));
        assert!(!clock_in_range(360, 540, 1200));
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("0000").unwrap(), 0);
        assert_eq!(parse_hhmm("0715").unwrap(), 435);
        assert_eq!(parse_hhmm("2359").unwrap(), 1439);
        for bad in ["2400", "0760", "715", "07:15", "ab12", " 715", "+715", ""] {
            assert!(parse_hhmm(bad).unwrap_err().is_defect(), "{bad}");
        }
    }

    #[test]
    fn test_date_spec() {
        let xmas = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert!(DateSpec::parse("2024-12-25").unwrap().matches(xmas));
        assert!(DateSpec::parse("*-12-25").unwrap().matches(xmas));
        assert!(DateSpec::parse("*-*-25").unwrap().matches(xmas));
        assert!(DateSpec::parse("*-*-*").unwrap().matches(xmas));
        assert!(!DateSpec::parse("2023-*-*").unwrap().matches(xmas));
        assert!(!DateSpec::parse("*-11-*").unwrap().matches(xmas));

        for bad in ["2024-12", "24-12-25", "2024-1-25", "*-*-*-*", "2024-xx-01"] {
            assert!(DateSpec::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_matched_pool_beats_else() {
        let cats = vec![
            numeric(None, None, "Else"),
            numeric(Some(0.0), Some(10.0), "Jog"),
        ];
        let text = match_numeric(&cats, Some(5.2), false, &mut rng()).unwrap();
        assert_eq!(text.as_deref(), Some("Jog"));

        let text = match_numeric(&cats, Some(12.0), false, &mut rng()).unwrap();
        assert_eq!(text.as_deref(), Some("Else"));

        let text = match_numeric(&cats, None, false, &mut rng()).unwrap();
        assert_eq!(text.as_deref(), Some("Else"));
    }

    #[test]
    fn test_no_category_applies() {
        let cats = vec![numeric(Some(0.0), Some(10.0), "Jog")];
        assert_eq!(match_numeric(&cats, Some(10.0), false, &mut rng()).unwrap(), None);
        assert_eq!(match_numeric(&[], Some(1.0), false, &mut rng()).unwrap(), None);
    }

    #[test]
    fn test_empty_description_slot_is_skipped() {
        let mut with_desc = numeric(None, None, "Else");
        with_desc.descriptions = TextOptions::from("Else description");
        let cats = vec![numeric(Some(0.0), Some(10.0), "Jog"), with_desc];

        // The matching category has no description, so the else pool is used.
        let text = match_numeric(&cats, Some(5.0), true, &mut rng()).unwrap();
        assert_eq!(text.as_deref(), Some("Else description"));
    }

    #[test]
    fn test_random_choice_stays_within_candidates() {
        let mut cat = numeric(Some(0.0), Some(10.0), "A");
        cat.titles = TextOptions::from(vec!["A", "B"]);
        let cats = vec![cat, numeric(Some(5.0), None, "C")];

        let mut rng = rng();
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let text = match_numeric(&cats, Some(6.0), false, &mut rng).unwrap().unwrap();
            seen.insert(text);
        }
        let expected: std::collections::BTreeSet<String> =
            ["A", "B", "C"].into_iter().map(String::from).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_clock_time_matching() {
        let cats = vec![
            clock("2300", "0100", "Midnight"),
            clock("0500", "1200", "Morning"),
            TimeCategory {
                lower: None,
                upper: None,
                titles: TextOptions::from("Day"),
                descriptions: TextOptions::default(),
            },
        ];
        let pick = |t| match_clock_time(&cats, t, false, &mut rng()).unwrap();
        assert_eq!(pick(at(7, 15)).as_deref(), Some("Morning"));
        assert_eq!(pick(at(23, 30)).as_deref(), Some("Midnight"));
        assert_eq!(pick(at(0, 59)).as_deref(), Some("Midnight"));
        assert_eq!(pick(at(1, 0)).as_deref(), Some("Day"));
        assert_eq!(pick(at(12, 0)).as_deref(), Some("Day"));
    }

    #[test]
    fn test_malformed_clock_bound_is_defect() {
        let cats = vec![clock("2500", "0100", "Bad")];
        let err = match_clock_time(&cats, at(7, 0), false, &mut rng()).unwrap_err();
        assert!(err.is_defect());
    }

    #[test]
    fn test_date_matching() {
        let cats = vec![
            date(Some("*-12-25"), "Christmas"),
            date(Some("*-*-01"), "First"),
            date(None, "Any day"),
        ];
        let pick = |y, m, d| {
            let day = NaiveDate::from_ymd_opt(y, m, d).unwrap();
            match_date(&cats, day, false, &mut rng()).unwrap()
        };
        assert_eq!(pick(2024, 12, 25).as_deref(), Some("Christmas"));
        assert_eq!(pick(2024, 6, 1).as_deref(), Some("First"));
        assert_eq!(pick(2024, 6, 2).as_deref(), Some("Any day"));
    }
}
