//! Absolute dates from the forum's month/day labels.
//!
//! Search results only show `M/D`, so the year is inferred: results arrive
//! newest first, and a month that is larger than the previous post's month
//! means a year boundary has been crossed backwards.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use compact_str::CompactString;
use regex::Regex;

static MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\s*/\s*(\d{1,2})$").unwrap());

/// A post date as resolved from its label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostDate {
    Parsed(NaiveDate),
    Unparsed(CompactString),
}

impl PostDate {
    #[must_use]
    pub const fn parsed(&self) -> Option<NaiveDate> {
        match self {
            Self::Parsed(date) => Some(*date),
            Self::Unparsed(_) => None,
        }
    }

    /// Collapses an unparsed label into `today`.
    #[must_use]
    pub const fn or_today(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Parsed(date) => *date,
            Self::Unparsed(_) => today,
        }
    }
}

/// Year-rollback state, threaded through every label in traversal order.
///
/// Posts must be fed newest first; feeding them in any other order silently
/// shifts years.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    year: i32,
    prev_month: u32,
}

impl Cursor {
    #[must_use]
    pub const fn new(year: i32, prev_month: u32) -> Self {
        Self { year, prev_month }
    }

    /// `{ year: today's year, prev_month: 12 }`.
    #[must_use]
    pub fn seeded(today: NaiveDate) -> Self {
        Self::new(today.year(), 12)
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn prev_month(&self) -> u32 {
        self.prev_month
    }

    /// Resolves one label and advances the cursor.
    ///
    /// The cursor only moves when the label is a real calendar date.
    pub fn resolve(&mut self, label: &str) -> PostDate {
        let label = label.trim();
        let Some((month, day)) = split_month_day(label) else {
            return PostDate::Unparsed(label.into());
        };

        let year = if month > self.prev_month {
            self.year - 1
        } else {
            self.year
        };
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            return PostDate::Unparsed(label.into());
        };

        self.year = year;
        self.prev_month = month;
        PostDate::Parsed(date)
    }

    /// Formats the resolved label as `YYYY-MM-DD`, falling back to `today`
    /// for anything that is not a month/day pair.
    pub fn normalize(&mut self, label: &str, today: NaiveDate) -> String {
        self.resolve(label)
            .or_today(today)
            .format("%Y-%m-%d")
            .to_string()
    }
}

fn split_month_day(label: &str) -> Option<(u32, u32)> {
    let caps = MONTH_DAY.captures(label)?;
    let month = caps.get(1)?.as_str().parse().ok()?;
    let day = caps.get(2)?.as_str().parse().ok()?;
    ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some((month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rolls_back_when_month_increases() {
        let mut cursor = Cursor::new(2025, 12);
        let today = ymd(2025, 12, 31);

        assert_eq!(cursor.normalize("11/20", today), "2025-11-20");
        assert_eq!(cursor.prev_month(), 11);
        assert_eq!(cursor.normalize("12/01", today), "2024-12-01");
        assert_eq!(cursor.year(), 2024);
        assert_eq!(cursor.prev_month(), 12);
    }

    #[test]
    fn same_month_keeps_year() {
        let mut cursor = Cursor::new(2025, 12);
        assert_eq!(cursor.resolve("12/30"), PostDate::Parsed(ymd(2025, 12, 30)));
        assert_eq!(cursor.resolve("12/02"), PostDate::Parsed(ymd(2025, 12, 2)));
        assert_eq!(cursor.year(), 2025);
    }

    #[test]
    fn year_drops_once_per_increase() {
        let labels = [
            "10/3", "9/28", "3/1", "1/2", "12/30", "7/7", "7/1", "2/14", "11/11", "11/1",
        ];
        let mut cursor = Cursor::new(2025, 12);
        let mut prev_month = 12;
        let mut expected = 2025;

        for label in labels {
            let PostDate::Parsed(date) = cursor.resolve(label) else {
                panic!("{label} should parse");
            };
            if date.month() > prev_month {
                expected -= 1;
            }
            prev_month = date.month();
            assert_eq!(date.year(), expected, "{label}");
            assert!(date.year() <= 2025);
        }
        assert_eq!(cursor.year(), 2023);
    }

    #[test]
    fn malformed_labels_fall_back_to_today() {
        let today = ymd(2026, 10, 19);
        for label in ["abc", "13/45", "", "3분 전", "10/15/2024", "0/3", "4/0", "/5"] {
            let mut cursor = Cursor::new(2025, 12);
            assert_eq!(cursor.normalize(label, today), "2026-10-19", "{label:?}");
            assert_eq!(cursor, Cursor::new(2025, 12), "{label:?} moved the cursor");
        }
    }

    #[test]
    fn unparsed_keeps_raw_label() {
        let mut cursor = Cursor::new(2025, 12);
        assert_eq!(cursor.resolve("  방금 "), PostDate::Unparsed("방금".into()));
    }

    #[test]
    fn tolerates_padding_and_spaces() {
        let mut cursor = Cursor::new(2025, 12);
        assert_eq!(cursor.resolve(" 03 / 07 "), PostDate::Parsed(ymd(2025, 3, 7)));
    }

    #[test]
    fn impossible_day_is_unparsed() {
        let mut cursor = Cursor::new(2025, 3);
        assert!(matches!(cursor.resolve("2/30"), PostDate::Unparsed(_)));
        // 2025 has no leap day; rolling back into 2024 makes it valid.
        let mut cursor = Cursor::new(2025, 1);
        assert_eq!(cursor.resolve("2/29"), PostDate::Parsed(ymd(2024, 2, 29)));
    }

    #[test]
    fn seeded_from_today() {
        let cursor = Cursor::seeded(ymd(2026, 10, 19));
        assert_eq!(cursor, Cursor::new(2026, 12));
    }
}
