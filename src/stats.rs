use core::fmt;
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::scrape::Post;

/// What to do with posts whose label never resolved to a date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unparsed {
    Skip,
    Today(NaiveDate),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MentionCount {
    pub date: NaiveDate,
    pub mentions: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Half {
    H1,
    H2,
}

impl Half {
    #[must_use]
    pub const fn of_month(month: u32) -> Self {
        if month <= 6 { Self::H1 } else { Self::H2 }
    }
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::H1 => "H1",
            Self::H2 => "H2",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodRow {
    pub year: i32,
    pub half: Half,
    pub mentions: u32,
}

impl PeriodRow {
    /// `"2024 H1"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.year, self.half)
    }
}

/// Mentions per distinct date, ascending by date.
pub fn count_by_date(posts: &[Post], unparsed: Unparsed) -> Vec<MentionCount> {
    let mut counts = BTreeMap::<NaiveDate, u32>::new();
    let mut skipped = 0usize;

    for post in posts {
        let date = match (post.date.parsed(), unparsed) {
            (Some(date), _) | (None, Unparsed::Today(date)) => date,
            (None, Unparsed::Skip) => {
                skipped += 1;
                continue;
            }
        };
        *counts.entry(date).or_default() += 1;
    }

    if skipped != 0 {
        tracing::warn!(target: "aggregate", "{skipped} posts with unparsed date labels were left out");
    }
    if counts.is_empty() {
        tracing::warn!(target: "aggregate", "no post carries a usable date");
        return Vec::new();
    }

    counts
        .into_iter()
        .map(|(date, mentions)| MentionCount { date, mentions })
        .collect()
}

/// Sums mentions per (year, half), ascending by year then half.
pub fn summarize(counts: &[MentionCount]) -> Vec<PeriodRow> {
    let mut periods = BTreeMap::<(i32, Half), u32>::new();
    for count in counts {
        let key = (count.date.year(), Half::of_month(count.date.month()));
        *periods.entry(key).or_default() += count.mentions;
    }

    periods
        .into_iter()
        .map(|((year, half), mentions)| PeriodRow {
            year,
            half,
            mentions,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::PostDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn post(date: PostDate) -> Post {
        Post {
            date,
            content: String::from("열람실 자리 있나요"),
        }
    }

    fn dated(y: i32, m: u32, d: u32) -> Post {
        post(PostDate::Parsed(ymd(y, m, d)))
    }

    #[test]
    fn counts_per_date_and_half() {
        let posts = [dated(2024, 3, 1), dated(2024, 3, 1), dated(2024, 9, 15)];

        let counts = count_by_date(&posts, Unparsed::Skip);
        assert_eq!(
            counts,
            [
                MentionCount { date: ymd(2024, 3, 1), mentions: 2 },
                MentionCount { date: ymd(2024, 9, 15), mentions: 1 },
            ]
        );

        let periods = summarize(&counts);
        assert_eq!(
            periods,
            [
                PeriodRow { year: 2024, half: Half::H1, mentions: 2 },
                PeriodRow { year: 2024, half: Half::H2, mentions: 1 },
            ]
        );
        assert_eq!(periods[0].label(), "2024 H1");
        assert_eq!(periods[1].label(), "2024 H2");
    }

    #[test]
    fn order_does_not_matter() {
        let mut posts = vec![
            dated(2023, 12, 24),
            dated(2024, 1, 2),
            dated(2023, 12, 24),
            dated(2022, 6, 30),
            dated(2024, 1, 2),
            dated(2024, 1, 2),
        ];
        let expected = count_by_date(&posts, Unparsed::Skip);

        posts.reverse();
        assert_eq!(count_by_date(&posts, Unparsed::Skip), expected);
        posts.rotate_left(2);
        assert_eq!(count_by_date(&posts, Unparsed::Skip), expected);
        posts.swap(0, 3);
        assert_eq!(count_by_date(&posts, Unparsed::Skip), expected);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(count_by_date(&[], Unparsed::Skip).is_empty());
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn only_unparsed_is_empty_when_skipping() {
        let posts = [post(PostDate::Unparsed("방금".into()))];
        assert!(count_by_date(&posts, Unparsed::Skip).is_empty());
    }

    #[test]
    fn unparsed_can_be_dated_today() {
        let today = ymd(2026, 10, 19);
        let posts = [
            post(PostDate::Unparsed("3분 전".into())),
            dated(2026, 10, 19),
            dated(2026, 10, 1),
        ];

        let counts = count_by_date(&posts, Unparsed::Today(today));
        assert_eq!(
            counts,
            [
                MentionCount { date: ymd(2026, 10, 1), mentions: 1 },
                MentionCount { date: today, mentions: 2 },
            ]
        );
    }

    #[test]
    fn period_sum_matches_parsed_posts() {
        let posts = [
            dated(2025, 7, 1),
            dated(2025, 6, 30),
            post(PostDate::Unparsed("abc".into())),
            dated(2024, 1, 1),
            dated(2024, 12, 31),
            dated(2025, 6, 30),
        ];
        let parsed = posts.iter().filter(|p| p.date.parsed().is_some()).count();

        let periods = summarize(&count_by_date(&posts, Unparsed::Skip));
        let total: u32 = periods.iter().map(|p| p.mentions).sum();
        assert_eq!(total as usize, parsed);
        assert_eq!(
            periods.iter().map(PeriodRow::label).collect::<Vec<_>>(),
            ["2024 H1", "2024 H2", "2025 H1", "2025 H2"]
        );
    }

    #[test]
    fn half_boundaries() {
        assert_eq!(Half::of_month(1), Half::H1);
        assert_eq!(Half::of_month(6), Half::H1);
        assert_eq!(Half::of_month(7), Half::H2);
        assert_eq!(Half::of_month(12), Half::H2);
    }
}
