use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::types::Streaks;

/// Parse a session `date`: `YYYY-MM-DD`, or the legacy `Mon Jan 01 2024` form.
pub fn parse_session_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%a %b %d %Y"))
        .ok()
}

/// Consecutive-day streaks over the distinct dates in `dates`.
///
/// `current` is the run ending at the latest date with activity, not at
/// today. Unparseable dates are ignored.
pub fn calculate_streaks<'a, I>(dates: I) -> Streaks
where
    I: IntoIterator<Item = &'a str>,
{
    let days: BTreeSet<NaiveDate> = dates.into_iter().filter_map(parse_session_date).collect();

    let mut current = 0u32;
    let mut max = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for day in days {
        current = match prev {
            Some(p) if p.succ_opt() == Some(day) => current + 1,
            _ => 1,
        };
        max = max.max(current);
        prev = Some(day);
    }

    Streaks { current, max }
}
