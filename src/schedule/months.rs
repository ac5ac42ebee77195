// File: ./src/schedule/months.rs
// Month-name lookup and calendar date synthesis for duty cells.
use chrono::{Duration, Months, NaiveDate};
use std::collections::HashMap;

const RUSSIAN: [&str; 12] = [
    "январь",
    "февраль",
    "март",
    "апрель",
    "май",
    "июнь",
    "июль",
    "август",
    "сентябрь",
    "октябрь",
    "ноябрь",
    "декабрь",
];

const ENGLISH: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Maps localized month names to month numbers `1..=12`.
///
/// Keys are stored lowercase and lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTable {
    names: HashMap<String, u32>,
}

impl MonthTable {
    pub fn russian() -> Self {
        Self::from_ordered(&RUSSIAN)
    }

    pub fn english() -> Self {
        Self::from_ordered(&ENGLISH)
    }

    fn from_ordered(names: &[&str; 12]) -> Self {
        Self::from_pairs(names.iter().zip(1..=12).map(|(n, m)| (*n, m)))
    }

    /// Builds a table from arbitrary `(name, month)` pairs.
    /// Month numbers are taken as given; callers validate the range.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let names = pairs
            .into_iter()
            .map(|(name, month)| (name.as_ref().trim().to_lowercase(), month))
            .collect();
        Self { names }
    }

    /// Adds the entries of `other`, which win on conflicting names.
    pub fn merge(mut self, other: MonthTable) -> Self {
        self.names.extend(other.names);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<u32> {
        self.names.get(&name.trim().to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for MonthTable {
    fn default() -> Self {
        Self::russian().merge(Self::english())
    }
}

/// Builds the date `year-month-day`, rolling over out-of-range parts.
///
/// Day 0 is the last day of the previous month and month 0 is December
/// of the previous year, so a cell with no number still gets a date.
/// Returns `None` only when the result leaves chrono's supported range.
pub fn normalize_date(year: i32, month: u32, day: i32) -> Option<NaiveDate> {
    let january = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let first = if month == 0 {
        january.checked_sub_months(Months::new(1))?
    } else {
        january.checked_add_months(Months::new(month - 1))?
    };
    first.checked_add_signed(Duration::days(i64::from(day) - 1))
}

/// [`normalize_date`] rendered as `YYYY-MM-DD`, or empty when out of range.
pub fn format_duty_date(year: i32, month: u32, day: i32) -> String {
    normalize_date(year, month, day)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
