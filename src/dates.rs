use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::PrepError;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?$").expect("date pattern compiles")
});

const YEAR_ONLY_SUFFIX: &str = "-XX-XX";
const AMBIGUOUS_PART: &str = "-XX";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// A collection date parsed from `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
///
/// Partial dates resolve to the first day of the missing unit, so `2015`
/// is January 1st and `2015-06` is June 1st.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionDate {
    date: NaiveDate,
    precision: DatePrecision,
}

impl CollectionDate {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn precision(&self) -> DatePrecision {
        self.precision
    }

    /// Fractional position of the date within its calendar year.
    ///
    /// Elapsed and total seconds are measured between real year boundaries,
    /// so leap years divide by 366 days.
    pub fn decimal_year(&self) -> f64 {
        let year = self.date.year();
        let start = year_start(year);
        let next = year_start(year + 1);
        let elapsed = (self.date - start).num_seconds() as f64;
        let duration = (next - start).num_seconds() as f64;
        year as f64 + elapsed / duration
    }
}

fn year_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl FromStr for CollectionDate {
    type Err = PrepError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || PrepError::InvalidDate(value.to_string());
        let caps = DATE_RE.captures(value).ok_or_else(invalid)?;
        let year: i32 = caps[1].parse().map_err(|_| invalid())?;
        let month = caps.get(2).map(|m| m.as_str().parse::<u32>());
        let day = caps.get(3).map(|d| d.as_str().parse::<u32>());

        let (month, day, precision) = match (month, day) {
            (None, _) => (1, 1, DatePrecision::Year),
            (Some(month), None) => (month.map_err(|_| invalid())?, 1, DatePrecision::Month),
            (Some(month), Some(day)) => (
                month.map_err(|_| invalid())?,
                day.map_err(|_| invalid())?,
                DatePrecision::Day,
            ),
        };
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        Ok(Self { date, precision })
    }
}

/// Converts a date string to a decimal year. `-XX` markers must already be
/// stripped (see [`strip_ambiguous`]).
pub fn decimal_date(value: &str) -> Result<f64, PrepError> {
    Ok(value.parse::<CollectionDate>()?.decimal_year())
}

/// Removes every `-XX` placeholder: `2015-XX-XX` becomes `2015`,
/// `2015-06-XX` becomes `2015-06`.
pub fn strip_ambiguous(value: &str) -> String {
    value.replace(AMBIGUOUS_PART, "")
}

pub fn is_year_only(raw_date: &str) -> bool {
    raw_date.ends_with(YEAR_ONLY_SUFFIX)
}

/// Leading `YYYY` component of a raw date.
pub fn year_component(raw_date: &str) -> &str {
    raw_date.split('-').next().unwrap_or(raw_date)
}

/// Shortest round-trip text for a decimal year; integral values keep a
/// trailing `.0` so that `2015-XX-XX` encodes as `2015.0`.
pub fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}
