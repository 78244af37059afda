//! Calendar helpers: date parsing and report periods.
//!
//! Dates come from `<input type=date>` (`YYYY-MM-DD`) or are typed by hand
//! (`DD/MM/YYYY`). Periods are inclusive day ranges, by default the current
//! Monday-to-Sunday week.

use chrono::{Datelike, Days, NaiveDate, Weekday};

const ISO_FORMAT: &str = "%Y-%m-%d";
const BR_FORMAT: &str = "%d/%m/%Y";

/// Parses `YYYY-MM-DD` or `DD/MM/YYYY`.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, ISO_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, BR_FORMAT))
        .ok()
}

/// The parsed date, or `today` when the input is missing or invalid.
#[must_use]
pub fn coerce_date(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    raw.and_then(parse_date).unwrap_or(today)
}

/// `DD/MM/YYYY`
#[must_use]
pub fn format_br(date: NaiveDate) -> String {
    date.format(BR_FORMAT).to_string()
}

/// `YYYY-MM-DD`, the value format of date inputs
#[must_use]
pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// `DD/MM`, used as column header in day pivots
#[must_use]
pub fn format_day_label(date: NaiveDate) -> String {
    date.format("%d/%m").to_string()
}

/// Portuguese weekday name
#[must_use]
pub fn weekday_pt(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Segunda-feira",
        Weekday::Tue => "Terça-feira",
        Weekday::Wed => "Quarta-feira",
        Weekday::Thu => "Quinta-feira",
        Weekday::Fri => "Sexta-feira",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day
    pub start: NaiveDate,
    /// Last day, included
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, swapping the bounds when they are reversed.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// Monday through Sunday of the week containing `today`.
    #[must_use]
    pub fn current_week(today: NaiveDate) -> Self {
        let start = today.week(Weekday::Mon).first_day();
        let end = start + Days::new(6);
        Self { start, end }
    }

    /// Range from optional query-string bounds.
    ///
    /// Each bound defaults to its side of the current week when absent or invalid.
    #[must_use]
    pub fn from_query(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Self {
        let week = Self::current_week(today);
        let start = start.and_then(parse_date).unwrap_or(week.start);
        let end = end.and_then(parse_date).unwrap_or(week.end);
        Self::new(start, end)
    }

    /// Limits the range to at most `max_days` days after the start.
    #[must_use]
    pub fn clamp_days(self, max_days: u64) -> Self {
        let end = match self.start.checked_add_days(Days::new(max_days)) {
            Some(limit) => self.end.min(limit),
            None => self.end,
        };
        Self {
            start: self.start,
            end,
        }
    }

    /// Whether `date` falls inside the range
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the range, both ends included.
    #[must_use]
    pub fn day_count(&self) -> usize {
        usize::try_from((self.end - self.start).num_days()).map_or(0, |days| days + 1)
    }

    /// Position of `date` inside the range, used as pivot column index.
    #[must_use]
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if self.contains(date) {
            usize::try_from((date - self.start).num_days()).ok()
        } else {
            None
        }
    }

    /// Every day of the range in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// `DD/MM` labels for every day of the range.
    #[must_use]
    pub fn day_labels(&self) -> Vec<String> {
        self.days().map(format_day_label).collect()
    }
}
