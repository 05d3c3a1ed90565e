use thiserror::Error;
use time::{Date, Weekday, format_description::BorrowedFormatItem, macros::format_description};

/// The number of business days a query covers when no start date is given.
pub const BUSINESS_DAYS: u32 = 7;

/// The `YYYY-MM-DD` layout used by the feed and by the query endpoint.
pub(crate) const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value, DATE_FORMAT)
}

/// Errors raised while resolving a query window.
#[derive(Debug, Error)]
pub enum WindowError {
    /// The requested start date is not a `YYYY-MM-DD` date
    #[error("invalid start date '{value}', use YYYY-MM-DD")]
    InvalidStartDate {
        /// The raw value
        value: String,
        /// The underlying parser error
        #[source]
        source: time::error::Parse,
    },
}

/// The date range an aggregation query covers.
///
/// `start` is inclusive and `end` exclusive. A window without an `end` is
/// open: every trade on or after `start` is considered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregationWindow {
    /// The first day (inclusive) of the window
    pub start: Date,
    /// The first day (exclusive) past the window, if bounded
    pub end: Option<Date>,
}

impl AggregationWindow {
    /// An open window starting on `start`.
    pub fn starting(start: Date) -> Self {
        Self { start, end: None }
    }

    /// Whether `day` falls inside the window.
    pub fn contains(&self, day: Date) -> bool {
        day >= self.start && self.end.is_none_or(|end| day < end)
    }

    /// A window spanning the last `days` business days before `today`.
    ///
    /// The day before `today` is the last day of the window, so trades of
    /// `today` are left out. Saturdays and
    /// Sundays are skipped; exchange holidays are not known here and count as
    /// business days.
    pub fn trailing_business_days(today: Date, days: u32) -> Self {
        let mut start = today;
        let mut counted = 0;
        let mut day = today;
        while counted < days {
            let Some(prev) = day.previous_day() else {
                break;
            };
            day = prev;
            if !matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday) {
                counted += 1;
                start = day;
            }
        }
        Self {
            start,
            end: Some(today),
        }
    }

    /// Resolve an optional, user-supplied start date.
    ///
    /// An empty or missing value falls back to the trailing
    /// [`BUSINESS_DAYS`] business days before `today`.
    pub fn resolve(start: Option<&str>, today: Date) -> Result<Self, WindowError> {
        match start.map(str::trim).filter(|s| !s.is_empty()) {
            Some(value) => parse_date(value)
                .map(Self::starting)
                .map_err(|source| WindowError::InvalidStartDate {
                    value: value.to_owned(),
                    source,
                }),
            None => Ok(Self::trailing_business_days(today, BUSINESS_DAYS)),
        }
    }
}
