use std::num::ParseIntError;
use thiserror::Error;

/// The reason a line of the feed could not be turned into a [`TradeRecord`](super::TradeRecord).
///
/// Only the first failing field of a line is reported.
#[derive(Clone, Debug, Error)]
pub enum DecodeError {
    /// The line has fewer delimited fields than a trade requires
    #[error("invalid line, expected at least {expected} columns, found {found}")]
    InsufficientColumns {
        /// The number of fields a trade requires
        expected: usize,
        /// The number of fields present on the line
        found: usize,
    },

    /// The line is not valid UTF-8
    #[error("line is not valid UTF-8")]
    InvalidEncoding,

    /// The instrument code field is blank
    #[error("empty instrument code")]
    EmptyInstrumentCode,

    /// The trade date is not a `YYYY-MM-DD` date
    #[error("failed to parse trade date '{value}': {source}")]
    InvalidDate {
        /// The raw field
        value: String,
        /// The underlying parser error
        #[source]
        source: time::error::Parse,
    },

    /// The price is not a decimal number
    #[error("failed to parse negotiated price '{value}': {source}")]
    InvalidPrice {
        /// The raw field
        value: String,
        /// The underlying parser error
        #[source]
        source: rust_decimal::Error,
    },

    /// The price is negative or too large to store
    #[error("negotiated price '{value}' is out of range, expected 0 to {max}")]
    PriceOutOfRange {
        /// The raw field
        value: String,
        /// The largest accepted price
        max: rust_decimal::Decimal,
    },

    /// The price has more decimal places than can be stored exactly
    #[error("negotiated price '{value}' has more than {scale} decimal places")]
    PriceTooPrecise {
        /// The raw field
        value: String,
        /// The number of decimal places accepted
        scale: u32,
    },

    /// The quantity is not a non-negative integer
    #[error("failed to parse negotiated quantity '{value}': {source}")]
    InvalidQuantity {
        /// The raw field
        value: String,
        /// The underlying parser error
        #[source]
        source: ParseIntError,
    },

    /// The quantity is too large to store
    #[error("negotiated quantity '{value}' exceeds {max}")]
    QuantityOutOfRange {
        /// The raw field
        value: String,
        /// The largest accepted quantity
        max: u64,
    },
}

/// A line of the feed that was skipped, together with why.
///
/// Failures are written once to a [`MalformedRecordSink`](crate::ports::MalformedRecordSink)
/// and never retried.
#[derive(Clone, Debug)]
pub struct ParseFailure {
    /// The 1-based line number within the source file
    pub line_number: u64,

    /// The offending line, without its line terminator
    pub raw_line: String,

    /// Why the line was rejected
    pub cause: DecodeError,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: {} | {}",
            self.line_number, self.cause, self.raw_line
        )
    }
}
