use rust_decimal::Decimal;
use time::Date;

/// A single negotiated trade, as read from one line of the exchange feed.
///
/// Records are immutable once decoded and have no identity beyond their field
/// values. They move by value from the decoder, through a worker's batch, into
/// the repository; nothing holds on to them afterward.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TradeRecord {
    /// The calendar date the trade took place on
    pub trade_date: Date,

    /// The instrument ticker, e.g. `PETR4`
    pub instrument_code: String,

    /// The unit price of the trade
    pub negotiated_price: Decimal,

    /// The number of units traded
    pub negotiated_quantity: u64,

    /// The closing time in the feed's `HHMMSSmmm` format, stored verbatim
    pub closing_time: String,
}

/// The number of decimal places a price may carry.
pub const PRICE_SCALE: u32 = 8;

/// The largest quantity a single trade may carry.
pub const MAX_QUANTITY: u64 = i64::MAX as u64;

/// The largest price a single trade may carry.
///
/// Prices are kept as a count of 10<sup>-[`PRICE_SCALE`]</sup> units in a
/// signed 64-bit integer, which puts the ceiling at `i64::MAX` such units.
pub fn max_price() -> Decimal {
    Decimal::new(i64::MAX, PRICE_SCALE)
}
