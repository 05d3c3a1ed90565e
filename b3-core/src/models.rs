mod aggregate;
mod failure;
mod trade;
mod window;

pub use aggregate::AggregatedData;
pub use failure::{DecodeError, ParseFailure};
pub use trade::{MAX_QUANTITY, PRICE_SCALE, TradeRecord, max_price};
pub use window::{AggregationWindow, BUSINESS_DAYS, WindowError, parse_date};
