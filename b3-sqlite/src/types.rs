//! Storage representations of domain values.

mod price;
pub use price::{PRICE_SCALE, PriceError, PriceUnits};
