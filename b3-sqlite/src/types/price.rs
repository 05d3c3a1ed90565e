//! Fixed-point storage of negotiated prices.
//!
//! SQLite has no exact decimal type, so a price is stored as an integer count
//! of 10<sup>-8</sup> units. Conversion fails rather than rounds: a price that
//! does not fit is an error, never a silently different value.

use rust_decimal::{Decimal, prelude::ToPrimitive as _};

pub use b3_core::models::PRICE_SCALE;

/// Why a price could not be stored.
#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    /// The price has more decimal places than [`PRICE_SCALE`]
    #[error("price {0} has more than {PRICE_SCALE} decimal places")]
    TooPrecise(Decimal),
    /// The scaled price does not fit a 64-bit integer
    #[error("price {0} is out of range")]
    OutOfRange(Decimal),
}

/// A price as a whole number of 10<sup>-8</sup> units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PriceUnits(pub i64);

impl TryFrom<Decimal> for PriceUnits {
    type Error = PriceError;

    fn try_from(price: Decimal) -> Result<Self, Self::Error> {
        let price = price.normalize();
        if price.scale() > PRICE_SCALE {
            return Err(PriceError::TooPrecise(price));
        }
        price
            .checked_mul(Decimal::from(10_i64.pow(PRICE_SCALE)))
            .and_then(|units| units.to_i64())
            .map(Self)
            .ok_or(PriceError::OutOfRange(price))
    }
}

impl From<PriceUnits> for Decimal {
    fn from(value: PriceUnits) -> Self {
        Decimal::new(value.0, PRICE_SCALE).normalize()
    }
}

impl sqlx::Type<sqlx::Sqlite> for PriceUnits {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for PriceUnits {
    fn encode_by_ref(
        &self,
        args: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        sqlx::Encode::<'q, sqlx::Sqlite>::encode_by_ref(&self.0, args)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for PriceUnits {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<i64 as sqlx::Decode<'r, sqlx::Sqlite>>::decode(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr as _;

    #[rstest]
    #[case("19.50", 1_950_000_000)]
    #[case("0", 0)]
    #[case("0.00000001", 1)]
    #[case("123456.78900000", 12_345_678_900_000)]
    fn scales_exactly(#[case] price: &str, #[case] units: i64) {
        let price = Decimal::from_str(price).unwrap();
        let stored = PriceUnits::try_from(price).unwrap();
        assert_eq!(stored, PriceUnits(units));
        assert_eq!(Decimal::from(stored), price);
    }

    #[test]
    fn rejects_extra_precision() {
        let price = Decimal::from_str("1.000000001").unwrap();
        assert!(matches!(
            PriceUnits::try_from(price),
            Err(PriceError::TooPrecise(_))
        ));
    }

    #[test]
    fn rejects_overflow() {
        let price = Decimal::from_str("100000000000000").unwrap();
        assert!(matches!(
            PriceUnits::try_from(price),
            Err(PriceError::OutOfRange(_))
        ));
    }
}
