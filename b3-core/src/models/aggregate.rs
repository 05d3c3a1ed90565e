use rust_decimal::Decimal;

/// Statistics for one instrument over an aggregation window.
///
/// This is recomputed from storage on every query; nothing is cached.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatedData {
    /// The instrument the statistics were computed for
    #[cfg_attr(feature = "serde", serde(rename = "ticker"))]
    pub instrument_code: String,

    /// The highest unit price negotiated within the window
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub max_range_value: Decimal,

    /// The largest total quantity traded on any single day of the window
    pub max_daily_volume: u64,
}
