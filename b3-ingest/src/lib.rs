#![warn(missing_docs)]
// Note: this overwrites the link in the README to point to the rust docs of the b3-ingest crate.
//! [b3_ingest]: https://docs.rs/b3_ingest/latest/b3_ingest/index.html
#![doc = include_str!("../README.md")]

mod accumulator;
pub use accumulator::BatchAccumulator;

pub mod config;

mod decoder;
pub use decoder::{
    CLOSING_TIME, DELIMITER, INSTRUMENT_CODE, MIN_FIELDS, NEGOTIATED_PRICE, NEGOTIATED_QUANTITY,
    TRADE_DATE, TradeDecoder, parse_trade,
};

mod error;
pub use error::IngestError;

mod orchestrator;
pub use orchestrator::{IngestReport, Ingestor};

mod progress;
pub use progress::{Progress, ProgressSnapshot};

mod sink;
pub use sink::{FileSink, MemorySink, TracingSink};
