//! Streaming decoder for the exchange's trade files.
//!
//! A trade file is a sequence of `;`-delimited lines. Only a handful of the
//! columns are relevant here:
//!
//! | index | column               | treatment                           |
//! |-------|----------------------|-------------------------------------|
//! | 1     | instrument code      | trimmed, must not be empty          |
//! | 3     | negotiated price     | decimal comma, 0 to [`max_price`], at most 8 places |
//! | 4     | negotiated quantity  | integer, 0 to [`MAX_QUANTITY`]      |
//! | 5     | closing time         | kept verbatim                       |
//! | 8     | trade date           | `YYYY-MM-DD`                        |

use b3_core::models::{
    DecodeError, MAX_QUANTITY, PRICE_SCALE, ParseFailure, TradeRecord, max_price, parse_date,
};
use rust_decimal::Decimal;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    str::FromStr as _,
};

/// The field separator of a trade line.
pub const DELIMITER: char = ';';

/// The fewest fields a line may have and still describe a trade.
pub const MIN_FIELDS: usize = 9;

/// Column index of the instrument code.
pub const INSTRUMENT_CODE: usize = 1;
/// Column index of the negotiated price.
pub const NEGOTIATED_PRICE: usize = 3;
/// Column index of the negotiated quantity.
pub const NEGOTIATED_QUANTITY: usize = 4;
/// Column index of the closing time.
pub const CLOSING_TIME: usize = 5;
/// Column index of the trade date.
pub const TRADE_DATE: usize = 8;

// Files can be several hundred megabytes; a larger buffer cuts down on syscalls.
const READ_BUFFER: usize = 1 << 16;

/// Parse one line of a trade file.
///
/// Fields are validated in the order date, price, quantity, instrument code,
/// and the first one that fails decides the error.
pub fn parse_trade(line: &str) -> Result<TradeRecord, DecodeError> {
    let mut fields = [""; MIN_FIELDS];
    let mut found = 0;
    for (idx, field) in line.split(DELIMITER).enumerate() {
        if idx < MIN_FIELDS {
            fields[idx] = field;
        }
        found = idx + 1;
    }

    if found < MIN_FIELDS {
        return Err(DecodeError::InsufficientColumns {
            expected: MIN_FIELDS,
            found,
        });
    }

    let date = fields[TRADE_DATE].trim();
    let trade_date = parse_date(date).map_err(|source| DecodeError::InvalidDate {
        value: date.to_owned(),
        source,
    })?;

    let price = fields[NEGOTIATED_PRICE];
    let negotiated_price = Decimal::from_str(&price.trim().replacen(',', ".", 1)).map_err(
        |source| DecodeError::InvalidPrice {
            value: price.to_owned(),
            source,
        },
    )?;

    if (negotiated_price.is_sign_negative() && !negotiated_price.is_zero())
        || negotiated_price > max_price()
    {
        return Err(DecodeError::PriceOutOfRange {
            value: price.to_owned(),
            max: max_price(),
        });
    }
    if negotiated_price.normalize().scale() > PRICE_SCALE {
        return Err(DecodeError::PriceTooPrecise {
            value: price.to_owned(),
            scale: PRICE_SCALE,
        });
    }

    let quantity = fields[NEGOTIATED_QUANTITY];
    let negotiated_quantity =
        quantity
            .trim()
            .parse::<u64>()
            .map_err(|source| DecodeError::InvalidQuantity {
                value: quantity.to_owned(),
                source,
            })?;

    if negotiated_quantity > MAX_QUANTITY {
        return Err(DecodeError::QuantityOutOfRange {
            value: quantity.to_owned(),
            max: MAX_QUANTITY,
        });
    }

    let instrument_code = fields[INSTRUMENT_CODE].trim();
    if instrument_code.is_empty() {
        return Err(DecodeError::EmptyInstrumentCode);
    }

    Ok(TradeRecord {
        trade_date,
        instrument_code: instrument_code.to_owned(),
        negotiated_price,
        negotiated_quantity,
        closing_time: fields[CLOSING_TIME].to_owned(),
    })
}

/// A lazy, line-by-line decoder over any buffered reader.
///
/// Every line (other than the header) yields exactly one item: the decoded
/// record, or a [`ParseFailure`] describing why the line was skipped. Only
/// one line is held in memory at a time.
///
/// An I/O error while reading is yielded once as the outer `Err`, after which
/// the iterator is exhausted.
pub struct TradeDecoder<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: u64,
    skip_header: bool,
    done: bool,
}

impl TradeDecoder<BufReader<File>> {
    /// Open a trade file for decoding.
    ///
    /// Failing to open the file is reported here rather than as an item of the
    /// iterator.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(READ_BUFFER, file)))
    }
}

impl<R: BufRead> TradeDecoder<R> {
    /// Decode lines from `reader`, treating the first line as a header.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
            skip_header: true,
            done: false,
        }
    }

    /// Whether the first line is a header to be skipped.
    pub fn skip_header(mut self, skip: bool) -> Self {
        self.skip_header = skip;
        self
    }

    /// The 1-based number of the last line read, counting the header.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Read the next line into the buffer, without its terminator.
    fn read_line(&mut self) -> io::Result<bool> {
        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(false);
        }
        self.line_number += 1;
        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }
        Ok(true)
    }

    fn decode_line(&self) -> Result<TradeRecord, ParseFailure> {
        match std::str::from_utf8(&self.buffer) {
            Ok(line) => parse_trade(line).map_err(|cause| ParseFailure {
                line_number: self.line_number,
                raw_line: line.to_owned(),
                cause,
            }),
            Err(_) => Err(ParseFailure {
                line_number: self.line_number,
                raw_line: String::from_utf8_lossy(&self.buffer).into_owned(),
                cause: DecodeError::InvalidEncoding,
            }),
        }
    }
}

impl<R: BufRead> Iterator for TradeDecoder<R> {
    type Item = io::Result<Result<TradeRecord, ParseFailure>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.read_line() {
                Ok(true) => {}
                Ok(false) => self.done = true,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }

            if self.done || (self.skip_header && self.line_number == 1) {
                continue;
            }

            return Some(Ok(self.decode_line()));
        }
        None
    }
}

impl<R: BufRead> std::iter::FusedIterator for TradeDecoder<R> {}
