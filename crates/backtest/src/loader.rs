// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2026 Ferrum Trading Systems. All rights reserved.
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! CSV bar loader (§6): columns `{symbol, exchange, open, high, low, close, datetime, ktype}`.
//!
//! Rows carry the bar's *start* datetime; `ktype` is the interval tag (`1m`, `1d`, ...). The
//! loader parses rows and sorts them by `(end_timestamp, interval)` via
//! [`sort_by_end_timestamp`], where `end_timestamp = next_start - 1s` within a
//! `(symbol, exchange, interval)` series; the engine re-derives the same ordering once it has
//! merged bars from every loaded contract into one replay sequence.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use ferrum_core::UnixNanos;
use ferrum_model::{Bar, Exchange, Interval, Symbol};
use rust_decimal::Decimal;
use ustr::Ustr;

use crate::error::BacktestError;

/// One second expressed in nanoseconds, the unit `end_date = next_start - 1s` is computed in.
const SECOND_NANOS: u64 = 1_000_000_000;

/// Sorts `bars` by `(end_timestamp, interval)` rather than by their own start `datetime` (§4.F).
///
/// A bar's `end_timestamp` is the next bar in its own `(symbol, exchange, interval)` series'
/// start minus one second; the last bar of a series has no successor and falls back to its own
/// start. Sorting on the end timestamp (instead of the start timestamp every `Bar` actually
/// stores) is what keeps a coarser-interval bar from reaching the bus before its own constituent
/// finer-interval bars have elapsed — sorting on start alone would let e.g. a daily bar publish
/// before some of that same day's own 1m bars.
pub fn sort_by_end_timestamp(bars: &mut [Bar]) {
    let mut series: HashMap<(Symbol, Exchange, Interval), Vec<usize>> = HashMap::new();
    for (index, bar) in bars.iter().enumerate() {
        series.entry((bar.symbol, bar.exchange, bar.interval)).or_default().push(index);
    }

    let mut end_timestamps = vec![UnixNanos::EPOCH; bars.len()];
    for indices in series.values_mut() {
        indices.sort_by_key(|&index| bars[index].datetime);
        for window in 0..indices.len() {
            let index = indices[window];
            end_timestamps[index] = match indices.get(window + 1) {
                Some(&next_index) => UnixNanos::new(bars[next_index].datetime.as_u64().saturating_sub(SECOND_NANOS)),
                None => bars[index].datetime,
            };
        }
    }

    let mut order: Vec<usize> = (0..bars.len()).collect();
    order.sort_by_key(|&index| (end_timestamps[index], bars[index].interval));
    let mut sorted = Vec::with_capacity(bars.len());
    for index in order {
        sorted.push(bars[index]);
    }
    bars.copy_from_slice(&sorted);
}

#[derive(Debug, serde::Deserialize)]
struct BarRow {
    symbol: String,
    exchange: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: Option<String>,
    datetime: String,
    ktype: String,
}

/// Parses a single datetime column value, accepting either RFC3339 or a bare `%Y-%m-%d %H:%M:%S`.
fn parse_datetime(raw: &str) -> Option<UnixNanos> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(UnixNanos::from_datetime(dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(UnixNanos::from_datetime(naive.and_utc()));
    }
    None
}

fn parse_decimal(row: usize, field: &'static str, raw: &str) -> Result<Decimal, BacktestError> {
    Decimal::from_str(raw).map_err(|_| BacktestError::InvalidField {
        row,
        field,
        value: raw.to_string(),
    })
}

/// Loads a CSV bar file into a flat, datetime-sorted `Vec<Bar>`.
///
/// `gateway_name` is stamped onto every row (the file itself carries no gateway identity — it is
/// sourced data, not a live gateway's own emission).
///
/// # Errors
///
/// Returns [`BacktestError::Csv`] on a malformed row and [`BacktestError::InvalidField`] on a
/// value that parses as CSV but not as the expected type (decimal price/volume, known exchange,
/// known interval tag, or datetime).
pub fn load_bars(path: impl AsRef<Path>, gateway_name: impl Into<Ustr>) -> Result<Vec<Bar>, BacktestError> {
    let gateway_name = gateway_name.into();
    let mut reader = csv::Reader::from_path(path.as_ref()).map_err(|source| BacktestError::Csv {
        row: 0,
        symbol: path.as_ref().display().to_string(),
        source,
    })?;

    let mut bars = Vec::new();

    for (row_index, record) in reader.deserialize::<BarRow>().enumerate() {
        let row: BarRow = record.map_err(|source| BacktestError::Csv {
            row: row_index,
            symbol: String::new(),
            source,
        })?;

        let exchange = Exchange::from_str(&row.exchange).map_err(|_| BacktestError::InvalidField {
            row: row_index,
            field: "exchange",
            value: row.exchange.clone(),
        })?;
        let interval = Interval::from_str(&row.ktype).map_err(|_| BacktestError::InvalidField {
            row: row_index,
            field: "ktype",
            value: row.ktype.clone(),
        })?;
        let datetime = parse_datetime(&row.datetime).ok_or_else(|| BacktestError::InvalidField {
            row: row_index,
            field: "datetime",
            value: row.datetime.clone(),
        })?;

        let open = parse_decimal(row_index, "open", &row.open)?;
        let high = parse_decimal(row_index, "high", &row.high)?;
        let low = parse_decimal(row_index, "low", &row.low)?;
        let close = parse_decimal(row_index, "close", &row.close)?;
        let volume = match row.volume.as_deref() {
            Some(raw) if !raw.is_empty() => parse_decimal(row_index, "volume", raw)?,
            _ => Decimal::ZERO,
        };

        bars.push(Bar {
            gateway_name,
            symbol: Symbol::new(&row.symbol),
            exchange,
            datetime,
            interval,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    sort_by_end_timestamp(&mut bars);

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(file, "{contents}").expect("write");
        file
    }

    #[test]
    fn parses_well_formed_rows_sorted_by_datetime() {
        let file = write_csv(
            "symbol,exchange,open,high,low,close,volume,datetime,ktype\n\
             rb2410,SHFE,3500,3520,3490,3510,1000,2024-01-02 09:00:00,1m\n\
             rb2410,SHFE,3490,3500,3480,3495,800,2024-01-01 09:00:00,1m\n",
        );

        let bars = load_bars(file.path(), "BACKTEST").expect("loads");

        assert_eq!(bars.len(), 2);
        assert!(bars[0].datetime < bars[1].datetime);
        assert_eq!(bars[0].symbol.as_str(), "rb2410");
        assert_eq!(bars[0].exchange, Exchange::Shfe);
        assert_eq!(bars[0].interval, Interval::Minute1);
    }

    #[test]
    fn missing_volume_column_defaults_to_zero() {
        let file = write_csv(
            "symbol,exchange,open,high,low,close,datetime,ktype\n\
             rb2410,SHFE,3500,3520,3490,3510,2024-01-02 09:00:00,1m\n",
        );

        let bars = load_bars(file.path(), "BACKTEST").expect("loads");
        assert_eq!(bars[0].volume, Decimal::ZERO);
    }

    #[test]
    fn unknown_interval_tag_is_invalid_field() {
        let file = write_csv(
            "symbol,exchange,open,high,low,close,datetime,ktype\n\
             rb2410,SHFE,3500,3520,3490,3510,2024-01-02 09:00:00,7m\n",
        );

        let err = load_bars(file.path(), "BACKTEST").unwrap_err();
        assert!(matches!(err, BacktestError::InvalidField { field: "ktype", .. }));
    }

    #[test]
    fn malformed_price_is_invalid_field() {
        let file = write_csv(
            "symbol,exchange,open,high,low,close,datetime,ktype\n\
             rb2410,SHFE,not-a-number,3520,3490,3510,2024-01-02 09:00:00,1m\n",
        );

        let err = load_bars(file.path(), "BACKTEST").unwrap_err();
        assert!(matches!(err, BacktestError::InvalidField { field: "open", .. }));
    }
}
