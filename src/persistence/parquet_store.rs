// src/persistence/parquet_store.rs
//
// Per-(symbol,timeframe) OHLCV columnar storage via `polars`, gzip-
// compressed. Serialized overwrite, no readers-during-writer contract.

use std::fs::File;
use std::path::Path;

use chrono::{TimeZone, Utc};
use polars::prelude::*;

use crate::domain::Candle;
use crate::utils::errors::ScanError;

pub fn write_candles(path: &Path, candles: &[Candle]) -> Result<(), ScanError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let ts: Vec<i64> = candles.iter().map(|c| c.ts.timestamp_millis()).collect();
    let open: Vec<f64> = candles.iter().map(|c| c.open).collect();
    let high: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let low: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let close: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volume: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    let mut df = df![
        "ts" => ts,
        "open" => open,
        "high" => high,
        "low" => low,
        "close" => close,
        "volume" => volume,
    ]
    .map_err(|e| ScanError::Other(format!("building OHLCV frame: {e}")))?;

    let file = File::create(path)?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Gzip(None))
        .finish(&mut df)
        .map_err(|e| ScanError::Other(format!("writing parquet: {e}")))?;

    Ok(())
}

pub fn read_candles(path: &Path) -> Result<Vec<Candle>, ScanError> {
    let file = File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| ScanError::Other(format!("reading parquet: {e}")))?;

    let ts = df.column("ts").and_then(|s| s.i64()).map_err(|e| ScanError::Other(e.to_string()))?;
    let open = df.column("open").and_then(|s| s.f64()).map_err(|e| ScanError::Other(e.to_string()))?;
    let high = df.column("high").and_then(|s| s.f64()).map_err(|e| ScanError::Other(e.to_string()))?;
    let low = df.column("low").and_then(|s| s.f64()).map_err(|e| ScanError::Other(e.to_string()))?;
    let close = df.column("close").and_then(|s| s.f64()).map_err(|e| ScanError::Other(e.to_string()))?;
    let volume = df.column("volume").and_then(|s| s.f64()).map_err(|e| ScanError::Other(e.to_string()))?;

    let mut candles = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let ts_ms = ts.get(i).unwrap_or(0);
        let Some(ts) = Utc.timestamp_millis_opt(ts_ms).single() else {
            continue;
        };
        candles.push(Candle {
            ts,
            open: open.get(i).unwrap_or(0.0),
            high: high.get(i).unwrap_or(0.0),
            low: low.get(i).unwrap_or(0.0),
            close: close.get(i).unwrap_or(0.0),
            volume: volume.get(i).unwrap_or(0.0),
        });
    }
    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn round_trips_candles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.parquet");
        let start = Utc::now();
        let candles: Vec<Candle> = (0..10)
            .map(|i| Candle {
                ts: start + Duration::hours(i),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 10.0,
            })
            .collect();

        write_candles(&path, &candles).unwrap();
        let read_back = read_candles(&path).unwrap();
        assert_eq!(read_back.len(), candles.len());
        assert!((read_back[0].close - 100.5).abs() < 1e-9);
    }
}
