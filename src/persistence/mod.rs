// src/persistence/mod.rs
//
// The data-persistence layer backing the continuous scanner:
// append-only daily JSON signal/cluster files (write-temp-then-rename
// for atomicity) and per-(symbol,timeframe) OHLCV parquet files via
// `polars`, the way `LenWilliamson-chapaty` persists its own OHLCV
// frames with the `parquet` feature. A range reader assembles training
// datasets by walking day-files and parquet files together.

pub mod parquet_store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{Signal, Symbol, Timeframe, Zone};
use crate::utils::errors::ScanError;

pub struct PersistenceStore {
    root: PathBuf,
}

impl PersistenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn signals_dir(&self) -> PathBuf {
        self.root.join("signals")
    }

    fn clustering_dir(&self) -> PathBuf {
        self.root.join("clustering")
    }

    fn ohlcv_dir(&self) -> PathBuf {
        self.root.join("ohlcv")
    }

    fn day_file(dir: &Path, exchange: &str, symbol: &Symbol, date: NaiveDate) -> PathBuf {
        dir.join(format!("{exchange}_{}_{}.json", symbol.pair.replace('/', ""), date.format("%Y-%m-%d")))
    }

    pub async fn append_signal(&self, exchange: &str, signal: &Signal) -> Result<(), ScanError> {
        let date = signal.timestamp.date_naive();
        let path = Self::day_file(&self.signals_dir(), exchange, &signal.symbol, date);
        append_json_record(&path, signal).await
    }

    pub async fn append_cluster(&self, exchange: &str, zone: &Zone) -> Result<(), ScanError> {
        let date = zone.ts.date_naive();
        let path = Self::day_file(&self.clustering_dir(), exchange, &zone.symbol, date);
        append_json_record(&path, zone).await
    }

    pub async fn write_ohlcv(
        &self,
        exchange: &str,
        symbol: &Symbol,
        timeframe: Timeframe,
        candles: &[crate::domain::Candle],
    ) -> Result<(), ScanError> {
        let dir = self.ohlcv_dir();
        fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{exchange}_{}_{}.parquet", symbol.pair.replace('/', ""), timeframe.as_str()));
        let recent: Vec<crate::domain::Candle> = candles.iter().rev().take(500).rev().cloned().collect();
        parquet_store::write_candles(&path, &recent)?;
        Ok(())
    }

    pub async fn read_ohlcv(
        &self,
        exchange: &str,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Result<Vec<crate::domain::Candle>, ScanError> {
        let path = self
            .ohlcv_dir()
            .join(format!("{exchange}_{}_{}.parquet", symbol.pair.replace('/', ""), timeframe.as_str()));
        if !path.exists() {
            return Ok(Vec::new());
        }
        parquet_store::read_candles(&path)
    }

    /// Walks `[today - days, today]`, assembling signals, clustering,
    /// and each configured timeframe's OHLCV into a training dataset.
    pub async fn assemble_training_data(
        &self,
        exchange: &str,
        symbol: &Symbol,
        days: i64,
        timeframes: &[Timeframe],
    ) -> Result<TrainingDataset, ScanError> {
        let today = Utc::now().date_naive();
        let mut signals = Vec::new();
        let mut clustering = Vec::new();

        for offset in 0..=days {
            let date = today - Duration::days(offset);
            let signal_path = Self::day_file(&self.signals_dir(), exchange, symbol, date);
            signals.extend(read_json_array::<Signal>(&signal_path).await?);

            let cluster_path = Self::day_file(&self.clustering_dir(), exchange, symbol, date);
            clustering.extend(read_json_array::<Zone>(&cluster_path).await?);
        }

        let mut ohlcv = HashMap::new();
        for tf in timeframes {
            let candles = self.read_ohlcv(exchange, symbol, *tf).await?;
            ohlcv.insert(tf.as_str().to_string(), candles);
        }

        Ok(TrainingDataset { signals, clustering, ohlcv })
    }
}

#[derive(Debug, Serialize)]
pub struct TrainingDataset {
    pub signals: Vec<Signal>,
    pub clustering: Vec<Zone>,
    pub ohlcv: HashMap<String, Vec<crate::domain::Candle>>,
}

async fn read_json_array<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> Result<Vec<T>, ScanError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).await?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&raw)?)
}

/// Read-append-rewrite: load the existing array (empty if absent),
/// append the record, and write atomically via a temp file + rename.
async fn append_json_record<T: Serialize>(path: &Path, record: &T) -> Result<(), ScanError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }

    let mut array: Vec<Value> = if path.exists() {
        let raw = fs::read_to_string(path).await?;
        if raw.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&raw)?
        }
    } else {
        Vec::new()
    };
    array.push(serde_json::to_value(record)?);

    let rendered = serde_json::to_string_pretty(&array)?;
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(rendered.as_bytes()).await?;
        file.flush().await?;
    }
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Regime, SignalLabel, SignalState, SlTpAdvisory};
    use chrono::Utc;

    fn dummy_signal(symbol: Symbol) -> Signal {
        Signal {
            id: uuid::Uuid::new_v4(),
            symbol,
            timeframe: Timeframe::H1,
            price: 100.0,
            signal_label: SignalLabel::Buy,
            signal_state: SignalState::Neutral,
            signal_strength: 60.0,
            composite_score: 50.0,
            volume_composite_score: 50.0,
            opportunity_score: 50.0,
            combined_score: 50.0,
            confidence_score: 50.0,
            sl_tp_advisory: SlTpAdvisory {
                stop_loss: 97.0,
                take_profit: 103.0,
                risk_amount: 3.0,
                reward_amount: 3.0,
                risk_reward_ratio: 1.0,
                stop_loss_pct: 0.03,
                take_profit_pct: 0.03,
                support_level: None,
                resistance_level: None,
            },
            regime: Regime::Bull,
            features: crate::indicators::compute_features(&crate::domain::CandleSeries {
                symbol: Symbol::new("mock", "BTC/USDT"),
                timeframe: Timeframe::H1,
                candles: synthetic_candles(),
            })
            .unwrap(),
            timestamp: Utc::now(),
        }
    }

    fn synthetic_candles() -> Vec<crate::domain::Candle> {
        use chrono::Duration as CDuration;
        let start = Utc::now() - CDuration::hours(250);
        (0..250)
            .map(|i| {
                let price = 100.0 + i as f64 * 0.05;
                crate::domain::Candle {
                    ts: start + CDuration::hours(i),
                    open: price,
                    high: price + 0.5,
                    low: price - 0.5,
                    close: price + 0.1,
                    volume: 10.0,
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn append_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistenceStore::new(dir.path());
        let symbol = Symbol::new("mock", "BTC/USDT");
        let signal = dummy_signal(symbol.clone());

        store.append_signal("mock", &signal).await.unwrap();
        store.append_signal("mock", &signal).await.unwrap();

        let path = PersistenceStore::day_file(&store.signals_dir(), "mock", &symbol, signal.timestamp.date_naive());
        let array = read_json_array::<Signal>(&path).await.unwrap();
        assert_eq!(array.len(), 2);
    }
}
