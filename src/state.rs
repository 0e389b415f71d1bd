// src/state.rs
//
// Carries what would otherwise be process globals (`last_scan_results`,
// `continuous_scanner`, ...) explicitly on a value shared via
// `web::Data`, with a single start/stop lifecycle for the continuous
// pipeline.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use serde_json::Value;

use crate::config::settings::Settings;
use crate::continuous::ContinuousPipeline;
use crate::persistence::PersistenceStore;
use crate::scan::ExchangeContext;

pub struct AppState {
    pub settings: Settings,
    pub exchanges: DashMap<String, Arc<ExchangeContext>>,
    pub continuous: Arc<ContinuousPipeline>,
    pub persistence: Arc<PersistenceStore>,
    pub last_scan: RwLock<Option<Value>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let persistence = Arc::new(PersistenceStore::new(settings.training_data_dir.clone()));
        let continuous = Arc::new(ContinuousPipeline::new(settings.clone()));
        Self { settings, exchanges: DashMap::new(), continuous, persistence, last_scan: RwLock::new(None) }
    }
}
