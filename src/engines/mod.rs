//! Plate recognizer implementations
//!
//! Engines are conditionally compiled based on feature flags and loaded in
//! the background so the server can accept preprocessing requests while
//! recognition models are still being fetched.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

use crate::config::Config;
use crate::engine::PlateRecognizer;
use crate::error::ServiceError;
use std::sync::{Arc, OnceLock};

/// Holder for the recognizer once it has finished loading
#[derive(Default)]
pub struct EngineSlot {
    engine: OnceLock<Arc<dyn PlateRecognizer>>,
}

impl EngineSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The loaded recognizer, if any
    pub fn get(&self) -> Option<Arc<dyn PlateRecognizer>> {
        self.engine.get().cloned()
    }

    /// Install a recognizer; later installs are ignored
    pub fn install(&self, engine: Arc<dyn PlateRecognizer>) {
        let name = engine.name();
        if self.engine.set(engine).is_err() {
            tracing::warn!("Recognizer already installed, ignoring {}", name);
        }
    }
}

/// Load the recognizer on a blocking thread and install it into `slot`
pub fn spawn_loader(config: Arc<Config>, slot: Arc<EngineSlot>) {
    if !config.ocr_enabled {
        tracing::info!("OCR disabled, serving preprocessing endpoints only");
        return;
    }

    tokio::task::spawn_blocking(move || match init(&config) {
        Ok(Some(engine)) => {
            tracing::info!("Recognizer '{}' ready", engine.name());
            slot.install(engine);
        }
        Ok(None) => {
            tracing::warn!("No recognition engine compiled in; build with --features engine-ocrs")
        }
        Err(e) => tracing::error!("Recognizer failed to load: {}", e),
    });
}

#[cfg(feature = "engine-ocrs")]
fn init(config: &Config) -> Result<Option<Arc<dyn PlateRecognizer>>, ServiceError> {
    tracing::info!("Initializing ocrs engine...");
    let engine: Arc<dyn PlateRecognizer> = Arc::new(ocrs::OcrsRecognizer::new(config)?);
    Ok(Some(engine))
}

#[cfg(not(feature = "engine-ocrs"))]
fn init(_config: &Config) -> Result<Option<Arc<dyn PlateRecognizer>>, ServiceError> {
    Ok(None)
}
