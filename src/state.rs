//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::convert::ConversionBackend;
use crate::pipeline::Converter;
use crate::staging::StagingArea;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    converter: Converter,
    backend_available: bool,
}

impl AppState {
    /// Create the application state around an already selected backend.
    ///
    /// Backend tools are checked once here; `/health` reports the result
    /// without spawning anything per request.
    pub async fn new(config: Config, backend: Arc<dyn ConversionBackend>) -> Self {
        let backend_available = backend.is_available().await;
        let staging = StagingArea::new(config.staging.root.clone());
        let converter = Converter::new(staging, backend);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                converter,
                backend_available,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the conversion pipeline
    pub fn converter(&self) -> &Converter {
        &self.inner.converter
    }

    /// Whether the backend's tools were installed at startup
    pub fn backend_available(&self) -> bool {
        self.inner.backend_available
    }
}
