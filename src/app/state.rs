//! Application state shared across routes

use std::sync::Arc;

use crate::assets::ModelStore;
use crate::config::Config;
use crate::obj::ParseOptions;
use crate::util::rate_limit::{create_limiter, Limiter};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub models: Arc<ModelStore>,
    pub model_limiter: Arc<Limiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let options = ParseOptions {
            polygon_mode: config.polygon_mode,
        };
        let models = Arc::new(ModelStore::new(
            config.asset_dir.clone(),
            options,
            config.max_model_bytes,
        ));

        let model_limiter = create_limiter(config.parse_rate_limit);

        Self {
            config,
            models,
            model_limiter,
        }
    }
}
