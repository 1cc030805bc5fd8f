use crate::config::EngineConfig;
use std::sync::Arc;
use storage_api::Engine;

/// Owner of the singleton-like instances that are needed for the entire lifetime of the server
#[derive(Debug)]
pub struct EngineEnvironment {
    pub engine: Arc<Engine>,
    pub engine_config: EngineConfig,
}

impl EngineEnvironment {
    pub fn new(config: EngineConfig) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.storage.data_dir)?;
        let data_file = config.storage.data_file();
        let full_path = std::path::absolute(&data_file)?;
        tracing::info!("opening data file at {}", full_path.display());

        let engine =
            Engine::open(&data_file).map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(Self {
            engine: Arc::new(engine),
            engine_config: config,
        })
    }
}
