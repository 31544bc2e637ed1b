use shared::{Config, CsvStore, NameResolver, SinaNameResolver, TradeRepository};
use std::path::PathBuf;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub repository: TradeRepository<CsvStore>,
    pub resolver: Arc<dyn NameResolver>,
}

impl AppState {
    pub fn new(data_file: Option<PathBuf>) -> Result<Self, anyhow::Error> {
        let mut config = Config::from_env()?;
        if let Some(path) = data_file {
            config.data_file = path;
        }
        tracing::debug!("Using data file {}", config.data_file.display());

        let resolver = Arc::new(SinaNameResolver::new(
            config.name_lookup_url.clone(),
            config.name_lookup_referer.clone(),
        ));

        let repository = TradeRepository::new(CsvStore::new(config.data_file.clone()));
        Ok(Self::with_parts(config, repository, resolver))
    }

    /// State over an explicit store and resolver
    pub fn with_parts(config: Config, repository: TradeRepository<CsvStore>, resolver: Arc<dyn NameResolver>) -> Self {
        Self {
            config,
            repository,
            resolver,
        }
    }
}
