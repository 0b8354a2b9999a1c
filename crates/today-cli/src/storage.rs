use std::path::PathBuf;

use crate::config::Config;
use color_eyre::Result;
use dirs::data_dir;
use today_storage::file_store::FileStore;
use tracing::debug;

/// Resolve the default data directory for Today.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("today"))
}

/// Build the file store, honoring a configured data directory.
pub fn store_from_config(config: &Config) -> Result<FileStore> {
    let root = match &config.data_dir {
        Some(root) => root.clone(),
        None => default_data_dir()?,
    };
    debug!(?root, "initializing file store");
    Ok(FileStore::new(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_configured_data_dir() {
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/today-data")),
            ..Config::default()
        };
        let store = store_from_config(&cfg).expect("store");
        assert_eq!(store.root(), PathBuf::from("/tmp/today-data").as_path());
    }
}
