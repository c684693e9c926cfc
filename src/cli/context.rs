use std::path::Path;

use resilient_e2e::{KitConfig, LoadedConfig};

pub struct CliContext {
    loaded: LoadedConfig,
}

impl CliContext {
    pub fn new(loaded: LoadedConfig) -> Self {
        Self { loaded }
    }

    pub fn config(&self) -> &KitConfig {
        &self.loaded.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.loaded.path.as_deref()
    }

    /// Whether the config path existed when loading
    pub fn from_file(&self) -> bool {
        self.loaded.from_file
    }
}
