//! Mount-side tuning knobs, adapted from the teacher's `client/src/config.rs`.
//! Dropped `server_url` (the `<source>` CLI argument replaces it) and the
//! implicit `config.toml`-in-cwd lookup in favor of an explicit `--config`
//! path, since a FUSE daemon has no natural "current directory".

use std::path::Path;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    Ttl,
    Lru,
    None,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub cache_strategy: CacheStrategy,
    pub cache_ttl_seconds: u64,
    pub cache_lru_capacity: usize,
    pub kernel_attr_timeout_seconds: u64,
    pub kernel_entry_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_strategy: CacheStrategy::Ttl,
            cache_ttl_seconds: 60,
            cache_lru_capacity: 1000,
            kernel_attr_timeout_seconds: 1,
            kernel_entry_timeout_seconds: 1,
        }
    }
}

/// Loads `path` if given and present, falling back to defaults otherwise --
/// a missing or unparsable config file is not fatal, it just means "use the
/// defaults" (matches the teacher's behavior, minus the hardcoded filename).
pub fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
        return Config::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read config file, using defaults");
            return Config::default();
        }
    };

    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not parse config file, using defaults");
            Config::default()
        }
    }
}
