use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{CollectorError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| CollectorError::Config(format!("Failed to read config file: {e}")))?;
    let cfg: Config = toml::from_str(&txt)
        .map_err(|e| CollectorError::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.ingest.salt.trim().is_empty() {
        return Err(CollectorError::Config(
            "ingest.salt must not be empty".to_string(),
        ));
    }
    if cfg.ingest.locales.is_empty() {
        return Err(CollectorError::Config(
            "ingest.locales must list at least one locale".to_string(),
        ));
    }
    if !cfg.ingest.locales.contains(&cfg.ingest.default_locale) {
        return Err(CollectorError::Config(format!(
            "ingest.default_locale '{}' is not in ingest.locales",
            cfg.ingest.default_locale
        )));
    }
    if cfg.ingest.trending_ttl_hours == 0 {
        return Err(CollectorError::Config(
            "ingest.trending_ttl_hours must be > 0".to_string(),
        ));
    }
    if cfg.store.retention_days == 0 {
        return Err(CollectorError::Config(
            "store.retention_days must be > 0".to_string(),
        ));
    }
    if cfg.store.connect_timeout_ms == 0 {
        return Err(CollectorError::Config(
            "store.connect_timeout_ms must be > 0".to_string(),
        ));
    }
    if cfg.comments.rate_limit.ceiling == 0 {
        return Err(CollectorError::Config(
            "comments.rate_limit.ceiling must be > 0".to_string(),
        ));
    }
    if cfg.comments.rate_limit.window_seconds == 0 {
        return Err(CollectorError::Config(
            "comments.rate_limit.window_seconds must be > 0".to_string(),
        ));
    }

    Ok(())
}
