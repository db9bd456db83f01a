//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars into a typed [`AppConfig`], with helpers to expand `~` and `${VAR}`
//! and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Typed application settings with defaults suitable for local runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Width of every stored and queried embedding vector.
    pub embedding_dim: usize,
    /// Currency attached to prices that arrive without one.
    pub default_currency: String,
    pub db_path: String,
    pub products_table: String,
    /// Directory holding model weights and tokenizer files.
    pub model_dir: String,
    /// Detection confidence a correction must strictly exceed.
    pub correction_threshold: f32,
    pub fetch_timeout_secs: u64,
    /// Rows processed concurrently during ingestion.
    pub batch_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 512,
            default_currency: "INR".to_string(),
            db_path: "data/stylesearch-db".to_string(),
            products_table: "products".to_string(),
            model_dir: "models/clip-vit-base-patch32".to_string(),
            correction_threshold: 0.7,
            fetch_timeout_secs: 10,
            batch_size: 10,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        let config: AppConfig = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding_dim must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.correction_threshold) {
            return Err(Error::InvalidConfig(
                "correction_threshold must be within [0, 1]".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".into()));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        expand_path(&self.db_path)
    }

    pub fn model_dir(&self) -> PathBuf {
        expand_path(&self.model_dir)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
