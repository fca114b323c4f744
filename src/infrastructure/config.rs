// ============================================================
// CONFIGURATION LOADING
// ============================================================
// Synonym tables and thresholds are tunable without recompiling:
// built-in defaults, overridden by boq-ingest.toml, overridden by
// BOQ_INGEST_* environment variables.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;

use crate::domain::error::{AppError, Result};
use crate::domain::mapping_config::MappingConfig;

pub const CONFIG_FILE: &str = "boq-ingest.toml";
pub const ENV_PREFIX: &str = "BOQ_INGEST_";

pub fn load_mapping_config() -> Result<MappingConfig> {
    let config: MappingConfig = Figment::from(Serialized::defaults(MappingConfig::default()))
        .merge(Toml::file(CONFIG_FILE))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
        .map_err(|e| AppError::ValidationError(format!("invalid configuration: {}", e)))?;

    config.validate().map_err(AppError::ValidationError)?;
    Ok(config)
}
