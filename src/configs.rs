use crate::curve::CurveIdentifier;
use crate::generate_ec_cert::SignaturePolicy;
use crate::subject::SubjectAttributes;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "certgen.toml";

/// Generation settings, typically read from `certgen.toml`
///
/// ```toml
/// curve = "prime256v1"
/// signature = "self-signed"
///
/// [subject]
/// country = "PG"
/// common_name = "EC Test"
/// ```
///
/// Every key is optional; missing subject fields take the demonstration values.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub curve: CurveIdentifier,
    #[serde(default)]
    pub signature: SignaturePolicy,
    #[serde(default)]
    pub subject: SubjectAttributes,
}

impl GeneratorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&config_str)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: GeneratorConfig =
            toml::from_str(config_str).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration with default path (certgen.toml)
    pub fn load() -> Result<Self> {
        Self::from_file(DEFAULT_CONFIG_PATH)
    }
}
