#![forbid(unsafe_code)]

mod error;
mod fetch;
mod logging;
mod prefetch;

pub use error::Error;
pub use fetch::Fetch;
pub use logging::Logging;
pub use prefetch::{ABSOLUTE_MAX_SLOTS, DEFAULT_MAX_SLOTS, DEFAULT_TTL_SECS, Prefetch};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables overriding file settings, e.g.
/// `PFSLOT_PREFETCH__TTL_SECS=30`.
pub const ENV_PREFIX: &str = "PFSLOT_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub prefetch: Prefetch,
    pub fetch: Fetch,
    pub logging: Logging,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config from a TOML file, layered over the defaults and
    /// under environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_owned()));
        }
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config.clamp())
    }

    /// Write the config as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let document = toml_edit::ser::to_document(self)?;
        std::fs::write(path, document.to_string())?;
        Ok(())
    }

    pub fn clamp(self) -> Self {
        Self {
            prefetch: self.prefetch.clamp(),
            ..self
        }
    }
}
