use std::{env, ffi::OsString, path::PathBuf};

use thiserror::Error;
use tracing::Level;

use crate::backend::BuildRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Library paths handed to the backend.
    pub references: Vec<PathBuf>,
    pub output: PathBuf,
    pub log_level: Level,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("VENA_LOG: '{0}' is not a log level")]
    LogLevel(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            references: Vec::new(),
            output: PathBuf::from("a.out"),
            log_level: Level::WARN,
        }
    }
}

impl Config {
    /// Reads `VENA_REFERENCES`, `VENA_OUTPUT` and `VENA_LOG`.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_vars(|name| env::var_os(name))
    }

    fn from_vars(var: impl Fn(&str) -> Option<OsString>) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Some(references) = var("VENA_REFERENCES") {
            config.references = env::split_paths(&references)
                .filter(|path| !path.as_os_str().is_empty())
                .collect();
        }
        if let Some(output) = var("VENA_OUTPUT") {
            config.output = PathBuf::from(output);
        }
        if let Some(level) = var("VENA_LOG") {
            let level = level.to_string_lossy();
            config.log_level = level
                .parse()
                .map_err(|_| ConfigError::LogLevel(level.into_owned()))?;
        }

        Ok(config)
    }

    pub fn build_request(&self) -> BuildRequest {
        BuildRequest {
            references: self.references.clone(),
            output: self.output.clone(),
        }
    }
}
