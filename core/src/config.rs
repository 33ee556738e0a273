//! Client configuration, usually read from a small TOML file:
//!
//! ```toml
//! scheme = "http"
//! host = "localhost"
//! port = 8080
//! path = "agreements.json"
//!
//! [default_headers]
//! Accept = "application/json"
//!
//! [values]
//! tenant = "acme"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agreement::Agreement;
use crate::completion::CompletionOptions;
use crate::error::{ClientError, ConfigError};
use crate::extract::ClientContext;
use crate::http::Scheme;
use crate::source::AgreementSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Agreements file.
    pub path: Option<PathBuf>,
    /// Base for relative references in inline agreements.
    pub base_dir: Option<PathBuf>,
    pub default_headers: BTreeMap<String, String>,
    pub values: Map<String, Value>,
    #[serde(skip)]
    pub agreements: Option<Vec<Agreement>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            host: "localhost".to_string(),
            port: 80,
            path: None,
            base_dir: None,
            default_headers: BTreeMap::new(),
            values: Map::new(),
            agreements: None,
        }
    }
}

impl ClientConfig {
    /// Configuration over an in-memory agreement list.
    pub fn inline(agreements: Vec<Agreement>) -> Self {
        Self {
            agreements: Some(agreements),
            ..Self::default()
        }
    }

    /// Configuration over an agreements file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        self.scheme = scheme;
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load a TOML config; relative paths inside it resolve against the
    /// config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.path = config.path.map(|p| dir.join(p));
        config.base_dir = Some(config.base_dir.map_or_else(|| dir.to_path_buf(), |b| dir.join(b)));
        Ok(config)
    }

    pub fn context(&self) -> ClientContext {
        ClientContext {
            scheme: self.scheme,
            host: self.host.clone(),
            port: self.port,
        }
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            default_headers: self.default_headers.clone(),
            values: self.values.clone(),
        }
    }

    /// Inline agreements take precedence over `path`.
    pub fn source(&self) -> Result<AgreementSource, ClientError> {
        if let Some(agreements) = &self.agreements {
            let base_dir = self.base_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            return Ok(AgreementSource::inline(agreements.clone(), base_dir));
        }
        match &self.path {
            Some(path) => Ok(AgreementSource::file(path)?),
            None => Err(ConfigError::MissingSource.into()),
        }
    }
}
