//! Where agreements come from.
//!
//! A file source is re-read on every [`AgreementSource::load`], so edits made
//! between runs are always picked up. Nothing is cached.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::agreement::Agreement;
use crate::error::SourceError;

#[derive(Debug, Clone, PartialEq)]
pub enum AgreementSource {
    Inline {
        agreements: Vec<Agreement>,
        base_dir: PathBuf,
    },
    File(PathBuf),
}

impl AgreementSource {
    pub fn inline(agreements: Vec<Agreement>, base_dir: impl Into<PathBuf>) -> Self {
        AgreementSource::Inline {
            agreements,
            base_dir: base_dir.into(),
        }
    }

    /// A file-backed source. Fails when `path` does not name a file.
    pub fn file(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        if !path.is_file() {
            return Err(SourceError::NotFound(path));
        }
        Ok(AgreementSource::File(path))
    }

    /// Directory relative references inside agreements resolve against.
    pub fn base_dir(&self) -> &Path {
        match self {
            AgreementSource::Inline { base_dir, .. } => base_dir,
            AgreementSource::File(path) => path.parent().unwrap_or_else(|| Path::new(".")),
        }
    }

    /// Current agreements. A file may hold one agreement or an array of them.
    pub fn load(&self) -> Result<Vec<Agreement>, SourceError> {
        let path = match self {
            AgreementSource::Inline { agreements, .. } => return Ok(agreements.clone()),
            AgreementSource::File(path) => path,
        };
        let raw = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        let document: Value = serde_json::from_str(&raw).map_err(|source| SourceError::Json {
            path: path.clone(),
            source,
        })?;
        let items = match document {
            Value::Array(items) => items,
            single => vec![single],
        };
        let agreements = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Agreement::from_value(item).map_err(|source| SourceError::Agreement {
                    path: path.clone(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(path = %path.display(), count = agreements.len(), "agreements loaded");
        Ok(agreements)
    }
}
