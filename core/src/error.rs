//! Error types for the agreement pipeline.
//!
//! # Design
//! Structural problems (malformed agreements, unresolvable schema files,
//! placeholders without a value) are errors and propagate with `?`. A
//! response that does not match its agreement is NOT an error: mismatches are
//! carried as data in [`crate::check::CheckResult`].

use std::path::PathBuf;

use thiserror::Error;

/// Raised at the parse boundary when raw JSON does not have the shape of an
/// agreement.
#[derive(Debug, Error)]
pub enum AgreementError {
    /// The agreement (or its `request` / `response` section) is not a JSON object.
    #[error("{what} should be an object, got {found}")]
    NotAnObject { what: &'static str, found: &'static str },

    /// The object has the right outer shape but a field has the wrong type.
    #[error("malformed agreement: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A placeholder could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("no value for placeholder `{name}`")]
    MissingValue { name: String },

    #[error("unterminated placeholder in `{input}`")]
    Unterminated { input: String },
}

/// Completion could not produce a resolved agreement.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("unsupported HTTP method `{0}`")]
    InvalidMethod(String),

    /// A file referenced relative to the base path could not be loaded.
    #[error("cannot resolve `{}`: {reason}", path.display())]
    Resolution { path: PathBuf, reason: String },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

/// The wire body of a resolved agreement could not be assembled.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("form-urlencoded body must be an object of scalars: {0}")]
    FormBody(String),

    #[error("body serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Misuse of the check stream state machine, or a body that could not be read.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("check stream already produced its result")]
    AlreadyChecked,

    #[error("check stream already received body data")]
    AlreadyStreaming,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The transport failed to deliver a request or its response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// The agreement source could not be read.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("agreement file `{}` not found", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("agreement #{index} in `{}`: {source}", path.display())]
    Agreement {
        path: PathBuf,
        index: usize,
        #[source]
        source: AgreementError,
    },
}

/// Client configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config names neither an agreements `path` nor inline agreements")]
    MissingSource,
}

/// Everything the client orchestrator can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Agreement(#[from] AgreementError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Prepare(#[from] PrepareError),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
