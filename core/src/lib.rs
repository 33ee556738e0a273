//! Contract-testing client core.
//!
//! # Overview
//! An *agreement* pairs an HTTP request with the response it must produce.
//! This crate completes partially specified agreements, sends their
//! requests and streams each live response through a checker that reports
//! every mismatch as a `[expected, actual]` diff entry.
//!
//! # Design
//! - Everything up to the wire is plain data: completion turns an
//!   [`Agreement`] into a [`ResolvedAgreement`], setup turns that into a
//!   [`PreparedRequest`]. Both are deterministic and never touch the network.
//! - The network sits behind [`Transport`]; [`ReqwestTransport`] is the
//!   default and tests substitute their own.
//! - [`CheckBodyStream`] consumes the body chunk by chunk and yields exactly
//!   one [`CheckResult`]. Mismatches are data, never errors.
//! - Raw JSON enters only through [`Agreement::from_value`], which rejects
//!   non-objects up front.

pub mod agreement;
pub mod check;
pub mod client;
pub mod completion;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod http;
pub mod prepare;
pub mod schema;
pub mod source;
pub mod telemetry;
pub mod template;
pub mod transport;

pub use agreement::{Agreement, ExpectedStatus, ResolvedAgreement};
pub use check::{CheckBodyStream, CheckResult};
pub use client::{AgreedClient, SentRequest, Verification};
pub use completion::{complete, complete_all, CompletionOptions};
pub use config::ClientConfig;
pub use error::{
    AgreementError, CheckError, ClientError, CompletionError, ConfigError, PrepareError,
    SourceError, TemplateError, TransportError,
};
pub use extract::{outgoing_request, ClientContext};
pub use http::{HttpMethod, PreparedRequest, RequestOptions, Scheme};
pub use prepare::setup;
pub use source::AgreementSource;
pub use template::format;
pub use transport::{LiveResponse, ReqwestTransport, Transport};
