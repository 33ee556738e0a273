//! Agreement client: loads agreements, sends their requests and checks the
//! responses.
//!
//! # Design
//! `AgreedClient` holds read-only configuration plus a [`Transport`]; no
//! state is shared between agreements, so requests for different agreements
//! run concurrently while each one stays strictly sequential
//! (build → send → collect body → compare).

use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::agreement::{Agreement, ExpectedStatus, ResolvedAgreement};
use crate::check::{check_body, CheckBodyStream, CheckResult};
use crate::completion::{complete, complete_all, CompletionOptions};
use crate::config::ClientConfig;
use crate::error::{ClientError, CompletionError, PrepareError, TransportError};
use crate::extract::ClientContext;
use crate::http::{HttpMethod, PreparedRequest};
use crate::prepare::setup;
use crate::schema::{JsonSchemaValidator, SchemaValidator};
use crate::source::AgreementSource;
use crate::transport::{LiveResponse, ReqwestTransport, Transport};

/// A request in flight, tagged with what it was built from.
#[derive(Debug)]
pub struct SentRequest {
    pub agreed: PreparedRequest,
    pub response: LiveResponse,
}

/// Outcome of verifying one agreement end to end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub method: HttpMethod,
    pub path: String,
    pub result: CheckResult,
}

pub struct AgreedClient<T = ReqwestTransport> {
    source: AgreementSource,
    context: ClientContext,
    options: CompletionOptions,
    validator: Arc<dyn SchemaValidator>,
    transport: T,
}

impl AgreedClient<ReqwestTransport> {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<T: Transport> AgreedClient<T> {
    /// Fails when the configured agreements file does not exist.
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self, ClientError> {
        Ok(Self {
            source: config.source()?,
            context: config.context(),
            options: config.completion_options(),
            validator: Arc::new(JsonSchemaValidator),
            transport,
        })
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn base_dir(&self) -> &Path {
        self.source.base_dir()
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    /// Complete `agreements` against this client's base directory and defaults.
    pub fn complete(&self, agreements: &[Agreement]) -> Result<Vec<ResolvedAgreement>, CompletionError> {
        complete_all(agreements, self.base_dir(), &self.options)
    }

    /// Re-read the agreement source and complete every agreement.
    pub fn get_agreements(&self) -> Result<Vec<ResolvedAgreement>, ClientError> {
        let agreements = self.source.load()?;
        Ok(self.complete(&agreements)?)
    }

    pub fn setup(&self, agreement: &ResolvedAgreement) -> Result<PreparedRequest, PrepareError> {
        setup(agreement, &self.context)
    }

    pub async fn create_request(&self, prepared: PreparedRequest) -> Result<SentRequest, TransportError> {
        let response = self.transport.send(&prepared).await?;
        Ok(SentRequest {
            agreed: prepared,
            response,
        })
    }

    /// Complete, set up and send every agreement. Requests run concurrently;
    /// the result keeps the input order.
    pub async fn create_requests(&self, agreements: &[Agreement]) -> Result<Vec<SentRequest>, ClientError> {
        let prepared = self
            .complete(agreements)?
            .iter()
            .map(|agreement| self.setup(agreement))
            .collect::<Result<Vec<_>, _>>()?;
        join_all(prepared.into_iter().map(|request| self.create_request(request)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(ClientError::from)
    }

    /// Check `response` against `agreement`, completed afresh.
    ///
    /// Status and header expectations are compared before the body is read;
    /// their entries join the body result once the body has been checked.
    pub async fn check_response(
        &self,
        response: LiveResponse,
        agreement: &Agreement,
    ) -> Result<CheckResult, ClientError> {
        let resolved = complete(agreement, self.base_dir(), &self.options)?;
        let expected = &resolved.response;

        let mut early = CheckResult::default();
        if let ExpectedStatus::Exact(status) = expected.status {
            if status != response.status {
                early.record("status", json!(status), json!(response.status));
            }
        }
        for (name, value) in &expected.headers {
            let actual = response.header(name);
            if actual != Some(value.as_str()) {
                early.record(
                    format!("headers.{name}"),
                    Value::String(value.clone()),
                    actual.map_or(Value::Null, |actual| Value::String(actual.to_string())),
                );
            }
        }

        let mut stream = CheckBodyStream::with_validator(Arc::clone(&self.validator));
        stream.expect(expected.body.clone())?;
        stream.schema(expected.schema.clone())?;
        stream.content_type(response.content_type())?;

        let mut result = check_body(stream, response.body).await?;
        result.merge(early);

        if result.is_match() {
            debug!(method = %resolved.request.method, path = %resolved.request.path, "agreement honoured");
        } else {
            warn!(
                method = %resolved.request.method,
                path = %resolved.request.path,
                mismatches = result.diff.len(),
                "agreement not honoured"
            );
        }
        Ok(result)
    }

    /// Load every agreement, send it and check its response.
    pub async fn verify(&self) -> Result<Vec<Verification>, ClientError> {
        let agreements = self.source.load()?;
        let resolved = self.complete(&agreements)?;

        let runs = agreements.iter().zip(&resolved).map(|(raw, agreement)| async move {
            let prepared = self.setup(agreement)?;
            let sent = self.create_request(prepared).await?;
            let result = self.check_response(sent.response, raw).await?;
            Ok::<_, ClientError>(Verification {
                method: agreement.request.method,
                path: agreement.request.path.clone(),
                result,
            })
        });
        let verifications = join_all(runs).await.into_iter().collect::<Result<Vec<_>, _>>()?;

        let failed = verifications.iter().filter(|v| !v.result.is_match()).count();
        info!(total = verifications.len(), failed, "verification finished");
        Ok(verifications)
    }
}
