use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::Value;
use tracing::debug;

use super::compare::compare;
use super::result::CheckResult;
use crate::content::is_json_media_type;
use crate::error::CheckError;
use crate::schema::{JsonSchemaValidator, SchemaValidator};
use crate::transport::BodyStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Collecting,
    Checked,
}

/// Accumulates a response body and compares it against an expectation once
/// the body ends.
///
/// Configure with [`expect`](Self::expect), [`schema`](Self::schema) and
/// [`content_type`](Self::content_type) before the first chunk, feed chunks
/// with [`write`](Self::write), then call [`finish`](Self::finish) exactly
/// once to obtain the [`CheckResult`].
pub struct CheckBodyStream {
    state: CheckState,
    received: bool,
    buffer: Vec<u8>,
    expected: Option<Value>,
    schema: Option<Value>,
    content_type: Option<String>,
    validator: Arc<dyn SchemaValidator>,
}

impl Default for CheckBodyStream {
    fn default() -> Self {
        Self::with_validator(Arc::new(JsonSchemaValidator))
    }
}

impl CheckBodyStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(validator: Arc<dyn SchemaValidator>) -> Self {
        Self {
            state: CheckState::Collecting,
            received: false,
            buffer: Vec::new(),
            expected: None,
            schema: None,
            content_type: None,
            validator,
        }
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    /// Expected body; `None` skips the body comparison.
    pub fn expect(&mut self, body: Option<Value>) -> Result<(), CheckError> {
        self.ensure_configurable()?;
        self.expected = body;
        Ok(())
    }

    pub fn schema(&mut self, schema: Option<Value>) -> Result<(), CheckError> {
        self.ensure_configurable()?;
        self.schema = schema;
        Ok(())
    }

    /// Declared content type of the response, used to pick the body parser.
    pub fn content_type(&mut self, content_type: Option<&str>) -> Result<(), CheckError> {
        self.ensure_configurable()?;
        self.content_type = content_type.map(str::to_string);
        Ok(())
    }

    pub fn write(&mut self, chunk: &[u8]) -> Result<(), CheckError> {
        if self.state == CheckState::Checked {
            return Err(CheckError::AlreadyChecked);
        }
        self.received = true;
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    /// End of body: parse, compare and produce the result. Only the first
    /// call succeeds.
    pub fn finish(&mut self) -> Result<CheckResult, CheckError> {
        if self.state == CheckState::Checked {
            return Err(CheckError::AlreadyChecked);
        }
        self.state = CheckState::Checked;

        let bytes = std::mem::take(&mut self.buffer);
        let actual = self.parse(&bytes);

        let mut result = CheckResult::default();
        if let Some(expected) = &self.expected {
            compare(expected, &actual, &mut result);
        }
        if let Some(schema) = &self.schema {
            let outcome = self.validator.validate(schema, &actual);
            if !outcome.valid {
                let errors = outcome.errors.into_iter().map(Value::String).collect();
                result.record("schema", schema.clone(), Value::Array(errors));
            }
        }
        debug!(bytes = bytes.len(), mismatches = result.diff.len(), "body checked");
        Ok(result)
    }

    fn ensure_configurable(&self) -> Result<(), CheckError> {
        match self.state {
            CheckState::Checked => Err(CheckError::AlreadyChecked),
            CheckState::Collecting if self.received => Err(CheckError::AlreadyStreaming),
            CheckState::Collecting => Ok(()),
        }
    }

    /// A declared non-JSON content type yields the raw text. Otherwise the
    /// body is parsed as JSON, falling back to text when it is not JSON.
    fn parse(&self, bytes: &[u8]) -> Value {
        let text = String::from_utf8_lossy(bytes).into_owned();
        let declared_json = match self.content_type.as_deref() {
            Some(content_type) if !is_json_media_type(content_type) => {
                return Value::String(text);
            }
            Some(_) => true,
            None => false,
        };
        if text.trim().is_empty() {
            return Value::Null;
        }
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                if declared_json {
                    debug!(error = %err, "declared JSON body does not parse");
                }
                Value::String(text)
            }
        }
    }
}

/// Drive `stream` over a response body and resolve with its single result.
pub async fn check_body(
    mut stream: CheckBodyStream,
    mut body: BodyStream,
) -> Result<CheckResult, CheckError> {
    while let Some(chunk) = body.next().await {
        stream.write(&chunk?)?;
    }
    stream.finish()
}
