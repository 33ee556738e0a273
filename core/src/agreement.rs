//! Agreement types: the raw, partially specified form read from agreement
//! files, and the resolved form produced by completion.
//!
//! # Design
//! Raw agreements keep every field optional so that fixtures only spell out
//! what they care about. [`Agreement::from_value`] is the one entry point for
//! untyped JSON: it rejects anything that is not an object before serde sees
//! it, so the rest of the crate never probes shapes at runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AgreementError;
use crate::http::{HttpMethod, Scheme};

/// A declarative contract: one request and the response it must produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    #[serde(default)]
    pub request: RawRequest,
    #[serde(default)]
    pub response: RawResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    /// Extra placeholder values for the expected response only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Map<String, Value>>,
}

/// A response schema given inline or as a path relative to the base path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    Path(String),
    Inline(Value),
}

impl Agreement {
    /// Parse untyped JSON into an agreement.
    ///
    /// Fails with [`AgreementError::NotAnObject`] when the value, or its
    /// `request` / `response` section, is not an object.
    pub fn from_value(mut value: Value) -> Result<Self, AgreementError> {
        let found = kind(&value);
        let Some(fields) = value.as_object_mut() else {
            return Err(AgreementError::NotAnObject {
                what: "agreement",
                found,
            });
        };
        for section in ["request", "response"] {
            let found = match fields.get(section) {
                None | Some(Value::Object(_)) => continue,
                Some(other) => kind(other),
            };
            if found != "null" {
                return Err(AgreementError::NotAnObject { what: section, found });
            }
            fields.remove(section);
        }
        Ok(serde_json::from_value(value)?)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Which response status an agreement accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExpectedStatus {
    /// No status was specified: every status is accepted.
    Any,
    Exact(u16),
}

impl ExpectedStatus {
    pub fn accepts(self, actual: u16) -> bool {
        match self {
            ExpectedStatus::Any => true,
            ExpectedStatus::Exact(expected) => expected == actual,
        }
    }
}

/// A fully resolved agreement. Produced only by completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAgreement {
    pub request: ResolvedRequest,
    pub response: ExpectedResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    /// Path with the query string appended.
    pub path: String,
    pub headers: BTreeMap<String, String>,
    /// Body template; formatted with `values` when the request is set up.
    pub body: Option<Value>,
    pub values: Map<String, Value>,
    pub scheme: Option<Scheme>,
    pub host: Option<String>,
    pub port: Option<u16>,
    #[serde(skip)]
    pub template: RequestTemplate,
}

/// Request fields before placeholder substitution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTemplate {
    pub path: String,
    pub query: Option<Map<String, Value>>,
    /// Merged headers under their final names, values unformatted.
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedResponse {
    pub status: ExpectedStatus,
    pub headers: BTreeMap<String, String>,
    /// `None` means the body is not compared.
    pub body: Option<Value>,
    pub schema: Option<Value>,
    #[serde(skip)]
    pub template: ResponseTemplate,
}

/// Response fields before placeholder substitution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseTemplate {
    pub headers: Option<BTreeMap<String, String>>,
    pub body: Option<Value>,
    pub values: Option<Map<String, Value>>,
}

impl ResolvedAgreement {
    /// Map back to the raw shape so completion can be applied again.
    ///
    /// Templated fields are handed back unformatted, so values that contain
    /// placeholder syntax themselves are substituted exactly once.
    pub fn to_agreement(&self) -> Agreement {
        let request = &self.request;
        let response = &self.response;
        Agreement {
            request: RawRequest {
                method: Some(request.method.as_str().to_string()),
                path: Some(request.template.path.clone()),
                query: request.template.query.clone(),
                headers: Some(request.template.headers.clone()),
                body: request.body.clone(),
                values: Some(request.values.clone()),
                scheme: request.scheme,
                host: request.host.clone(),
                port: request.port,
            },
            response: RawResponse {
                status: match response.status {
                    ExpectedStatus::Any => None,
                    ExpectedStatus::Exact(status) => Some(status),
                },
                headers: response.template.headers.clone(),
                body: response.template.body.clone(),
                schema: response.schema.clone().map(SchemaRef::Inline),
                values: response.template.values.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_agreement() {
        let agreement = Agreement::from_value(json!({
            "request": {
                "method": "POST",
                "path": "/users",
                "headers": {"content-type": "application/json"},
                "body": {"name": "{{name}}"},
                "values": {"name": "Ada"}
            },
            "response": {"status": 201, "schema": "./user.schema.json"}
        }))
        .unwrap();
        assert_eq!(agreement.request.method.as_deref(), Some("POST"));
        assert_eq!(agreement.response.status, Some(201));
        assert_eq!(
            agreement.response.schema,
            Some(SchemaRef::Path("./user.schema.json".into()))
        );
    }

    #[test]
    fn empty_object_is_a_valid_agreement() {
        let agreement = Agreement::from_value(json!({})).unwrap();
        assert_eq!(agreement, Agreement::default());
    }

    #[test]
    fn inline_schema_is_kept_as_value() {
        let agreement = Agreement::from_value(json!({
            "response": {"schema": {"type": "object"}}
        }))
        .unwrap();
        assert_eq!(
            agreement.response.schema,
            Some(SchemaRef::Inline(json!({"type": "object"})))
        );
    }

    #[test]
    fn rejects_non_object_agreement() {
        let err = Agreement::from_value(json!("GET /users")).unwrap_err();
        assert!(matches!(
            err,
            AgreementError::NotAnObject { what: "agreement", found: "string" }
        ));
    }

    #[test]
    fn rejects_non_object_sections() {
        let err = Agreement::from_value(json!({"request": [1, 2]})).unwrap_err();
        assert!(matches!(
            err,
            AgreementError::NotAnObject { what: "request", found: "array" }
        ));
    }

    #[test]
    fn rejects_wrongly_typed_fields() {
        let err = Agreement::from_value(json!({"response": {"status": "ok"}})).unwrap_err();
        assert!(matches!(err, AgreementError::Malformed(_)));
    }

    #[test]
    fn any_status_accepts_everything() {
        assert!(ExpectedStatus::Any.accepts(503));
        assert!(ExpectedStatus::Exact(200).accepts(200));
        assert!(!ExpectedStatus::Exact(200).accepts(404));
    }
}
