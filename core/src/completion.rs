//! Agreement completion: raw agreement in, fully resolved agreement out.
//!
//! # Defaults
//! | field              | default                                   |
//! |--------------------|-------------------------------------------|
//! | `request.method`   | `GET`                                     |
//! | `request.path`     | `/` (a leading `/` is always added)       |
//! | `request.headers`  | option defaults, `Content-Type: application/json` |
//! | `request.body`     | none                                      |
//! | `request.values`   | option values                             |
//! | `response.status`  | [`ExpectedStatus::Any`]                   |
//! | `response.headers` | none expected                             |
//! | `response.body`    | not compared                              |
//! | `response.schema`  | none                                      |
//!
//! Completion never mutates its input and is idempotent:
//! completing `resolved.to_agreement()` yields `resolved` again.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::agreement::{
    Agreement, ExpectedResponse, ExpectedStatus, RawRequest, RawResponse, RequestTemplate,
    ResolvedAgreement, ResolvedRequest, ResponseTemplate, SchemaRef,
};
use crate::content::{canonical_header_name, APPLICATION_JSON, CONTENT_TYPE};
use crate::error::CompletionError;
use crate::http::HttpMethod;
use crate::schema::{JsonSchemaValidator, SchemaValidator};
use crate::template::{format, format_str, text};

/// Client-wide defaults merged under every agreement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub default_headers: BTreeMap<String, String>,
    pub values: Map<String, Value>,
}

/// Complete one agreement against `base_path`.
pub fn complete(
    agreement: &Agreement,
    base_path: &Path,
    options: &CompletionOptions,
) -> Result<ResolvedAgreement, CompletionError> {
    let request = complete_request(&agreement.request, options)?;
    let response = complete_response(&agreement.response, &request.values, base_path)?;
    debug!(method = %request.method, path = %request.path, "agreement completed");
    Ok(ResolvedAgreement { request, response })
}

/// Complete every agreement, failing on the first one that cannot be resolved.
pub fn complete_all(
    agreements: &[Agreement],
    base_path: &Path,
    options: &CompletionOptions,
) -> Result<Vec<ResolvedAgreement>, CompletionError> {
    agreements
        .iter()
        .map(|agreement| complete(agreement, base_path, options))
        .collect()
}

fn complete_request(
    request: &RawRequest,
    options: &CompletionOptions,
) -> Result<ResolvedRequest, CompletionError> {
    let values = overlay(&options.values, request.values.as_ref());
    let method = match request.method.as_deref() {
        Some(method) => method.parse()?,
        None => HttpMethod::Get,
    };

    let path_template = request.path.clone().unwrap_or_else(|| "/".to_string());
    let mut path = format_str(&path_template, &values)?;
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    if let Some(query) = request.query.as_ref().filter(|query| !query.is_empty()) {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in query {
            serializer.append_pair(key, &text(&format(value, &values)?));
        }
        path.push(if path.contains('?') { '&' } else { '?' });
        path.push_str(&serializer.finish());
    }

    let header_templates = merge_headers(&options.default_headers, request.headers.as_ref());
    let mut headers = BTreeMap::new();
    for (name, value) in &header_templates {
        headers.insert(name.clone(), format_str(value, &values)?);
    }

    Ok(ResolvedRequest {
        method,
        path,
        headers,
        body: request.body.clone().filter(|body| !body.is_null()),
        values,
        scheme: request.scheme,
        host: request.host.clone(),
        port: request.port,
        template: RequestTemplate {
            path: path_template,
            query: request.query.clone(),
            headers: header_templates,
        },
    })
}

fn complete_response(
    response: &RawResponse,
    request_values: &Map<String, Value>,
    base_path: &Path,
) -> Result<ExpectedResponse, CompletionError> {
    let values = overlay(request_values, response.values.as_ref());
    let status = response
        .status
        .map_or(ExpectedStatus::Any, ExpectedStatus::Exact);

    let mut headers = BTreeMap::new();
    for (name, value) in response.headers.iter().flatten() {
        headers.insert(name.to_ascii_lowercase(), format_str(value, &values)?);
    }

    let body = match &response.body {
        Some(body) => Some(format(body, &values)?),
        None => None,
    };

    Ok(ExpectedResponse {
        status,
        headers,
        body,
        schema: resolve_schema(response.schema.as_ref(), base_path)?,
        template: ResponseTemplate {
            headers: response.headers.clone(),
            body: response.body.clone(),
            values: response.values.clone(),
        },
    })
}

/// Merge agreement headers over the defaults, values still unformatted.
/// `Content-Type` is stored once under its canonical name and defaults to
/// `application/json`.
fn merge_headers(
    defaults: &BTreeMap<String, String>,
    given: Option<&BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in defaults.iter().chain(given.into_iter().flatten()) {
        let name = canonical_header_name(name).map_or_else(|| name.clone(), str::to_string);
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        headers.insert(name, value.clone());
    }
    headers
        .entry(CONTENT_TYPE.to_string())
        .or_insert_with(|| APPLICATION_JSON.to_string());
    headers
}

fn resolve_schema(
    schema: Option<&SchemaRef>,
    base_path: &Path,
) -> Result<Option<Value>, CompletionError> {
    let schema = match schema {
        None => return Ok(None),
        Some(SchemaRef::Inline(schema)) => schema.clone(),
        Some(SchemaRef::Path(relative)) => {
            let path = base_path.join(relative);
            let raw = fs::read_to_string(&path).map_err(|err| CompletionError::Resolution {
                path: path.clone(),
                reason: err.to_string(),
            })?;
            serde_json::from_str(&raw).map_err(|err| CompletionError::Resolution {
                path,
                reason: err.to_string(),
            })?
        }
    };
    JsonSchemaValidator
        .check_schema(&schema)
        .map_err(CompletionError::InvalidSchema)?;
    Ok(Some(schema))
}

fn overlay(base: &Map<String, Value>, top: Option<&Map<String, Value>>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in top.into_iter().flatten() {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use serde_json::json;

    fn agreement(value: Value) -> Agreement {
        Agreement::from_value(value).unwrap()
    }

    fn resolve(value: Value) -> ResolvedAgreement {
        complete(&agreement(value), Path::new("."), &CompletionOptions::default()).unwrap()
    }

    #[test]
    fn empty_agreement_gets_every_default() {
        let resolved = resolve(json!({}));
        assert_eq!(resolved.request.method, HttpMethod::Get);
        assert_eq!(resolved.request.path, "/");
        assert_eq!(
            resolved.request.headers,
            BTreeMap::from([(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())])
        );
        assert!(resolved.request.body.is_none());
        assert!(resolved.request.values.is_empty());
        assert_eq!(resolved.response.status, ExpectedStatus::Any);
        assert!(resolved.response.body.is_none());
        assert!(resolved.response.schema.is_none());
    }

    #[test]
    fn lower_case_content_type_is_stored_once_canonically() {
        let resolved = resolve(json!({
            "request": {"headers": {"content-type": "text/plain", "X-Trace": "1"}}
        }));
        assert_eq!(resolved.request.headers.get("Content-Type").unwrap(), "text/plain");
        assert!(!resolved.request.headers.contains_key("content-type"));
        assert_eq!(resolved.request.headers.len(), 2);
    }

    #[test]
    fn agreement_headers_override_defaults_case_insensitively() {
        let options = CompletionOptions {
            default_headers: BTreeMap::from([
                ("accept".to_string(), "*/*".to_string()),
                ("Content-Type".to_string(), "text/plain".to_string()),
            ]),
            values: Map::new(),
        };
        let raw = agreement(json!({
            "request": {"headers": {"Accept": "application/json", "CONTENT-TYPE": "application/xml"}}
        }));
        let resolved = complete(&raw, Path::new("."), &options).unwrap();
        assert_eq!(
            resolved.request.headers,
            BTreeMap::from([
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/xml".to_string()),
            ])
        );
    }

    #[test]
    fn path_and_query_are_templated() {
        let resolved = resolve(json!({
            "request": {
                "method": "delete",
                "path": "users/{{id}}",
                "query": {"force": true, "reason": "{{why}}"},
                "values": {"id": 7, "why": "clean up"}
            }
        }));
        assert_eq!(resolved.request.method, HttpMethod::Delete);
        assert_eq!(resolved.request.path, "/users/7?force=true&reason=clean+up");
    }

    #[test]
    fn request_body_stays_a_template() {
        let resolved = resolve(json!({
            "request": {"body": {"id": "{{userId}}"}, "values": {"userId": "42"}}
        }));
        assert_eq!(resolved.request.body, Some(json!({"id": "{{userId}}"})));
    }

    #[test]
    fn response_body_is_formatted_with_request_and_response_values() {
        let resolved = resolve(json!({
            "request": {"values": {"id": "42", "name": "Ada"}},
            "response": {
                "status": 200,
                "body": {"id": "{{id}}", "name": "{{name}}"},
                "values": {"name": "Grace"}
            }
        }));
        assert_eq!(resolved.response.status, ExpectedStatus::Exact(200));
        assert_eq!(resolved.response.body, Some(json!({"id": "42", "name": "Grace"})));
    }

    #[test]
    fn option_values_are_overridden_by_agreement_values() {
        let options = CompletionOptions {
            default_headers: BTreeMap::new(),
            values: json!({"host": "a", "user": "root"}).as_object().cloned().unwrap(),
        };
        let raw = agreement(json!({"request": {"values": {"user": "ada"}}}));
        let resolved = complete(&raw, Path::new("."), &options).unwrap();
        assert_eq!(resolved.request.values["host"], "a");
        assert_eq!(resolved.request.values["user"], "ada");
    }

    #[test]
    fn missing_placeholder_value_fails() {
        let raw = agreement(json!({"response": {"body": {"id": "{{nope}}"}}}));
        let err = complete(&raw, Path::new("."), &CompletionOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CompletionError::Template(TemplateError::MissingValue { name }) if name == "nope"
        ));
    }

    #[test]
    fn unknown_method_fails() {
        let raw = agreement(json!({"request": {"method": "BREW"}}));
        let err = complete(&raw, Path::new("."), &CompletionOptions::default()).unwrap_err();
        assert!(matches!(err, CompletionError::InvalidMethod(_)));
    }

    #[test]
    fn schema_path_resolves_against_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("user.schema.json"), r#"{"type":"object"}"#).unwrap();
        let raw = agreement(json!({"response": {"schema": "user.schema.json"}}));
        let resolved = complete(&raw, dir.path(), &CompletionOptions::default()).unwrap();
        assert_eq!(resolved.response.schema, Some(json!({"type": "object"})));
    }

    #[test]
    fn missing_schema_file_is_a_resolution_failure() {
        let dir = tempfile::tempdir().unwrap();
        let raw = agreement(json!({"response": {"schema": "./missing.json"}}));
        let err = complete(&raw, dir.path(), &CompletionOptions::default()).unwrap_err();
        assert!(matches!(err, CompletionError::Resolution { path, .. } if path.ends_with("missing.json")));
    }

    #[test]
    fn uncompilable_schema_is_rejected() {
        let raw = agreement(json!({"response": {"schema": {"type": 5}}}));
        let err = complete(&raw, Path::new("."), &CompletionOptions::default()).unwrap_err();
        assert!(matches!(err, CompletionError::InvalidSchema(_)));
    }

    #[test]
    fn completion_is_idempotent() {
        let raw = agreement(json!({
            "request": {
                "method": "post",
                "path": "users",
                "query": {"dry": 1},
                "headers": {"content-type": "application/json", "X-Id": "{{id}}"},
                "body": {"id": "{{id}}"},
                "values": {"id": "9"}
            },
            "response": {
                "status": 201,
                "headers": {"Content-Type": "application/json"},
                "body": {"id": "{{id}}"},
                "schema": {"type": "object"}
            }
        }));
        let options = CompletionOptions::default();
        let once = complete(&raw, Path::new("."), &options).unwrap();
        let twice = complete(&once.to_agreement(), Path::new("."), &options).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn values_containing_placeholder_syntax_are_substituted_once() {
        let raw = agreement(json!({
            "request": {
                "path": "/t/{{p}}",
                "query": {"q": "{{p}}"},
                "headers": {"X-P": "{{p}}"},
                "values": {"p": "{{q}}"}
            },
            "response": {
                "headers": {"X-P": "{{p}}"},
                "body": {"msg": "{{p}}"},
                "values": {"extra": "{{nope}}"}
            }
        }));
        let options = CompletionOptions::default();
        let once = complete(&raw, Path::new("."), &options).unwrap();
        assert_eq!(once.request.path, "/t/{{q}}?q=%7B%7Bq%7D%7D");
        assert_eq!(once.request.headers["X-P"], "{{q}}");
        assert_eq!(once.response.headers["x-p"], "{{q}}");
        assert_eq!(once.response.body, Some(json!({"msg": "{{q}}"})));

        let twice = complete(&once.to_agreement(), Path::new("."), &options).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn recompletion_keeps_default_headers_and_response_values() {
        let options = CompletionOptions {
            default_headers: BTreeMap::from([("accept".to_string(), "{{fmt}}".to_string())]),
            values: json!({"fmt": "text/csv"}).as_object().cloned().unwrap(),
        };
        let raw = agreement(json!({
            "request": {"path": "users"},
            "response": {"body": "{{greeting}}", "values": {"greeting": "hi"}}
        }));
        let once = complete(&raw, Path::new("."), &options).unwrap();
        assert_eq!(once.request.headers["accept"], "text/csv");
        assert_eq!(once.response.body, Some(json!("hi")));

        let twice = complete(&once.to_agreement(), Path::new("."), &options).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn input_is_not_mutated() {
        let raw = agreement(json!({"request": {"headers": {"content-type": "text/plain"}}}));
        let before = raw.clone();
        complete_all(std::slice::from_ref(&raw), Path::new("."), &CompletionOptions::default())
            .unwrap();
        assert_eq!(raw, before);
    }
}
