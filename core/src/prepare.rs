//! Request setup: decides the wire body, `Content-Type` and `Content-Length`
//! of a resolved agreement.
//!
//! The body template is formatted with the agreement's values regardless of
//! content type. A JSON request is then serialized as compact JSON, a string
//! body goes out as is, a form-urlencoded object is form encoded, and any other
//! structured body falls back to JSON text.

use serde_json::Value;
use tracing::debug;

use crate::agreement::ResolvedAgreement;
use crate::content::{
    is_content_json, is_form_url_encoded, APPLICATION_JSON, CONTENT_LENGTH, CONTENT_TYPE,
};
use crate::error::PrepareError;
use crate::extract::{outgoing_request, ClientContext};
use crate::http::PreparedRequest;
use crate::template::{format, text};

/// Assemble the transport request for `agreement`.
pub fn setup(
    agreement: &ResolvedAgreement,
    context: &ClientContext,
) -> Result<PreparedRequest, PrepareError> {
    let request = &agreement.request;
    let mut options = outgoing_request(request, context);

    let content = match &request.body {
        Some(template) => {
            let body = format(template, &request.values)?;
            Some(encode(body, &request.headers)?)
        }
        None => None,
    };
    let content_length = content.as_ref().map_or(0, String::len);

    // outgoing_request already folded every casing of the name into CONTENT_TYPE.
    options
        .headers
        .entry(CONTENT_TYPE.to_string())
        .or_insert_with(|| APPLICATION_JSON.to_string());
    options
        .headers
        .insert(CONTENT_LENGTH.to_string(), content_length.to_string());

    debug!(
        method = %options.method,
        url = %options.url(),
        content_length,
        "request prepared"
    );
    Ok(PreparedRequest {
        options,
        content,
        content_length,
    })
}

fn encode(
    body: Value,
    headers: &std::collections::BTreeMap<String, String>,
) -> Result<String, PrepareError> {
    if is_content_json(Some(headers)) {
        return Ok(serde_json::to_string(&body)?);
    }
    match body {
        Value::String(s) => Ok(s),
        body if is_form_url_encoded(Some(headers)) => encode_form(&body),
        body => Ok(serde_json::to_string(&body)?),
    }
}

fn encode_form(body: &Value) -> Result<String, PrepareError> {
    let Value::Object(fields) = body else {
        return Err(PrepareError::FormBody(body.to_string()));
    };
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        if value.is_object() || value.is_array() {
            return Err(PrepareError::FormBody(format!("field `{key}` is not a scalar")));
        }
        serializer.append_pair(key, &text(value));
    }
    Ok(serializer.finish())
}
