//! Header-based body classification.

use std::collections::BTreeMap;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// True when the canonical `Content-Type` header is exactly `application/json`.
pub fn is_content_json(headers: Option<&BTreeMap<String, String>>) -> bool {
    declared(headers) == Some(APPLICATION_JSON)
}

/// True when the canonical `Content-Type` header is exactly
/// `application/x-www-form-urlencoded`.
pub fn is_form_url_encoded(headers: Option<&BTreeMap<String, String>>) -> bool {
    declared(headers) == Some(FORM_URL_ENCODED)
}

fn declared(headers: Option<&BTreeMap<String, String>>) -> Option<&str> {
    headers?.get(CONTENT_TYPE).map(String::as_str)
}

/// Canonical casing for the headers this crate manages itself; `None` for
/// everything else.
pub fn canonical_header_name(name: &str) -> Option<&'static str> {
    if name.eq_ignore_ascii_case(CONTENT_TYPE) {
        Some(CONTENT_TYPE)
    } else if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
        Some(CONTENT_LENGTH)
    } else {
        None
    }
}

/// Whether a response content type denotes a JSON document, ignoring
/// parameters such as `charset`.
pub fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == APPLICATION_JSON || essence.ends_with("+json")
}
