//! Maps a resolved request onto transport options.

use std::collections::BTreeMap;

use crate::agreement::ResolvedRequest;
use crate::content::canonical_header_name;
use crate::http::{RequestOptions, Scheme};

/// Where requests go when an agreement does not say otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            host: "localhost".to_string(),
            port: 80,
        }
    }
}

/// Build transport options for `request`, falling back to `context` for
/// scheme, host and port.
pub fn outgoing_request(request: &ResolvedRequest, context: &ClientContext) -> RequestOptions {
    RequestOptions {
        scheme: request.scheme.unwrap_or(context.scheme),
        host: request.host.clone().unwrap_or_else(|| context.host.clone()),
        port: request.port.unwrap_or(context.port),
        method: request.method,
        path: request.path.clone(),
        headers: dedup_headers(&request.headers),
    }
}

/// One entry per case-insensitive name. Managed headers take their canonical
/// casing, others keep the first casing seen; the last value wins.
pub(crate) fn dedup_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let existing = out
            .keys()
            .find(|known| known.eq_ignore_ascii_case(name))
            .cloned();
        let key = match (canonical_header_name(name), existing) {
            (Some(canonical), _) => canonical.to_string(),
            (None, Some(known)) => known,
            (None, None) => name.clone(),
        };
        out.retain(|known, _| !known.eq_ignore_ascii_case(&key));
        out.insert(key, value.clone());
    }
    out
}
