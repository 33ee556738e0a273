use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of checking one response against its agreement.
///
/// `diff` maps a field (`status`, `schema`, `headers.<name>` or a body path
/// such as `items[0].id`) to `[expected, actual]`. An empty diff means the
/// response honoured the agreement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub diff: BTreeMap<String, [Value; 2]>,
}

impl CheckResult {
    pub fn is_match(&self) -> bool {
        self.diff.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[Value; 2]> {
        self.diff.get(key)
    }

    /// Record a mismatch. An existing entry for `key` is never overwritten;
    /// returns whether the entry was added.
    pub fn record(&mut self, key: impl Into<String>, expected: Value, actual: Value) -> bool {
        let key = key.into();
        if self.diff.contains_key(&key) {
            return false;
        }
        self.diff.insert(key, [expected, actual]);
        true
    }

    /// Fold `other` into `self`, keeping entries already present.
    pub fn merge(&mut self, other: CheckResult) {
        for (key, entry) in other.diff {
            self.diff.entry(key).or_insert(entry);
        }
    }
}
