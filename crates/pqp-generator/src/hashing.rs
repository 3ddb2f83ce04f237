//! `base_code_hash` (§4.2): a SHA-256 digest over a candidate's identity —
//! its template name plus canonicalised params — with tunable numeric
//! literals stripped first. Two parametric-expansion children of the same
//! template hash identically even though their concrete `sl_pct`/`tp_pct`
//! values differ; `pqp_db::strategies::count_by_base_code_hash` uses that
//! to cap how many live variants of one underlying template are allowed.

use sha2::{Digest, Sha256};

const PLACEHOLDER: char = '#';

/// Replaces every maximal run of ASCII digits (and an immediately adjoining
/// `.` between two digit runs) with a single [`PLACEHOLDER`] token, so
/// `"fast=10,slow=30"` and `"fast=12,slow=45"` collapse to the same string.
fn strip_numeric_literals(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            out.push(PLACEHOLDER);
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || (chars[i] == '.' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()))) {
                i += 1;
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Canonical (sorted-key) JSON text for `params`, or `""` if absent.
fn canonical_params(params: Option<&serde_json::Value>) -> String {
    params.map(sort_value).map(|v| v.to_string()).unwrap_or_default()
}

fn sort_value(v: &serde_json::Value) -> serde_json::Value {
    use serde_json::{Map, Value};
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut sorted = Map::new();
            for k in keys {
                sorted.insert(k.clone(), sort_value(&map[&k]));
            }
            Value::Object(sorted)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        other => other.clone(),
    }
}

/// `base_code_hash(template_name, params)`: hex-encoded SHA-256 over
/// `"{template_name}|{canonical params, numerics stripped}"`.
pub fn base_code_hash(template_name: &str, params: Option<&serde_json::Value>) -> String {
    let canonical = canonical_params(params);
    let identity = format!("{template_name}|{}", strip_numeric_literals(&canonical));

    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_template_different_literals_hash_the_same() {
        let a = base_code_hash("ma_cross", Some(&json!({"fast": 10, "slow": 30})));
        let b = base_code_hash("ma_cross", Some(&json!({"fast": 12, "slow": 45})));
        assert_eq!(a, b);
    }

    #[test]
    fn different_templates_hash_differently() {
        let a = base_code_hash("ma_cross", Some(&json!({"fast": 10, "slow": 30})));
        let b = base_code_hash("rsi_reversal", Some(&json!({"fast": 10, "slow": 30})));
        assert_ne!(a, b);
    }

    #[test]
    fn key_order_does_not_affect_the_hash() {
        let a = base_code_hash("ma_cross", Some(&json!({"fast": 10, "slow": 30})));
        let b = base_code_hash("ma_cross", Some(&json!({"slow": 30, "fast": 10})));
        assert_eq!(a, b);
    }

    #[test]
    fn no_params_is_stable() {
        let a = base_code_hash("ma_cross", None);
        let b = base_code_hash("ma_cross", None);
        assert_eq!(a, b);
    }
}
