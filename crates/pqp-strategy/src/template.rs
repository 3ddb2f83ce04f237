//! Template-parameter expansion: the full cross-product over a template's
//! parameter grid, deduplicated by parameter hash (§8's idempotence law —
//! two generator workers racing to expand the same template must produce
//! the union without duplicates).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::{Map, Value};

/// One tunable parameter and its candidate values.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamAxis {
    pub name: String,
    pub values: Vec<Value>,
}

impl ParamAxis {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self { name: name.into(), values }
    }
}

/// A template's full parameter grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamGrid {
    axes: Vec<ParamAxis>,
}

impl ParamGrid {
    pub fn new(axes: Vec<ParamAxis>) -> Self {
        Self { axes }
    }

    /// The full cross-product, one `Value::Object` per combination, in
    /// deterministic axis-then-value order.
    pub fn expand(&self) -> Vec<Value> {
        let mut combos: Vec<Vec<(String, Value)>> = vec![Vec::new()];
        for axis in &self.axes {
            let mut next = Vec::with_capacity(combos.len() * axis.values.len().max(1));
            for combo in &combos {
                for v in &axis.values {
                    let mut c = combo.clone();
                    c.push((axis.name.clone(), v.clone()));
                    next.push(c);
                }
            }
            combos = next;
        }
        combos
            .into_iter()
            .map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>()))
            .collect()
    }
}

/// Deterministic dedupe key for a parameter set: canonicalised (keys sorted
/// recursively) then hashed. Used as the `BTreeSet<u64>` seen-set entry so
/// repeated expansion of the same template never double-enqueues a
/// combination already generated, racing workers included.
pub fn param_hash(params: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    canonical_string(params).hash(&mut hasher);
    hasher.finish()
}

fn canonical_string(v: &Value) -> String {
    sort_value(v).to_string()
}

fn sort_value(v: &Value) -> Value {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn expand_is_full_cross_product() {
        let grid = ParamGrid::new(vec![
            ParamAxis::new("sl_pct", vec![json!(1.0), json!(2.0)]),
            ParamAxis::new("tp_pct", vec![json!(3.0), json!(4.0), json!(5.0)]),
        ]);
        let combos = grid.expand();
        assert_eq!(combos.len(), 6);
    }

    #[test]
    fn empty_grid_expands_to_one_empty_combo() {
        let grid = ParamGrid::new(vec![]);
        assert_eq!(grid.expand(), vec![Value::Object(Map::new())]);
    }

    #[test]
    fn param_hash_ignores_key_order() {
        let a = json!({"sl_pct": 1.0, "tp_pct": 3.0});
        let b = json!({"tp_pct": 3.0, "sl_pct": 1.0});
        assert_eq!(param_hash(&a), param_hash(&b));
    }

    #[test]
    fn param_hash_distinguishes_different_values() {
        let a = json!({"sl_pct": 1.0});
        let b = json!({"sl_pct": 1.5});
        assert_ne!(param_hash(&a), param_hash(&b));
    }

    #[test]
    fn seen_set_dedupes_racing_expansions() {
        let grid = ParamGrid::new(vec![ParamAxis::new("sl_pct", vec![json!(1.0), json!(2.0)])]);
        let worker_a = grid.expand();
        let worker_b = grid.expand();
        let mut seen: BTreeSet<u64> = BTreeSet::new();
        let mut enqueued = 0;
        for params in worker_a.iter().chain(worker_b.iter()) {
            if seen.insert(param_hash(params)) {
                enqueued += 1;
            }
        }
        assert_eq!(enqueued, 2, "union of two identical expansions must not duplicate");
    }
}
