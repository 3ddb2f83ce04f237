//! Static strategy registry: a catalogue of available strategies and the
//! factories that build fresh instances of them.
//!
//! Grounded on the teacher's plugin registry (insertion-ordered entries, a
//! `Fn() -> Box<dyn Strategy>` factory per entry, explicit non-singleton
//! construction) but keyed on the richer identity this system declares per
//! strategy (category/bar_interval/direction) instead of a bare timeframe.
//! A process builds one `StrategyRegistry` at startup (`pqp-cli`'s `main`)
//! and passes it explicitly to the Generator/Validator; there is no global.

use crate::Strategy;

/// A factory that produces a fresh strategy instance from its stored
/// `params`. Called once per instantiation (Validator's `DynamicInstantiate`
/// phase, the Backtester's per-candidate run) — never reused across calls,
/// since strategies may hold per-run mutable state.
pub type StrategyFactory = Box<dyn Fn(Option<&serde_json::Value>) -> Box<dyn Strategy> + Send + Sync>;

/// Static metadata for a registered strategy template.
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyMeta {
    pub name: String,
    pub category: String,
    pub description: String,
}

impl StrategyMeta {
    pub fn new(name: impl Into<String>, category: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: description.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateName { name: String },
    UnknownStrategy { name: String },
    EmptyName,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "strategy '{name}' is already registered"),
            Self::UnknownStrategy { name } => write!(f, "no strategy named '{name}' is registered"),
            Self::EmptyName => write!(f, "strategy name must not be empty"),
        }
    }
}

impl std::error::Error for RegistryError {}

struct RegistryEntry {
    meta: StrategyMeta,
    factory: StrategyFactory,
}

/// Catalogue of available strategy templates, keyed by name, preserving
/// insertion order for deterministic listing.
pub struct StrategyRegistry {
    entries: Vec<RegistryEntry>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn register<F>(&mut self, meta: StrategyMeta, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(Option<&serde_json::Value>) -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        if meta.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.contains(&meta.name) {
            return Err(RegistryError::DuplicateName { name: meta.name.clone() });
        }
        self.entries.push(RegistryEntry {
            meta,
            factory: Box::new(factory),
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.meta.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list(&self) -> Vec<&StrategyMeta> {
        self.entries.iter().map(|e| &e.meta).collect()
    }

    pub fn lookup(&self, name: &str) -> Result<&StrategyMeta, RegistryError> {
        self.entries
            .iter()
            .find(|e| e.meta.name == name)
            .map(|e| &e.meta)
            .ok_or_else(|| RegistryError::UnknownStrategy { name: name.to_string() })
    }

    /// Instantiate a fresh strategy with the given `params`. Each call
    /// produces a new instance — the factory is called anew every time.
    pub fn instantiate(&self, name: &str, params: Option<&serde_json::Value>) -> Result<Box<dyn Strategy>, RegistryError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.meta.name == name)
            .ok_or_else(|| RegistryError::UnknownStrategy { name: name.to_string() })?;
        Ok((entry.factory)(params))
    }

    pub fn deregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.meta.name != name);
        self.entries.len() < before
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::MovingAverageCross;

    fn registry_with_one() -> StrategyRegistry {
        let mut reg = StrategyRegistry::new();
        reg.register(
            StrategyMeta::new("ma_cross", "MOM", "moving-average crossover"),
            |params| Box::new(MovingAverageCross::from_params(params)),
        )
        .unwrap();
        reg
    }

    #[test]
    fn register_then_instantiate_round_trips() {
        let reg = registry_with_one();
        assert!(reg.contains("ma_cross"));
        let strategy = reg.instantiate("ma_cross", None).unwrap();
        assert_eq!(strategy.category(), "MOM");
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut reg = registry_with_one();
        let err = reg
            .register(StrategyMeta::new("ma_cross", "MOM", "dup"), |params| {
                Box::new(MovingAverageCross::from_params(params))
            })
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName { name: "ma_cross".into() });
    }

    #[test]
    fn unknown_name_rejected() {
        let reg = registry_with_one();
        assert!(matches!(reg.instantiate("nope", None), Err(RegistryError::UnknownStrategy { .. })));
    }

    #[test]
    fn empty_name_rejected() {
        let mut reg = StrategyRegistry::new();
        let err = reg
            .register(StrategyMeta::new("  ", "MOM", "x"), |params| {
                Box::new(MovingAverageCross::from_params(params))
            })
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let mut reg = StrategyRegistry::new();
        for name in ["a", "b", "c"] {
            reg.register(StrategyMeta::new(name, "MOM", "x"), |params| {
                Box::new(MovingAverageCross::from_params(params))
            })
            .unwrap();
        }
        let names: Vec<_> = reg.list().into_iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn deregister_removes_entry() {
        let mut reg = registry_with_one();
        assert!(reg.deregister("ma_cross"));
        assert!(!reg.contains("ma_cross"));
        assert!(!reg.deregister("ma_cross"));
    }
}
