//! Name-keyed store of type composers.
//!
//! `TypeStorage` is the registry behind a [`SchemaComposer`](crate::SchemaComposer).
//! Iteration follows insertion order.

use indexmap::IndexMap;

use crate::error::ComposeError;
use crate::Result;

/// Values that can report their own registry key.
pub trait HasTypeName {
    /// Returns the name used as key by [`TypeStorage::add`], if one can be inferred.
    fn type_name_hint(&self) -> Option<String>;
}

/// Insertion-ordered map from type names to values.
#[derive(Debug, Clone)]
pub struct TypeStorage<V> {
    types: IndexMap<String, V>,
}

impl<V> Default for TypeStorage<V> {
    fn default() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }
}

impl<V: Clone> TypeStorage<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<V> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| ComposeError::type_not_found(name))
    }

    /// Returns a reference to the value registered under `name`, if any.
    pub fn get_ref(&self, name: &str) -> Option<&V> {
        self.types.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Stores `value` under `name`, overwriting any previous entry.
    pub fn set(&mut self, name: impl Into<String>, value: V) -> &mut Self {
        self.types.insert(name.into(), value);
        self
    }

    /// Removes the entry under `name`, keeping the order of the others.
    pub fn delete(&mut self, name: &str) -> Option<V> {
        self.types.shift_remove(name)
    }

    /// Returns the existing value for `name`, or stores and returns `value`.
    pub fn get_or_set(&mut self, name: &str, value: V) -> V {
        self.types
            .entry(name.to_string())
            .or_insert(value)
            .clone()
    }

    /// Returns the existing value for `name`; on a miss evaluates `make` once
    /// and stores its result only when it produced a value.
    pub fn get_or_set_with<F>(&mut self, name: &str, make: F) -> Option<V>
    where
        F: FnOnce() -> Option<V>,
    {
        if let Some(existing) = self.types.get(name) {
            return Some(existing.clone());
        }

        let value = make()?;
        self.types.insert(name.to_string(), value.clone());
        Some(value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.types.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.types.values()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &V)> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn clear(&mut self) {
        self.types.clear();
    }
}

impl<V: Clone + HasTypeName> TypeStorage<V> {
    /// Stores `value` under the name it reports.
    ///
    /// Returns the key used, or `None` (storing nothing) if no name can be inferred.
    pub fn add(&mut self, value: V) -> Option<String> {
        let name = value.type_name_hint()?;
        self.types.insert(name.clone(), value);
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Named(Option<&'static str>);

    impl HasTypeName for Named {
        fn type_name_hint(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let storage: TypeStorage<Named> = TypeStorage::new();
        let err = storage.get("User").unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_set_chains_and_overwrites() {
        let mut storage = TypeStorage::new();
        storage.set("A", Named(Some("A"))).set("A", Named(Some("B")));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get("A").unwrap(), Named(Some("B")));
    }

    #[test]
    fn test_get_or_set_with_evaluates_only_on_miss() {
        let mut storage = TypeStorage::new();
        let calls = Cell::new(0);

        let first = storage.get_or_set_with("A", || {
            calls.set(calls.get() + 1);
            Some(Named(Some("A")))
        });
        let second = storage.get_or_set_with("A", || {
            calls.set(calls.get() + 1);
            Some(Named(Some("other")))
        });

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_get_or_set_with_empty_result_leaves_miss() {
        let mut storage: TypeStorage<Named> = TypeStorage::new();
        assert!(storage.get_or_set_with("A", || None).is_none());
        assert!(!storage.has("A"));
    }

    #[test]
    fn test_add_infers_key() {
        let mut storage = TypeStorage::new();
        assert_eq!(storage.add(Named(Some("User"))), Some("User".to_string()));
        assert_eq!(storage.add(Named(None)), None);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut storage = TypeStorage::new();
        storage.set("b", Named(None)).set("a", Named(None)).set("c", Named(None));
        storage.delete("a");
        let keys: Vec<_> = storage.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }
}
