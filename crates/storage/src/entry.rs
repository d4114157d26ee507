use common::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An immutable `(key, value-or-absent)` pair produced by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry<K, V> {
    key:   K,
    value: Option<V>,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: Option<V>) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    pub fn into_key(self) -> K {
        self.key
    }

    pub fn into_value(self) -> Option<V> {
        self.value
    }
}

/// How long a written value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Whatever the cache is configured with.
    #[default]
    Default,
    Never,
    After(Duration),
}

impl Expiry {
    /// Zero-length lifetimes are rejected up front instead of silently
    /// turning a write into a no-op.
    pub fn validate(self) -> Result<Self> {
        match self {
            Self::After(ttl) if ttl.is_zero() => {
                Err(Error::contract("expiry duration must be greater than zero"))
            }
            other => Ok(other),
        }
    }

    pub fn resolve(self, default_ttl: Option<Duration>) -> Option<Duration> {
        match self {
            Self::Default => default_ttl,
            Self::Never => None,
            Self::After(ttl) => Some(ttl),
        }
    }
}

/// What an entry processor left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<V> {
    Unchanged,
    Set { value: V, expiry: Option<Expiry> },
    Removed,
}

/// The view of a single entry handed to an entry processor while the cache
/// holds that key.
#[derive(Debug)]
pub struct MutableEntry<K, V> {
    key:     K,
    value:   Option<V>,
    expiry:  Option<Expiry>,
    mutated: bool,
}

impl<K, V> MutableEntry<K, V> {
    pub fn new(key: K, value: Option<V>) -> Self {
        Self {
            key,
            value,
            expiry: None,
            mutated: false,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// Stores `value`, keeping the entry's current expiry.
    pub fn set_value(&mut self, value: V) -> Option<V> {
        self.mutated = true;
        self.value.replace(value)
    }

    pub fn set_value_with_expiry(&mut self, value: V, expiry: Expiry) -> Option<V> {
        self.expiry = Some(expiry);
        self.set_value(value)
    }

    /// Removes the entry, returning what it held.
    pub fn remove(&mut self) -> Option<V> {
        let prior = self.value.take();
        if prior.is_some() {
            self.mutated = true;
        }
        prior
    }

    pub fn into_mutation(self) -> Mutation<V> {
        if !self.mutated {
            return Mutation::Unchanged;
        }
        match self.value {
            Some(value) => Mutation::Set {
                value,
                expiry: self.expiry,
            },
            None => Mutation::Removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_entry_is_unchanged() {
        let entry = MutableEntry::new("k", Some(1));
        assert_eq!(entry.into_mutation(), Mutation::Unchanged);
    }

    #[test]
    fn test_removing_absent_entry_is_unchanged() {
        let mut entry = MutableEntry::<_, i32>::new("k", None);
        assert_eq!(entry.remove(), None);
        assert_eq!(entry.into_mutation(), Mutation::Unchanged);
    }

    #[test]
    fn test_set_then_remove_is_removed() {
        let mut entry = MutableEntry::new("k", Some(1));
        assert_eq!(entry.set_value(2), Some(1));
        assert_eq!(entry.remove(), Some(2));
        assert_eq!(entry.into_mutation(), Mutation::Removed);
    }

    #[test]
    fn test_set_with_expiry() {
        let ttl = Expiry::After(Duration::from_secs(5));
        let mut entry = MutableEntry::new("k", None);
        entry.set_value_with_expiry(7, ttl);
        assert_eq!(
            entry.into_mutation(),
            Mutation::Set {
                value:  7,
                expiry: Some(ttl),
            }
        );
    }

    #[test]
    fn test_zero_expiry_is_a_contract_violation() {
        let err = Expiry::After(Duration::ZERO).validate().unwrap_err();
        assert!(matches!(err, Error::ContractViolation(_)));
        assert!(Expiry::Never.validate().is_ok());
    }

    #[test]
    fn test_expiry_resolution() {
        let default = Some(Duration::from_secs(60));
        assert_eq!(Expiry::Default.resolve(default), default);
        assert_eq!(Expiry::Never.resolve(default), None);
        assert_eq!(
            Expiry::After(Duration::from_secs(1)).resolve(None),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_entry_serde() {
        let entry = Entry::new("alpha".to_owned(), Some(3));
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"key":"alpha","value":3}"#);
        let back: Entry<String, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
