use std::collections::BTreeMap;

mod error;
mod impls;

/// Ordered map interface.
///
/// - Keys are unique.
/// - `put` overwrites the existing value and returns the old one.
/// - Misses are reported as `None`, never as errors.
pub trait OrderedMap {
    type Key: Ord;
    type Value;

    fn new() -> Self;

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn get(&self, key: &Self::Key) -> Option<&Self::Value>;

    fn contains(&self, key: &Self::Key) -> bool {
        self.get(key).is_some()
    }

    fn put(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    fn delete(&mut self, key: &Self::Key) -> Option<Self::Value>;

    fn clear(&mut self);
}

pub use error::InvariantViolation;
pub use impls::LlrbMap;

/// The standard library B-tree, used as the benchmark baseline.
impl<K: Ord, V> OrderedMap for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn new() -> Self {
        BTreeMap::new()
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn get(&self, key: &K) -> Option<&V> {
        BTreeMap::get(self, key)
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        self.insert(key, value)
    }

    fn delete(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }

    fn clear(&mut self) {
        BTreeMap::clear(self);
    }
}
