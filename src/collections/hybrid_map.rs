use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    hash::Hash,
    mem,
    sync::Arc,
};

use itertools::Either;

/// The storage of a [`HybridMap`].
#[derive(Clone)]
enum Repr<K, V> {
    /// No entries. Owns no storage, so every empty map is equivalent to every other.
    Empty,
    /// Exactly one entry, stored inline.
    Single(K, V),
    /// Any number of entries in a hash table that may be shared with clones of this map.
    /// Writes go through [`Arc::make_mut`].
    Large(Arc<HashMap<K, V>>),
}

impl<K, V> Default for Repr<K, V> {
    fn default() -> Self {
        Self::Empty
    }
}

/// A map optimized for zero or one entries.
///
/// Up to one entry is stored inline. Inserting a second distinct key upgrades the map to a
/// hash table permanently; removing entries afterwards does not downgrade it.
///
/// Cloning is cheap: the hash table of a large map is shared between the clone and the source
/// until either of them is written to, at which point the writer takes a private copy.
/// A clone is therefore always logically independent of its source.
pub struct HybridMap<K, V> {
    repr: Repr<K, V>,
}

impl<K, V> HybridMap<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self { repr: Repr::Empty }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Empty => 0,
            Repr::Single(..) => 1,
            Repr::Large(map) => map.len(),
        }
    }

    /// Checks whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the entries.
    /// The order is unspecified but does not change as long as the map is not modified.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        match &self.repr {
            Repr::Empty => Either::Left(None.into_iter()),
            Repr::Single(key, value) => Either::Left(Some((key, value)).into_iter()),
            Repr::Large(map) => Either::Right(map.iter()),
        }
    }

    /// Iterates over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Checks whether both maps currently read from the same hash table.
    #[cfg(test)]
    pub(crate) fn shares_storage_with(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Large(lhs), Repr::Large(rhs)) => Arc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl<K, V> HybridMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Returns the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.repr {
            Repr::Single(k, v) if k == key => Some(v),
            Repr::Empty | Repr::Single(..) => None,
            Repr::Large(map) => map.get(key),
        }
    }

    /// Checks whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Associates `value` with `key`, returning the previously associated value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.repr {
            Repr::Empty => {
                self.repr = Repr::Single(key, value);
                None
            }
            Repr::Single(ref k, ref mut v) if *k == key => Some(mem::replace(v, value)),
            Repr::Single(..) => {
                let mut map = HashMap::with_capacity(4);
                if let Repr::Single(k, v) = mem::take(&mut self.repr) {
                    map.insert(k, v);
                }
                map.insert(key, value);
                self.repr = Repr::Large(Arc::new(map));
                None
            }
            Repr::Large(ref mut map) => Arc::make_mut(map).insert(key, value),
        }
    }

    /// Removes `key`, returning the value that was associated with it.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        match self.repr {
            Repr::Single(ref k, _) if k == key => {
                let Repr::Single(_, value) = mem::take(&mut self.repr) else {
                    return None;
                };
                Some(value)
            }
            Repr::Empty | Repr::Single(..) => None,
            // Looking up first keeps a shared table shared when there is nothing to remove.
            Repr::Large(ref mut map) if map.contains_key(key) => Arc::make_mut(map).remove(key),
            Repr::Large(_) => None,
        }
    }

    /// Removes all entries. A large map keeps its (now private) hash table.
    pub fn clear(&mut self) {
        match self.repr {
            Repr::Empty => {}
            Repr::Single(..) => self.repr = Repr::Empty,
            Repr::Large(ref mut map) => match Arc::get_mut(map) {
                Some(owned) => owned.clear(),
                None => *map = Arc::default(),
            },
        }
    }
}

impl<K, V> Default for HybridMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for HybridMap<K, V>
where
    K: Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        Self {
            repr: self.repr.clone(),
        }
    }
}

impl<K, V> Debug for HybridMap<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> PartialEq for HybridMap<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|it| it == value))
    }
}

impl<K, V> Eq for HybridMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Eq + Clone,
{
}

impl<K, V> FromIterator<(K, V)> for HybridMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for HybridMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_entry_stays_inline() {
        let mut map = HybridMap::new();
        assert_eq!(map.insert(1, "a"), None);
        assert_eq!(map.insert(1, "b"), Some("a"));
        assert!(matches!(map.repr, Repr::Single(1, "b")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn second_key_upgrades() {
        let mut map = HybridMap::new();
        map.insert(1, ());
        map.insert(2, ());
        assert!(matches!(map.repr, Repr::Large(_)));
        map.remove(&1);
        map.remove(&2);
        assert!(map.is_empty());
        assert!(matches!(map.repr, Repr::Large(_)));
    }

    #[test]
    fn clone_shares_until_written() {
        let source: HybridMap<_, _> = (0..8).map(|it| (it, it * 2)).collect();
        let mut copy = source.clone();
        assert!(copy.shares_storage_with(&source));

        assert_eq!(copy.remove(&100), None);
        assert!(copy.shares_storage_with(&source));

        copy.insert(3, 42);
        assert!(!copy.shares_storage_with(&source));
        assert_eq!(source.get(&3), Some(&6));
        assert_eq!(copy.get(&3), Some(&42));
    }

    #[test]
    fn clear_does_not_leak_into_clone() {
        let mut source: HybridMap<_, _> = (0..4).map(|it| (it, ())).collect();
        let copy = source.clone();
        source.clear();
        assert!(source.is_empty());
        assert_eq!(copy.len(), 4);
    }

    #[test]
    fn equality_ignores_representation() {
        let mut large: HybridMap<_, _> = [(1, 'x'), (2, 'y')].into_iter().collect();
        large.remove(&2);
        let mut single = HybridMap::new();
        single.insert(1, 'x');
        assert_eq!(large, single);
        assert_ne!(single, HybridMap::new());
    }

    proptest! {
        #[test]
        fn behaves_like_hash_map(
            ops in prop::collection::vec((any::<bool>(), 0u8..6, any::<u16>()), 0..64)
        ) {
            let mut map = HybridMap::new();
            let mut model = HashMap::new();
            for (is_insert, key, value) in ops {
                if is_insert {
                    prop_assert_eq!(map.insert(key, value), model.insert(key, value));
                } else {
                    prop_assert_eq!(map.remove(&key), model.remove(&key));
                }
                prop_assert_eq!(map.len(), model.len());
            }
            for (key, value) in &model {
                prop_assert_eq!(map.get(key), Some(value));
            }
        }
    }
}
