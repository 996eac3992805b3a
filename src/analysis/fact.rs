//! Dataflow facts built on the hybrid containers.

use std::{
    fmt::{Debug, Display, Formatter},
    hash::Hash,
};

use itertools::Itertools;

use super::lattice::MeetSemiLattice;
use crate::collections::{HybridMap, HybridSet};

/// A fact mapping keys (usually variables) to lattice values.
///
/// A key that is absent is logically bound to the bottom of the lattice, and the bottom is
/// never stored explicitly. Two facts are equal if they agree on every key.
pub struct MapFact<K, V> {
    map: HybridMap<K, V>,
}

impl<K, V> MapFact<K, V>
where
    K: Hash + Eq + Clone,
    V: MeetSemiLattice,
{
    /// Creates a fact binding every key to the bottom.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: HybridMap::new(),
        }
    }

    /// Returns the value bound to `key`, which is the bottom if `key` is absent.
    #[must_use]
    pub fn get(&self, key: &K) -> V {
        self.map.get(key).cloned().unwrap_or_else(V::bottom)
    }

    /// Binds `key` to `value`. Binding the bottom removes `key`.
    /// Returns whether the fact changed.
    pub fn update(&mut self, key: K, value: V) -> bool {
        if value.is_bottom() {
            self.map.remove(&key).is_some()
        } else {
            self.map
                .insert(key, value.clone())
                .is_none_or(|previous| previous != value)
        }
    }

    /// Removes `key`, returning the value it was bound to.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    /// Makes `self` equal to `other`. Returns whether `self` changed.
    pub fn copy_from(&mut self, other: &Self) -> bool {
        if self == other {
            false
        } else {
            self.map = other.map.clone();
            true
        }
    }

    /// Meets every binding of `other` into `self`. Returns whether `self` changed.
    pub fn meet_with(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (key, value) in other.entries() {
            let met = self.get(key).meet(value.clone());
            changed |= self.update(key.clone(), met);
        }
        changed
    }

    /// Unbinds every key.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<K, V> MapFact<K, V> {
    /// Iterates over the keys that are not bound to the bottom together with their values.
    ///
    /// The iterator borrows the fact, so it can be restarted by calling this method again.
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.map.iter()
    }

    /// Iterates over the keys that are not bound to the bottom.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.map.keys()
    }

    /// Returns the number of keys not bound to the bottom.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Checks whether every key is bound to the bottom.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K, V> Default for MapFact<K, V> {
    fn default() -> Self {
        Self {
            map: HybridMap::default(),
        }
    }
}

impl<K: Clone, V: Clone> Clone for MapFact<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K: Debug, V: Debug> Debug for MapFact<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MapFact").field(&self.map).finish()
    }
}

impl<K, V> PartialEq for MapFact<K, V>
where
    K: Hash + Eq + Clone,
    V: PartialEq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K, V> Eq for MapFact<K, V>
where
    K: Hash + Eq + Clone,
    V: Eq + Clone,
{
}

impl<K, V> Display for MapFact<K, V>
where
    K: Display + Ord,
    V: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.entries()
                .sorted_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs))
                .map(|(key, value)| format!("{key}={value}"))
                .join(", ")
        )
    }
}

impl<K, V> FromIterator<(K, V)> for MapFact<K, V>
where
    K: Hash + Eq + Clone,
    V: MeetSemiLattice,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut fact = Self::new();
        for (key, value) in iter {
            fact.update(key, value);
        }
        fact
    }
}

/// A fact that is a set of elements, ordered by inclusion. The empty set is the bottom.
pub struct SetFact<T> {
    set: HybridSet<T>,
}

impl<T> SetFact<T>
where
    T: Hash + Eq + Clone,
{
    /// Creates an empty fact.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            set: HybridSet::new(),
        }
    }

    /// Checks whether `element` is in the fact.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        self.set.contains(element)
    }

    /// Adds `element`, returning whether the fact changed.
    pub fn add(&mut self, element: T) -> bool {
        self.set.insert(element)
    }

    /// Removes `element`, returning whether the fact changed.
    pub fn remove(&mut self, element: &T) -> bool {
        self.set.remove(element)
    }

    /// Adds every element of `other`, returning whether the fact changed.
    pub fn union(&mut self, other: &Self) -> bool {
        other
            .iter()
            .fold(false, |changed, it| self.add(it.clone()) || changed)
    }

    /// Makes `self` equal to `other`. Returns whether `self` changed.
    pub fn copy_from(&mut self, other: &Self) -> bool {
        if self == other {
            false
        } else {
            self.set = other.set.clone();
            true
        }
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.set.clear();
    }
}

impl<T> SetFact<T> {
    /// Iterates over the elements in an unspecified but stable order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.set.iter()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Checks whether the fact is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl<T> Default for SetFact<T> {
    fn default() -> Self {
        Self {
            set: HybridSet::default(),
        }
    }
}

impl<T: Clone> Clone for SetFact<T> {
    fn clone(&self) -> Self {
        Self {
            set: self.set.clone(),
        }
    }
}

impl<T: Debug> Debug for SetFact<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SetFact").field(&self.set).finish()
    }
}

impl<T> PartialEq for SetFact<T>
where
    T: Hash + Eq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.set == other.set
    }
}

impl<T> Eq for SetFact<T> where T: Hash + Eq + Clone {}

impl<T> Display for SetFact<T>
where
    T: Display + Ord,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.iter().sorted().join(", "))
    }
}

impl<T> FromIterator<T> for SetFact<T>
where
    T: Hash + Eq + Clone,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            set: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::lattice::Value;
    use proptest::prelude::*;

    type Fact = MapFact<&'static str, Value>;

    #[test]
    fn absent_key_is_undefined() {
        let fact = Fact::new();
        assert_eq!(fact.get(&"x"), Value::Undefined);
    }

    #[test]
    fn updating_to_undefined_removes() {
        let mut fact = Fact::new();
        assert!(fact.update("x", Value::Constant(1)));
        assert!(!fact.update("x", Value::Constant(1)));
        assert!(fact.update("x", Value::Undefined));
        assert_eq!(fact.get(&"x"), Value::Undefined);
        assert!(fact.is_empty());
        assert_eq!(fact, Fact::new());
        assert!(!fact.update("y", Value::Undefined));
    }

    #[test]
    fn copy_is_independent() {
        let mut f1: Fact = [("a", Value::Constant(1)), ("b", Value::NotAConstant)]
            .into_iter()
            .collect();
        let mut f2 = f1.clone();

        f1.update("c", Value::Constant(3));
        f1.update("a", Value::NotAConstant);
        assert_eq!(f2.get(&"c"), Value::Undefined);
        assert_eq!(f2.get(&"a"), Value::Constant(1));

        f2.remove(&"b");
        assert_eq!(f1.get(&"b"), Value::NotAConstant);
    }

    #[test]
    fn copy_of_empty_is_independent() {
        let mut f1 = Fact::new();
        let f2 = f1.clone();
        f1.update("x", Value::Constant(7));
        assert!(f2.is_empty());
    }

    #[test]
    fn meet_with() {
        let mut target: Fact = [("x", Value::Constant(1)), ("y", Value::Constant(2))]
            .into_iter()
            .collect();
        let source: Fact = [("x", Value::Constant(2)), ("z", Value::Constant(3))]
            .into_iter()
            .collect();
        assert!(target.meet_with(&source));
        assert_eq!(target.get(&"x"), Value::NotAConstant);
        assert_eq!(target.get(&"y"), Value::Constant(2));
        assert_eq!(target.get(&"z"), Value::Constant(3));
        assert!(!target.meet_with(&source));
    }

    #[test]
    fn display_is_sorted() {
        let fact: Fact = [("y", Value::NotAConstant), ("x", Value::Constant(1))]
            .into_iter()
            .collect();
        assert_eq!(fact.to_string(), "{x=1, y=NAC}");

        let set: SetFact<_> = ["b", "a"].into_iter().collect();
        assert_eq!(set.to_string(), "{a, b}");
    }

    #[test]
    fn set_union() {
        let mut lhs: SetFact<_> = [1, 2].into_iter().collect();
        let rhs: SetFact<_> = [2, 3].into_iter().collect();
        assert!(lhs.union(&rhs));
        assert!(!lhs.union(&rhs));
        assert_eq!(lhs, [1, 2, 3].into_iter().collect::<SetFact<_>>());
    }

    proptest! {
        #[test]
        fn entries_skip_undefined(
            bindings in prop::collection::vec((0u8..8, any::<Value>()), 0..16)
        ) {
            let mut fact = MapFact::new();
            for (key, value) in bindings {
                fact.update(key, value);
            }
            prop_assert!(fact.entries().all(|(_, value)| !value.is_undefined()));
            prop_assert_eq!(fact.entries().count(), fact.len());
        }
    }
}
