use std::{
    fmt::{Debug, Formatter},
    hash::Hash,
};

use super::HybridMap;

/// A set optimized for zero or one elements.
///
/// This is a [`HybridMap`] with unit values and shares its storage policy:
/// one element is kept inline, more upgrade to a hash table, and [`Clone`] produces a
/// logically independent copy that shares the table until the first write on either side.
pub struct HybridSet<T> {
    inner: HybridMap<T, ()>,
}

impl<T> HybridSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: HybridMap::new(),
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Checks whether the set has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over the elements in an unspecified but stable order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.inner.keys()
    }

    #[cfg(test)]
    pub(crate) fn shares_storage_with(&self, other: &Self) -> bool {
        self.inner.shares_storage_with(&other.inner)
    }
}

impl<T> HybridSet<T>
where
    T: Hash + Eq + Clone,
{
    /// Checks whether `element` is in the set.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        self.inner.contains_key(element)
    }

    /// Adds `element`, returning whether it was not already present.
    pub fn insert(&mut self, element: T) -> bool {
        self.inner.insert(element, ()).is_none()
    }

    /// Removes `element`, returning whether it was present.
    pub fn remove(&mut self, element: &T) -> bool {
        self.inner.remove(element).is_some()
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<T> Default for HybridSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for HybridSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Debug> Debug for HybridSet<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T> PartialEq for HybridSet<T>
where
    T: Hash + Eq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Eq for HybridSet<T> where T: Hash + Eq + Clone {}

impl<T> FromIterator<T> for HybridSet<T>
where
    T: Hash + Eq + Clone,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|it| (it, ())).collect(),
        }
    }
}

impl<T> Extend<T> for HybridSet<T>
where
    T: Hash + Eq + Clone,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter.into_iter().map(|it| (it, ())));
    }
}

impl<'a, T> From<&'a HybridSet<T>> for HybridSet<T>
where
    T: Clone,
{
    fn from(source: &'a HybridSet<T>) -> Self {
        source.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn copy_is_independent_of_source() {
        let mut s1 = HybridSet::new();
        s1.insert(1);
        s1.insert(2);
        let mut s2 = HybridSet::from(&s1);

        s1.insert(42);
        assert!(!s2.contains(&42));

        s2.insert(7);
        assert!(!s1.contains(&7));
        assert_eq!(s1.len(), 3);
        assert_eq!(s2.len(), 3);
    }

    #[test]
    fn copy_of_single_element_is_independent() {
        let mut s1 = HybridSet::new();
        s1.insert(1);
        let s2 = s1.clone();
        s1.remove(&1);
        assert!(s2.contains(&1));
        assert!(s1.is_empty());
    }

    #[test]
    fn empty_sets_are_independent() {
        let mut a = HybridSet::new();
        let b = HybridSet::new();
        a.insert(1);
        assert!(!b.contains(&1));
        assert!(b.is_empty());
    }

    #[test]
    fn sets_copied_from_empty_are_independent() {
        let mut a: HybridSet<i32> = HashSet::<i32>::new().into_iter().collect();
        let b: HybridSet<i32> = HashSet::<i32>::new().into_iter().collect();
        a.insert(1);
        assert!(!b.contains(&1));

        let c = HybridSet::from(&b);
        let mut d = HybridSet::from(&b);
        d.insert(9);
        assert!(!c.contains(&9));
        assert!(!b.contains(&9));
    }

    #[test]
    fn shared_table_is_copied_on_first_write() {
        let source: HybridSet<_> = (0..16).collect();
        let mut copy = source.clone();
        assert!(copy.shares_storage_with(&source));
        assert!(copy.remove(&0));
        assert!(!copy.shares_storage_with(&source));
        assert!(source.contains(&0));
    }

    proptest! {
        #[test]
        fn mutations_never_cross_copies(
            initial in prop::collection::hash_set(0u8..32, 0..8),
            source_adds in prop::collection::vec(0u8..32, 0..8),
            copy_removes in prop::collection::vec(0u8..32, 0..8),
        ) {
            let mut source: HybridSet<_> = initial.iter().copied().collect();
            let mut copy = source.clone();
            for it in &source_adds {
                source.insert(*it);
            }
            for it in &copy_removes {
                copy.remove(it);
            }

            let expected_source: HashSet<_> = initial.iter().chain(&source_adds).copied().collect();
            let expected_copy: HashSet<_> = initial.difference(&copy_removes.iter().copied().collect()).copied().collect();
            prop_assert_eq!(source.iter().copied().collect::<HashSet<_>>(), expected_source);
            prop_assert_eq!(copy.iter().copied().collect::<HashSet<_>>(), expected_copy);
        }
    }
}
