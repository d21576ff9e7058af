//! An ordered map on a plain, never rebalanced binary search tree.
//!
//! [`BstMap`] shares its node layout, iterators and cursors with
//! [`AvlTreeMap`](crate::AvlTreeMap); it only skips the fix-up passes. It is mostly useful as
//! a baseline, and for watching what rebalancing buys on adversarial (e.g. sorted) input.

use core::borrow::Borrow;
use core::fmt;
use core::ops::{Index, IndexMut};

use crate::KeyNotFound;
use crate::avl_tree_map::{Cursor, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::raw::RawTree;

/// An ordered map based on an unbalanced [binary search tree].
///
/// Entries are attached where the key descent ends and never moved afterwards, except when a
/// node with two children is removed and trades places with its in-order predecessor. Every
/// operation costs O(height), and the height equals the number of entries when keys arrive in
/// sorted order.
///
/// # Examples
///
/// ```
/// use avl_tree::BstMap;
///
/// let mut map = BstMap::new();
/// map.insert(2, "b");
/// map.insert(1, "a");
/// map.insert(3, "c");
/// assert!(map.is_balanced());
///
/// map.insert(4, "d");
/// map.insert(5, "e");
/// assert!(!map.is_balanced());
/// assert_eq!(map.height(), 4);
///
/// assert_eq!(map.remove(&2), Some("b"));
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 3, 4, 5]);
/// ```
///
/// [binary search tree]: https://en.wikipedia.org/wiki/Binary_search_tree
pub struct BstMap<K, V> {
    raw: RawTree<K, V>,
}

impl<K, V> BstMap<K, V> {
    /// Makes a new, empty `BstMap`. Does not allocate anything on its own.
    #[must_use]
    pub const fn new() -> BstMap<K, V> {
        BstMap { raw: RawTree::new() }
    }

    /// Creates an empty map with room for at least `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        BstMap {
            raw: RawTree::with_capacity(capacity),
        }
    }

    /// Returns the number of entries the map can hold without growing its node arena.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Clears the map, removing all elements.
    ///
    /// Nodes are released in a post-order walk that does not recurse, so even a map whose
    /// tree degenerated into a list is cleared without exhausting the stack.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Complexity
    ///
    /// O(height)
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns the key-value pair corresponding to the supplied key.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get_key_value(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Returns a reference to the value corresponding to the key, or [`KeyNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`KeyNotFound`] if the map does not contain `key`.
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get(key).ok_or(KeyNotFound)
    }

    /// Returns a mutable reference to the value corresponding to the key, or [`KeyNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`KeyNotFound`] if the map does not contain `key`.
    pub fn try_get_mut<Q>(&mut self, key: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key).ok_or(KeyNotFound)
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.contains_key(key)
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    /// Inserts a key-value pair without rebalancing.
    ///
    /// Returns the previous value if the key was already present; in that case only the
    /// value is replaced and the tree shape is untouched.
    ///
    /// # Complexity
    ///
    /// O(height)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::BstMap;
    ///
    /// let mut map = BstMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        K: Ord,
    {
        self.raw.insert_unbalanced(key, value)
    }

    /// Removes a key from the map, returning its value if it was present.
    ///
    /// # Complexity
    ///
    /// O(height)
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value if it was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.remove_unbalanced(key)
    }

    /// Returns a cursor at the entry for `key`, or the end cursor if the key is absent.
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        Cursor::new(&self.raw, self.raw.find(key))
    }

    /// Returns a cursor at the entry with the smallest key, or the end cursor when empty.
    #[must_use]
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        Cursor::new(&self.raw, self.raw.first())
    }

    /// Returns the end cursor.
    #[must_use]
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        Cursor::new(&self.raw, None)
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw)
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.raw)
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut { inner: self.iter_mut() }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns `true` if, at every node, the heights of the two subtrees differ by at most one.
    ///
    /// # Complexity
    ///
    /// O(n), using an explicit stack rather than recursion.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.raw.is_balanced()
    }

    /// Returns the number of levels in the tree; 0 for an empty map.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }
}

impl<K: Clone, V: Clone> Clone for BstMap<K, V> {
    fn clone(&self) -> Self {
        BstMap { raw: self.raw.clone() }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for BstMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq> Eq for BstMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BstMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for BstMap<K, V> {
    fn default() -> Self {
        BstMap::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BstMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = BstMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for BstMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a BstMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut BstMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V> IntoIterator for BstMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> IntoIter<K, V> {
        IntoIter::new(self.raw.drain_to_vec())
    }
}

impl<K, Q, V> Index<&Q> for BstMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, Q, V> IndexMut<&Q> for BstMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    fn index_mut(&mut self, key: &Q) -> &mut V {
        self.get_mut(key).expect("no entry found for key")
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for BstMap<K, V> {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}
