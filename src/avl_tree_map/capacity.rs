use super::AvlTreeMap;
use crate::raw::RawTree;

impl<K, V> AvlTreeMap<K, V> {
    /// Creates an empty map with room for at least `capacity` entries before the node arena
    /// has to grow.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<i32, i32> = AvlTreeMap::with_capacity(32);
    /// assert!(map.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        AvlTreeMap {
            raw: RawTree::with_capacity(capacity),
        }
    }

    /// Returns the number of entries the map can hold without growing its node arena.
    ///
    /// Slots freed by [`remove`](AvlTreeMap::remove) are reused, so the capacity only grows
    /// when the number of live entries exceeds it.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map: AvlTreeMap<i32, i32> = AvlTreeMap::with_capacity(32);
    /// assert_eq!(map.capacity(), 32);
    ///
    /// for i in 0..100 {
    ///     map.insert(i % 8, i);
    ///     map.remove(&((i + 4) % 8));
    /// }
    /// assert_eq!(map.capacity(), 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
