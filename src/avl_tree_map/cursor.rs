use core::fmt;

use crate::raw::{Handle, RawTree};

/// A read-only position in a map: either one of its entries or the end position.
///
/// The end position sits past the entry with the largest key and before the entry with the
/// smallest one, so stepping a cursor in either direction cycles through the entries and
/// passes the end once per lap. Cursors are created by [`find`], [`cursor_front`] and
/// [`cursor_end`] (on both [`AvlTreeMap`] and [`BstMap`]).
///
/// Two cursors are equal when they belong to the same map and point at the same entry, or
/// are both at the end.
///
/// # Examples
///
/// ```
/// use avl_tree::AvlTreeMap;
///
/// let map = AvlTreeMap::from([(1, "a"), (2, "b"), (3, "c")]);
///
/// let mut cursor = map.cursor_front();
/// let mut seen = Vec::new();
/// while let Some((key, value)) = cursor.key_value() {
///     seen.push((*key, *value));
///     cursor.move_next();
/// }
/// assert_eq!(seen, [(1, "a"), (2, "b"), (3, "c")]);
/// assert_eq!(cursor, map.cursor_end());
/// ```
///
/// [`find`]: crate::AvlTreeMap::find
/// [`cursor_front`]: crate::AvlTreeMap::cursor_front
/// [`cursor_end`]: crate::AvlTreeMap::cursor_end
/// [`AvlTreeMap`]: crate::AvlTreeMap
/// [`BstMap`]: crate::BstMap
pub struct Cursor<'a, K, V> {
    tree: &'a RawTree<K, V>,
    current: Option<Handle>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) const fn new(tree: &'a RawTree<K, V>, current: Option<Handle>) -> Self {
        Cursor { tree, current }
    }

    /// Returns `true` if the cursor is at the end position.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the key at the cursor, or `None` at the end position.
    #[must_use]
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(k, _)| k)
    }

    /// Returns the value at the cursor, or `None` at the end position.
    #[must_use]
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, v)| v)
    }

    /// Returns the entry at the cursor, or `None` at the end position.
    #[must_use]
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        let tree = self.tree;
        self.current.map(|handle| tree.entry(handle))
    }

    /// Moves to the entry with the next larger key. From the largest key this moves to the
    /// end position, and from the end position to the smallest key.
    ///
    /// # Complexity
    ///
    /// O(height) worst case, amortized O(1) over a full traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, ()), (2, ())]);
    /// let mut cursor = map.find(&2);
    /// cursor.move_next();
    /// assert!(cursor.is_end());
    /// cursor.move_next();
    /// assert_eq!(cursor.key(), Some(&1));
    /// ```
    pub fn move_next(&mut self) {
        self.current = match self.current {
            Some(handle) => self.tree.successor(handle),
            None => self.tree.first(),
        };
    }

    /// Moves to the entry with the next smaller key. From the smallest key this moves to the
    /// end position, and from the end position to the largest key.
    ///
    /// # Complexity
    ///
    /// O(height) worst case, amortized O(1) over a full traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, ()), (2, ())]);
    /// let mut cursor = map.find(&1);
    /// cursor.move_prev();
    /// assert!(cursor.is_end());
    /// cursor.move_prev();
    /// assert_eq!(cursor.key(), Some(&2));
    /// ```
    pub fn move_prev(&mut self) {
        self.current = match self.current {
            Some(handle) => self.tree.predecessor(handle),
            None => self.tree.last(),
        };
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.current == other.current
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value()).finish()
    }
}
