use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::ops::{Index, IndexMut};

use alloc::vec;
use alloc::vec::Vec;

use crate::KeyNotFound;
use crate::raw::{Handle, RawTree};

mod capacity;
mod cursor;

pub use cursor::Cursor;

/// An ordered map based on an [AVL tree].
///
/// Entries are kept in a binary search tree ordered by [`Ord`] on the key. Each node records
/// whether its left or right subtree is taller, and the two may differ by at most one level.
///
/// Every insert and remove is followed by a fix-up pass that walks from the changed node
/// towards the root, updating balance factors and rotating subtrees whose heights drifted
/// apart by two. The tree height therefore never exceeds about 1.44 log<sub>2</sub>(n), and
/// lookups, inserts and removes are O(log n) in the worst case, whatever order keys arrive in.
/// [`BstMap`](crate::BstMap) has the same interface without the fix-ups.
///
/// Iteration ([`iter`](AvlTreeMap::iter), [`keys`](AvlTreeMap::keys),
/// [`values`](AvlTreeMap::values), consuming the map) always runs in ascending key order.
///
/// Changing a key's ordering while it is stored (through interior mutability, say) is a logic
/// error. The map may then miss entries or return them out of order, but it stays memory safe.
///
/// # Examples
///
/// ```
/// use avl_tree::AvlTreeMap;
///
/// // Sorted input is the worst case for a plain search tree.
/// let mut ports = AvlTreeMap::new();
/// for (port, service) in [(21, "ftp"), (22, "ssh"), (25, "smtp"), (53, "dns"), (80, "http"), (443, "https")] {
///     ports.insert(port, service);
/// }
/// assert_eq!(ports.height(), 3);
/// assert!(ports.is_balanced());
///
/// assert_eq!(ports[&22], "ssh");
/// assert_eq!(ports.remove(&21), Some("ftp"));
/// assert!(!ports.contains_key(&21));
///
/// let mut cursor = ports.find(&53);
/// cursor.move_next();
/// assert_eq!(cursor.key_value(), Some((&80, &"http")));
/// ```
///
/// A map can also be built directly from an array of pairs:
///
/// ```
/// use avl_tree::AvlTreeMap;
///
/// let boiling_points = AvlTreeMap::from([("water", 100), ("ethanol", 78), ("mercury", 357)]);
/// assert_eq!(boiling_points.first_key_value(), Some((&"ethanol", &78)));
/// assert_eq!(boiling_points.keys().copied().collect::<Vec<_>>(), ["ethanol", "mercury", "water"]);
/// ```
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlTreeMap<K, V> {
    raw: RawTree<K, V>,
}

/// An iterator over the entries of an `AvlTreeMap` or a `BstMap`.
///
/// This `struct` is created by the [`iter`] method on [`AvlTreeMap`]. See its
/// documentation for more.
///
/// # Examples
///
/// ```
/// use avl_tree::AvlTreeMap;
///
/// let map = AvlTreeMap::from([(1, "a"), (2, "b")]);
/// let mut iter = map.iter();
/// assert_eq!(iter.next(), Some((&1, &"a")));
/// assert_eq!(iter.next_back(), Some((&2, &"b")));
/// assert_eq!(iter.next(), None);
/// ```
///
/// [`iter`]: AvlTreeMap::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    tree: Option<&'a RawTree<K, V>>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

/// A mutable iterator over the entries of an `AvlTreeMap` or a `BstMap`.
///
/// This `struct` is created by the [`iter_mut`] method on [`AvlTreeMap`]. See its
/// documentation for more.
///
/// # Examples
///
/// ```
/// use avl_tree::AvlTreeMap;
///
/// let mut map = AvlTreeMap::from([(1, 10), (2, 20)]);
/// for (_, value) in map.iter_mut() {
///     *value += 1;
/// }
/// let values: Vec<_> = map.values().copied().collect();
/// assert_eq!(values, [11, 21]);
/// ```
///
/// [`iter_mut`]: AvlTreeMap::iter_mut
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct IterMut<'a, K, V> {
    inner: vec::IntoIter<(&'a K, &'a mut V)>,
}

/// An owning iterator over the entries of an `AvlTreeMap` or a `BstMap`, sorted by key.
///
/// This `struct` is created by the [`into_iter`] method on [`AvlTreeMap`]
/// (provided by the [`IntoIterator`] trait). See its documentation for more.
///
/// # Examples
///
/// ```
/// use avl_tree::AvlTreeMap;
///
/// let map = AvlTreeMap::from([(2, "b"), (1, "a")]);
/// let entries: Vec<_> = map.into_iter().collect();
/// assert_eq!(entries, [(1, "a"), (2, "b")]);
/// ```
///
/// [`into_iter`]: IntoIterator::into_iter
pub struct IntoIter<K, V> {
    inner: vec::IntoIter<(K, V)>,
}

/// An iterator over the keys of an `AvlTreeMap` or a `BstMap`.
///
/// This `struct` is created by the [`keys`] method on [`AvlTreeMap`]. See its
/// documentation for more.
///
/// [`keys`]: AvlTreeMap::keys
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

/// An iterator over the values of an `AvlTreeMap` or a `BstMap`.
///
/// This `struct` is created by the [`values`] method on [`AvlTreeMap`]. See its
/// documentation for more.
///
/// [`values`]: AvlTreeMap::values
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

/// A mutable iterator over the values of an `AvlTreeMap` or a `BstMap`.
///
/// This `struct` is created by the [`values_mut`] method on [`AvlTreeMap`]. See its
/// documentation for more.
///
/// [`values_mut`]: AvlTreeMap::values_mut
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<K, V> AvlTreeMap<K, V> {
    /// Makes a new, empty `AvlTreeMap`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map: AvlTreeMap<&str, u32> = AvlTreeMap::new();
    /// assert_eq!((map.len(), map.height()), (0, 0));
    /// map.insert("root", 1);
    /// assert_eq!(map.height(), 1);
    /// ```
    #[must_use]
    pub const fn new() -> AvlTreeMap<K, V> {
        AvlTreeMap { raw: RawTree::new() }
    }

    /// Clears the map, removing all elements. The map can be reused afterwards.
    ///
    /// # Complexity
    ///
    /// O(n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map: AvlTreeMap<u32, u32> = (0..1_000).map(|k| (k, k)).collect();
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.cursor_front(), map.cursor_end());
    ///
    /// map.insert(7, 49);
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let hosts = AvlTreeMap::from([(String::from("localhost"), [127, 0, 0, 1])]);
    /// assert_eq!(hosts.get("localhost"), Some(&[127, 0, 0, 1]));
    /// assert_eq!(hosts.get("example.org"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns the key-value pair corresponding to the supplied key.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get_key_value(&1), Some((&1, &"a")));
    /// assert_eq!(map.get_key_value(&2), None);
    /// ```
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get_key_value(key)
    }

    /// Returns a reference to the value corresponding to the key, or [`KeyNotFound`].
    ///
    /// This is the non-panicking counterpart of `map[&key]`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Errors
    ///
    /// Returns [`KeyNotFound`] if the map does not contain `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::{AvlTreeMap, KeyNotFound};
    ///
    /// let map = AvlTreeMap::from([("a", 1)]);
    /// assert_eq!(map.try_get("a"), Ok(&1));
    /// assert_eq!(map.try_get("b"), Err(KeyNotFound));
    /// ```
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get(key).ok_or(KeyNotFound)
    }

    /// Returns a mutable reference to the value corresponding to the key, or [`KeyNotFound`].
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Errors
    ///
    /// Returns [`KeyNotFound`] if the map does not contain `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::from([("a", 1)]);
    /// *map.try_get_mut("a")? += 10;
    /// assert_eq!(map["a"], 11);
    /// assert!(map.try_get_mut("b").is_err());
    /// # Ok::<(), avl_tree::KeyNotFound>(())
    /// ```
    pub fn try_get_mut<Q>(&mut self, key: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key).ok_or(KeyNotFound)
    }

    /// Returns the first key-value pair in the map.
    /// The key in this pair is the minimum key in the map.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut scores = AvlTreeMap::new();
    /// assert_eq!(scores.first_key_value(), None);
    /// scores.insert("mallory", 41);
    /// scores.insert("alice", 97);
    /// assert_eq!(scores.first_key_value(), Some((&"alice", &97)));
    /// ```
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    /// Returns the last key-value pair in the map.
    /// The key in this pair is the maximum key in the map.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut scores = AvlTreeMap::new();
    /// scores.insert("mallory", 41);
    /// scores.insert("alice", 97);
    /// assert_eq!(scores.last_key_value(), Some((&"mallory", &41)));
    /// ```
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let primes: AvlTreeMap<u32, ()> = [2, 3, 5, 7, 11].into_iter().map(|p| (p, ())).collect();
    /// assert!(primes.contains_key(&7));
    /// assert!(!primes.contains_key(&9));
    /// ```
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.contains_key(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut stock = AvlTreeMap::from([("bolts", 40), ("nuts", 12)]);
    /// if let Some(count) = stock.get_mut("nuts") {
    ///     *count -= 5;
    /// }
    /// assert_eq!(stock["nuts"], 7);
    /// assert_eq!(stock.get_mut("washers"), None);
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Inserts a key-value pair into the map and rebalances the tree.
    ///
    /// If the map did not have this key present, `None` is returned.
    ///
    /// If the map did have this key present, the value is updated, and the old
    /// value is returned. The key is not updated and the tree shape does not change.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::new();
    /// for k in 0..7 {
    ///     assert_eq!(map.insert(k, "fresh"), None);
    /// }
    /// // Seven ascending keys end up as a perfect tree.
    /// assert_eq!(map.height(), 3);
    ///
    /// assert_eq!(map.insert(3, "updated"), Some("fresh"));
    /// assert_eq!(map[&3], "updated");
    /// assert_eq!(map.len(), 7);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        K: Ord,
    {
        self.raw.insert_balanced(key, value)
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map. Removing an absent key leaves the map untouched.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map: AvlTreeMap<i32, i32> = (0..15).map(|k| (k, k * k)).collect();
    /// assert_eq!(map.remove(&4), Some(16));
    /// assert_eq!(map.remove(&4), None);
    ///
    /// // Removing a whole side still leaves a balanced tree.
    /// for k in 0..7 {
    ///     map.remove(&k);
    /// }
    /// assert!(map.is_balanced());
    /// assert_eq!((map.len(), map.height()), (8, 4));
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value if the key
    /// was previously in the map.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut map = AvlTreeMap::from([(String::from("key"), 1)]);
    /// // The owned key comes back, found through a borrowed `&str`.
    /// assert_eq!(map.remove_entry("key"), Some((String::from("key"), 1)));
    /// assert_eq!(map.remove_entry("key"), None);
    /// ```
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        self.raw.remove_balanced(key)
    }

    /// Returns a cursor pointing at the entry for `key`, or the end cursor if the key is
    /// absent.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, "a"), (2, "b"), (3, "c")]);
    /// let mut cursor = map.find(&2);
    /// assert_eq!(cursor.key(), Some(&2));
    /// cursor.move_next();
    /// assert_eq!(cursor.value(), Some(&"c"));
    ///
    /// assert_eq!(map.find(&4), map.cursor_end());
    /// ```
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V>
    where
        K: Borrow<Q> + Ord,
        Q: ?Sized + Ord,
    {
        Cursor::new(&self.raw, self.raw.find(key))
    }

    /// Returns a cursor pointing at the entry with the smallest key. On an empty map this is
    /// the end cursor.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(2, "b"), (1, "a")]);
    /// assert_eq!(map.cursor_front().key(), Some(&1));
    ///
    /// let empty: AvlTreeMap<i32, i32> = AvlTreeMap::new();
    /// assert!(empty.cursor_front().is_end());
    /// ```
    #[must_use]
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        Cursor::new(&self.raw, self.raw.first())
    }

    /// Returns the end cursor, which points past the entry with the largest key.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, "a"), (2, "b")]);
    /// let mut cursor = map.cursor_end();
    /// assert!(cursor.is_end());
    /// cursor.move_prev();
    /// assert_eq!(cursor.key(), Some(&2));
    /// ```
    #[must_use]
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        Cursor::new(&self.raw, None)
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(30, 'c'), (10, 'a'), (20, 'b')]);
    ///
    /// let mut iter = map.iter();
    /// assert_eq!(iter.next(), Some((&10, &'a')));
    /// assert_eq!(iter.next_back(), Some((&30, &'c')));
    /// assert_eq!(iter.len(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) to create the iterator; amortized O(1) per iteration step.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.raw)
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut balances = AvlTreeMap::from([("acct-1", 100), ("acct-2", -20), ("acct-3", 5)]);
    ///
    /// // Overdrawn accounts are charged a fee.
    /// for (_, balance) in balances.iter_mut().filter(|(_, b)| **b < 0) {
    ///     *balance -= 10;
    /// }
    /// assert_eq!(balances["acct-2"], -30);
    /// assert_eq!(balances["acct-3"], 5);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n) to create the iterator, which collects the entry references up front; O(1) per
    /// iteration step.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.raw)
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let words = AvlTreeMap::from([("pear", 4), ("fig", 3), ("apple", 5)]);
    /// assert_eq!(words.keys().copied().collect::<Vec<_>>(), ["apple", "fig", "pear"]);
    /// assert_eq!(words.keys().next_back(), Some(&"pear"));
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the map, in order by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let words = AvlTreeMap::from([("pear", 4), ("fig", 3), ("apple", 5)]);
    /// assert_eq!(words.values().sum::<i32>(), 12);
    /// assert_eq!(words.values().copied().collect::<Vec<_>>(), [5, 3, 4]);
    /// ```
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut tags: AvlTreeMap<u8, Vec<&str>> = AvlTreeMap::from([(1, vec![]), (2, vec!["x"])]);
    /// for list in tags.values_mut() {
    ///     list.push("seen");
    /// }
    /// assert_eq!(tags[&1], ["seen"]);
    /// assert_eq!(tags[&2], ["x", "seen"]);
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut { inner: self.iter_mut() }
    }

    /// Returns the number of elements in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut a = AvlTreeMap::new();
    /// assert_eq!(a.len(), 0);
    /// a.insert(1, "a");
    /// assert_eq!(a.len(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let mut a = AvlTreeMap::new();
    /// assert!(a.is_empty());
    /// a.insert(1, "a");
    /// assert!(!a.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns `true` if, at every node, the heights of the two subtrees differ by at most one.
    ///
    /// The check measures the heights from scratch rather than trusting the stored balance
    /// factors, so it doubles as an audit of the rebalancing. It always holds for an
    /// `AvlTreeMap`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map: AvlTreeMap<_, _> = (0..100).map(|i| (i, ())).collect();
    /// assert!(map.is_balanced());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.raw.is_balanced()
    }

    /// Returns the number of levels in the tree; 0 for an empty map.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(1, ()), (2, ()), (3, ())]);
    /// assert_eq!(map.height(), 2);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }
}

impl<K: Clone, V: Clone> Clone for AvlTreeMap<K, V> {
    fn clone(&self) -> Self {
        AvlTreeMap { raw: self.raw.clone() }
    }
}

impl<K: Hash, V: Hash> Hash for AvlTreeMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (k, v) in self {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq> Eq for AvlTreeMap<K, V> {}

impl<K: PartialOrd, V: PartialOrd> PartialOrd for AvlTreeMap<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K: Ord, V: Ord> Ord for AvlTreeMap<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for AvlTreeMap<K, V> {
    fn default() -> Self {
        AvlTreeMap::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = AvlTreeMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTreeMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K: Ord + Copy, V: Copy> Extend<(&'a K, &'a V)> for AvlTreeMap<K, V> {
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        for (&k, &v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut AvlTreeMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V> IntoIterator for AvlTreeMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Gets an owning iterator over the entries of the map, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_tree::AvlTreeMap;
    ///
    /// let map = AvlTreeMap::from([(2, "b"), (1, "a")]);
    /// let mut iter = map.into_iter();
    /// assert_eq!(iter.next(), Some((1, "a")));
    /// assert_eq!(iter.next_back(), Some((2, "b")));
    /// ```
    fn into_iter(mut self) -> IntoIter<K, V> {
        IntoIter::new(self.raw.drain_to_vec())
    }
}

impl<K, Q, V> Index<&Q> for AvlTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, Q, V> IndexMut<&Q> for AvlTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    /// Returns a mutable reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index_mut(&mut self, key: &Q) -> &mut V {
        self.get_mut(key).expect("no entry found for key")
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for AvlTreeMap<K, V> {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(tree: &'a RawTree<K, V>) -> Self {
        Iter {
            tree: Some(tree),
            front: tree.first(),
            back: tree.last(),
            remaining: tree.len(),
        }
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree?;
        let handle = self.front?;
        self.front = tree.successor(handle);
        self.remaining -= 1;
        Some(tree.entry(handle))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree?;
        let handle = self.back?;
        self.back = tree.predecessor(handle);
        self.remaining -= 1;
        Some(tree.entry(handle))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<K, V> Default for Iter<'_, K, V> {
    /// Creates an empty `avl_tree_map::Iter`.
    ///
    /// ```
    /// # use avl_tree::avl_tree_map;
    /// let iter: avl_tree_map::Iter<'_, u8, u8> = Default::default();
    /// assert_eq!(iter.len(), 0);
    /// ```
    fn default() -> Self {
        Iter {
            tree: None,
            front: None,
            back: None,
            remaining: 0,
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(tree: &'a mut RawTree<K, V>) -> Self {
        IterMut {
            inner: tree.entries_mut().into_iter(),
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IterMut<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}

impl<K, V> Default for IterMut<'_, K, V> {
    /// Creates an empty `avl_tree_map::IterMut`.
    ///
    /// ```
    /// # use avl_tree::avl_tree_map;
    /// let iter: avl_tree_map::IterMut<'_, u8, u8> = Default::default();
    /// assert_eq!(iter.len(), 0);
    /// ```
    fn default() -> Self {
        IterMut {
            inner: Vec::new().into_iter(),
        }
    }
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(entries: Vec<(K, V)>) -> Self {
        IntoIter {
            inner: entries.into_iter(),
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.as_slice()).finish()
    }
}

impl<K, V> Default for IntoIter<K, V> {
    /// Creates an empty `avl_tree_map::IntoIter`.
    ///
    /// ```
    /// # use avl_tree::avl_tree_map;
    /// let iter: avl_tree_map::IntoIter<u8, u8> = Default::default();
    /// assert_eq!(iter.len(), 0);
    /// ```
    fn default() -> Self {
        IntoIter::new(Vec::new())
    }
}

/// Implements the iterator traits for a wrapper that yields one half of each entry produced
/// by its `inner` iterator.
macro_rules! entry_half_iter {
    ($name:ident<$lt:lifetime>, $item:ty, $inner:ident, |$entry:pat_param| $half:expr) => {
        impl<$lt, K, V> Iterator for $name<$lt, K, V> {
            type Item = $item;

            fn next(&mut self) -> Option<$item> {
                self.inner.next().map(|$entry| $half)
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                self.inner.size_hint()
            }
        }

        impl<K, V> DoubleEndedIterator for $name<'_, K, V> {
            fn next_back(&mut self) -> Option<Self::Item> {
                self.inner.next_back().map(|$entry| $half)
            }
        }

        impl<K, V> ExactSizeIterator for $name<'_, K, V> {
            fn len(&self) -> usize {
                self.inner.len()
            }
        }

        impl<K, V> FusedIterator for $name<'_, K, V> {}

        impl<K, V> Default for $name<'_, K, V> {
            fn default() -> Self {
                $name { inner: $inner::default() }
            }
        }
    };
}

entry_half_iter!(Keys<'a>, &'a K, Iter, |(k, _)| k);
entry_half_iter!(Values<'a>, &'a V, Iter, |(_, v)| v);
entry_half_iter!(ValuesMut<'a>, &'a mut V, IterMut, |(_, v)| v);

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys { inner: self.inner.clone() }
    }
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values { inner: self.inner.clone() }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<K, V: fmt::Debug> fmt::Debug for ValuesMut<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.inner.as_slice().iter().map(|entry| &entry.1)).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::manual_assert)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::String;
    use pretty_assertions::assert_eq;

    impl<K: Ord, V> AvlTreeMap<K, V> {
        fn validate(&self) {
            self.raw.validate_invariants();
        }
    }

    #[test]
    fn map_invariants_hold_through_churn() {
        let mut map = AvlTreeMap::new();
        for i in 0..200 {
            map.insert((i * 37) % 200, i);
            map.validate();
        }
        for i in (0..200).step_by(3) {
            assert!(map.remove(&i).is_some());
            map.validate();
        }
        assert_eq!(map.len(), 200 - 67);
    }

    #[test]
    fn upsert_keeps_length() {
        let mut map = AvlTreeMap::new();
        assert_eq!(map.insert("k", 1), None);
        assert_eq!(map.insert("k", 2), Some(1));
        assert_eq!(map.len(), 1);
        assert_eq!(map["k"], 2);
        map.validate();
    }

    #[test]
    fn index_mut_updates_in_place() {
        let mut map = AvlTreeMap::from([(1, 10), (2, 20)]);
        map[&2] += 5;
        assert_eq!(map.get(&2), Some(&25));
    }

    #[test]
    #[should_panic(expected = "no entry found for key")]
    fn index_missing_key_panics() {
        let map: AvlTreeMap<i32, i32> = AvlTreeMap::new();
        let _ = map[&1];
    }

    #[test]
    fn try_get_reports_missing_key() {
        let mut map = AvlTreeMap::from([(1, 'a')]);
        assert_eq!(map.try_get(&1), Ok(&'a'));
        assert_eq!(map.try_get(&2), Err(KeyNotFound));
        assert_eq!(map.try_get_mut(&2), Err(KeyNotFound));
    }

    #[test]
    fn iter_meets_in_the_middle() {
        let map: AvlTreeMap<i32, i32> = (0..5).map(|i| (i, -i)).collect();
        let mut iter = map.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.next().map(|(k, _)| *k), Some(0));
        assert_eq!(iter.next_back().map(|(k, _)| *k), Some(4));
        assert_eq!(iter.next().map(|(k, _)| *k), Some(1));
        assert_eq!(iter.next_back().map(|(k, _)| *k), Some(3));
        assert_eq!(iter.len(), 1);
        assert_eq!(iter.next().map(|(k, _)| *k), Some(2));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn key_and_value_iterators_walk_both_ends() {
        let mut map: AvlTreeMap<i32, i32> = (1..=4).map(|i| (i, i * 100)).collect();

        let mut keys = map.keys();
        assert_eq!((keys.next(), keys.next_back()), (Some(&1), Some(&4)));
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.by_ref().collect::<Vec<_>>(), [&2, &3]);
        assert_eq!((keys.next(), keys.next_back()), (None, None));

        let mut values = map.values().rev();
        assert_eq!(values.next(), Some(&400));
        assert_eq!(values.size_hint(), (3, Some(3)));

        let mut values_mut = map.values_mut();
        if let Some(last) = values_mut.next_back() {
            *last = 0;
        }
        assert_eq!(values_mut.len(), 3);
        assert_eq!(format!("{values_mut:?}"), "[100, 200, 300]");
        assert_eq!(map[&4], 0);

        assert_eq!(Keys::<i32, i32>::default().len(), 0);
        assert_eq!(Values::<i32, i32>::default().next(), None);
        assert_eq!(ValuesMut::<i32, i32>::default().next_back(), None);
    }

    #[test]
    fn debug_prints_entries_in_order() {
        let map = AvlTreeMap::from([(3, "c"), (1, "a"), (2, "b")]);
        assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b", 3: "c"}"#);
        assert_eq!(format!("{:?}", map.keys()), "[1, 2, 3]");
        assert_eq!(format!("{:?}", map.values()), r#"["a", "b", "c"]"#);
    }

    #[test]
    fn clone_is_independent() {
        let mut original = AvlTreeMap::from([(1, String::from("one"))]);
        let copy = original.clone();
        original.insert(2, String::from("two"));
        if let Some(v) = original.get_mut(&1) {
            v.push('!');
        }
        assert_eq!(copy.len(), 1);
        assert_eq!(copy[&1], "one");
        copy.validate();
    }

    #[test]
    fn equality_ignores_shape() {
        let a: AvlTreeMap<i32, i32> = (0..10).map(|i| (i, i)).collect();
        let b: AvlTreeMap<i32, i32> = (0..10).rev().map(|i| (i, i)).collect();
        assert_eq!(a, b);
        assert!(a <= b);

        let mut c = b.clone();
        c.insert(10, 10);
        assert!(a < c);
    }

    #[test]
    fn extend_by_reference() {
        let source = AvlTreeMap::from([(1, 1), (2, 2)]);
        let mut target = AvlTreeMap::from([(2, 20), (3, 30)]);
        target.extend(&source);
        assert_eq!(target.into_iter().collect::<Vec<_>>(), [(1, 1), (2, 2), (3, 30)]);
    }

    #[test]
    fn clear_then_reuse() {
        let mut map: AvlTreeMap<i32, i32> = (0..64).map(|i| (i, i)).collect();
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.height(), 0);
        assert!(map.cursor_front().is_end());
        map.insert(7, 7);
        map.validate();
        assert_eq!(map.first_key_value(), Some((&7, &7)));
    }
}
