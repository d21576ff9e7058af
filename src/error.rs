/// The error returned by fallible keyed access such as
/// [`AvlTreeMap::try_get`](crate::AvlTreeMap::try_get) when the key is absent.
///
/// Indexing with `map[&key]` panics in the same situation; this is the non-panicking form.
///
/// # Examples
///
/// ```
/// use avl_tree::{AvlTreeMap, KeyNotFound};
///
/// let map = AvlTreeMap::from([(1, "a")]);
/// assert_eq!(map.try_get(&1), Ok(&"a"));
/// assert_eq!(map.try_get(&2), Err(KeyNotFound));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, thiserror::Error)]
#[error("no entry found for key")]
pub struct KeyNotFound;
