use core::borrow::Borrow;
use core::cmp::Ordering;

use alloc::vec;
use alloc::vec::Vec;
use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, Side};

/// The linked binary search tree backing both `BstMap` and `AvlTreeMap`.
///
/// This type owns the node arena and implements everything that does not depend on a
/// balancing policy: descent, attach/splice, in-order neighbours, position swaps and
/// audits. The AVL fix-ups live in `super::avl` as a second `impl` block.
#[derive(Clone)]
pub(crate) struct RawTree<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Total number of key-value pairs in the tree.
    len: usize,
}

/// Result of descending the tree looking for a key.
pub(crate) enum SearchResult {
    /// Key was found at the given node.
    Found(Handle),
    /// Key was not found; a new node would hang off this parent on this side.
    /// `None` means the tree is empty and the new node becomes the root.
    NotFound(Option<(Handle, Side)>),
}

impl<K, V> RawTree<K, V> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
        }
    }

    /// Creates a new tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
            len: 0,
        }
    }

    /// Returns the number of key-value pairs in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree contains no elements.
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity of the node arena.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    #[cfg(test)]
    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    /// Returns a reference to a node by handle.
    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    /// Returns a mutable reference to a node by handle.
    #[inline]
    pub(crate) fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    pub(crate) fn parent(&self, handle: Handle) -> Option<Handle> {
        self.nodes.get(handle).parent()
    }

    #[inline]
    pub(crate) fn child(&self, handle: Handle, side: Side) -> Option<Handle> {
        self.nodes.get(handle).child(side)
    }

    #[inline]
    pub(crate) fn balance(&self, handle: Handle) -> i8 {
        self.nodes.get(handle).balance()
    }

    #[inline]
    pub(crate) fn set_balance(&mut self, handle: Handle, balance: i8) {
        self.nodes.get_mut(handle).set_balance(balance);
    }

    /// Returns the parent of `handle` and the side `handle` hangs on, or `None` for the root.
    pub(crate) fn position(&self, handle: Handle) -> Option<(Handle, Side)> {
        let parent = self.parent(handle)?;
        let side = self
            .nodes
            .get(parent)
            .side_of(handle)
            .expect("`RawTree::position()` - parent does not link back to child!");
        Some((parent, side))
    }

    /// Points the link at `position` to `new`: the parent's child link on that side, or the
    /// root when `position` is `None`. Does not touch `new`'s parent link.
    pub(crate) fn relink(&mut self, position: Option<(Handle, Side)>, new: Option<Handle>) {
        match position {
            Some((parent, side)) => self.nodes.get_mut(parent).set_child(side, new),
            None => self.root = new,
        }
    }

    /// Returns the leftmost (smallest) node of the subtree rooted at `handle`.
    pub(crate) fn leftmost(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.nodes.get(handle).left() {
            handle = left;
        }
        handle
    }

    /// Returns the rightmost (largest) node of the subtree rooted at `handle`.
    pub(crate) fn rightmost(&self, mut handle: Handle) -> Handle {
        while let Some(right) = self.nodes.get(handle).right() {
            handle = right;
        }
        handle
    }

    /// Returns the node with the smallest key.
    pub(crate) fn first(&self) -> Option<Handle> {
        self.root.map(|root| self.leftmost(root))
    }

    /// Returns the node with the largest key.
    pub(crate) fn last(&self) -> Option<Handle> {
        self.root.map(|root| self.rightmost(root))
    }

    /// Returns the in-order predecessor of `handle`.
    ///
    /// With a left subtree this is its rightmost node. Otherwise we climb while we are a
    /// left child; the first ancestor reached from its right side is the predecessor.
    pub(crate) fn predecessor(&self, handle: Handle) -> Option<Handle> {
        if let Some(left) = self.nodes.get(handle).left() {
            return Some(self.rightmost(left));
        }

        let mut current = handle;
        let mut parent = self.parent(current);
        while let Some(p) = parent {
            if self.nodes.get(p).left() != Some(current) {
                break;
            }
            current = p;
            parent = self.parent(p);
        }
        parent
    }

    /// Returns the in-order successor of `handle`, mirroring [`predecessor`](Self::predecessor).
    pub(crate) fn successor(&self, handle: Handle) -> Option<Handle> {
        if let Some(right) = self.nodes.get(handle).right() {
            return Some(self.leftmost(right));
        }

        let mut current = handle;
        let mut parent = self.parent(current);
        while let Some(p) = parent {
            if self.nodes.get(p).right() != Some(current) {
                break;
            }
            current = p;
            parent = self.parent(p);
        }
        parent
    }

    /// Returns the key-value pair stored at `handle`.
    #[inline]
    pub(crate) fn entry(&self, handle: Handle) -> (&K, &V) {
        let node = self.nodes.get(handle);
        (node.key(), node.value())
    }

    /// Returns the first key-value pair in the tree.
    pub(crate) fn first_key_value(&self) -> Option<(&K, &V)> {
        self.first().map(|h| self.entry(h))
    }

    /// Returns the last key-value pair in the tree.
    pub(crate) fn last_key_value(&self) -> Option<(&K, &V)> {
        self.last().map(|h| self.entry(h))
    }

    /// Returns every live handle in ascending key order.
    pub(crate) fn in_order(&self) -> Vec<Handle> {
        let mut order = Vec::with_capacity(self.len);
        let mut current = self.first();
        while let Some(h) = current {
            order.push(h);
            current = self.successor(h);
        }
        order
    }

    /// Returns `(key, &mut value)` for every node in ascending key order.
    pub(crate) fn entries_mut(&mut self) -> Vec<(&K, &mut V)> {
        let order = self.in_order();
        let mut by_slot: Vec<Option<(&K, &mut V)>> = Vec::new();
        by_slot.resize_with(self.nodes.slot_count(), || None);
        for (handle, node) in self.nodes.iter_mut() {
            by_slot[handle.to_index()] = Some(node.key_value_mut());
        }
        order
            .into_iter()
            .map(|h| by_slot[h.to_index()].take().expect("`RawTree::entries_mut()` - node visited twice!"))
            .collect()
    }

    /// Drains all key-value pairs from the tree in ascending key order.
    pub(crate) fn drain_to_vec(&mut self) -> Vec<(K, V)> {
        let order = self.in_order();
        let entries = order.into_iter().map(|h| self.nodes.take(h).into_entry()).collect();
        self.nodes.clear();
        self.root = None;
        self.len = 0;
        entries
    }

    /// Removes every node from the tree.
    ///
    /// Nodes are freed in an iterative post-order walk over the parent links, so each slot is
    /// released exactly once and deep (unbalanced) trees cannot exhaust the stack. Links into
    /// already freed slots are only compared, never followed.
    pub(crate) fn clear(&mut self) {
        let mut current = self.root.take();
        let mut came_from: Option<Handle> = None;
        let mut freed = 0usize;

        while let Some(handle) = current {
            let (parent, left, right) = self.nodes.get(handle).links();
            let next = match came_from {
                Some(child) if Some(child) == right => None,
                Some(child) if Some(child) == left => right,
                _ => left.or(right),
            };

            if let Some(child) = next {
                came_from = None;
                current = Some(child);
            } else {
                self.nodes.free(handle);
                freed += 1;
                came_from = Some(handle);
                current = parent;
            }
        }

        debug_assert_eq!(freed, self.len, "`RawTree::clear()` - freed count does not match len!");
        debug_assert!(self.nodes.is_empty(), "`RawTree::clear()` - unreachable nodes left in the arena!");
        log::debug!("cleared tree, freed {freed} nodes");
        self.nodes.clear();
        self.len = 0;
    }

    /// Computes the tree height and whether every node satisfies
    /// `|height(left) - height(right)| <= 1`.
    ///
    /// Heights are measured from the links alone; stored balance factors are not consulted.
    pub(crate) fn audit_heights(&self) -> (usize, bool) {
        let Some(root) = self.root else {
            return (0, true);
        };

        let mut heights = vec![0usize; self.nodes.slot_count()];
        let mut balanced = true;
        let mut stack: SmallVec<[(Handle, bool); 64]> = SmallVec::new();
        stack.push((root, false));

        while let Some((handle, children_done)) = stack.pop() {
            let node = self.nodes.get(handle);
            if children_done {
                let left = node.left().map_or(0, |c| heights[c.to_index()]);
                let right = node.right().map_or(0, |c| heights[c.to_index()]);
                balanced &= left.abs_diff(right) <= 1;
                heights[handle.to_index()] = 1 + left.max(right);
            } else {
                stack.push((handle, true));
                if let Some(right) = node.right() {
                    stack.push((right, false));
                }
                if let Some(left) = node.left() {
                    stack.push((left, false));
                }
            }
        }

        (heights[root.to_index()], balanced)
    }

    /// Returns the number of levels in the tree (0 when empty).
    pub(crate) fn height(&self) -> usize {
        self.audit_heights().0
    }

    /// Returns true if no node's subtrees differ in height by more than one.
    pub(crate) fn is_balanced(&self) -> bool {
        self.audit_heights().1
    }

    /// Allocates a new leaf at `position` (see [`SearchResult::NotFound`]) and links it in.
    pub(crate) fn attach(&mut self, key: K, value: V, position: Option<(Handle, Side)>) -> Handle {
        let parent = position.map(|(p, _)| p);
        let handle = self.nodes.alloc(Node::new(key, value, parent));
        self.relink(position, Some(handle));
        self.len += 1;
        handle
    }

    /// Splices a node with at most one child out of the tree and frees it.
    ///
    /// The sole child, if any, takes the node's place under its former parent (or becomes the
    /// root). Returns the payload together with the former parent and the side of it that
    /// lost a level, which is where a rebalancing pass has to start.
    pub(crate) fn splice_out(&mut self, handle: Handle) -> ((K, V), Option<(Handle, Side)>) {
        let node = self.nodes.get(handle);
        assert!(
            node.left().is_none() || node.right().is_none(),
            "`RawTree::splice_out()` - node has two children!"
        );
        let child = node.left().or(node.right());
        let position = self.position(handle);

        self.relink(position, child);
        if let Some(child) = child {
            self.nodes.get_mut(child).set_parent(position.map(|(p, _)| p));
        }

        self.len -= 1;
        (self.nodes.take(handle).into_entry(), position)
    }

    /// Exchanges the structural positions of two nodes.
    ///
    /// Parent/left/right links, the neighbours' back-links and the root are rewritten so that
    /// `a` sits where `b` was and vice versa. Keys, values and balance factors stay with their
    /// node. There are two cases: one node is the direct child of the other, or they are
    /// disjoint (siblings and more distant relatives).
    pub(crate) fn node_swap(&mut self, a: Handle, b: Handle) {
        if a == b {
            return;
        }

        if let Some(side) = self.nodes.get(a).side_of(b) {
            self.swap_adjacent(a, b, side);
        } else if let Some(side) = self.nodes.get(b).side_of(a) {
            self.swap_adjacent(b, a, side);
        } else {
            self.swap_disjoint(a, b);
        }
    }

    /// `lower` is the child of `upper` on `side`.
    fn swap_adjacent(&mut self, upper: Handle, lower: Handle, side: Side) {
        let position = self.position(upper);
        let sibling = self.child(upper, side.opposite());
        let (_, lower_left, lower_right) = self.nodes.get(lower).links();

        let lower_node = self.nodes.get_mut(lower);
        lower_node.set_parent(position.map(|(p, _)| p));
        lower_node.set_child(side, Some(upper));
        lower_node.set_child(side.opposite(), sibling);

        self.nodes.get_mut(upper).set_links((Some(lower), lower_left, lower_right));

        self.relink(position, Some(lower));
        if let Some(sibling) = sibling {
            self.nodes.get_mut(sibling).set_parent(Some(lower));
        }
        for child in [lower_left, lower_right].into_iter().flatten() {
            self.nodes.get_mut(child).set_parent(Some(upper));
        }
    }

    fn swap_disjoint(&mut self, a: Handle, b: Handle) {
        let a_position = self.position(a);
        let b_position = self.position(b);
        let a_links = self.nodes.get(a).links();
        let b_links = self.nodes.get(b).links();

        self.nodes.get_mut(a).set_links(b_links);
        self.nodes.get_mut(b).set_links(a_links);

        // Siblings share a parent but never a side, so the two relinks do not collide.
        self.relink(a_position, Some(b));
        self.relink(b_position, Some(a));

        for child in [a_links.1, a_links.2].into_iter().flatten() {
            self.nodes.get_mut(child).set_parent(Some(b));
        }
        for child in [b_links.1, b_links.2].into_iter().flatten() {
            self.nodes.get_mut(child).set_parent(Some(a));
        }
    }
}

impl<K: Ord, V> RawTree<K, V> {
    /// Descends from the root comparing keys.
    pub(crate) fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(mut current) = self.root else {
            return SearchResult::NotFound(None);
        };

        loop {
            let node = self.nodes.get(current);
            let side = match key.cmp(node.key().borrow()) {
                Ordering::Equal => return SearchResult::Found(current),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            match node.child(side) {
                Some(child) => current = child,
                None => return SearchResult::NotFound(Some((current, side))),
            }
        }
    }

    /// Returns the node holding `key`, if any.
    pub(crate) fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.search(key) {
            SearchResult::Found(handle) => Some(handle),
            SearchResult::NotFound(_) => None,
        }
    }

    /// Returns a reference to the value corresponding to the key.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).map(|h| self.nodes.get(h).value())
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.find(key)?;
        Some(self.nodes.get_mut(handle).value_mut())
    }

    /// Returns the key-value pair corresponding to the key.
    pub(crate) fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).map(|h| self.entry(h))
    }

    /// Returns true if the tree contains the specified key.
    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).is_some()
    }

    /// Inserts without rebalancing. Returns the old value if the key was already present.
    pub(crate) fn insert_unbalanced(&mut self, key: K, value: V) -> Option<V> {
        match self.search(&key) {
            SearchResult::Found(handle) => Some(self.nodes.get_mut(handle).replace_value(value)),
            SearchResult::NotFound(position) => {
                self.attach(key, value, position);
                None
            }
        }
    }

    /// Removes without rebalancing. A node with two children first trades places with its
    /// in-order predecessor, which leaves it with at most one child.
    pub(crate) fn remove_unbalanced<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let target = self.find(key)?;
        if let Some(predecessor) = self.two_child_predecessor(target) {
            self.node_swap(predecessor, target);
        }
        let (entry, _) = self.splice_out(target);
        Some(entry)
    }

    /// Returns the predecessor of `handle` if it has both children, i.e. when it cannot be
    /// spliced out directly.
    pub(crate) fn two_child_predecessor(&self, handle: Handle) -> Option<Handle> {
        let node = self.nodes.get(handle);
        let left = node.left()?;
        node.right()?;
        Some(self.rightmost(left))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::manual_assert, clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use alloc::string::String;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    impl<K: Ord, V> RawTree<K, V> {
        /// Validates the structural invariants shared by every tree: key order, mutual
        /// parent/child links, and `len`. Panics with a descriptive message on violation.
        pub(crate) fn validate_structure(&self) {
            let mut errors: Vec<String> = Vec::new();

            if let Some(root) = self.root {
                if self.parent(root).is_some() {
                    errors.push(alloc::format!("root {:?} has a parent", root));
                }
            } else if self.len != 0 {
                errors.push(alloc::format!("empty tree has len {}", self.len));
            }

            let mut count = 0usize;
            let mut stack: Vec<Handle> = self.root.into_iter().collect();
            while let Some(handle) = stack.pop() {
                count += 1;
                if !self.nodes.contains(handle) {
                    errors.push(alloc::format!("link to freed slot {:?}", handle));
                    continue;
                }
                for side in [Side::Left, Side::Right] {
                    if let Some(child) = self.child(handle, side) {
                        if self.parent(child) != Some(handle) {
                            errors.push(alloc::format!(
                                "child {:?} of {:?} points back at {:?}",
                                child,
                                handle,
                                self.parent(child)
                            ));
                        }
                        stack.push(child);
                    }
                }
            }

            if count != self.len {
                errors.push(alloc::format!("len mismatch: self.len={}, reachable={}", self.len, count));
            }
            if self.nodes.len() != self.len {
                errors.push(alloc::format!("len mismatch: self.len={}, live slots={}", self.len, self.nodes.len()));
            }

            let order = self.in_order();
            for pair in order.windows(2) {
                if self.node(pair[0]).key() >= self.node(pair[1]).key() {
                    errors.push(alloc::format!("keys out of order at {:?} and {:?}", pair[0], pair[1]));
                }
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        /// Returns the keys of the tree in pre-order, for comparing exact shapes.
        pub(crate) fn pre_order_keys(&self) -> Vec<&K> {
            let mut keys = Vec::new();
            let mut stack: Vec<Handle> = self.root.into_iter().collect();
            while let Some(handle) = stack.pop() {
                keys.push(self.node(handle).key());
                stack.extend(self.child(handle, Side::Right));
                stack.extend(self.child(handle, Side::Left));
            }
            keys
        }

        pub(crate) fn handle_of(&self, key: &K) -> Handle {
            self.find(key).expect("key should be present")
        }

        pub(crate) fn live_slots(&self) -> usize {
            self.nodes.len()
        }
    }

    fn tree_of(keys: &[i32]) -> RawTree<i32, i32> {
        let mut tree = RawTree::new();
        for &k in keys {
            tree.insert_unbalanced(k, k * 10);
        }
        tree.validate_structure();
        tree
    }

    fn key_of(tree: &RawTree<i32, i32>, handle: Option<Handle>) -> Option<i32> {
        handle.map(|h| *tree.node(h).key())
    }

    #[test]
    fn insert_attaches_on_the_correct_side() {
        let tree = tree_of(&[5, 3, 8, 1, 4]);
        assert_eq!(tree.pre_order_keys(), [&5, &3, &1, &4, &8]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn insert_existing_key_replaces_value_only() {
        let mut tree = tree_of(&[2, 1, 3]);
        let before = tree.handle_of(&1);
        assert_eq!(tree.insert_unbalanced(1, 99), Some(10));
        assert_eq!(tree.handle_of(&1), before);
        assert_eq!(tree.get(&1), Some(&99));
        assert_eq!(tree.len(), 3);
        tree.validate_structure();
    }

    #[test]
    fn predecessor_and_successor_walk_in_order() {
        let tree = tree_of(&[50, 30, 70, 20, 40, 60, 80, 35, 45, 65]);
        let keys: Vec<i32> = tree.in_order().into_iter().map(|h| *tree.node(h).key()).collect();
        assert_eq!(keys, [20, 30, 35, 40, 45, 50, 60, 65, 70, 80]);

        // Left subtree present: rightmost of it.
        assert_eq!(key_of(&tree, tree.predecessor(tree.handle_of(&50))), Some(45));
        // No left subtree, we are a right child: parent.
        assert_eq!(key_of(&tree, tree.predecessor(tree.handle_of(&65))), Some(60));
        // No left subtree, climb through left-child steps.
        assert_eq!(key_of(&tree, tree.predecessor(tree.handle_of(&60))), Some(50));
        assert_eq!(key_of(&tree, tree.predecessor(tree.handle_of(&35))), Some(30));
        // Smallest key has none.
        assert_eq!(key_of(&tree, tree.predecessor(tree.handle_of(&20))), None);

        assert_eq!(key_of(&tree, tree.successor(tree.handle_of(&45))), Some(50));
        assert_eq!(key_of(&tree, tree.successor(tree.handle_of(&30))), Some(35));
        assert_eq!(key_of(&tree, tree.successor(tree.handle_of(&80))), None);
    }

    #[test]
    fn remove_leaf_single_child_and_root() {
        let mut tree = tree_of(&[5, 3, 8, 1, 9]);

        assert_eq!(tree.remove_unbalanced(&1), Some((1, 10)));
        tree.validate_structure();
        assert_eq!(tree.pre_order_keys(), [&5, &3, &8, &9]);

        // 8 has only a right child, which moves up.
        assert_eq!(tree.remove_unbalanced(&8), Some((8, 80)));
        tree.validate_structure();
        assert_eq!(tree.pre_order_keys(), [&5, &3, &9]);

        assert_eq!(tree.remove_unbalanced(&42), None);
        assert_eq!(tree.len(), 3);

        assert_eq!(tree.remove_unbalanced(&5), Some((5, 50)));
        tree.validate_structure();
        assert_eq!(tree.pre_order_keys(), [&3, &9]);

        tree.remove_unbalanced(&3);
        tree.remove_unbalanced(&9);
        tree.validate_structure();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
    }

    #[test]
    fn remove_root_with_only_left_child_promotes_it() {
        let mut tree = tree_of(&[5, 3, 1]);
        tree.remove_unbalanced(&5);
        tree.validate_structure();
        assert_eq!(tree.pre_order_keys(), [&3, &1]);
    }

    #[test]
    fn remove_two_children_uses_predecessor() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40, 45]);
        assert_eq!(tree.remove_unbalanced(&50), Some((50, 500)));
        tree.validate_structure();
        // 45 was the rightmost node of the left subtree and now heads the tree.
        assert_eq!(tree.pre_order_keys(), [&45, &30, &20, &40, &70]);
    }

    // Swaps break key order, so every handle is looked up before the swap and links are
    // checked through handles afterwards.

    #[test]
    fn node_swap_adjacent_left_child() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40]);
        let [h50, h30, h70, h20, h40] = [50, 30, 70, 20, 40].map(|k| tree.handle_of(&k));
        tree.node_swap(h30, h50);

        assert_eq!(tree.root(), Some(h30));
        assert_eq!(tree.parent(h30), None);
        assert_eq!(tree.child(h30, Side::Left), Some(h50));
        assert_eq!(tree.child(h30, Side::Right), Some(h70));
        assert_eq!(tree.parent(h50), Some(h30));
        assert_eq!(tree.child(h50, Side::Left), Some(h20));
        assert_eq!(tree.child(h50, Side::Right), Some(h40));
        assert_eq!(tree.parent(h20), Some(h50));
        assert_eq!(tree.parent(h40), Some(h50));
        assert_eq!(tree.parent(h70), Some(h30));
        // Payloads did not move.
        assert_eq!(tree.entry(h50), (&50, &500));
        assert_eq!(tree.pre_order_keys(), [&30, &50, &20, &40, &70]);
    }

    #[test]
    fn node_swap_adjacent_right_child_below_root() {
        let mut tree = tree_of(&[10, 5, 20, 30, 25]);
        let [h10, h20, h30, h25] = [10, 20, 30, 25].map(|k| tree.handle_of(&k));
        tree.node_swap(h20, h30);

        assert_eq!(tree.root(), Some(h10));
        assert_eq!(tree.child(h10, Side::Right), Some(h30));
        assert_eq!(tree.parent(h30), Some(h10));
        assert_eq!(tree.child(h30, Side::Right), Some(h20));
        assert_eq!(tree.child(h30, Side::Left), None);
        assert_eq!(tree.parent(h20), Some(h30));
        assert_eq!(tree.child(h20, Side::Left), Some(h25));
        assert_eq!(tree.child(h20, Side::Right), None);
        assert_eq!(tree.parent(h25), Some(h20));
        assert_eq!(tree.pre_order_keys(), [&10, &5, &30, &20, &25]);
    }

    #[test]
    fn node_swap_disjoint_root_and_deep_node() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40, 45]);
        let [h50, h30, h70, h40, h45] = [50, 30, 70, 40, 45].map(|k| tree.handle_of(&k));
        tree.node_swap(h45, h50);

        assert_eq!(tree.root(), Some(h45));
        assert_eq!(tree.parent(h45), None);
        assert_eq!(tree.child(h45, Side::Left), Some(h30));
        assert_eq!(tree.child(h45, Side::Right), Some(h70));
        assert_eq!(tree.parent(h30), Some(h45));
        assert_eq!(tree.parent(h70), Some(h45));
        assert_eq!(tree.child(h40, Side::Right), Some(h50));
        assert_eq!(tree.parent(h50), Some(h40));
        assert!(tree.node(h50).is_leaf());
        assert_eq!(tree.pre_order_keys(), [&45, &30, &20, &40, &50, &70]);
    }

    #[test]
    fn node_swap_siblings_and_grandchild() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40]);
        let [h50, h30, h70, h20, h40] = [50, 30, 70, 20, 40].map(|k| tree.handle_of(&k));

        tree.node_swap(h30, h70);
        assert_eq!(tree.child(h50, Side::Left), Some(h70));
        assert_eq!(tree.child(h50, Side::Right), Some(h30));
        assert_eq!(tree.parent(h70), Some(h50));
        assert_eq!(tree.parent(h30), Some(h50));
        assert_eq!(tree.child(h70, Side::Left), Some(h20));
        assert_eq!(tree.child(h70, Side::Right), Some(h40));
        assert_eq!(tree.parent(h20), Some(h70));
        assert_eq!(tree.parent(h40), Some(h70));
        assert!(tree.node(h30).is_leaf());
        assert_eq!(tree.pre_order_keys(), [&50, &70, &20, &40, &30]);

        // Swapping back restores a valid search tree.
        tree.node_swap(h70, h30);
        tree.validate_structure();
        assert_eq!(tree.pre_order_keys(), [&50, &30, &20, &40, &70]);

        // Grandparent and grandchild.
        tree.node_swap(h50, h20);
        assert_eq!(tree.root(), Some(h20));
        assert_eq!(tree.parent(h20), None);
        assert_eq!(tree.child(h20, Side::Left), Some(h30));
        assert_eq!(tree.child(h20, Side::Right), Some(h70));
        assert_eq!(tree.parent(h30), Some(h20));
        assert_eq!(tree.parent(h70), Some(h20));
        assert_eq!(tree.child(h30, Side::Left), Some(h50));
        assert_eq!(tree.child(h30, Side::Right), Some(h40));
        assert_eq!(tree.parent(h50), Some(h30));
        assert!(tree.node(h50).is_leaf());
        assert_eq!(tree.pre_order_keys(), [&20, &30, &50, &40, &70]);
    }

    #[test]
    fn node_swap_with_itself_is_a_no_op() {
        let mut tree = tree_of(&[2, 1, 3]);
        let root = tree.handle_of(&2);
        tree.node_swap(root, root);
        tree.validate_structure();
        assert_eq!(tree.pre_order_keys(), [&2, &1, &3]);
    }

    #[test]
    fn clear_frees_every_node_and_is_reusable() {
        // Root with only a left subtree, then a right-only chain below it.
        let mut tree = tree_of(&[10, 5, 3, 4, 7, 6, 8, 9]);
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.live_slots(), 0);
        tree.validate_structure();

        tree.insert_unbalanced(1, 1);
        tree.validate_structure();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn clear_handles_degenerate_chains() {
        let mut tree: RawTree<i32, i32> = RawTree::new();
        for k in 0..5_000 {
            tree.insert_unbalanced(k, k);
        }
        assert_eq!(tree.height(), 5_000);
        assert!(!tree.is_balanced());
        tree.clear();
        assert_eq!(tree.live_slots(), 0);
    }

    #[test]
    fn audit_heights() {
        let empty: RawTree<i32, i32> = RawTree::new();
        assert_eq!(empty.audit_heights(), (0, true));

        assert_eq!(tree_of(&[2, 1, 3]).audit_heights(), (2, true));
        assert_eq!(tree_of(&[1, 2, 3]).audit_heights(), (3, false));
        assert_eq!(tree_of(&[4, 2, 6, 1, 3, 5, 7, 8]).audit_heights(), (4, true));
        // Root is balanced in height but a child is not.
        assert_eq!(tree_of(&[4, 2, 6, 1, 7, 0, 8]).audit_heights(), (4, false));
    }

    #[test]
    fn drain_returns_sorted_entries() {
        let mut tree = tree_of(&[3, 1, 2]);
        assert_eq!(tree.drain_to_vec(), [(1, 10), (2, 20), (3, 30)]);
        assert!(tree.is_empty());
        assert_eq!(tree.live_slots(), 0);
    }

    #[test]
    fn entries_mut_in_key_order() {
        let mut tree = tree_of(&[3, 1, 2]);
        for (k, v) in tree.entries_mut() {
            *v += *k;
        }
        assert_eq!(tree.drain_to_vec(), [(1, 11), (2, 22), (3, 33)]);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Remove(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..200).prop_map(Op::Insert),
            2 => (0i32..200).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn structure_maintained_after_operations(ops in prop::collection::vec(op_strategy(), 0..400)) {
            let mut tree: RawTree<i32, i32> = RawTree::new();
            let mut model = alloc::collections::BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        prop_assert_eq!(tree.insert_unbalanced(key, key), model.insert(key, key));
                    }
                    Op::Remove(key) => {
                        prop_assert_eq!(tree.remove_unbalanced(&key), model.remove_entry(&key));
                    }
                }
                tree.validate_structure();
            }

            let (height, balanced) = tree.audit_heights();
            prop_assert!(height <= tree.len());
            prop_assert_eq!(balanced, tree.is_balanced());
        }
    }
}
