//! AVL rebalancing on top of [`RawTree`].
//!
//! Every node carries `balance = height(right) - height(left)`. Inserts and removes mutate
//! the links exactly like the unbalanced tree and then walk upward from the mutated site,
//! adjusting balance factors and rotating wherever a factor reaches ±2.

use core::borrow::Borrow;

use super::handle::Handle;
use super::node::Side;
use super::raw_tree::{RawTree, SearchResult};

impl<K, V> RawTree<K, V> {
    /// Moves `node` down towards `direction` and promotes its child on the other side into its
    /// position. `rotate(x, Side::Left)` is a left rotation: `x.right` takes `x`'s place, `x`
    /// becomes its left child and inherits its former left subtree. The root or the parent's
    /// child link is updated; balance factors are left to the caller.
    ///
    /// # Panics
    ///
    /// Panics if `node` has no child on the side opposite to `direction`.
    pub(crate) fn rotate(&mut self, node: Handle, direction: Side) {
        let promote = direction.opposite();
        let pivot = self
            .child(node, promote)
            .expect("`RawTree::rotate()` - `node` has no child to promote!");
        let position = self.position(node);
        let inner = self.child(pivot, direction);

        self.node_mut(node).set_child(promote, inner);
        if let Some(inner) = inner {
            self.node_mut(inner).set_parent(Some(node));
        }

        self.node_mut(pivot).set_parent(position.map(|(parent, _)| parent));
        self.relink(position, Some(pivot));

        self.node_mut(pivot).set_child(direction, Some(node));
        self.node_mut(node).set_parent(Some(pivot));

        log::trace!("rotated {node:?} {direction:?}, promoted {pivot:?}");
    }

    /// Structural [`node_swap`](Self::node_swap) followed by an exchange of the two balance
    /// factors.
    ///
    /// Each factor first travels with its node and is then traded back, so the factor ends up
    /// staying with the tree position rather than with the key.
    pub(crate) fn node_swap_balanced(&mut self, a: Handle, b: Handle) {
        self.node_swap(a, b);
        let (a_balance, b_balance) = (self.balance(a), self.balance(b));
        self.set_balance(a, b_balance);
        self.set_balance(b, a_balance);
    }

    /// Restores the AVL invariant after `node` was added below `parent`, whose balance was 0
    /// before the insert and has already been set to lean towards `node`.
    pub(crate) fn insert_fix(&mut self, mut parent: Handle, mut node: Handle) {
        while let Some((grandparent, side)) = self.position(parent) {
            let balance = self.balance(grandparent) + side.unit();
            self.set_balance(grandparent, balance);

            match balance {
                0 => return,
                -1 | 1 => {
                    node = parent;
                    parent = grandparent;
                }
                _ => {
                    self.rebalance_after_insert(grandparent, parent, node, side);
                    return;
                }
            }
        }
    }

    /// `grandparent` is doubly heavy on `side`, where `parent` hangs.
    fn rebalance_after_insert(&mut self, grandparent: Handle, parent: Handle, node: Handle, side: Side) {
        let lean = side.unit();
        let node_side = self
            .node(parent)
            .side_of(node)
            .expect("`RawTree::insert_fix()` - `node` is not a child of `parent`!");

        if node_side == side {
            // Zig-zig.
            self.rotate(grandparent, side.opposite());
            self.set_balance(parent, 0);
            self.set_balance(grandparent, 0);
            log::trace!("insert fix-up: single rotation at {grandparent:?}");
        } else {
            // Zig-zag: `node` ends up on top, `parent` and `grandparent` split its subtrees.
            let node_balance = self.balance(node);
            self.rotate(parent, side);
            self.rotate(grandparent, side.opposite());

            let (parent_balance, grandparent_balance) = if node_balance == lean {
                (0, -lean)
            } else if node_balance == -lean {
                (lean, 0)
            } else {
                (0, 0)
            };
            self.set_balance(parent, parent_balance);
            self.set_balance(grandparent, grandparent_balance);
            self.set_balance(node, 0);
            log::trace!("insert fix-up: double rotation at {parent:?} and {grandparent:?}");
        }
    }

    /// Restores the AVL invariant after one of `node`'s subtrees lost a level.
    ///
    /// `diff` is +1 when the left subtree shrank and -1 when the right one did. The walk goes
    /// upward until a subtree's height is found unchanged.
    pub(crate) fn remove_fix(&mut self, mut node: Option<Handle>, mut diff: i8) {
        while let Some(current) = node {
            // Taken before any rotation moves `current`.
            let position = self.position(current);
            let balance = self.balance(current) + diff;

            match balance {
                0 => self.set_balance(current, 0),
                -1 | 1 => {
                    self.set_balance(current, balance);
                    return;
                }
                -2 | 2 => {
                    let heavy = if balance < 0 { Side::Left } else { Side::Right };
                    if !self.rebalance_after_remove(current, heavy) {
                        return;
                    }
                }
                _ => unreachable!("`RawTree::remove_fix()` - balance factor {balance} out of range!"),
            }

            node = position.map(|(parent, _)| parent);
            diff = position.map_or(0, |(_, side)| -side.unit());
        }
        log::trace!("remove fix-up reached the root");
    }

    /// Rotates a node that is doubly heavy on `heavy`. Returns true if the subtree got
    /// shorter, meaning the fix-up has to continue upward.
    fn rebalance_after_remove(&mut self, node: Handle, heavy: Side) -> bool {
        let lean = heavy.unit();
        let child = self
            .child(node, heavy)
            .expect("`RawTree::remove_fix()` - doubly heavy node has no child on its heavy side!");
        let child_balance = self.balance(child);

        if child_balance == lean {
            self.rotate(node, heavy.opposite());
            self.set_balance(node, 0);
            self.set_balance(child, 0);
            log::trace!("remove fix-up: single rotation at {node:?}, height shrank");
            true
        } else if child_balance == 0 {
            self.rotate(node, heavy.opposite());
            self.set_balance(node, lean);
            self.set_balance(child, -lean);
            log::trace!("remove fix-up: single rotation at {node:?}, height kept");
            false
        } else {
            let grandchild = self
                .child(child, heavy.opposite())
                .expect("`RawTree::remove_fix()` - child leaning inward has no inner child!");
            let grandchild_balance = self.balance(grandchild);
            self.rotate(child, heavy);
            self.rotate(node, heavy.opposite());

            let (node_balance, child_balance) = if grandchild_balance == -lean {
                (0, lean)
            } else if grandchild_balance == lean {
                (-lean, 0)
            } else {
                (0, 0)
            };
            self.set_balance(node, node_balance);
            self.set_balance(child, child_balance);
            self.set_balance(grandchild, 0);
            log::trace!("remove fix-up: double rotation at {child:?} and {node:?}");
            true
        }
    }
}

impl<K: Ord, V> RawTree<K, V> {
    /// Inserts a key-value pair and rebalances.
    /// Returns the old value if the key was already present; the node and its balance are kept.
    pub(crate) fn insert_balanced(&mut self, key: K, value: V) -> Option<V> {
        match self.search(&key) {
            SearchResult::Found(handle) => Some(self.node_mut(handle).replace_value(value)),
            SearchResult::NotFound(position) => {
                let handle = self.attach(key, value, position);
                if let Some((parent, side)) = position {
                    // A leaning parent had its only empty slot filled and is level again.
                    if self.balance(parent) == 0 {
                        self.set_balance(parent, side.unit());
                        self.insert_fix(parent, handle);
                    } else {
                        self.set_balance(parent, 0);
                    }
                }
                None
            }
        }
    }

    /// Removes a key and rebalances. Returns the removed entry, or `None` if absent.
    pub(crate) fn remove_balanced<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let target = self.find(key)?;
        Some(self.remove_handle_balanced(target))
    }

    /// Removes the node at `handle` and rebalances.
    pub(crate) fn remove_handle_balanced(&mut self, target: Handle) -> (K, V) {
        if let Some(predecessor) = self.two_child_predecessor(target) {
            self.node_swap_balanced(predecessor, target);
        }

        let (entry, position) = self.splice_out(target);
        if let Some((parent, side)) = position {
            self.remove_fix(Some(parent), -side.unit());
        }
        entry
    }
}
