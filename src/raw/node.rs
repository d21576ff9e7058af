use super::handle::Handle;

/// Which child link of a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    /// Returns the other side.
    #[inline]
    pub(crate) const fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// The balance change caused by the subtree on this side growing by one level.
    #[inline]
    pub(crate) const fn unit(self) -> i8 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }
}

/// A tree node: one key/value pair plus its links.
///
/// `left` and `right` are the owning links of the tree shape. `parent` is a back-reference
/// used only to walk upward; it never decides when a node is freed.
pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    parent: Option<Handle>,
    left: Option<Handle>,
    right: Option<Handle>,
    // height(right) - height(left). Only -1, 0 and 1 are valid between operations; -2 and 2
    // exist transiently while a fix-up is running. Unused by the unbalanced tree.
    balance: i8,
}

impl<K: Clone, V: Clone> Clone for Node<K, V> {
    fn clone(&self) -> Self {
        Node {
            key: self.key.clone(),
            value: self.value.clone(),
            parent: self.parent,
            left: self.left,
            right: self.right,
            balance: self.balance,
        }
    }
}

impl<K, V> Node<K, V> {
    /// Creates a detached, balanced leaf below `parent`.
    pub(crate) const fn new(key: K, value: V, parent: Option<Handle>) -> Self {
        Self {
            key,
            value,
            parent,
            left: None,
            right: None,
            balance: 0,
        }
    }

    #[inline]
    pub(crate) const fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) const fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    #[inline]
    pub(crate) fn key_value_mut(&mut self) -> (&K, &mut V) {
        (&self.key, &mut self.value)
    }

    /// Replaces the stored value, returning the previous one. Links and balance are untouched.
    pub(crate) fn replace_value(&mut self, value: V) -> V {
        core::mem::replace(&mut self.value, value)
    }

    /// Consumes the node, returning its payload.
    pub(crate) fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }

    #[inline]
    pub(crate) const fn parent(&self) -> Option<Handle> {
        self.parent
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    #[inline]
    pub(crate) const fn left(&self) -> Option<Handle> {
        self.left
    }

    #[inline]
    pub(crate) const fn right(&self) -> Option<Handle> {
        self.right
    }

    #[inline]
    pub(crate) const fn child(&self, side: Side) -> Option<Handle> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, child: Option<Handle>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    /// Returns the side `child` hangs on, or `None` if it is not a child of this node.
    #[inline]
    pub(crate) fn side_of(&self, child: Handle) -> Option<Side> {
        if self.left == Some(child) {
            Some(Side::Left)
        } else if self.right == Some(child) {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Returns the three structural links as `(parent, left, right)`.
    #[inline]
    pub(crate) const fn links(&self) -> (Option<Handle>, Option<Handle>, Option<Handle>) {
        (self.parent, self.left, self.right)
    }

    /// Overwrites all three structural links at once.
    #[inline]
    pub(crate) fn set_links(&mut self, (parent, left, right): (Option<Handle>, Option<Handle>, Option<Handle>)) {
        self.parent = parent;
        self.left = left;
        self.right = right;
    }

    /// Returns true if the node has no children.
    #[cfg(test)]
    pub(crate) const fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    #[inline]
    pub(crate) const fn balance(&self) -> i8 {
        self.balance
    }

    #[inline]
    pub(crate) fn set_balance(&mut self, balance: i8) {
        debug_assert!((-2..=2).contains(&balance), "balance factor {balance} out of range");
        self.balance = balance;
    }
}
