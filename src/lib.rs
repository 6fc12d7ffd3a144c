//! An ordered multiset built on a self-balancing AVL tree.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Height and balance conventions:
// - A missing subtree has height -1; a leaf has height 0.
// - `height(x) = 1 + max(height(left(x)), height(right(x)))`.
// - `balance(x) = height(left(x)) - height(right(x))`, kept within {-1, 0, 1}.
// - Equal keys descend to the right on insertion. Rotations preserve the
//   in-order sequence but may leave an equal key in a left subtree, so the
//   checkable ordering invariant is that an in-order walk is non-decreasing.

extern crate alloc;

use alloc::boxed::Box;
use core::{borrow::Borrow, cmp::Ordering, fmt, mem, ops::Not, ptr::NonNull};

mod debug;
mod iter;
#[cfg(any(test, feature = "model"))]
pub mod model;
#[cfg(test)]
mod tests;

pub use iter::Iter;

/// An ordered multiset backed by an [AVL tree].
///
/// Duplicate keys are permitted; an in-order traversal yields keys in
/// non-decreasing order. The tree rebalances itself on every insertion and
/// removal, so lookups, insertions, and removals all complete in _O(log(n))_
/// time.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct AvlTree<T: Ord> {
    root: Link<T>,
    len: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

struct Node<T> {
    parent: Link<T>,
    children: [Link<T>; 2],
    height: i8,
    key: T,
}

type Link<T> = Option<NonNull<Node<T>>>;

impl<T: Ord> AvlTree<T> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree: the longest root-to-leaf edge count.
    ///
    /// An empty tree has height -1; a tree with a single element has height 0.
    pub fn height(&self) -> i8 {
        unsafe { self.height_of(self.root) }
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        if let Some(root) = self.root {
            unsafe {
                assert!(root.as_ref().parent().is_none());
                self.assert_invariants_at(root, None, None);
            }
        }
    }

    // Checks the subtree rooted at `node` and returns its computed height.
    //
    // `min` and `max` are the inclusive key bounds inherited from ancestors;
    // both are inclusive because a rotation may place an equal key on either
    // side of a node.
    #[allow(clippy::only_used_in_recursion)]
    unsafe fn assert_invariants_at(
        &self,
        node: NonNull<Node<T>>,
        min: Option<&T>,
        max: Option<&T>,
    ) -> i8 {
        unsafe {
            let key = &(*node.as_ptr()).key;

            if let Some(min) = min {
                assert!(key >= min);
            }

            if let Some(max) = max {
                assert!(key <= max);
            }

            let mut child_heights = [-1i8; 2];

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = node.as_ref().child(dir) {
                    // Ensure the child's parent link points back to this node.
                    let parent = child
                        .as_ref()
                        .parent()
                        .expect("child parent pointer not set");
                    assert_eq!(parent, node);

                    let (child_min, child_max) = match dir {
                        Dir::Left => (min, Some(key)),
                        Dir::Right => (Some(key), max),
                    };

                    child_heights[dir as usize] =
                        self.assert_invariants_at(child, child_min, child_max);
                }
            }

            // Ensure the cached height is exact, not merely an upper bound.
            let height = 1 + child_heights[0].max(child_heights[1]);
            assert_eq!(node.as_ref().height, height);

            // Ensure the AVL balance factor is within bounds.
            let balance = child_heights[0] - child_heights[1];
            assert!([-1, 0, 1].contains(&balance));

            height
        }
    }

    /// Returns a reference to an element equal to `key`, if one is present.
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        unsafe { Some(&(*node.as_ptr()).key) }
    }

    /// Returns `true` if the tree contains an element equal to `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match key.cmp(cur.as_ref().key.borrow()) {
                    Ordering::Less => opt_cur = cur.as_ref().left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = cur.as_ref().right(),
                }
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<&T> {
        let root = self.root?;
        let (first, _) = unsafe { self.min_in_subtree(root) };

        unsafe { Some(&(*first.as_ptr()).key) }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<&T> {
        let root = self.root?;
        let last = unsafe { self.max_in_subtree(root) };

        unsafe { Some(&(*last.as_ptr()).key) }
    }

    /// Returns an iterator over the elements of the tree in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Inserts `key` into the tree.
    ///
    /// Duplicates are kept: inserting a key equal to one already present adds
    /// another occurrence rather than replacing it.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: T) {
        let mut node = Node::new(key);

        let Some(root) = self.root else {
            // Tree is empty. Set the new node as the root and return.
            self.root = Some(Box::leak(node).into());
            self.len += 1;
            return;
        };

        // Descend the tree, looking for a free slot.
        let mut parent = root;
        let dir = loop {
            let ordering = node.key.cmp(unsafe { &parent.as_ref().key });

            let dir = match ordering {
                Ordering::Less => Dir::Left,
                // Equal keys land in the right subtree.
                Ordering::Equal | Ordering::Greater => Dir::Right,
            };

            match unsafe { parent.as_ref().child(dir) } {
                Some(child) => parent = child,
                None => break dir,
            }
        };

        node.parent = Some(parent);
        let ptr: NonNull<Node<T>> = Box::leak(node).into();

        unsafe {
            parent.as_mut().set_child(dir, Some(ptr));
            self.rebalance_from(Some(parent));
        }

        self.len += 1;
    }

    /// Removes one element equal to `key` from the tree and returns it.
    ///
    /// Returns `None`, leaving the tree unchanged, if no equal element is
    /// present. When `key` occurs more than once, exactly one occurrence is
    /// removed per call.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        Some(unsafe { self.remove_at(node) })
    }

    // Unlinks `node` from the tree and returns its key.
    //
    // # Safety
    //
    // The caller must ensure that `node` is an element of `self`, and not any
    // other tree.
    unsafe fn remove_at(&mut self, node: NonNull<Node<T>>) -> T {
        unsafe {
            // A node with two children trades keys with its in-order
            // predecessor, the maximum of its left subtree. The predecessor
            // has no right child, so it can be spliced out in the target's
            // stead without relinking the target itself.
            let node = match (node.as_ref().left(), node.as_ref().right()) {
                (Some(left), Some(_)) => {
                    let pred = self.max_in_subtree(left);
                    mem::swap(&mut (*node.as_ptr()).key, &mut (*pred.as_ptr()).key);
                    pred
                }
                _ => node,
            };

            debug_assert!(node.as_ref().right().is_none() || node.as_ref().left().is_none());

            let parent = node.as_ref().parent();
            let child = node.as_ref().left().or(node.as_ref().right());

            // Elevate the sole child (which may be None) and rebalance from
            // the unlinked node's former parent.
            self.replace_child_or_set_root(parent, node, child);
            self.maybe_set_parent(child, parent);
            self.rebalance_from(parent);

            self.len -= 1;

            let node = Box::from_raw(node.as_ptr());
            let Node { key, .. } = *node;

            key
        }
    }

    /// Clears the tree, removing and freeing all elements.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let (cur, parent) = self.min_in_subtree(cur);
                let parent = parent.or_else(|| cur.as_ref().parent());

                let right = cur.as_ref().right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                drop(Box::from_raw(cur.as_ptr()));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the
                // node had no parent, the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(mut node) = opt_node else {
            return;
        };

        unsafe { node.as_mut().set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<Node<T>>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with
    // `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    #[cfg(not(debug_assertions))]
    #[inline]
    unsafe fn replace_child(
        &mut self,
        mut parent: NonNull<Node<T>>,
        old_child: NonNull<Node<T>>,
        new_child: Link<T>,
    ) {
        unsafe {
            if parent.as_ref().left() == Some(old_child) {
                parent.as_mut().set_child(Dir::Left, new_child);
            } else {
                parent.as_mut().set_child(Dir::Right, new_child);
            }
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with
    // `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    #[cfg(debug_assertions)]
    unsafe fn replace_child(
        &mut self,
        mut parent: NonNull<Node<T>>,
        old_child: NonNull<Node<T>>,
        new_child: Link<T>,
    ) {
        unsafe {
            if parent.as_ref().left() == Some(old_child) {
                if let Some(new_child) = new_child {
                    assert_ne!(
                        parent.as_ref().right(),
                        Some(new_child),
                        "`new_child` must not be a child of `parent`"
                    );
                }

                parent.as_mut().set_child(Dir::Left, new_child);
            } else if parent.as_ref().right() == Some(old_child) {
                if let Some(new_child) = new_child {
                    assert_ne!(
                        parent.as_ref().left(),
                        Some(new_child),
                        "`new_child` must not be a child of `parent`"
                    );
                }

                parent.as_mut().set_child(Dir::Right, new_child);
            } else {
                unreachable!("`old_child` must be a child of `parent`");
            }
        }
    }

    // Performs a rotation in direction `dir` at `down`: the `!dir` child of
    // `down` is promoted into its place, and `down` becomes that child's
    // `dir` child. The in-order sequence is unchanged.
    //
    // At exit, `down`'s height is recomputed from its children and the
    // promoted node's height is set to exactly one more. For every shape this
    // rotation is invoked on, that puts both heights exactly right; the
    // invariant checker verifies as much after every mutation under test.
    unsafe fn rotate(&mut self, mut down: NonNull<Node<T>>, dir: Dir) {
        unsafe {
            let mut up = down
                .as_ref()
                .child(!dir)
                .expect("rotation requires a child on the taller side");

            debug_assert!(self.root != Some(up));

            // `across` moves from the `dir` child of `up` to the `!dir` child
            // of `down`.
            let across = up.as_ref().child(dir);
            down.as_mut().set_child(!dir, across);
            self.maybe_set_parent(across, Some(down));

            up.as_mut().set_child(dir, Some(down));
            let parent = down.as_mut().set_parent(Some(up));
            up.as_mut().set_parent(parent);

            self.replace_child_or_set_root(parent, down, Some(up));

            self.update_height(down);
            up.as_mut().height = down.as_ref().height + 1;
        }
    }

    // Restores the balance factor of `node` to within ±1, rotating per the
    // four AVL cases.
    unsafe fn enforce_balance(&mut self, node: NonNull<Node<T>>) {
        unsafe {
            let balance = self.balance_of(Some(node));

            if balance > 1 {
                if self.balance_of(node.as_ref().left()) < 0 {
                    // Left-right: the left child leans right, so straighten it
                    // first.
                    let left = node.as_ref().left().expect("left-heavy node has a left child");
                    self.rotate(left, Dir::Left);
                }

                self.rotate(node, Dir::Right);
            } else if balance < -1 {
                if self.balance_of(node.as_ref().right()) > 0 {
                    // Right-left mirror.
                    let right = node.as_ref().right().expect("right-heavy node has a right child");
                    self.rotate(right, Dir::Right);
                }

                self.rotate(node, Dir::Left);
            }
        }
    }

    // Climbs from `from` to the root, refreshing each node's height and
    // rotating wherever the balance factor has left ±1.
    //
    // The climb never stops early: one insertion unbalances at most one
    // ancestor, but a removal can demand a rotation at every level.
    unsafe fn rebalance_from(&mut self, from: Link<T>) {
        let mut opt_node = from;

        while let Some(node) = opt_node {
            unsafe {
                self.update_height(node);
                self.enforce_balance(node);

                // Read the parent link only now: if a rotation demoted `node`,
                // this visits the node promoted into its place before resuming
                // the ancestor chain above it.
                opt_node = node.as_ref().parent();
            }
        }
    }

    // Returns the minimum node in the subtree.
    //
    // If the subtree root is not the minimum, also returns the minimum node's
    // parent.
    #[inline]
    unsafe fn min_in_subtree(&self, root: NonNull<Node<T>>) -> (NonNull<Node<T>>, Link<T>) {
        let mut parent = None;
        let mut cur = root;

        while let Some(left) = unsafe { cur.as_ref().left() } {
            parent = Some(cur);
            cur = left;
        }

        (cur, parent)
    }

    // Returns the maximum node in the subtree.
    #[inline]
    unsafe fn max_in_subtree(&self, root: NonNull<Node<T>>) -> NonNull<Node<T>> {
        let mut cur = root;

        while let Some(right) = unsafe { cur.as_ref().right() } {
            cur = right;
        }

        cur
    }

    // Support methods ========================================================

    // Returns the cached height of the pointed-to node, or -1 for a missing
    // subtree.
    #[inline]
    unsafe fn height_of(&self, node: Link<T>) -> i8 {
        node.map(|n| unsafe { n.as_ref().height }).unwrap_or(-1)
    }

    // Returns the balance factor of the pointed-to node, or 0 for a missing
    // subtree.
    #[inline]
    unsafe fn balance_of(&self, node: Link<T>) -> i8 {
        let Some(node) = node else {
            return 0;
        };

        unsafe { self.height_of(node.as_ref().left()) - self.height_of(node.as_ref().right()) }
    }

    // Recomputes the cached height of `node` from its children's caches.
    #[inline]
    unsafe fn update_height(&mut self, mut node: NonNull<Node<T>>) {
        unsafe {
            let height = 1 + i8::max(
                self.height_of(node.as_ref().left()),
                self.height_of(node.as_ref().right()),
            );

            node.as_mut().height = height;
        }
    }

    unsafe fn which_child(&self, parent: NonNull<Node<T>>, child: Link<T>) -> Dir {
        if unsafe { parent.as_ref().left() } == child {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

impl<T: Ord> Drop for AvlTree<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Ord> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + fmt::Debug> fmt::Debug for AvlTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

unsafe impl<T: Ord + Send> Send for AvlTree<T> {}
unsafe impl<T: Ord + Sync> Sync for AvlTree<T> {}

impl<T> Node<T> {
    fn new(key: T) -> Box<Node<T>> {
        Box::new(Node {
            parent: None,
            children: [None; 2],
            height: 0,
            key,
        })
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        self.parent
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        self.children[dir as usize]
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.children[dir as usize], child)
    }
}
