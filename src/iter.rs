use core::{fmt, iter::FusedIterator};

use crate::{AvlTree, Dir, Link};

enum CameFrom {
    Parent,
    LeftChild,
    Here,
    RightChild,
}

/// An iterator over the elements of an [`AvlTree`] in ascending order.
///
/// Returned by [`AvlTree::iter`]. Advancing walks the tree's parent links, so
/// no auxiliary stack is needed.
pub struct Iter<'tree, T: Ord> {
    tree: &'tree AvlTree<T>,

    front_cur: Link<T>,
    front_from: CameFrom,

    len: usize,
}

impl<'tree, T: Ord> Iter<'tree, T> {
    pub(crate) fn new(tree: &'tree AvlTree<T>) -> Self {
        Iter {
            tree,

            front_cur: tree.root,
            front_from: CameFrom::Parent,
            len: tree.len(),
        }
    }
}

impl<'tree, T: Ord> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let mut cur = self.front_cur?;

        loop {
            match self.front_from {
                CameFrom::Parent => {
                    // Upon entering a new subtree, find the minimum element.
                    while let Some(left) = unsafe { cur.as_ref().left() } {
                        cur = left;
                    }

                    // Once the minimum is found, its (empty) left subtree has
                    // been exhausted.
                    self.front_from = CameFrom::LeftChild;
                }

                CameFrom::LeftChild => {
                    // The left subtree has been exhausted, so this node is up
                    // next. Save off the iterator state and return it.
                    self.front_cur = Some(cur);
                    self.front_from = CameFrom::Here;
                    self.len -= 1;

                    return Some(unsafe { &(*cur.as_ptr()).key });
                }

                CameFrom::Here => {
                    // The current node was just yielded.
                    if let Some(right) = unsafe { cur.as_ref().right() } {
                        // If the right subtree is not empty, go there.
                        self.front_from = CameFrom::Parent;

                        cur = right;
                    } else if let Some(parent) = unsafe { cur.as_ref().parent() } {
                        // Otherwise, ascend one level.
                        self.front_from =
                            match unsafe { self.tree.which_child(parent, Some(cur)) } {
                                Dir::Left => CameFrom::LeftChild,
                                Dir::Right => CameFrom::RightChild,
                            };

                        cur = parent;
                    } else {
                        // The root's right subtree is only entered after the
                        // root is yielded, so running out of parents here
                        // means every element has been yielded and the length
                        // guard has already returned.
                        unreachable!()
                    }
                }

                CameFrom::RightChild => {
                    // This node and its whole subtree are exhausted. Ascend
                    // until arriving at a node from its left child; that node
                    // is the successor.
                    loop {
                        let Some(parent) = (unsafe { cur.as_ref().parent() }) else {
                            // Unreachable for the same reason as above.
                            unreachable!()
                        };

                        let from = unsafe { self.tree.which_child(parent, Some(cur)) };
                        cur = parent;

                        if from == Dir::Left {
                            break;
                        }
                    }

                    self.front_from = CameFrom::LeftChild;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, T: Ord> ExactSizeIterator for Iter<'tree, T> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<'tree, T: Ord> FusedIterator for Iter<'tree, T> {}

unsafe impl<T: Ord + Sync> Send for Iter<'_, T> {}
unsafe impl<T: Ord + Sync> Sync for Iter<'_, T> {}

impl<T: Ord> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("len", &self.len).finish()
    }
}
