//! Iterators over an [`RbTree`].
//!
//! All traversals are threaded through parent pointers; none of them recurse or allocate.

use core::{iter::FusedIterator, ptr::NonNull};

use cordyceps::Linked;

use crate::{Dir, Link, Links, RbTree};

/// An in-order iterator over the elements of an [`RbTree`].
pub struct Iter<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: &'tree RbTree<T, C>,

    front: Link<T>,
    back: Link<T>,

    len: usize,
}

impl<'tree, T, C> Iter<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree RbTree<T, C>) -> Self {
        Iter {
            tree,

            front: tree.first,
            back: tree.last,
            len: tree.len(),
        }
    }
}

impl<'tree, T, C> Iterator for Iter<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.front?;
        self.len -= 1;

        unsafe {
            self.front = self.tree.successor_raw(cur);
            Some(cur.as_ref())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, T, C> DoubleEndedIterator for Iter<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        // The length is shared by both ends, so they never cross.
        if self.len == 0 {
            return None;
        }

        let cur = self.back?;
        self.len -= 1;

        unsafe {
            self.back = self.tree.predecessor_raw(cur);
            Some(cur.as_ref())
        }
    }
}

impl<T, C> ExactSizeIterator for Iter<'_, T, C> where T: Linked<Links<T>> + ?Sized {}

impl<T, C> FusedIterator for Iter<'_, T, C> where T: Linked<Links<T>> + ?Sized {}

/// An iterator visiting each element of an [`RbTree`] before its children.
pub struct PreOrder<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: &'tree RbTree<T, C>,
    next: Link<T>,
}

impl<'tree, T, C> PreOrder<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree RbTree<T, C>) -> Self {
        PreOrder {
            tree,
            next: tree.root,
        }
    }
}

impl<'tree, T, C> Iterator for PreOrder<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;

        unsafe {
            self.next = self.tree.pre_order_successor(cur);
            Some(cur.as_ref())
        }
    }
}

impl<T, C> FusedIterator for PreOrder<'_, T, C> where T: Linked<Links<T>> + ?Sized {}

/// An iterator visiting each element of an [`RbTree`] after its children.
pub struct PostOrder<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: &'tree RbTree<T, C>,
    next: Link<T>,
}

impl<'tree, T, C> PostOrder<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    pub(crate) fn new(tree: &'tree RbTree<T, C>) -> Self {
        PostOrder {
            tree,
            next: tree.root.map(|root| unsafe { tree.deepest_first(root) }),
        }
    }
}

impl<'tree, T, C> Iterator for PostOrder<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;

        unsafe {
            self.next = self.tree.post_order_successor(cur);
            Some(cur.as_ref())
        }
    }
}

impl<T, C> FusedIterator for PostOrder<'_, T, C> where T: Linked<Links<T>> + ?Sized {}

impl<T, C> RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    // Returns the in-order neighbor of `node` in direction `dir`.
    //
    // If `node` has a `dir` subtree, this is the nearest element of that subtree. Otherwise it is
    // the first ancestor reached from its `!dir` side, or `None` at the edge of the tree.
    unsafe fn step(&self, node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe {
            if let Some(child) = self.links(node).child(dir) {
                return Some(self.extreme(child, !dir));
            }

            let mut cur = node;
            while let Some(parent) = self.links(cur).parent() {
                if self.links(parent).child(dir) != Some(cur) {
                    return Some(parent);
                }

                cur = parent;
            }

            None
        }
    }

    #[inline]
    pub(crate) unsafe fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.step(node, Dir::Right) }
    }

    #[inline]
    pub(crate) unsafe fn predecessor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.step(node, Dir::Left) }
    }

    unsafe fn pre_order_successor(&self, node: NonNull<T>) -> Link<T> {
        unsafe {
            let links = self.links(node);
            if let Some(child) = links.left().or(links.right()) {
                return Some(child);
            }

            // Climb until an unvisited right subtree is found.
            let mut cur = node;
            while let Some(parent) = self.links(cur).parent() {
                let right = self.links(parent).right();
                if right.is_some() && right != Some(cur) {
                    return right;
                }

                cur = parent;
            }

            None
        }
    }

    // Returns the first node of the subtree at `node` in post-order: the leftmost leaf.
    pub(crate) unsafe fn deepest_first(&self, mut node: NonNull<T>) -> NonNull<T> {
        unsafe {
            loop {
                let links = self.links(node);
                match links.left().or(links.right()) {
                    Some(child) => node = child,
                    None => return node,
                }
            }
        }
    }

    // Reads only `node`'s parent link and the parent's child links.
    pub(crate) unsafe fn post_order_successor(&self, node: NonNull<T>) -> Link<T> {
        unsafe {
            let parent = self.links(node).parent()?;

            match self.links(parent).right() {
                Some(right) if self.links(parent).left() == Some(node) => {
                    Some(self.deepest_first(right))
                }
                _ => Some(parent),
            }
        }
    }
}
