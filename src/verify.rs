//! Invariant checks run after every mutation in test and `verify` builds.
//!
//! Other builds compile the hooks to nothing.

#[cfg(any(test, feature = "verify"))]
mod checks {
    extern crate std;

    use core::{cmp::Ordering, ptr::NonNull};
    use std::{collections::HashSet, prelude::v1::*};

    use cordyceps::Linked;

    use crate::{Color, Compare, Dir, Link, Links, RbTree};

    macro_rules! violation {
        ($($arg:tt)*) => {{
            tracing::error!($($arg)*);
            panic!($($arg)*);
        }};
    }

    impl<T, C> RbTree<T, C>
    where
        T: Linked<Links<T>> + ?Sized,
        C: Compare<T>,
    {
        /// Recomputes every structural invariant from scratch, panicking on the first violation.
        #[doc(hidden)]
        pub fn assert_invariants(&self) {
            // Cycles must be ruled out before anything else walks the tree.
            let reachable = self.assert_acyclic();

            if reachable != self.len {
                violation!(
                    "size mismatch: expected {}, got {}: RbTree {:p}",
                    self.len,
                    reachable,
                    self
                );
            }

            self.assert_first_last();

            let Some(root) = self.root else {
                tracing::trace!(len = 0, "tree invariants hold");
                return;
            };

            unsafe {
                if let Some(parent) = self.links(root).parent() {
                    violation!("root has a parent {:p}: RbTree {:p}", parent, self);
                }

                self.assert_ordered(root, None, None);
                let black_height = self.assert_balanced(root);
                self.assert_parent_links(root);

                if self.links(root).color() != Color::Black {
                    violation!("root is not black: RbTree {:p}", self);
                }

                tracing::trace!(len = self.len, black_height, "tree invariants hold");
            }
        }

        // Walks down from the root and up from the last node, returning the number of nodes
        // reachable from the root.
        fn assert_acyclic(&self) -> usize {
            let mut visited = HashSet::new();
            let mut stack: Vec<NonNull<T>> = self.root.into_iter().collect();

            while let Some(node) = stack.pop() {
                if !visited.insert(node) {
                    violation!("cycle detected: RbTree {:p} node: {:p}", self, node);
                }

                let links = unsafe { self.links(node) };
                stack.extend(links.left());
                stack.extend(links.right());
            }

            let mut climbed = HashSet::new();
            let mut opt_cur = self.last;
            let mut top = None;

            while let Some(cur) = opt_cur {
                if !climbed.insert(cur) {
                    violation!("parent cycle detected: RbTree {:p} node: {:p}", self, cur);
                }

                top = Some(cur);
                opt_cur = unsafe { self.links(cur).parent() };
            }

            if top != self.root {
                violation!("last node does not lead up to the root: RbTree {:p}", self);
            }

            visited.len()
        }

        fn assert_first_last(&self) {
            let Some(root) = self.root else {
                if self.first.is_some() || self.last.is_some() {
                    violation!("non-empty first/last in empty tree: RbTree {:p}", self);
                }
                return;
            };

            let min = unsafe { self.extreme(root, Dir::Left) };
            if self.first != Some(min) {
                violation!(
                    "first pointer mismatch: expected {:p}, got {:?}: RbTree {:p}",
                    min,
                    self.first,
                    self
                );
            }

            let max = unsafe { self.extreme(root, Dir::Right) };
            if self.last != Some(max) {
                violation!(
                    "last pointer mismatch: expected {:p}, got {:?}: RbTree {:p}",
                    max,
                    self.last,
                    self
                );
            }
        }

        // Checks that every node of the subtree lies strictly between `min` and `max`.
        unsafe fn assert_ordered(&self, node: NonNull<T>, min: Link<T>, max: Link<T>) {
            unsafe {
                let item = node.as_ref();

                if let Some(min) = min {
                    if self.cmp.compare(item, min.as_ref()) != Ordering::Greater {
                        violation!(
                            "order violation: node {:p} <= min {:p}: RbTree {:p}",
                            node,
                            min,
                            self
                        );
                    }
                }

                if let Some(max) = max {
                    if self.cmp.compare(item, max.as_ref()) != Ordering::Less {
                        violation!(
                            "order violation: node {:p} >= max {:p}: RbTree {:p}",
                            node,
                            max,
                            self
                        );
                    }
                }

                if let Some(left) = self.links(node).left() {
                    self.assert_ordered(left, min, Some(node));
                }

                if let Some(right) = self.links(node).right() {
                    self.assert_ordered(right, Some(node), max);
                }
            }
        }

        // Returns the black-height of the subtree, counting absent children.
        unsafe fn assert_balanced(&self, node: NonNull<T>) -> usize {
            unsafe {
                let links = self.links(node);

                let left_height = match links.left() {
                    Some(left) => self.assert_balanced(left),
                    None => 1,
                };
                let right_height = match links.right() {
                    Some(right) => self.assert_balanced(right),
                    None => 1,
                };

                if left_height != right_height {
                    violation!(
                        "black height mismatch: left {}, right {}: RbTree {:p} node: {:p}",
                        left_height,
                        right_height,
                        self,
                        node
                    );
                }

                match links.color() {
                    Color::Red => {
                        if self.color(links.left()) == Color::Red
                            || self.color(links.right()) == Color::Red
                        {
                            violation!("red node with red child: RbTree {:p} node: {:p}", self, node);
                        }

                        left_height
                    }
                    Color::Black => left_height + 1,
                }
            }
        }

        unsafe fn assert_parent_links(&self, node: NonNull<T>) {
            unsafe {
                for dir in [Dir::Left, Dir::Right] {
                    if let Some(child) = self.links(node).child(dir) {
                        if self.links(child).parent() != Some(node) {
                            violation!(
                                "{:?} child parent pointer mismatch: RbTree {:p} node: {:p}",
                                dir,
                                self,
                                node
                            );
                        }

                        self.assert_parent_links(child);
                    }
                }
            }
        }

        #[inline]
        pub(crate) fn verify(&self) {
            self.assert_invariants();
        }

        pub(crate) fn verify_unlinked(&self, node: NonNull<T>) {
            if unsafe { self.links(node).is_linked() } {
                violation!(
                    "already linked element detected: RbTree {:p} element: {:p}",
                    self,
                    node
                );
            }
        }

        pub(crate) fn verify_member(&self, node: NonNull<T>) {
            let mut opt_cur = self.root;

            while let Some(cur) = opt_cur {
                if cur.cast::<()>() == node.cast::<()>() {
                    return;
                }

                opt_cur = unsafe {
                    match self.cmp.compare(node.as_ref(), cur.as_ref()) {
                        Ordering::Less => self.links(cur).left(),
                        _ => self.links(cur).right(),
                    }
                };
            }

            violation!("not a member: RbTree {:p} element: {:p}", self, node);
        }
    }
}

#[cfg(not(any(test, feature = "verify")))]
mod noop {
    use core::ptr::NonNull;

    use cordyceps::Linked;

    use crate::{Compare, Links, RbTree};

    impl<T, C> RbTree<T, C>
    where
        T: Linked<Links<T>> + ?Sized,
        C: Compare<T>,
    {
        #[inline(always)]
        pub(crate) fn verify(&self) {}

        #[inline(always)]
        pub(crate) fn verify_unlinked(&self, _node: NonNull<T>) {}

        #[inline(always)]
        pub(crate) fn verify_member(&self, _node: NonNull<T>) {}
    }
}
