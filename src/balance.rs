//! Structural changes: linking, unlinking, rotations and the red-black fixups.
//!
//! Nothing outside this module writes parent, child or color links of a linked node.

use core::{cmp::Ordering, ptr::NonNull};

use cordyceps::Linked;

use crate::{Color, Compare, Dir, Link, Links, RbTree};

impl<T, C> RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
    C: Compare<T>,
{
    // Links `node` into the tree in sorted position.
    //
    // Returns `Err(node)` without touching the tree if an equal element is already linked.
    //
    // # Safety
    //
    // `node` must be unlinked and must stay pinned while it is linked.
    pub(crate) unsafe fn link(&mut self, node: NonNull<T>) -> Result<(), NonNull<T>> {
        self.verify_unlinked(node);

        match unsafe { self.find_slot(node) } {
            Some((parent, dir)) => {
                unsafe { self.attach(node, parent, dir) };
                Ok(())
            }
            None => Err(node),
        }
    }

    // Returns the parent and side of the empty slot where `node` belongs, or `None` if an equal
    // element is already linked.
    //
    // Only the comparator runs here; the tree is not modified.
    pub(crate) unsafe fn find_slot(&self, node: NonNull<T>) -> Option<(Link<T>, Dir)> {
        let mut opt_parent = None;
        let mut dir = Dir::Left;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            dir = match unsafe { self.cmp.compare(node.as_ref(), cur.as_ref()) } {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return None,
                Ordering::Greater => Dir::Right,
            };

            opt_parent = Some(cur);
            opt_cur = unsafe { self.links(cur).child(dir) };
        }

        Some((opt_parent, dir))
    }

    // Attaches `node` as the `dir` child of `parent`, or as the root, and rebalances.
    //
    // # Safety
    //
    // The slot must have come from `find_slot` with no mutation since.
    pub(crate) unsafe fn attach(&mut self, node: NonNull<T>, parent: Link<T>, dir: Dir) {
        unsafe {
            let links = self.links_mut(node);
            links.set_parent(parent);
            links.set_left(None);
            links.set_right(None);
            links.set_color(Color::Red);

            match parent {
                None => {
                    self.root = Some(node);
                    self.first = Some(node);
                    self.last = Some(node);
                }

                Some(parent) => {
                    self.links_mut(parent).set_child(dir, Some(node));

                    match dir {
                        Dir::Left if self.first == Some(parent) => self.first = Some(node),
                        Dir::Right if self.last == Some(parent) => self.last = Some(node),
                        _ => (),
                    }
                }
            }

            self.insert_fixup(node);
        }

        self.len += 1;
        self.verify();
    }

    // Unlinks `node` from the tree and resets its links.
    //
    // # Safety
    //
    // `node` must be linked in this tree.
    pub(crate) unsafe fn unlink(&mut self, node: NonNull<T>) {
        self.verify_member(node);

        unsafe {
            // Refresh the cached extremes while `node`'s links are still intact.
            if self.first == Some(node) {
                self.first = self.successor_raw(node);
            }

            if self.last == Some(node) {
                self.last = self.predecessor_raw(node);
            }

            let links = self.links(node);
            let left = links.left();
            let right = links.right();
            let parent = links.parent();
            let mut removed_color = links.color();

            // `x` moves into the position vacated by the removed node; `x_parent` is its new
            // parent, tracked separately because `x` may be absent.
            let (x, x_parent) = match (left, right) {
                (None, _) => {
                    self.transplant(node, right);
                    (right, parent)
                }

                (Some(left), None) => {
                    self.transplant(node, Some(left));
                    (Some(left), parent)
                }

                (Some(left), Some(right)) => {
                    // The successor has no left child, so it can be lifted out and put in
                    // `node`'s place, taking over its color.
                    let successor = self.extreme(right, Dir::Left);
                    removed_color = self.links(successor).color();

                    let x = self.links(successor).right();
                    let x_parent = if successor == right {
                        Some(successor)
                    } else {
                        let successor_parent = self.links(successor).parent();
                        self.transplant(successor, x);
                        self.links_mut(successor).set_right(Some(right));
                        self.links_mut(right).set_parent(Some(successor));
                        successor_parent
                    };

                    self.transplant(node, Some(successor));
                    self.links_mut(successor).set_left(Some(left));
                    self.links_mut(left).set_parent(Some(successor));
                    self.links_mut(successor)
                        .set_color(self.links(node).color());

                    (x, x_parent)
                }
            };

            // Removing a black node shortens every path through it.
            if removed_color == Color::Black {
                self.delete_fixup(x, x_parent);
            }

            self.links_mut(node).init();
        }

        self.len -= 1;
        self.verify();
    }
}

impl<T, C> RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    // Rotates the subtree rooted at `x` in direction `dir`.
    //
    // `x`'s `!dir` child `y` takes `x`'s place, `x` becomes `y`'s `dir` child, and `y`'s former
    // `dir` subtree moves across to `x`. Rotating left at `x` is `rotate(x, Dir::Left)`.
    unsafe fn rotate(&mut self, x: NonNull<T>, dir: Dir) {
        unsafe {
            let Some(y) = self.links(x).child(!dir) else {
                debug_assert!(false, "rotation requires a child to promote");
                return;
            };

            let across = self.links(y).child(dir);
            self.links_mut(x).set_child(!dir, across);
            if let Some(across) = across {
                self.links_mut(across).set_parent(Some(x));
            }

            let parent = self.links(x).parent();
            self.links_mut(y).set_parent(parent);
            self.replace_child_or_set_root(parent, x, Some(y));

            self.links_mut(y).set_child(dir, Some(x));
            self.links_mut(x).set_parent(Some(y));
        }
    }

    // Replaces the subtree rooted at `old` with the one rooted at `new`.
    //
    // `old`'s own links are not updated.
    unsafe fn transplant(&mut self, old: NonNull<T>, new: Link<T>) {
        unsafe {
            let parent = self.links(old).parent();
            self.replace_child_or_set_root(parent, old, new);

            if let Some(new) = new {
                self.links_mut(new).set_parent(parent);
            }
        }
    }

    // Points the child link of `parent` that referred to `old_child` at `new_child`, or makes
    // `new_child` the root if `parent` is absent.
    //
    // `new_child`'s parent pointer is not updated.
    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe {
                let dir = self.which_child(parent, Some(old_child));
                debug_assert_eq!(self.links(parent).child(dir), Some(old_child));
                self.links_mut(parent).set_child(dir, new_child);
            },
            None => self.root = new_child,
        }
    }

    #[inline]
    unsafe fn paint(&mut self, node: Link<T>, color: Color) {
        if let Some(node) = node {
            unsafe { self.links_mut(node).set_color(color) };
        }
    }

    // Restores the red-black invariants after the red leaf `z` was attached.
    //
    // Invariants:
    // - `z` is red.
    // - The only possible violation is `z` and `p(z)` both being red, or `z` being a red root.
    unsafe fn insert_fixup(&mut self, mut z: NonNull<T>) {
        unsafe {
            while let Some(parent) = self.links(z).parent() {
                if self.links(parent).color() == Color::Black {
                    break;
                }

                // A red node is never the root, so a red parent has a parent of its own.
                let Some(grandparent) = self.links(parent).parent() else {
                    break;
                };

                let side = self.which_child(grandparent, Some(parent));
                let uncle = self.links(grandparent).child(!side);

                if self.color(uncle) == Color::Red {
                    // Push the grandparent's blackness down one level and continue above it.
                    self.paint(Some(parent), Color::Black);
                    self.paint(uncle, Color::Black);
                    self.paint(Some(grandparent), Color::Red);
                    z = grandparent;
                    continue;
                }

                // Turn an inner grandchild into an outer one.
                if self.links(parent).child(!side) == Some(z) {
                    z = parent;
                    self.rotate(z, side);
                }

                let Some(parent) = self.links(z).parent() else {
                    break;
                };
                let Some(grandparent) = self.links(parent).parent() else {
                    break;
                };

                self.paint(Some(parent), Color::Black);
                self.paint(Some(grandparent), Color::Red);
                self.rotate(grandparent, !side);
            }

            self.paint(self.root, Color::Black);
        }
    }

    // Restores the red-black invariants after a black node was removed.
    //
    // `x` carries an extra black. It is either absent or the node that replaced the removed one,
    // and `x_parent` is its parent.
    unsafe fn delete_fixup(&mut self, mut x: Link<T>, mut x_parent: Link<T>) {
        unsafe {
            while x != self.root && self.color(x) == Color::Black {
                let Some(parent) = x_parent else {
                    break;
                };

                let side = self.which_child(parent, x);

                // The removed node was black, so `x`'s side lost one black and its sibling
                // subtree has a black-height of at least one.
                let Some(mut w) = self.links(parent).child(!side) else {
                    debug_assert!(false, "black-height violated: missing sibling");
                    break;
                };

                if self.links(w).color() == Color::Red {
                    // Convert to a black sibling.
                    self.paint(Some(w), Color::Black);
                    self.paint(Some(parent), Color::Red);
                    self.rotate(parent, side);

                    w = match self.links(parent).child(!side) {
                        Some(w) => w,
                        None => break,
                    };
                }

                let near = self.links(w).child(side);
                let far = self.links(w).child(!side);

                if self.color(near) == Color::Black && self.color(far) == Color::Black {
                    // Remove one black from both sides and move the extra black up.
                    self.paint(Some(w), Color::Red);
                    x = Some(parent);
                    x_parent = self.links(parent).parent();
                    continue;
                }

                if self.color(far) == Color::Black {
                    // Move the red near nephew to the far side.
                    self.paint(near, Color::Black);
                    self.paint(Some(w), Color::Red);
                    self.rotate(w, !side);

                    w = match self.links(parent).child(!side) {
                        Some(w) => w,
                        None => break,
                    };
                }

                // The far nephew is red: one rotation absorbs the extra black.
                let parent_color = self.links(parent).color();
                self.paint(Some(w), parent_color);
                self.paint(Some(parent), Color::Black);
                self.paint(self.links(w).child(!side), Color::Black);
                self.rotate(parent, side);

                x = self.root;
                x_parent = None;
            }

            self.paint(x, Color::Black);
        }
    }
}
