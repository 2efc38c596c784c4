//! Cursors over an [`RbTree`].
//!
//! A cursor rests either on an element or on a "ghost" position between the last element and the
//! first. Moving past either end lands on the ghost; moving off the ghost wraps around.

use core::{marker::PhantomData, pin::Pin, ptr::NonNull};

use cordyceps::Linked;

use crate::{Compare, Duplicate, Link, Links, RbTree};

/// A read-only cursor over an [`RbTree`].
pub struct Cursor<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: &'tree RbTree<T, C>,
    cur: Link<T>,
}

/// A cursor over an [`RbTree`] that can unlink and link elements.
pub struct CursorMut<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: NonNull<RbTree<T, C>>,
    cur: Link<T>,
    _tree: PhantomData<&'tree mut RbTree<T, C>>,
}

impl<T, C> RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
    C: Compare<T>,
{
    /// Returns a cursor resting on the minimum element, or on the ghost if the tree is empty.
    pub fn cursor_first(&self) -> Cursor<'_, T, C> {
        Cursor {
            tree: self,
            cur: self.first,
        }
    }

    /// Returns a cursor resting on the maximum element, or on the ghost if the tree is empty.
    pub fn cursor_last(&self) -> Cursor<'_, T, C> {
        Cursor {
            tree: self,
            cur: self.last,
        }
    }

    /// Returns a cursor resting on the first element not less than `probe`.
    pub fn cursor_lower_bound(&self, probe: &T) -> Cursor<'_, T, C> {
        Cursor {
            tree: self,
            cur: self.lower_bound(probe).map(NonNull::from),
        }
    }

    /// Returns an editing cursor resting on the minimum element.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T, C> {
        let cur = self.first;
        CursorMut::new(self, cur)
    }

    /// Returns an editing cursor resting on the maximum element.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, T, C> {
        let cur = self.last;
        CursorMut::new(self, cur)
    }

    /// Returns an editing cursor resting on the first element not less than `probe`.
    pub fn cursor_lower_bound_mut(&mut self, probe: &T) -> CursorMut<'_, T, C> {
        let cur = self.lower_bound(probe).map(NonNull::from);
        CursorMut::new(self, cur)
    }

    #[inline]
    unsafe fn after(&self, cur: Link<T>) -> Link<T> {
        match cur {
            Some(node) => unsafe { self.successor_raw(node) },
            None => self.first,
        }
    }

    #[inline]
    unsafe fn before(&self, cur: Link<T>) -> Link<T> {
        match cur {
            Some(node) => unsafe { self.predecessor_raw(node) },
            None => self.last,
        }
    }
}

impl<'tree, T, C> Cursor<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
    C: Compare<T>,
{
    /// Moves to the next element, or to the ghost after the last one.
    pub fn move_next(&mut self) {
        self.cur = unsafe { self.tree.after(self.cur) };
    }

    /// Moves to the previous element, or to the ghost before the first one.
    pub fn move_prev(&mut self) {
        self.cur = unsafe { self.tree.before(self.cur) };
    }

    /// Returns the element under the cursor, or `None` on the ghost.
    pub fn get(&self) -> Option<&'tree T> {
        self.cur.map(|node| unsafe { node.as_ref() })
    }

    /// Returns the element a call to [`move_next`](Self::move_next) would land on.
    pub fn peek_next(&self) -> Option<&'tree T> {
        unsafe { self.tree.after(self.cur).map(|node| node.as_ref()) }
    }

    /// Returns the element a call to [`move_prev`](Self::move_prev) would land on.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        unsafe { self.tree.before(self.cur).map(|node| node.as_ref()) }
    }
}

impl<T, C> Clone for Cursor<'_, T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn clone(&self) -> Self {
        Cursor {
            tree: self.tree,
            cur: self.cur,
        }
    }
}

impl<'tree, T, C> CursorMut<'tree, T, C>
where
    T: Linked<Links<T>> + ?Sized,
    C: Compare<T>,
{
    fn new(tree: &'tree mut RbTree<T, C>, cur: Link<T>) -> Self {
        CursorMut {
            tree: NonNull::from(tree),
            cur,
            _tree: PhantomData,
        }
    }

    #[inline]
    fn tree(&self) -> &RbTree<T, C> {
        // SAFETY: the tree is mutably borrowed for `'tree`.
        unsafe { self.tree.as_ref() }
    }

    #[inline]
    fn tree_mut(&mut self) -> &mut RbTree<T, C> {
        // SAFETY: the tree is mutably borrowed for `'tree`.
        unsafe { self.tree.as_mut() }
    }

    /// Returns a read-only cursor at the same position.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, T, C> {
        Cursor {
            tree: self.tree(),
            cur: self.cur,
        }
    }

    /// Moves to the next element, or to the ghost after the last one.
    pub fn move_next(&mut self) {
        self.cur = unsafe { self.tree().after(self.cur) };
    }

    /// Moves to the previous element, or to the ghost before the first one.
    pub fn move_prev(&mut self) {
        self.cur = unsafe { self.tree().before(self.cur) };
    }

    /// Returns the element under the cursor, or `None` on the ghost.
    pub fn get(&self) -> Option<&T> {
        self.cur.map(|node| unsafe { node.as_ref() })
    }

    /// Returns a pinned mutable reference to the element under the cursor.
    ///
    /// # Safety
    ///
    /// The caller must not change the element in any way that alters how it compares to other
    /// elements of the tree, and must not touch its links.
    pub unsafe fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        self.cur
            .map(|mut node| unsafe { Pin::new_unchecked(node.as_mut()) })
    }

    /// Returns the element a call to [`move_next`](Self::move_next) would land on.
    pub fn peek_next(&self) -> Option<&T> {
        unsafe { self.tree().after(self.cur).map(|node| node.as_ref()) }
    }

    /// Returns the element a call to [`move_prev`](Self::move_prev) would land on.
    pub fn peek_prev(&self) -> Option<&T> {
        unsafe { self.tree().before(self.cur).map(|node| node.as_ref()) }
    }

    /// Unlinks the element under the cursor and moves to the next one.
    ///
    /// On the ghost this returns `None` and changes nothing.
    pub fn remove_current(&mut self) -> Option<T::Handle> {
        let node = self.cur?;
        self.move_next();

        unsafe { Some(self.tree_mut().erase(node)) }
    }

    /// Unlinks the element under the cursor and moves to the previous one.
    ///
    /// On the ghost this returns `None` and changes nothing.
    pub fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        let node = self.cur?;
        self.move_prev();

        unsafe { Some(self.tree_mut().erase(node)) }
    }

    /// Links `item` into the tree in sorted position. The cursor does not move.
    pub fn insert(&mut self, item: T::Handle) -> Result<(), Duplicate<T::Handle>> {
        // Rebalancing moves links around but never elements, so `self.cur` stays valid.
        self.tree_mut().insert(item)
    }
}
