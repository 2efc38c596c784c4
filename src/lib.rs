//! An intrusive red-black tree.
//!
//! Elements carry their own [`Links`] and are linked into an [`RbTree`] through the
//! [`cordyceps::Linked`] trait, so the tree never allocates. Ordering is supplied by a
//! [`Compare`] implementation chosen when the tree is built; by default elements are ordered by
//! [`TreeNode::key`].
//!
//! The tree has set semantics: an element comparing equal to one already linked is rejected.
//!
//! Besides the usual ordered-set operations, trees can be combined with linear merge-walks (see
//! [`set_ops`]) and with [`RbTree::merge`], which relinks elements from one tree into another.

// Conventions used in comments follow Cormen, Leiserson, Rivest and Stein:
// - `x`, `y`, `z` are nodes being restructured; `p(x)` is the parent of `x`.
// - `w` is the sibling of `x` during deletion fixup.
// - An absent child is black and is counted by the black-height.
//
// The invariants of a red-black tree are:
// 1. Every node is either red or black.
// 2. The root is black.
// 3. A red node has no red child.
// 4. Every path from a node to an absent descendant contains the same number of black nodes.
//
// In addition this tree caches its minimum and maximum node and its length.

extern crate alloc;

use alloc::vec::Vec;
use core::{
    borrow::Borrow, cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not,
    ptr::NonNull,
};

use cordyceps::Linked;

mod balance;
pub mod cursor;
mod debug;
mod error;
pub mod iter;
pub mod set_ops;
mod verify;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use cursor::{Cursor, CursorMut};
pub use error::Duplicate;
pub use iter::{Iter, PostOrder, PreOrder};
pub use set_ops::{Difference, Intersection, Sorted, SymDifference, Union};

/// A strict total order over tree elements.
///
/// The result for any pair of linked elements must not change while they are linked.
pub trait Compare<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Compare<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// An element with a key that gives it a natural order.
pub trait TreeNode<L>: Linked<L> {
    type Key: Ord;

    fn key(&self) -> &Self::Key;
}

/// Orders [`TreeNode`]s by their keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyOrder;

impl<T> Compare<T> for KeyOrder
where
    T: TreeNode<Links<T>> + ?Sized,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.key().cmp(b.key())
    }
}

/// An intrusive red-black tree.
///
/// The tree stores raw pointers to its elements. Each element is converted from its
/// [`Linked::Handle`] when inserted and converted back when it is erased, cleared or popped;
/// dropping the tree unlinks every remaining element and drops its handle.
pub struct RbTree<T, C = KeyOrder>
where
    T: Linked<Links<T>> + ?Sized,
{
    root: Link<T>,
    first: Link<T>,
    last: Link<T>,
    len: usize,
    cmp: C,
}

/// Links to other elements of an [`RbTree`].
///
/// Embed one of these in each element and expose it through [`Linked::links`].
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

/// The color of a linked element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
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

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    color: Color,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

impl<T> RbTree<T, KeyOrder>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree ordered by element keys.
    pub const fn new() -> RbTree<T, KeyOrder> {
        RbTree::with_comparator(KeyOrder)
    }

    /// Returns a reference to the element whose key equals `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_by(|node| node.key().borrow().cmp(key))
    }

    /// Returns `true` if the tree contains an element whose key equals `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Unlinks and returns the element whose key equals `key`.
    pub fn remove_key<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find_raw_by(|node| node.key().borrow().cmp(key))?;
        unsafe { Some(self.erase(node)) }
    }
}

impl<T, C> RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    /// Returns a new empty tree ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> RbTree<T, C> {
        RbTree {
            root: None,
            first: None,
            last: None,
            len: 0,
            cmp,
        }
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

    /// Returns the comparator ordering this tree.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<&T> {
        self.first.map(|first| unsafe { first.as_ref() })
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<&T> {
        self.last.map(|last| unsafe { last.as_ref() })
    }

    /// Exchanges the contents of two trees, comparators included.
    ///
    /// This operation completes in _O(1)_ time.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns an iterator over the elements of the tree, in order.
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter::new(self)
    }

    /// Returns an iterator visiting each element before its children.
    pub fn pre_order(&self) -> PreOrder<'_, T, C> {
        PreOrder::new(self)
    }

    /// Returns an iterator visiting each element after its children.
    pub fn post_order(&self) -> PostOrder<'_, T, C> {
        PostOrder::new(self)
    }

    /// Calls `f` on every element, in order.
    pub fn traverse<F: FnMut(&T)>(&self, f: F) {
        self.iter().for_each(f);
    }

    /// Calls `f` on every element, visiting each element before its children.
    pub fn traverse_pre_order<F: FnMut(&T)>(&self, f: F) {
        self.pre_order().for_each(f);
    }

    /// Calls `f` on every element, visiting each element after its children.
    pub fn traverse_post_order<F: FnMut(&T)>(&self, f: F) {
        self.post_order().for_each(f);
    }

    /// Returns the element for which `f` returns [`Ordering::Equal`].
    ///
    /// `f` reports how an element compares to the target, as in [`slice::binary_search_by`],
    /// and must be consistent with the tree's order.
    pub fn find_by<F>(&self, f: F) -> Option<&T>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.find_raw_by(f).map(|node| unsafe { node.as_ref() })
    }

    /// Returns the first element for which `f` does not return [`Ordering::Less`].
    pub fn lower_bound_by<F>(&self, mut f: F) -> Option<&T>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.bound_by(|node| f(node) != Ordering::Less)
    }

    /// Returns the first element for which `f` returns [`Ordering::Greater`].
    pub fn upper_bound_by<F>(&self, mut f: F) -> Option<&T>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.bound_by(|node| f(node) == Ordering::Greater)
    }

    fn find_raw_by<F>(&self, mut f: F) -> Link<T>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match f(cur.as_ref()) {
                    Ordering::Less => opt_cur = self.links(cur).right(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = self.links(cur).left(),
                }
            }
        }
    }

    // Returns the leftmost node satisfying `past`, which must be monotonic over the in-order
    // sequence.
    fn bound_by<F>(&self, mut past: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut candidate = None;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                if past(cur.as_ref()) {
                    candidate = Some(cur);
                    opt_cur = self.links(cur).left();
                } else {
                    opt_cur = self.links(cur).right();
                }
            }
        }

        candidate.map(|node| unsafe { node.as_ref() })
    }

    // Unlinks every element in post-order, handing each handle to `f`.
    //
    // Every hook is reset before its handle is produced.
    fn drain_with<F: FnMut(T::Handle)>(&mut self, mut f: F) {
        let mut opt_cur = self.root.map(|root| unsafe { self.deepest_first(root) });

        while let Some(cur) = opt_cur {
            unsafe {
                // The successor only reads `cur`'s parent and the parent's children, which are
                // untouched until `cur` itself is reset.
                opt_cur = self.post_order_successor(cur);
                self.links_mut(cur).init();
                f(T::from_ptr(cur));
            }
        }

        self.root = None;
        self.first = None;
        self.last = None;
        self.len = 0;
    }

    // Support methods ========================================================

    #[inline]
    unsafe fn links<'a>(&self, node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    #[allow(clippy::mut_from_ref)]
    unsafe fn links_mut<'a>(&mut self, node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    /// Returns the color of the pointed-to node. Absent nodes are black.
    #[inline]
    unsafe fn color(&self, node: Link<T>) -> Color {
        node.map(|n| unsafe { self.links(n).color() })
            .unwrap_or(Color::Black)
    }

    #[inline]
    unsafe fn which_child(&self, parent: NonNull<T>, child: Link<T>) -> Dir {
        if unsafe { self.links(parent).left() } == child {
            Dir::Left
        } else {
            Dir::Right
        }
    }

    // Returns the last node reached by following `dir` links from `node`.
    #[inline]
    unsafe fn extreme(&self, mut node: NonNull<T>, dir: Dir) -> NonNull<T> {
        while let Some(next) = unsafe { self.links(node).child(dir) } {
            node = next;
        }

        node
    }
}

impl<T, C> RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
    C: Compare<T>,
{
    /// Inserts an item into the tree.
    ///
    /// If an element comparing equal to `item` is already linked, the tree is left unchanged and
    /// `item` is handed back inside the error. If the comparator panics, the tree is left
    /// unchanged and `item` is dropped.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Result<(), Duplicate<T::Handle>> {
        let ptr = T::into_ptr(item);
        self.verify_unlinked(ptr);

        // The comparator may unwind during the descent, which leaves the tree untouched.
        let pending = Pending(ptr);
        let slot = unsafe { self.find_slot(ptr) };
        mem::forget(pending);

        match slot {
            Some((parent, dir)) => {
                unsafe { self.attach(ptr, parent, dir) };
                Ok(())
            }
            // SAFETY: `ptr` came from `into_ptr` above and was not linked.
            None => Err(Duplicate(unsafe { T::from_ptr(ptr) })),
        }
    }

    /// Removes an arbitrary element from the tree.
    ///
    /// This operation completes in _O(log(n))_ time.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn erase(&mut self, node: NonNull<T>) -> T::Handle {
        unsafe {
            self.unlink(node);
            T::from_ptr(node)
        }
    }

    /// Unlinks and returns the element comparing equal to `probe`, if any.
    pub fn remove(&mut self, probe: &T) -> Option<T::Handle> {
        let node = self.find_raw(probe)?;
        unsafe { Some(self.erase(node)) }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first?;
        unsafe { Some(self.erase(first)) }
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last?;
        unsafe { Some(self.erase(last)) }
    }

    /// Returns the linked element comparing equal to `probe`.
    pub fn find(&self, probe: &T) -> Option<&T> {
        self.find_by(|node| self.cmp.compare(node, probe))
    }

    /// Returns `true` if an element comparing equal to `probe` is linked.
    pub fn contains(&self, probe: &T) -> bool {
        self.find(probe).is_some()
    }

    /// Returns the first element not less than `probe`.
    pub fn lower_bound(&self, probe: &T) -> Option<&T> {
        self.bound_by(|node| self.cmp.compare(node, probe) != Ordering::Less)
    }

    /// Returns the first element greater than `probe`.
    pub fn upper_bound(&self, probe: &T) -> Option<&T> {
        self.bound_by(|node| self.cmp.compare(probe, node) == Ordering::Less)
    }

    /// Returns the in-order successor of `node`.
    ///
    /// `node` must be linked in this tree. This operation completes in _O(log(n))_ time, and
    /// walking the whole tree with it from [`first`](Self::first) takes _O(n)_.
    pub fn next<'a>(&'a self, node: &'a T) -> Option<&'a T> {
        let ptr = NonNull::from(node);
        self.verify_member(ptr);

        unsafe { self.successor_raw(ptr).map(|next| next.as_ref()) }
    }

    /// Returns the in-order predecessor of `node`.
    ///
    /// `node` must be linked in this tree.
    pub fn prev<'a>(&'a self, node: &'a T) -> Option<&'a T> {
        let ptr = NonNull::from(node);
        self.verify_member(ptr);

        unsafe { self.predecessor_raw(ptr).map(|prev| prev.as_ref()) }
    }

    /// Clears the tree, returning every element in post-order.
    ///
    /// The links of each returned element are reset.
    pub fn clear(&mut self) -> Vec<T::Handle> {
        let mut nodes = Vec::with_capacity(self.len);
        self.drain_with(|node| nodes.push(node));
        self.verify();
        nodes
    }

    /// Removes every element matching `predicate`, returning them in order.
    ///
    /// Matching elements are collected before any of them is unlinked.
    pub fn erase_if<F>(&mut self, mut predicate: F) -> Vec<T::Handle>
    where
        F: FnMut(&T) -> bool,
    {
        let matching: Vec<NonNull<T>> = self
            .iter()
            .filter(|node| predicate(node))
            .map(NonNull::from)
            .collect();

        matching
            .into_iter()
            .map(|node| unsafe { self.erase(node) })
            .collect()
    }

    /// Moves every element of `other` with no equal in `self` into `self`.
    ///
    /// Elements that collide with an element of `self` remain linked in `other`. Both trees must
    /// order elements the same way.
    pub fn merge<D>(&mut self, other: &mut RbTree<T, D>)
    where
        D: Compare<T>,
    {
        let mut opt_cur = other.first;

        while let Some(cur) = opt_cur {
            unsafe {
                opt_cur = other.successor_raw(cur);

                if self.find_raw(cur.as_ref()).is_none() {
                    other.unlink(cur);
                    let linked = self.link(cur);
                    debug_assert!(linked.is_ok());
                }
            }
        }

        self.verify();
        other.verify();
    }

    /// Returns `true` if every element of `other` has an equal element in `self`.
    pub fn includes<D>(&self, other: &RbTree<T, D>) -> bool
    where
        D: Compare<T>,
    {
        set_ops::includes(self, other)
    }

    /// Returns the elements of `self` with no equal in `other`, in order.
    pub fn difference<'a, D>(&'a self, other: &'a RbTree<T, D>) -> Difference<'a, T, Self, RbTree<T, D>>
    where
        D: Compare<T>,
    {
        Difference::new(self, other)
    }

    /// Returns the elements of `self` with an equal in `other`, in order.
    pub fn intersection<'a, D>(
        &'a self,
        other: &'a RbTree<T, D>,
    ) -> Intersection<'a, T, Self, RbTree<T, D>>
    where
        D: Compare<T>,
    {
        Intersection::new(self, other)
    }

    /// Returns the elements present in exactly one of the trees, in order.
    pub fn sym_difference<'a, D>(
        &'a self,
        other: &'a RbTree<T, D>,
    ) -> SymDifference<'a, T, Self, RbTree<T, D>>
    where
        D: Compare<T>,
    {
        SymDifference::new(self, other)
    }

    /// Returns the elements present in either tree, in order.
    ///
    /// Where both trees hold equal elements, only the one from `self` is produced.
    pub fn union<'a, D>(&'a self, other: &'a RbTree<T, D>) -> Union<'a, T, Self, RbTree<T, D>>
    where
        D: Compare<T>,
    {
        Union::new(self, other)
    }

    fn find_raw(&self, probe: &T) -> Link<T> {
        self.find_raw_by(|node| self.cmp.compare(node, probe))
    }
}

// An element on its way into a tree. Dropping this drops the element's handle.
struct Pending<T: Linked<Links<T>> + ?Sized>(NonNull<T>);

impl<T> Drop for Pending<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        // SAFETY: the pointer came from `into_ptr` and was never linked.
        drop(unsafe { T::from_ptr(self.0) });
    }
}

impl<T, C> Default for RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
    C: Default,
{
    fn default() -> Self {
        RbTree::with_comparator(C::default())
    }
}

impl<T, C> fmt::Debug for RbTree<T, C>
where
    T: Linked<Links<T>> + fmt::Debug + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'tree, T, C> IntoIterator for &'tree RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, C> Drop for RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.drain_with(drop);
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                color: Color::Black,
                _unpin: PhantomPinned,
            }),
        }
    }

    /// Resets the links to the unlinked state.
    ///
    /// Calling this on the links of an element that is still linked into a tree corrupts that
    /// tree.
    pub fn init(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.color = Color::Black;
    }

    /// Returns `true` if these links point at any other element.
    pub fn is_linked(&self) -> bool {
        self.parent().is_some() || self.left().is_some() || self.right().is_some()
    }

    /// Returns the color recorded in these links.
    pub fn color(&self) -> Color {
        unsafe { (*self.inner.get()).color }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
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
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_color(&mut self, color: Color) {
        self.inner.get_mut().color = color;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("color", &self.color())
            .finish()
    }
}
