//! Set algebra over ordered sequences.
//!
//! Every operation here is a single merge-walk over two sequences, costing _O(n + m)_. The walks
//! only use [`Sorted`], so they work for any structure that can produce its first element and
//! step to the next one. Both operands must order elements the same way; comparisons use the
//! left operand's order.

use core::{cmp::Ordering, fmt, iter::FusedIterator, ptr::NonNull};

use cordyceps::Linked;

use crate::{Compare, Links, RbTree};

/// An ordered sequence that can be walked from its first element.
pub trait Sorted<T: ?Sized> {
    /// Returns the first element of the sequence.
    fn first_item(&self) -> Option<&T>;

    /// Returns the element following `item`, which must belong to this sequence.
    fn next_item<'a>(&'a self, item: &'a T) -> Option<&'a T>;

    /// Compares two elements by the order of this sequence.
    fn order(&self, a: &T, b: &T) -> Ordering;
}

impl<T, C> Sorted<T> for RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
    C: Compare<T>,
{
    #[inline]
    fn first_item(&self) -> Option<&T> {
        self.first()
    }

    #[inline]
    fn next_item<'a>(&'a self, item: &'a T) -> Option<&'a T> {
        // Elements produced by a walk are members by construction; skip the membership check.
        unsafe {
            self.successor_raw(NonNull::from(item))
                .map(|next| next.as_ref())
        }
    }

    #[inline]
    fn order(&self, a: &T, b: &T) -> Ordering {
        self.comparator().compare(a, b)
    }
}

/// Returns `true` if every element of `b` has an equal element in `a`.
pub fn includes<T, A, B>(a: &A, b: &B) -> bool
where
    T: ?Sized,
    A: Sorted<T> + ?Sized,
    B: Sorted<T> + ?Sized,
{
    let mut cur_a = a.first_item();
    let mut cur_b = b.first_item();

    while let (Some(x), Some(y)) = (cur_a, cur_b) {
        match a.order(x, y) {
            Ordering::Less => cur_a = a.next_item(x),
            // `y` sorts before everything left in `a`, so it cannot be found.
            Ordering::Greater => return false,
            Ordering::Equal => {
                cur_a = a.next_item(x);
                cur_b = b.next_item(y);
            }
        }
    }

    cur_b.is_none()
}

// Two cursors advancing through `a` and `b` in lockstep.
struct MergeWalk<'a, T: ?Sized, A: ?Sized, B: ?Sized> {
    a: &'a A,
    b: &'a B,
    cur_a: Option<&'a T>,
    cur_b: Option<&'a T>,
}

enum Step<'a, T: ?Sized> {
    OnlyA(&'a T),
    OnlyB(&'a T),
    Both(&'a T, &'a T),
}

impl<'a, T, A, B> MergeWalk<'a, T, A, B>
where
    T: ?Sized,
    A: Sorted<T> + ?Sized,
    B: Sorted<T> + ?Sized,
{
    fn new(a: &'a A, b: &'a B) -> Self {
        MergeWalk {
            a,
            b,
            cur_a: a.first_item(),
            cur_b: b.first_item(),
        }
    }

    // Consumes the smaller of the two cursors, or both if they are equal.
    fn step(&mut self) -> Option<Step<'a, T>> {
        let a = self.a;
        let b = self.b;

        match (self.cur_a, self.cur_b) {
            (None, None) => None,

            (Some(x), None) => {
                self.cur_a = a.next_item(x);
                Some(Step::OnlyA(x))
            }

            (None, Some(y)) => {
                self.cur_b = b.next_item(y);
                Some(Step::OnlyB(y))
            }

            (Some(x), Some(y)) => match a.order(x, y) {
                Ordering::Less => {
                    self.cur_a = a.next_item(x);
                    Some(Step::OnlyA(x))
                }
                Ordering::Greater => {
                    self.cur_b = b.next_item(y);
                    Some(Step::OnlyB(y))
                }
                Ordering::Equal => {
                    self.cur_a = a.next_item(x);
                    self.cur_b = b.next_item(y);
                    Some(Step::Both(x, y))
                }
            },
        }
    }

    fn a_exhausted(&self) -> bool {
        self.cur_a.is_none()
    }

    fn b_exhausted(&self) -> bool {
        self.cur_b.is_none()
    }
}

macro_rules! set_op_iter {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<'a, T: ?Sized, A: ?Sized, B: ?Sized> {
            walk: MergeWalk<'a, T, A, B>,
        }

        impl<'a, T, A, B> $name<'a, T, A, B>
        where
            T: ?Sized,
            A: Sorted<T> + ?Sized,
            B: Sorted<T> + ?Sized,
        {
            /// Starts a walk over `a` and `b`.
            pub fn new(a: &'a A, b: &'a B) -> Self {
                $name {
                    walk: MergeWalk::new(a, b),
                }
            }
        }

        impl<'a, T, A, B> FusedIterator for $name<'a, T, A, B>
        where
            T: ?Sized,
            A: Sorted<T> + ?Sized,
            B: Sorted<T> + ?Sized,
        {
        }

        impl<'a, T: ?Sized, A: ?Sized, B: ?Sized> fmt::Debug for $name<'a, T, A, B> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("a_exhausted", &self.walk.cur_a.is_none())
                    .field("b_exhausted", &self.walk.cur_b.is_none())
                    .finish()
            }
        }
    };
}

set_op_iter! {
    /// The elements of `a` with no equal in `b`.
    Difference
}

set_op_iter! {
    /// The elements of `a` with an equal in `b`.
    Intersection
}

set_op_iter! {
    /// The elements present in exactly one of `a` and `b`.
    SymDifference
}

set_op_iter! {
    /// The elements present in either `a` or `b`, with `a`'s element chosen on a match.
    Union
}

impl<'a, T, A, B> Iterator for Difference<'a, T, A, B>
where
    T: ?Sized,
    A: Sorted<T> + ?Sized,
    B: Sorted<T> + ?Sized,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.walk.a_exhausted() {
            if let Some(Step::OnlyA(x)) = self.walk.step() {
                return Some(x);
            }
        }

        None
    }
}

impl<'a, T, A, B> Iterator for Intersection<'a, T, A, B>
where
    T: ?Sized,
    A: Sorted<T> + ?Sized,
    B: Sorted<T> + ?Sized,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.walk.a_exhausted() && !self.walk.b_exhausted() {
            if let Some(Step::Both(x, _)) = self.walk.step() {
                return Some(x);
            }
        }

        None
    }
}

impl<'a, T, A, B> Iterator for SymDifference<'a, T, A, B>
where
    T: ?Sized,
    A: Sorted<T> + ?Sized,
    B: Sorted<T> + ?Sized,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walk.step()? {
                Step::OnlyA(x) | Step::OnlyB(x) => return Some(x),
                Step::Both(..) => continue,
            }
        }
    }
}

impl<'a, T, A, B> Iterator for Union<'a, T, A, B>
where
    T: ?Sized,
    A: Sorted<T> + ?Sized,
    B: Sorted<T> + ?Sized,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        match self.walk.step()? {
            Step::OnlyA(x) | Step::OnlyB(x) | Step::Both(x, _) => Some(x),
        }
    }
}
