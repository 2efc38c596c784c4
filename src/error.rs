use core::fmt;

/// Returned by [`RbTree::insert`](crate::RbTree::insert) when an equal element is already
/// linked.
///
/// Holds the rejected handle, which was not linked and can be reused.
pub struct Duplicate<H>(pub H);

impl<H> Duplicate<H> {
    /// Returns the rejected handle.
    pub fn into_inner(self) -> H {
        self.0
    }
}

impl<H> fmt::Debug for Duplicate<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Duplicate(..)")
    }
}

impl<H> fmt::Display for Duplicate<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an equal element is already linked in the tree")
    }
}

impl<H> std::error::Error for Duplicate<H> {}
