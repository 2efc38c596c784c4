//! Model-based checks shared by the property tests and the fuzz targets.
//!
//! Each `run_*` function drives an [`RbTree`] and a trusted model with the same operations and
//! asserts that they agree after every step. The tree's own invariant checker runs on every
//! mutation.

extern crate std;

use std::{
    cmp::Ordering,
    collections::BTreeSet,
    ops::Bound::{Excluded, Unbounded},
    prelude::v1::*,
    ptr::{self, NonNull},
};

use arbitrary::Arbitrary;
use cordyceps::Linked;
use proptest::{
    arbitrary::any,
    strategy::{Just, Strategy},
};

use crate::{Links, RbTree, TreeNode};

/// A boxed element whose links are its first field.
#[derive(Debug)]
#[repr(C)]
pub struct TestNode {
    pub links: Links<TestNode>,
    pub key: u32,
}

impl TestNode {
    pub fn new(key: u32) -> Box<TestNode> {
        Box::new(TestNode::probe(key))
    }

    /// Returns an unlinked node usable as a search probe.
    pub fn probe(key: u32) -> TestNode {
        TestNode {
            links: Links::new(),
            key,
        }
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

#[inline]
fn ref_key(node: &TestNode) -> u32 {
    node.key
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

impl ItemValue {
    fn resolve(self, sorted: &[u32]) -> u32 {
        match self {
            ItemValue::Index(idx) if sorted.is_empty() => idx as u32,
            ItemValue::Index(idx) => sorted[idx % sorted.len()],
            ItemValue::Random(v) => v,
        }
    }
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Get(ItemValue),
    Remove(ItemValue),
    LowerBound(ItemValue),
    UpperBound(ItemValue),
    Next(ItemValue),
    Prev(ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
    EraseIf(u8),
    Clear,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    // Clearing is rare so trees get a chance to grow.
    proptest::prop_oneof![
        8 => value_strategy().prop_map(Op::Insert),
        2 => value_strategy().prop_map(Op::Get),
        3 => value_strategy().prop_map(Op::Remove),
        2 => value_strategy().prop_map(Op::LowerBound),
        2 => value_strategy().prop_map(Op::UpperBound),
        2 => value_strategy().prop_map(Op::Next),
        2 => value_strategy().prop_map(Op::Prev),
        1 => Just(Op::First),
        1 => Just(Op::PopFirst),
        1 => Just(Op::Last),
        1 => Just(Op::PopLast),
        1 => any::<u8>().prop_map(Op::EraseIf),
        1 => Just(Op::Clear),
    ]
}

// Keys divisible by a selector-dependent modulus.
fn erase_predicate(selector: u8) -> impl Fn(u32) -> bool {
    let modulus = u32::from(selector % 5) + 2;
    move |key| key % modulus == 0
}

pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut btree = BTreeSet::new();
    let mut rb: RbTree<TestNode> = RbTree::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        let sorted: Vec<u32> = btree.iter().copied().collect();

        match op {
            Op::Insert(item) => {
                let value = item.resolve(&sorted);

                let from_btree = btree.insert(value);
                let from_rb = match rb.insert(TestNode::new(value)) {
                    Ok(()) => true,
                    Err(dup) => {
                        let node = dup.into_inner();
                        assert!(!node.links.is_linked(), "Op #{op_id}: {op:?}");
                        false
                    }
                };

                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
            }

            Op::Get(item) => {
                let value = item.resolve(&sorted);

                let from_btree = btree.get(&value).copied();
                let from_rb = rb.get(&value).map(ref_key);
                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");

                let by_probe = rb.find(&TestNode::probe(value)).map(ref_key);
                assert_eq!(from_btree, by_probe, "Op #{op_id}: {op:?}");
                assert_eq!(
                    from_btree.is_some(),
                    rb.contains(&TestNode::probe(value)),
                    "Op #{op_id}: {op:?}"
                );
            }

            Op::Remove(item) => {
                let value = item.resolve(&sorted);

                let from_btree = btree.remove(&value).then_some(value);
                let from_rb = rb.remove_key(&value).map(|node| {
                    assert!(!node.links.is_linked());
                    node.key
                });

                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
            }

            Op::LowerBound(item) => {
                let value = item.resolve(&sorted);

                let from_btree = btree.range(value..).next().copied();
                let from_rb = rb.lower_bound(&TestNode::probe(value)).map(ref_key);
                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");

                let by_key = rb.lower_bound_by(|node| node.key.cmp(&value)).map(ref_key);
                assert_eq!(from_btree, by_key, "Op #{op_id}: {op:?}");
            }

            Op::UpperBound(item) => {
                let value = item.resolve(&sorted);

                let from_btree = btree.range((Excluded(value), Unbounded)).next().copied();
                let from_rb = rb.upper_bound(&TestNode::probe(value)).map(ref_key);
                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");

                let by_key = rb.upper_bound_by(|node| node.key.cmp(&value)).map(ref_key);
                assert_eq!(from_btree, by_key, "Op #{op_id}: {op:?}");
            }

            Op::Next(item) => {
                let value = item.resolve(&sorted);

                if let Some(node) = rb.get(&value) {
                    let from_btree = btree.range((Excluded(value), Unbounded)).next().copied();
                    let from_rb = rb.next(node).map(ref_key);
                    assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
                }
            }

            Op::Prev(item) => {
                let value = item.resolve(&sorted);

                if let Some(node) = rb.get(&value) {
                    let from_btree = btree.range(..value).next_back().copied();
                    let from_rb = rb.prev(node).map(ref_key);
                    assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
                }
            }

            Op::First => {
                let from_btree = btree.first().copied();
                let from_rb = rb.first().map(ref_key);

                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
            }

            Op::PopFirst => {
                let from_btree = btree.pop_first();
                let from_rb = rb.pop_first().map(|node| node.key);

                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
            }

            Op::Last => {
                let from_btree = btree.last().copied();
                let from_rb = rb.last().map(ref_key);

                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
            }

            Op::PopLast => {
                let from_btree = btree.pop_last();
                let from_rb = rb.pop_last().map(|node| node.key);

                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
            }

            Op::EraseIf(selector) => {
                let predicate = erase_predicate(selector);

                let from_btree: Vec<u32> = btree.iter().copied().filter(|&k| predicate(k)).collect();
                btree.retain(|&k| !predicate(k));

                let from_rb: Vec<u32> = rb
                    .erase_if(|node| predicate(node.key))
                    .into_iter()
                    .map(|node| {
                        assert!(!node.links.is_linked());
                        node.key
                    })
                    .collect();

                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
            }

            Op::Clear => {
                let from_btree = std::mem::take(&mut btree);

                let from_rb: BTreeSet<u32> = rb
                    .clear()
                    .into_iter()
                    .map(|node| {
                        assert!(!node.links.is_linked());
                        node.key
                    })
                    .collect();

                assert_eq!(from_btree, from_rb, "Op #{op_id}: {op:?}");
                assert!(rb.is_empty());
            }
        }

        rb.assert_invariants();
        assert_eq!(btree.len(), rb.len());
        assert!(btree.iter().eq(rb.iter().map(|node| &node.key)));
        assert!(btree.iter().rev().eq(rb.iter().rev().map(|node| &node.key)));
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MovePrev,
    MoveNext,
    PeekNext,
    PeekPrev,
    RemoveCurrent,
    RemoveCurrentMovePrev,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MovePrev),
        Just(CursorOp::MoveNext),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
        Just(CursorOp::RemoveCurrent),
        Just(CursorOp::RemoveCurrentMovePrev),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub values: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_values = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let values = core::iter::repeat_with(|| u32::arbitrary(u).unwrap_or(0))
            .take(num_values.into())
            .collect();

        let ops = core::iter::repeat_with(|| CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { values, ops })
    }
}

pub fn run_cursor_equivalence(mut values: Vec<u32>, ops: Vec<CursorOp>) {
    values.sort_unstable();
    values.dedup();

    // A `Vec` and an index stand in for a cursor over a sorted sequence.
    let mut vec = Vec::new();
    let mut rb: RbTree<TestNode> = RbTree::new();

    for val in values {
        vec.push(val);
        assert!(rb.insert(TestNode::new(val)).is_ok());
    }

    fn vec_curs_prev(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_sub(1),
            None => v.len().checked_sub(1),
        }
    }

    fn vec_curs_next(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_add(1).filter(|&i| i < v.len()),
            None => (!v.is_empty()).then_some(0),
        }
    }

    let mut vec_curs = vec_curs_next(&vec, None);
    let mut rb_curs = rb.cursor_first_mut();

    assert_eq!(vec_curs.map(|i| vec[i]), rb_curs.get().map(ref_key));

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                vec_curs = vec_curs_next(&vec, vec_curs);
                rb_curs.move_next();
            }

            CursorOp::MovePrev => {
                vec_curs = vec_curs_prev(&vec, vec_curs);
                rb_curs.move_prev();
            }

            CursorOp::PeekNext => {
                let v = vec_curs_next(&vec, vec_curs).map(|i| vec[i]);
                let w = rb_curs.peek_next().map(ref_key);

                assert_eq!(v, w);
            }

            CursorOp::PeekPrev => {
                let v = vec_curs_prev(&vec, vec_curs).map(|i| vec[i]);
                let w = rb_curs.peek_prev().map(ref_key);

                assert_eq!(v, w);
            }

            CursorOp::RemoveCurrent => {
                let v = vec_curs.map(|i| vec.remove(i));

                if vec_curs == Some(vec.len()) {
                    vec_curs = None;
                }

                let w = rb_curs.remove_current().map(|node| node.key);

                assert_eq!(v, w);
            }

            CursorOp::RemoveCurrentMovePrev => {
                let new_vec_curs = vec_curs.map(|i| i.checked_sub(1));
                let v = vec_curs.map(|i| vec.remove(i));

                if let Some(vc) = new_vec_curs {
                    vec_curs = vc;
                }

                let w = rb_curs.remove_current_and_move_prev().map(|node| node.key);

                assert_eq!(v, w);
            }
        }

        assert_eq!(vec_curs.map(|i| vec[i]), rb_curs.get().map(ref_key));
    }

    drop(rb_curs);
    rb.assert_invariants();
    assert!(vec.iter().eq(rb.iter().map(|node| &node.key)));
}

/// An element owned by a [`Pool`], with its links in a named field.
///
/// Many pool nodes share a value, so they collide with each other in a tree.
#[derive(Debug)]
pub struct PoolNode {
    pub value: u32,
    pub id: usize,
    links: Links<PoolNode>,
}

unsafe impl Linked<Links<PoolNode>> for PoolNode {
    type Handle = NonNull<PoolNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        r
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        ptr
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<PoolNode>> {
        let ptr = ptr.as_ptr();
        // SAFETY: `ptr` is non-null, so a pointer to one of its fields is as well.
        unsafe { NonNull::new_unchecked(ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl TreeNode<Links<PoolNode>> for PoolNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.value
    }
}

/// Storage for [`PoolNode`]s that outlives every tree linking them.
pub struct Pool {
    nodes: Vec<NonNull<PoolNode>>,
}

impl Pool {
    pub fn new(len: usize, distinct_values: u32) -> Pool {
        let nodes = (0..len)
            .map(|id| {
                NonNull::from(Box::leak(Box::new(PoolNode {
                    value: id as u32 % distinct_values,
                    id,
                    links: Links::new(),
                })))
            })
            .collect();

        Pool { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ptr(&self, idx: usize) -> NonNull<PoolNode> {
        self.nodes[idx]
    }

    pub fn get(&self, idx: usize) -> &PoolNode {
        unsafe { self.nodes[idx].as_ref() }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        for node in self.nodes.drain(..) {
            unsafe {
                assert!(!node.as_ref().links.is_linked(), "pool dropped while linked");
                drop(Box::from_raw(node.as_ptr()));
            }
        }
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ForestOp {
    Insert { tree: u8, item: u16 },
    Erase { tree: u8, item: u16 },
    Clear { tree: u8 },
    Find { tree: u8, item: u16 },
    LowerBound { tree: u8, item: u16 },
    UpperBound { tree: u8, item: u16 },
    Merge { dst: u8, src: u8 },
    Includes { a: u8, b: u8 },
    Difference { a: u8, b: u8 },
    Intersection { a: u8, b: u8 },
    SymDifference { a: u8, b: u8 },
    Union { a: u8, b: u8 },
    EraseIf { tree: u8, selector: u8 },
    Swap { a: u8, b: u8 },
}

fn pair() -> impl Strategy<Value = (u8, u8)> {
    (any::<u8>(), any::<u8>())
}

fn tree_item() -> impl Strategy<Value = (u8, u16)> {
    (any::<u8>(), any::<u16>())
}

pub fn forest_op_strategy() -> impl Strategy<Value = ForestOp> {
    proptest::prop_oneof![
        16 => tree_item().prop_map(|(tree, item)| ForestOp::Insert { tree, item }),
        4 => tree_item().prop_map(|(tree, item)| ForestOp::Erase { tree, item }),
        1 => any::<u8>().prop_map(|tree| ForestOp::Clear { tree }),
        2 => tree_item().prop_map(|(tree, item)| ForestOp::Find { tree, item }),
        2 => tree_item().prop_map(|(tree, item)| ForestOp::LowerBound { tree, item }),
        2 => tree_item().prop_map(|(tree, item)| ForestOp::UpperBound { tree, item }),
        2 => pair().prop_map(|(dst, src)| ForestOp::Merge { dst, src }),
        2 => pair().prop_map(|(a, b)| ForestOp::Includes { a, b }),
        2 => pair().prop_map(|(a, b)| ForestOp::Difference { a, b }),
        2 => pair().prop_map(|(a, b)| ForestOp::Intersection { a, b }),
        2 => pair().prop_map(|(a, b)| ForestOp::SymDifference { a, b }),
        2 => pair().prop_map(|(a, b)| ForestOp::Union { a, b }),
        1 => pair().prop_map(|(tree, selector)| ForestOp::EraseIf { tree, selector }),
        1 => pair().prop_map(|(a, b)| ForestOp::Swap { a, b }),
    ]
}

const FOREST_TREES: usize = 4;
const FOREST_ITEMS: usize = 256;
const FOREST_VALUES: u32 = 64;

type PoolTree = RbTree<PoolNode>;

// Element identities, which is what the set operations must agree on.
fn ids<'a>(nodes: impl Iterator<Item = &'a PoolNode>) -> Vec<usize> {
    nodes.map(|node| node.id).collect()
}

fn reference_difference(a: &PoolTree, b: &PoolTree) -> Vec<usize> {
    ids(a.iter().filter(|node| b.find(node).is_none()))
}

fn reference_intersection(a: &PoolTree, b: &PoolTree) -> Vec<usize> {
    ids(a.iter().filter(|node| b.find(node).is_some()))
}

fn reference_sorted(mut nodes: Vec<&PoolNode>) -> Vec<usize> {
    nodes.sort_by_key(|node| node.value);
    ids(nodes.into_iter())
}

fn reference_sym_difference(a: &PoolTree, b: &PoolTree) -> Vec<usize> {
    let only_a = a.iter().filter(|node| b.find(node).is_none());
    let only_b = b.iter().filter(|node| a.find(node).is_none());
    reference_sorted(only_a.chain(only_b).collect())
}

fn reference_union(a: &PoolTree, b: &PoolTree) -> Vec<usize> {
    let only_b = b.iter().filter(|node| a.find(node).is_none());
    reference_sorted(a.iter().chain(only_b).collect())
}

fn reference_bound(tree: &PoolTree, probe: &PoolNode, inclusive: bool) -> Option<usize> {
    tree.iter()
        .find(|node| match node.value.cmp(&probe.value) {
            Ordering::Greater => true,
            Ordering::Equal => inclusive,
            Ordering::Less => false,
        })
        .map(|node| node.id)
}

fn pair_mut<E>(v: &mut [E], a: usize, b: usize) -> (&mut E, &mut E) {
    assert_ne!(a, b);

    if a < b {
        let (lo, hi) = v.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = v.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

fn forest_erase_predicate(selector: u8) -> impl Fn(&PoolNode) -> bool {
    move |node| match selector % 6 {
        0 => node.value % 2 == 0,
        1 => node.value % 2 == 1,
        2 => node.value < 8,
        3 => node.id % 3 == 0,
        4 => node.id % 5 == 0,
        _ => node.value > 1000,
    }
}

/// Runs `ops` against several trees sharing one pool of elements.
///
/// `home[i]` records which tree holds pool node `i`; the trees must agree with it after every
/// step, and no node may ever be linked in two trees.
pub fn run_forest_ops(ops: Vec<ForestOp>) {
    // Declared first so it is dropped after the trees.
    let pool = Pool::new(FOREST_ITEMS, FOREST_VALUES);
    let mut trees: Vec<PoolTree> = (0..FOREST_TREES).map(|_| RbTree::new()).collect();
    let mut home: Vec<Option<usize>> = vec![None; pool.len()];

    let tree_idx = |t: u8| t as usize % FOREST_TREES;
    let item_idx = |i: u16| i as usize % FOREST_ITEMS;

    for (op_id, op) in ops.into_iter().enumerate() {
        match op {
            ForestOp::Insert { tree, item } => {
                let (t, i) = (tree_idx(tree), item_idx(item));

                if home[i].is_none() {
                    match trees[t].insert(pool.ptr(i)) {
                        Ok(()) => home[i] = Some(t),
                        Err(_) => assert!(trees[t].contains(pool.get(i)), "Op #{op_id}: {op:?}"),
                    }
                }
            }

            ForestOp::Erase { tree, item } => {
                let (t, i) = (tree_idx(tree), item_idx(item));

                if home[i] == Some(t) {
                    let erased = unsafe { trees[t].erase(pool.ptr(i)) };
                    assert_eq!(erased, pool.ptr(i), "Op #{op_id}: {op:?}");
                    home[i] = None;
                }
            }

            ForestOp::Clear { tree } => {
                let t = tree_idx(tree);

                for node in trees[t].clear() {
                    let node = unsafe { node.as_ref() };
                    assert!(!node.links.is_linked(), "Op #{op_id}: {op:?}");
                    assert_eq!(home[node.id], Some(t), "Op #{op_id}: {op:?}");
                    home[node.id] = None;
                }
            }

            ForestOp::Find { tree, item } => {
                let (t, i) = (tree_idx(tree), item_idx(item));
                let probe = pool.get(i);

                let expected = trees[t]
                    .iter()
                    .find(|node| node.value == probe.value)
                    .map(|node| node.id);
                let actual = trees[t].find(probe).map(|node| node.id);
                assert_eq!(expected, actual, "Op #{op_id}: {op:?}");
            }

            ForestOp::LowerBound { tree, item } => {
                let (t, i) = (tree_idx(tree), item_idx(item));
                let probe = pool.get(i);

                let expected = reference_bound(&trees[t], probe, true);
                let actual = trees[t].lower_bound(probe).map(|node| node.id);
                assert_eq!(expected, actual, "Op #{op_id}: {op:?}");
            }

            ForestOp::UpperBound { tree, item } => {
                let (t, i) = (tree_idx(tree), item_idx(item));
                let probe = pool.get(i);

                let expected = reference_bound(&trees[t], probe, false);
                let actual = trees[t].upper_bound(probe).map(|node| node.id);
                assert_eq!(expected, actual, "Op #{op_id}: {op:?}");
            }

            ForestOp::Merge { dst, src } => {
                let (d, s) = (tree_idx(dst), tree_idx(src));
                if d == s {
                    continue;
                }

                let total = trees[d].len() + trees[s].len();
                let (dst_tree, src_tree) = pair_mut(&mut trees, d, s);
                dst_tree.merge(src_tree);

                assert_eq!(dst_tree.len() + src_tree.len(), total, "Op #{op_id}: {op:?}");
                assert!(
                    src_tree.iter().all(|node| dst_tree.contains(node)),
                    "Op #{op_id}: {op:?}"
                );

                for node in dst_tree.iter() {
                    home[node.id] = Some(d);
                }
            }

            ForestOp::Includes { a, b } => {
                let (a, b) = (&trees[tree_idx(a)], &trees[tree_idx(b)]);

                let expected = b.iter().all(|node| a.find(node).is_some());
                assert_eq!(expected, a.includes(b), "Op #{op_id}: {op:?}");
            }

            ForestOp::Difference { a, b } => {
                let (a, b) = (&trees[tree_idx(a)], &trees[tree_idx(b)]);

                let expected = reference_difference(a, b);
                assert_eq!(expected, ids(a.difference(b)), "Op #{op_id}: {op:?}");
            }

            ForestOp::Intersection { a, b } => {
                let (a, b) = (&trees[tree_idx(a)], &trees[tree_idx(b)]);

                let expected = reference_intersection(a, b);
                assert_eq!(expected, ids(a.intersection(b)), "Op #{op_id}: {op:?}");
            }

            ForestOp::SymDifference { a, b } => {
                let (a, b) = (&trees[tree_idx(a)], &trees[tree_idx(b)]);

                let expected = reference_sym_difference(a, b);
                assert_eq!(expected, ids(a.sym_difference(b)), "Op #{op_id}: {op:?}");
            }

            ForestOp::Union { a, b } => {
                let (a, b) = (&trees[tree_idx(a)], &trees[tree_idx(b)]);

                let expected = reference_union(a, b);
                assert_eq!(expected, ids(a.union(b)), "Op #{op_id}: {op:?}");
            }

            ForestOp::EraseIf { tree, selector } => {
                let t = tree_idx(tree);
                let predicate = forest_erase_predicate(selector);

                let expected = ids(trees[t].iter().filter(|&node| predicate(node)));
                let erased = trees[t].erase_if(|node| predicate(node));
                let erased = ids(erased.iter().map(|node| unsafe { node.as_ref() }));
                assert_eq!(expected, erased, "Op #{op_id}: {op:?}");

                for id in erased {
                    assert!(!pool.get(id).links.is_linked(), "Op #{op_id}: {op:?}");
                    home[id] = None;
                }
            }

            ForestOp::Swap { a, b } => {
                let (a, b) = (tree_idx(a), tree_idx(b));
                if a == b {
                    continue;
                }

                let (len_a, len_b) = (trees[a].len(), trees[b].len());
                let (tree_a, tree_b) = pair_mut(&mut trees, a, b);
                tree_a.swap(tree_b);
                assert_eq!((tree_a.len(), tree_b.len()), (len_b, len_a), "Op #{op_id}: {op:?}");

                for slot in home.iter_mut() {
                    *slot = slot.map(|t| match t {
                        t if t == a => b,
                        t if t == b => a,
                        t => t,
                    });
                }
            }
        }

        check_forest(&pool, &trees, &home);
    }

    for tree in trees.iter_mut() {
        tree.clear();
    }
}

fn check_forest(pool: &Pool, trees: &[PoolTree], home: &[Option<usize>]) {
    for (t, tree) in trees.iter().enumerate() {
        tree.assert_invariants();

        for node in tree.iter() {
            assert_eq!(home[node.id], Some(t), "node {} found in tree {t}", node.id);
        }

        let mut walked = 0;
        let mut opt_cur = tree.first();
        while let Some(cur) = opt_cur {
            walked += 1;
            opt_cur = tree.next(cur);
            if let Some(next) = opt_cur {
                assert!(tree.prev(next).is_some_and(|prev| ptr::eq(prev, cur)));
            }
        }
        assert_eq!(walked, tree.len());
    }

    let linked = (0..pool.len())
        .filter(|&i| pool.get(i).links.is_linked() || home[i].is_some())
        .inspect(|&i| {
            let holders = trees
                .iter()
                .filter(|tree| tree.find(pool.get(i)).is_some_and(|n| ptr::eq(n, pool.get(i))))
                .count();
            assert_eq!(holders, 1, "node {i} is linked in {holders} trees");
        })
        .count();

    let total: usize = trees.iter().map(|tree| tree.len()).sum();
    assert!(total <= linked, "{total} elements linked, {linked} nodes accounted for");
    assert_eq!(total, home.iter().filter(|slot| slot.is_some()).count());
}
