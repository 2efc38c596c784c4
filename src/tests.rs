extern crate std;

use std::{
    cell::Cell,
    ops::Range,
    panic::{self, AssertUnwindSafe},
    prelude::v1::*,
    ptr::{self, NonNull},
    rc::Rc,
    string::String,
};

use cordyceps::Linked;
use proptest::{prelude::*, strategy::ValueTree, test_runner::TestRunner};

use crate::model::{self, ForestOp, Op, Pool, PoolNode, TestNode};

use super::*;

// Verifier events go to the test output when `RUST_LOG` asks for them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn tree_of(keys: &[u32]) -> RbTree<TestNode> {
    init_tracing();
    let mut tree = RbTree::new();

    for &key in keys {
        assert!(tree.insert(TestNode::new(key)).is_ok());
        tree.assert_invariants();
    }

    tree
}

fn keys<'a>(nodes: impl Iterator<Item = &'a TestNode>) -> Vec<u32> {
    nodes.map(|node| node.key).collect()
}

fn probe(key: u32) -> TestNode {
    TestNode::probe(key)
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);

    for key in keys {
        let node = tree.get(key).expect("item not found");
        assert_eq!(node.key(), key);
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

// Every order of `0..n` for small `n`.
fn permutations(n: u32) -> Vec<Vec<u32>> {
    fn extend(prefix: &mut Vec<u32>, rest: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
        if rest.is_empty() {
            out.push(prefix.clone());
            return;
        }

        for i in 0..rest.len() {
            let key = rest.remove(i);
            prefix.push(key);
            extend(prefix, rest, out);
            prefix.pop();
            rest.insert(i, key);
        }
    }

    let mut out = Vec::new();
    extend(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}

#[test]
fn five_elems_find() {
    for keys in permutations(5) {
        insert_find_all(&keys);
    }
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_of(keys);

    for key in keys {
        let node = tree.remove_key(key).expect("item not found");
        assert_eq!(node.key, *key);
        assert!(!node.links.is_linked());
        tree.assert_invariants();
    }
    assert!(tree.is_empty());

    for &key in keys {
        assert!(tree.insert(TestNode::new(key)).is_ok());
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        let node = NonNull::from(tree.get(key).expect("item not found"));
        let node = unsafe { tree.erase(node) };
        assert_eq!(node.key, *key);
        tree.assert_invariants();
    }
    assert!(tree.is_empty());
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_five() {
    for keys in permutations(5) {
        insert_remove_all(&keys);
    }
}

#[test]
fn three_ascending_rotate_to_black_root() {
    let tree = tree_of(&[10, 20, 30]);

    let shape: Vec<(u32, Color)> = tree
        .pre_order()
        .map(|node| (node.key, node.links.color()))
        .collect();

    assert_eq!(
        shape,
        [(20, Color::Black), (10, Color::Red), (30, Color::Red)]
    );
}

#[test]
fn traversal_orders() {
    // Ascending inserts settle into 2(1, 4(3, 6(5, 7))).
    let tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(keys(tree.iter()), [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(keys(tree.iter().rev()), [7, 6, 5, 4, 3, 2, 1]);
    assert_eq!(keys(tree.pre_order()), [2, 1, 4, 3, 6, 5, 7]);
    assert_eq!(keys(tree.post_order()), [1, 3, 5, 7, 6, 4, 2]);

    let mut visited = Vec::new();
    tree.traverse(|node| visited.push(node.key));
    tree.traverse_pre_order(|node| visited.push(node.key));
    tree.traverse_post_order(|node| visited.push(node.key));
    assert_eq!(visited.len(), 21);
    assert_eq!(visited[..7], [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(visited[7..14], [2, 1, 4, 3, 6, 5, 7]);
    assert_eq!(visited[14..], [1, 3, 5, 7, 6, 4, 2]);

    let colors: Vec<Color> = tree.pre_order().map(|node| node.links.color()).collect();
    assert_eq!(
        colors,
        [
            Color::Black,
            Color::Black,
            Color::Red,
            Color::Black,
            Color::Black,
            Color::Red,
            Color::Red,
        ]
    );
}

#[test]
fn iter_meets_in_the_middle() {
    let tree = tree_of(&[4, 2, 6, 1, 3, 5]);
    let mut iter = tree.iter();

    assert_eq!(iter.len(), 6);
    assert_eq!(iter.next().map(|n| n.key), Some(1));
    assert_eq!(iter.next_back().map(|n| n.key), Some(6));
    assert_eq!(iter.next().map(|n| n.key), Some(2));
    assert_eq!(iter.next_back().map(|n| n.key), Some(5));
    assert_eq!(iter.len(), 2);
    assert_eq!(keys(iter.by_ref()), [3, 4]);
    assert!(iter.next().is_none());
    assert!(iter.next_back().is_none());

    let empty: RbTree<TestNode> = RbTree::new();
    assert!(empty.iter().next().is_none());
    assert!(empty.pre_order().next().is_none());
    assert!(empty.post_order().next().is_none());
}

#[test]
fn bounds() {
    let tree = tree_of(&[1, 2, 3, 4, 5]);
    let lower = |key| tree.lower_bound(&probe(key)).map(|node| node.key);
    let upper = |key| tree.upper_bound(&probe(key)).map(|node| node.key);

    assert_eq!(lower(3), Some(3));
    assert_eq!(upper(3), Some(4));
    assert_eq!(lower(0), Some(1));
    assert_eq!(upper(0), Some(1));
    assert_eq!(lower(5), Some(5));
    assert_eq!(upper(5), None);
    assert_eq!(lower(6), None);
    assert_eq!(upper(6), None);

    let sparse = tree_of(&[10, 20, 30]);
    assert_eq!(sparse.lower_bound(&probe(15)).map(|n| n.key), Some(20));
    assert_eq!(sparse.upper_bound(&probe(15)).map(|n| n.key), Some(20));
    assert_eq!(sparse.lower_bound_by(|n| n.key.cmp(&25)).map(|n| n.key), Some(30));
    assert_eq!(sparse.upper_bound_by(|n| n.key.cmp(&30)).map(|n| n.key), None);
}

#[test]
fn next_and_prev_walk_the_order() {
    let tree = tree_of(&[8, 3, 10, 1, 6, 14, 4, 7, 13]);

    let mut forward = Vec::new();
    let mut cur = tree.first();
    while let Some(node) = cur {
        forward.push(node.key);
        cur = tree.next(node);
    }
    assert_eq!(forward, [1, 3, 4, 6, 7, 8, 10, 13, 14]);

    let mut backward = Vec::new();
    let mut cur = tree.last();
    while let Some(node) = cur {
        backward.push(node.key);
        cur = tree.prev(node);
    }
    forward.reverse();
    assert_eq!(backward, forward);
}

#[test]
fn find_and_contains() {
    let tree = tree_of(&[5, 1, 9]);

    assert_eq!(tree.find(&probe(9)).map(|n| n.key), Some(9));
    assert!(tree.find(&probe(4)).is_none());
    assert!(tree.contains(&probe(1)));
    assert!(!tree.contains(&probe(2)));
    assert!(tree.contains_key(&5));
    assert_eq!(tree.find_by(|n| n.key.cmp(&1)).map(|n| n.key), Some(1));
}

#[test]
fn duplicate_insert_returns_handle() {
    let mut tree = tree_of(&[1, 2, 3]);

    let err = tree
        .insert(TestNode::new(2))
        .expect_err("duplicate was linked");
    assert_eq!(err.to_string(), "an equal element is already linked in the tree");

    let node = err.into_inner();
    assert_eq!(node.key, 2);
    assert!(!node.links.is_linked());
    assert_eq!(tree.len(), 3);
    tree.assert_invariants();

    // The rejected handle is still usable.
    let mut other: RbTree<TestNode> = RbTree::new();
    assert!(other.insert(node).is_ok());
    assert_eq!(keys(other.iter()), [2]);
}

#[test]
fn erase_root_until_empty() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
    let mut remaining: Vec<u32> = (1..=7).collect();

    while let Some(root) = tree.pre_order().next().map(NonNull::from) {
        let node = unsafe { tree.erase(root) };
        assert!(!node.links.is_linked());

        remaining.retain(|&key| key != node.key);
        tree.assert_invariants();
        assert_eq!(keys(tree.iter()), remaining);
    }

    assert!(tree.is_empty());
    assert!(remaining.is_empty());
    assert!(tree.first().is_none());
    assert!(tree.last().is_none());
}

#[test]
fn remove_absent_returns_none() {
    let mut tree = tree_of(&[1, 2]);

    assert!(tree.remove(&probe(3)).is_none());
    assert!(tree.remove_key(&0).is_none());
    assert_eq!(tree.remove(&probe(2)).map(|n| n.key), Some(2));
    assert_eq!(tree.len(), 1);

    let mut empty: RbTree<TestNode> = RbTree::new();
    assert!(empty.remove(&probe(1)).is_none());
    assert!(empty.pop_first().is_none());
    assert!(empty.pop_last().is_none());
}

#[test]
fn first_and_last_track_extremes() {
    let mut tree = tree_of(&[5]);
    assert_eq!(tree.first().map(|n| n.key), Some(5));
    assert_eq!(tree.last().map(|n| n.key), Some(5));

    for key in [3, 8, 1, 9] {
        assert!(tree.insert(TestNode::new(key)).is_ok());
    }
    assert_eq!(tree.first().map(|n| n.key), Some(1));
    assert_eq!(tree.last().map(|n| n.key), Some(9));

    assert_eq!(tree.pop_first().map(|n| n.key), Some(1));
    assert_eq!(tree.pop_last().map(|n| n.key), Some(9));
    assert_eq!(tree.first().map(|n| n.key), Some(3));
    assert_eq!(tree.last().map(|n| n.key), Some(8));
    tree.assert_invariants();
}

#[test]
fn clear_unlinks_everything() {
    let mut tree = tree_of(&[1, 2, 3, 4, 5, 6, 7]);

    let cleared = tree.clear();
    assert_eq!(cleared.len(), 7);
    assert!(cleared.iter().all(|node| !node.links.is_linked()));
    assert_eq!(
        cleared.iter().map(|node| node.key).collect::<Vec<_>>(),
        [1, 3, 5, 7, 6, 4, 2]
    );

    assert!(tree.is_empty());
    assert!(tree.first().is_none());
    assert!(tree.last().is_none());
    tree.assert_invariants();

    // Cleared elements can be linked again.
    for node in cleared {
        assert!(tree.insert(node).is_ok());
    }
    assert_eq!(keys(tree.iter()), [1, 2, 3, 4, 5, 6, 7]);
    tree.assert_invariants();
}

#[test]
fn erase_if_returns_matches_in_order() {
    let mut tree = tree_of(&[6, 3, 9, 1, 4, 7, 10, 2]);

    let odd = tree.erase_if(|node| node.key % 2 == 1);
    assert_eq!(odd.iter().map(|n| n.key).collect::<Vec<_>>(), [1, 3, 7, 9]);
    assert!(odd.iter().all(|node| !node.links.is_linked()));
    assert_eq!(keys(tree.iter()), [2, 4, 6, 10]);
    tree.assert_invariants();

    assert!(tree.erase_if(|_| false).is_empty());
    assert_eq!(tree.erase_if(|_| true).len(), 4);
    assert!(tree.is_empty());
}

#[test]
fn set_algebra() {
    let a = tree_of(&[1, 3, 5]);
    let b = tree_of(&[2, 3, 4]);

    assert_eq!(keys(a.union(&b)), [1, 2, 3, 4, 5]);
    assert_eq!(keys(a.intersection(&b)), [3]);
    assert_eq!(keys(a.difference(&b)), [1, 5]);
    assert_eq!(keys(b.difference(&a)), [2, 4]);
    assert_eq!(keys(a.sym_difference(&b)), [1, 2, 4, 5]);
    assert!(!a.includes(&b));

    // On a match, the left operand's element is produced.
    let from_a = a.find(&probe(3)).expect("3 is in a");
    assert!(a.intersection(&b).all(|node| ptr::eq(node, from_a)));
    assert!(a.union(&b).any(|node| ptr::eq(node, from_a)));

    let sub = tree_of(&[1, 5]);
    let empty: RbTree<TestNode> = RbTree::new();
    assert!(a.includes(&sub));
    assert!(!sub.includes(&a));
    assert!(a.includes(&empty));
    assert!(empty.includes(&empty));
    assert!(!empty.includes(&a));
    assert_eq!(keys(a.union(&empty)), [1, 3, 5]);
    assert_eq!(keys(empty.union(&a)), [1, 3, 5]);
    assert!(a.intersection(&empty).next().is_none());
}

#[test]
fn set_algebra_laws() {
    let a = tree_of(&[2, 4, 6, 8, 10, 12]);
    let b = tree_of(&[3, 6, 9, 12]);

    let union = keys(a.union(&b));
    let intersection = keys(a.intersection(&b));
    let sym_difference = keys(a.sym_difference(&b));

    // |A ∪ B| = |A| + |B| - |A ∩ B|
    assert_eq!(union.len(), a.len() + b.len() - intersection.len());
    assert!(union.len() >= a.len().max(b.len()));

    // (A \ B) ∪ (A ∩ B) = A
    let mut split = keys(a.difference(&b));
    split.extend(intersection.iter().copied());
    split.sort_unstable();
    assert_eq!(split, keys(a.iter()));

    // A △ B = (A \ B) ∪ (B \ A)
    let mut halves = keys(a.difference(&b));
    halves.extend(keys(b.difference(&a)));
    halves.sort_unstable();
    assert_eq!(sym_difference, halves);

    assert_eq!(keys(b.intersection(&a)), intersection);
    assert_eq!(keys(b.union(&a)), union);

    assert!(a.includes(&a));
    assert_eq!(keys(a.union(&a)), keys(a.iter()));
    assert!(a.sym_difference(&a).next().is_none());
}

#[test]
fn merge_moves_non_colliding_elements() {
    let mut dst = tree_of(&[1, 3, 5]);
    let mut src = tree_of(&[2, 3, 4, 6]);
    let kept = NonNull::from(src.find(&probe(3)).expect("3 is in src"));

    dst.merge(&mut src);

    assert_eq!(keys(dst.iter()), [1, 2, 3, 4, 5, 6]);
    assert_eq!(keys(src.iter()), [3]);
    assert_eq!(src.first().map(NonNull::from), Some(kept));
    assert_ne!(dst.find(&probe(3)).map(NonNull::from), Some(kept));

    dst.assert_invariants();
    src.assert_invariants();

    let mut empty = RbTree::new();
    dst.merge(&mut empty);
    assert_eq!(dst.len(), 6);
    empty.merge(&mut dst);
    assert_eq!(empty.len(), 6);
    assert!(dst.is_empty());
}

#[test]
fn swap_exchanges_contents() {
    let mut a = tree_of(&[1, 2, 3]);
    let mut b = tree_of(&[7]);

    a.swap(&mut b);

    assert_eq!(keys(a.iter()), [7]);
    assert_eq!(keys(b.iter()), [1, 2, 3]);
    a.assert_invariants();
    b.assert_invariants();
}

#[test]
fn swap_exchanges_comparators() {
    let by_direction = |descending: bool| {
        move |a: &TestNode, b: &TestNode| {
            let order = a.key.cmp(&b.key);
            if descending {
                order.reverse()
            } else {
                order
            }
        }
    };

    let mut up: RbTree<TestNode, _> = RbTree::with_comparator(by_direction(false));
    let mut down: RbTree<TestNode, _> = RbTree::with_comparator(by_direction(true));

    for key in [2, 1, 3] {
        assert!(up.insert(TestNode::new(key)).is_ok());
    }
    for key in [5, 4, 6] {
        assert!(down.insert(TestNode::new(key)).is_ok());
    }
    assert_eq!(keys(up.iter()), [1, 2, 3]);
    assert_eq!(keys(down.iter()), [6, 5, 4]);

    up.swap(&mut down);

    // Each tree keeps the order its elements were linked under.
    assert_eq!(keys(up.iter()), [6, 5, 4]);
    assert_eq!(keys(down.iter()), [1, 2, 3]);

    // New elements are placed by the comparator that came across.
    assert!(up.insert(TestNode::new(7)).is_ok());
    assert!(up.insert(TestNode::new(0)).is_ok());
    assert!(down.insert(TestNode::new(7)).is_ok());
    assert!(down.insert(TestNode::new(0)).is_ok());

    assert_eq!(keys(up.iter()), [7, 6, 5, 4, 0]);
    assert_eq!(keys(down.iter()), [0, 1, 2, 3, 7]);
    assert_eq!(up.first().map(|n| n.key), Some(7));
    assert_eq!(down.first().map(|n| n.key), Some(0));
    up.assert_invariants();
    down.assert_invariants();
}

// Counts how many times an element with this counter was dropped.
#[derive(Debug)]
#[repr(C)]
struct Counted {
    links: Links<Counted>,
    key: u32,
    drops: Rc<Cell<usize>>,
}

impl Counted {
    fn new(key: u32, drops: &Rc<Cell<usize>>) -> Box<Counted> {
        Box::new(Counted {
            links: Links::new(),
            key,
            drops: drops.clone(),
        })
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

unsafe impl Linked<Links<Counted>> for Counted {
    type Handle = Box<Counted>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<Counted>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

#[test]
fn panicking_comparator_drops_rejected_element() {
    let drops = Rc::new(Cell::new(0));
    let refused = 13;

    let mut tree: RbTree<Counted, _> =
        RbTree::with_comparator(move |a: &Counted, b: &Counted| {
            assert!(a.key != refused && b.key != refused, "refusing key {refused}");
            a.key.cmp(&b.key)
        });

    for key in [1, 2, 3] {
        assert!(tree.insert(Counted::new(key, &drops)).is_ok());
    }

    let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = tree.insert(Counted::new(refused, &drops));
    }));
    assert!(unwound.is_err());
    assert_eq!(drops.get(), 1);

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.iter().map(|n| n.key).collect::<Vec<_>>(), [1, 2, 3]);
    tree.assert_invariants();

    // A duplicate is handed back, not dropped.
    let dup = tree
        .insert(Counted::new(2, &drops))
        .expect_err("duplicate was linked");
    assert_eq!(drops.get(), 1);
    drop(dup);
    assert_eq!(drops.get(), 2);

    drop(tree);
    assert_eq!(drops.get(), 5);
}

#[test]
fn closure_comparator() {
    let reverse = |a: &TestNode, b: &TestNode| b.key.cmp(&a.key);
    let mut tree: RbTree<TestNode, _> = RbTree::with_comparator(reverse);

    for key in [4, 1, 3, 5, 2] {
        assert!(tree.insert(TestNode::new(key)).is_ok());
        tree.assert_invariants();
    }

    assert_eq!(keys(tree.iter()), [5, 4, 3, 2, 1]);
    assert_eq!(tree.first().map(|n| n.key), Some(5));
    assert_eq!(tree.lower_bound(&probe(3)).map(|n| n.key), Some(3));
    assert_eq!(tree.upper_bound(&probe(3)).map(|n| n.key), Some(2));
    assert!(tree.insert(TestNode::new(3)).is_err());

    let other: RbTree<TestNode, _> = RbTree::with_comparator(reverse);
    assert_eq!(keys(tree.union(&other)), [5, 4, 3, 2, 1]);
}

#[test]
fn cursor_walks_and_wraps() {
    let mut tree = tree_of(&[10, 20, 30]);

    let mut cursor = tree.cursor_first();
    assert_eq!(cursor.get().map(|n| n.key), Some(10));
    assert_eq!(cursor.peek_prev().map(|n| n.key), None);
    cursor.move_prev();
    assert!(cursor.get().is_none());
    assert_eq!(cursor.peek_next().map(|n| n.key), Some(10));
    cursor.move_prev();
    assert_eq!(cursor.get().map(|n| n.key), Some(30));

    let cursor = tree.cursor_lower_bound(&probe(15));
    assert_eq!(cursor.get().map(|n| n.key), Some(20));

    let mut cursor = tree.cursor_last_mut();
    assert!(cursor.insert(TestNode::new(25)).is_ok());
    assert!(cursor.insert(TestNode::new(30)).is_err());
    assert_eq!(cursor.get().map(|n| n.key), Some(30));
    assert_eq!(cursor.peek_prev().map(|n| n.key), Some(25));

    assert_eq!(cursor.remove_current_and_move_prev().map(|n| n.key), Some(30));
    assert_eq!(cursor.get().map(|n| n.key), Some(25));
    assert_eq!(cursor.remove_current().map(|n| n.key), Some(25));
    assert!(cursor.get().is_none());
    assert!(cursor.remove_current().is_none());

    let mut cursor = tree.cursor_lower_bound_mut(&probe(20));
    assert_eq!(cursor.as_cursor().get().map(|n| n.key), Some(20));
    cursor.move_next();
    assert!(cursor.get().is_none());

    assert_eq!(keys(tree.iter()), [10, 20]);
    tree.assert_invariants();
}

#[test]
fn debug_output() {
    let tree = tree_of(&[2, 1, 3]);

    let debug = std::format!("{tree:?}");
    assert!(debug.starts_with('{'));
    assert_eq!(debug.matches("key").count(), 3);

    let mut graph = String::new();
    tree.dotgraph("t", |node| node.key, &mut graph)
        .expect("writing to a String cannot fail");
    assert!(graph.starts_with("digraph \"graph-t\" {"));
    assert!(graph.contains("[label=\"2\", color=black]"));
    assert!(graph.contains("[label=\"1\", color=red]"));
    assert!(graph.contains("shape=point"));
    assert!(graph.ends_with("}\n"));

    let mut empty_graph = String::new();
    RbTree::<TestNode>::new()
        .dotgraph("e", |node| node.key, &mut empty_graph)
        .expect("writing to a String cannot fail");
    assert_eq!(empty_graph, "digraph \"graph-e\" {}");
}

#[test]
#[should_panic(expected = "already linked")]
fn insert_linked_element_panics() {
    let pool = Pool::new(4, 4);
    let mut a: RbTree<PoolNode> = RbTree::new();
    let mut b: RbTree<PoolNode> = RbTree::new();

    assert!(a.insert(pool.ptr(0)).is_ok());
    assert!(a.insert(pool.ptr(1)).is_ok());

    // Element 0 now has a child in `a`.
    let _ = b.insert(pool.ptr(0));
}

#[test]
#[should_panic(expected = "not a member")]
fn erase_foreign_element_panics() {
    let mut a = tree_of(&[1, 2]);
    let b = tree_of(&[1]);

    let foreign = NonNull::from(b.first().expect("b is not empty"));
    let _ = unsafe { a.erase(foreign) };
}

fn sample<S: Strategy>(strategy: S, count: usize) -> Vec<S::Value> {
    let mut runner = TestRunner::deterministic();

    (0..count)
        .map(|_| {
            strategy
                .new_tree(&mut runner)
                .expect("strategy generates values")
                .current()
        })
        .collect()
}

#[test]
fn op_mix_grows_trees() {
    let ops = sample(model::op_strategy(), 2000);
    let inserts = ops.iter().filter(|op| matches!(op, Op::Insert(_))).count();
    let clears = ops.iter().filter(|op| matches!(op, Op::Clear)).count();

    assert!(clears > 0);
    assert!(inserts > 4 * clears, "{inserts} inserts, {clears} clears");

    let forest = sample(model::forest_op_strategy(), 2000);
    let inserts = forest.iter().filter(|op| matches!(op, ForestOp::Insert { .. })).count();
    let clears = forest.iter().filter(|op| matches!(op, ForestOp::Clear { .. })).count();

    assert!(clears > 0);
    assert!(inserts > 4 * clears, "{inserts} inserts, {clears} clears");
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        init_tracing();
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        values in proptest::collection::vec(0u32..1000, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        init_tracing();
        model::run_cursor_equivalence(values, ops);
    }

    #[test]
    fn forest_ops(ops in proptest::collection::vec(model::forest_op_strategy(), FUZZ_RANGE)) {
        init_tracing();
        model::run_forest_ops(ops);
    }
}
