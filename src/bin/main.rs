use std::ptr::NonNull;

use cordyceps::Linked;
use cordyceps_rbtree::{Links, RbTree, TreeNode};

#[derive(Debug)]
struct Timer {
    deadline: u64,
    name: &'static str,
    links: Links<Timer>,
}

impl Timer {
    fn new(deadline: u64, name: &'static str) -> Box<Timer> {
        Box::new(Timer {
            deadline,
            name,
            links: Links::new(),
        })
    }
}

unsafe impl Linked<Links<Timer>> for Timer {
    type Handle = Box<Timer>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::from(Box::leak(r))
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<Timer>> {
        let ptr = ptr.as_ptr();
        unsafe { NonNull::new_unchecked(std::ptr::addr_of_mut!((*ptr).links)) }
    }
}

impl TreeNode<Links<Timer>> for Timer {
    type Key = u64;

    fn key(&self) -> &Self::Key {
        &self.deadline
    }
}

fn names(tree: &RbTree<Timer>) -> Vec<&'static str> {
    tree.iter().map(|timer| timer.name).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut pending: RbTree<Timer> = RbTree::new();

    for (deadline, name) in [(30, "flush"), (10, "poll"), (20, "retry"), (50, "gc"), (40, "ping")] {
        pending.insert(Timer::new(deadline, name))?;
        pending.assert_invariants();
        println!("{:?}", names(&pending));
    }

    if let Err(dup) = pending.insert(Timer::new(20, "retry-again")) {
        println!("rejected {}: {dup}", dup.into_inner().name);
    }

    let mut late: RbTree<Timer> = RbTree::new();
    for (deadline, name) in [(20, "shadow"), (60, "report"), (70, "rotate")] {
        late.insert(Timer::new(deadline, name))?;
    }

    pending.merge(&mut late);
    pending.assert_invariants();
    println!("merged: {:?}, left behind: {:?}", names(&pending), names(&late));

    let mut graph = String::new();
    pending.dotgraph("pending", |timer| timer.deadline, &mut graph)?;
    println!("{graph}");

    while let Some(timer) = pending.pop_first() {
        pending.assert_invariants();
        println!("fire {} at {}", timer.name, timer.deadline);
    }

    Ok(())
}
