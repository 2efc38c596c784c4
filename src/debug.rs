extern crate std;

use core::ptr::NonNull;
use std::{collections::VecDeque, fmt, prelude::v1::*};

use cordyceps::Linked;

use crate::{Color, Dir, Links, RbTree};

impl<T, C> RbTree<T, C>
where
    T: Linked<Links<T>> + ?Sized,
{
    /// Writes the tree as a Graphviz digraph, one rank per level.
    ///
    /// Each node is labelled with `label(node)`; red nodes are drawn red. Absent children are drawn
    /// as points so the shape of the tree is preserved.
    pub fn dotgraph<W, D, F>(&self, name: &str, mut label: F, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
        D: fmt::Display,
        F: FnMut(&T) -> D,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T: ?Sized> {
            Node(NonNull<T>, usize),
            Missing(usize),
        }

        let mut queue = VecDeque::new();
        let mut next_id = 0;
        queue.push_back(Item::Node(root, next_id));
        next_id += 1;

        writeln!(w, "digraph \"graph-{name}\" {{")?;

        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, " {{rank=same; ")?;

            for _ in 0..queue.len() {
                let (node, id) = match queue.pop_front() {
                    Some(Item::Node(node, id)) => (node, id),
                    Some(Item::Missing(id)) => {
                        write!(w, "\"{name}-{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let links = unsafe { self.links(node) };
                let text = label(unsafe { node.as_ref() });
                let color = match links.color() {
                    Color::Red => "red",
                    Color::Black => "black",
                };
                write!(w, "\"{name}-{id}\" [label=\"{text}\", color={color}]; ")?;

                for dir in [Dir::Left, Dir::Right] {
                    let child_id = next_id;
                    next_id += 1;

                    match links.child(dir) {
                        Some(child) => queue.push_back(Item::Node(child, child_id)),
                        None => queue.push_back(Item::Missing(child_id)),
                    }

                    writeln!(edges, " \"{name}-{id}\" -> \"{name}-{child_id}\";")?;
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;
        w.write_str("}\n")
    }
}
