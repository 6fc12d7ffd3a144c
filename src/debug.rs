use alloc::{collections::VecDeque, string::String};
use core::{fmt, ptr::NonNull};

use crate::{AvlTree, Node};

impl<T: Ord + fmt::Display> AvlTree<T> {
    /// Writes the tree to `w` in Graphviz dot format.
    ///
    /// Each level of the tree becomes one `rank=same` row; nodes are labelled
    /// `key:height` and missing children are drawn as points. Node identities
    /// come from allocation addresses, so duplicate keys render as distinct
    /// nodes.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T> {
            Node(NonNull<Node<T>>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        for _row in 0.. {
            use fmt::Write;
            let remaining = queue.len();
            if remaining == 0 {
                break;
            }

            write!(w, "{{rank=same; ")?;

            for _row_node in 0..remaining {
                let node = queue.pop_front().unwrap();

                let node = match node {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let id = node.as_ptr() as usize;
                let key = unsafe { &(*node.as_ptr()).key };
                let height = unsafe { node.as_ref().height };
                write!(w, "\"graph{name}-{id:x}\" [label=\"{key}:{height}\"]; ")?;

                for child in unsafe { [node.as_ref().left(), node.as_ref().right()] } {
                    match child {
                        Some(child) => {
                            let child_id = child.as_ptr() as usize;

                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{id:x}\" -> \"graph{name}-{child_id:x}\";"
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{id:x}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
