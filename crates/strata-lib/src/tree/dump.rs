//! Indented outline of a node and its active structure.

use strata_core::truncate;

use crate::Result;

use super::{NodeId, NodeKind, Tree};

const CONTENT_LEN: usize = 40;

impl Tree {
    /// One line per node: shape, definition, field name, state and content.
    ///
    /// ```text
    /// sequence #3 "<a>123</a>"
    ///   leaf #0 "<a>"
    ///   leaf #1 digits "123"
    ///   leaf #2 "</a>"
    /// ```
    pub fn dump(&self, node: NodeId) -> Result<String> {
        self.data(node)?;
        let mut out = String::new();
        let mut stack = vec![(node, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            self.dump_line(id, depth, &mut out);
            let children = self.children(id).unwrap_or_default();
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
        Ok(out)
    }

    fn dump_line(&self, node: NodeId, depth: usize, out: &mut String) {
        let data = &self.nodes[node.index()];
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} {}", data.kind.shape(), data.def));
        if let Some(name) = self.grammar.name(data.def) {
            out.push_str(&format!(" {name}"));
        }
        match &data.kind {
            NodeKind::Choice {
                current: Some(index),
                ..
            } => out.push_str(&format!(" [{index}]")),
            NodeKind::Optional { present: false, .. } if data.content.is_some() => {
                out.push_str(" absent")
            }
            _ => {}
        }
        match &data.content {
            Some(content) => out.push_str(&format!(" {:?}\n", truncate(content, CONTENT_LEN))),
            None => out.push_str(" unset\n"),
        }
    }
}
