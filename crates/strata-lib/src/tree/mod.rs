//! Live node trees.
//!
//! Nodes live in an append-only arena owned by `Tree` and are addressed by
//! `NodeId`. Ownership is the parent link: a node is active in its parent when
//! the parent's current structure includes it (every Sequence child, the
//! current Choice alternative, a present Option child, the current items and
//! separators of a loop). Content changes propagate upward only along active
//! links, so the ownership relation and the listener relation are one and the
//! same.
//!
//! Sequence children are created with their parent. Choice alternatives and
//! Option children are created on first use, which keeps recursive grammars
//! finite. Loop items are created per assignment. Replaced items, and the
//! items of a removed or reset loop, are released: their slots go back on a
//! free list, and the generation carried by `NodeId` turns old handles into
//! `UnknownNode` errors instead of aliases of whatever reuses the slot.

mod dump;
mod sync;


use std::fmt;
use std::rc::Rc;

use crate::grammar::{DefId, Grammar, Repetition, Rule};
use crate::trace::NoopTracer;
use crate::{Error, Result, search};

/// Handle to a node inside a `Tree`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Arena slot. Slots are reused once a node is released.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.index)
    }
}

/// Handle to a registered content listener.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(u64);

/// A content change, as seen by listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentChange {
    pub node: NodeId,
    /// Content before the change; `None` if the node was unset.
    pub old: Option<String>,
    pub new: String,
}

type Listener = Box<dyn FnMut(&ContentChange)>;

/// Structural kind of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeShape {
    Leaf,
    Sequence,
    Choice,
    Optional,
    Loop,
    Separated,
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Leaf => "leaf",
            Self::Sequence => "sequence",
            Self::Choice => "choice",
            Self::Optional => "optional",
            Self::Loop => "loop",
            Self::Separated => "separated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf,
    Sequence {
        children: Vec<NodeId>,
    },
    Choice {
        alternatives: Vec<Option<NodeId>>,
        current: Option<usize>,
    },
    Optional {
        child: Option<NodeId>,
        present: bool,
    },
    Loop {
        items: Vec<NodeId>,
    },
    Separated {
        items: Vec<NodeId>,
        separators: Vec<NodeId>,
    },
}

impl NodeKind {
    fn shape(&self) -> NodeShape {
        match self {
            Self::Leaf => NodeShape::Leaf,
            Self::Sequence { .. } => NodeShape::Sequence,
            Self::Choice { .. } => NodeShape::Choice,
            Self::Optional { .. } => NodeShape::Optional,
            Self::Loop { .. } => NodeShape::Loop,
            Self::Separated { .. } => NodeShape::Separated,
        }
    }
}

struct NodeData {
    /// Bumped whenever the slot is released.
    generation: u32,
    def: DefId,
    content: Option<String>,
    parent: Option<NodeId>,
    kind: NodeKind,
    listeners: Vec<(ListenerId, Listener)>,
}

/// Arena of nodes built from one grammar.
pub struct Tree {
    grammar: Rc<Grammar>,
    nodes: Vec<NodeData>,
    free: Vec<u32>,
    next_listener: u64,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.node_count())
            .finish_non_exhaustive()
    }
}

impl Tree {
    pub fn new(grammar: impl Into<Rc<Grammar>>) -> Self {
        Self {
            grammar: grammar.into(),
            nodes: Vec::new(),
            free: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Number of live nodes, reachable or not. Released nodes do not count.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Fresh node for `def`: unset, or holding the definition's default content.
    ///
    /// `DefId`s are plain indices, so a handle from another grammar is only
    /// caught when it is out of range for this one; in range, it silently
    /// names this grammar's definition at that index.
    pub fn create(&mut self, def: DefId) -> Result<NodeId> {
        if !self.grammar.contains(def) {
            return Err(Error::UnknownDefinition(def));
        }
        Ok(self.alloc(def, None, true))
    }

    /// Allocate a node, its sequence children included.
    fn alloc(&mut self, def: DefId, parent: Option<NodeId>, defaults: bool) -> NodeId {
        let grammar = Rc::clone(&self.grammar);
        let kind = match grammar.shape(def) {
            Rule::Literal(_) | Rule::Pattern(_) | Rule::Empty => NodeKind::Leaf,
            Rule::Sequence(_) => NodeKind::Sequence {
                children: Vec::new(),
            },
            Rule::Choice(alternatives) => NodeKind::Choice {
                alternatives: vec![None; alternatives.len()],
                current: None,
            },
            Rule::Optional { .. } => NodeKind::Optional {
                child: None,
                present: false,
            },
            Rule::Loop { .. } => NodeKind::Loop { items: Vec::new() },
            Rule::Separated { .. } => NodeKind::Separated {
                items: Vec::new(),
                separators: Vec::new(),
            },
            Rule::Alias { .. } | Rule::Forward(_) | Rule::WithDefault { .. } => {
                unreachable!("shape() resolves indirections")
            }
        };
        let id = self.occupy(NodeData {
            generation: 0,
            def,
            content: None,
            parent,
            kind,
            listeners: Vec::new(),
        });

        if let Rule::Sequence(items) = grammar.shape(def) {
            let children = items
                .iter()
                .map(|item| self.alloc(*item, Some(id), defaults))
                .collect();
            self.nodes[id.index()].kind = NodeKind::Sequence { children };
        }

        if defaults && let Some(text) = grammar.default_content(def) {
            // Validated when the grammar was built.
            if let Ok(split) = search::resolve(&grammar, def, text, &mut NoopTracer) {
                self.assign(id, &split, text, &mut NoopTracer);
            }
        }
        id
    }

    /// Store `data` in a free slot, or a new one.
    fn occupy(&mut self, mut data: NodeData) -> NodeId {
        let Some(index) = self.free.pop() else {
            let index = self.nodes.len() as u32;
            self.nodes.push(data);
            return NodeId {
                index,
                generation: 0,
            };
        };
        let slot = &mut self.nodes[index as usize];
        let generation = slot.generation;
        data.generation = generation;
        *slot = data;
        NodeId { index, generation }
    }

    /// Free `roots` and everything below them. Listeners are dropped and
    /// outstanding handles go stale.
    fn release(&mut self, roots: &[NodeId]) {
        let mut stack = roots.to_vec();
        while let Some(id) = stack.pop() {
            let data = &mut self.nodes[id.index()];
            if data.generation != id.generation {
                continue;
            }
            data.generation = data.generation.wrapping_add(1);
            data.content = None;
            data.parent = None;
            data.listeners.clear();
            match std::mem::replace(&mut data.kind, NodeKind::Leaf) {
                NodeKind::Leaf => {}
                NodeKind::Sequence { children } => stack.extend(children),
                NodeKind::Choice { alternatives, .. } => {
                    stack.extend(alternatives.into_iter().flatten());
                }
                NodeKind::Optional { child, .. } => stack.extend(child),
                NodeKind::Loop { items } => stack.extend(items),
                NodeKind::Separated { items, separators } => {
                    stack.extend(items);
                    stack.extend(separators);
                }
            }
            self.free.push(id.index);
        }
    }

    fn data(&self, node: NodeId) -> Result<&NodeData> {
        self.nodes
            .get(node.index())
            .filter(|data| data.generation == node.generation)
            .ok_or(Error::UnknownNode(node))
    }

    fn data_mut(&mut self, node: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(node.index())
            .filter(|data| data.generation == node.generation)
            .ok_or(Error::UnknownNode(node))
    }

    fn mismatch(&self, node: NodeId, expected: NodeShape) -> Error {
        let found = self.nodes[node.index()].kind.shape();
        Error::ShapeMismatch {
            node,
            expected,
            found,
        }
    }

    pub fn content(&self, node: NodeId) -> Result<&str> {
        self.data(node)?
            .content
            .as_deref()
            .ok_or(Error::NoContent(node))
    }

    pub fn is_set(&self, node: NodeId) -> Result<bool> {
        Ok(self.data(node)?.content.is_some())
    }

    pub fn definition(&self, node: NodeId) -> Result<DefId> {
        Ok(self.data(node)?.def)
    }

    pub fn regex(&self, node: NodeId) -> Result<&str> {
        let def = self.data(node)?.def;
        Ok(self.grammar.regex(def))
    }

    pub fn shape(&self, node: NodeId) -> Result<NodeShape> {
        Ok(self.data(node)?.kind.shape())
    }

    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.data(node)?.parent)
    }

    /// Whether the node currently contributes to its parent's content.
    pub fn is_active(&self, node: NodeId) -> Result<bool> {
        self.data(node)?;
        Ok(self.active_parent(node).is_some())
    }

    /// Parent whose content depends on `node`, if any.
    fn active_parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.index()].parent?;
        let related = match &self.nodes[parent.index()].kind {
            NodeKind::Leaf => false,
            NodeKind::Sequence { children } => children.contains(&node),
            NodeKind::Choice {
                alternatives,
                current,
            } => current.is_some_and(|i| alternatives[i] == Some(node)),
            NodeKind::Optional { child, present } => *present && *child == Some(node),
            NodeKind::Loop { items } => items.contains(&node),
            NodeKind::Separated { items, separators } => {
                items.contains(&node) || separators.contains(&node)
            }
        };
        related.then_some(parent)
    }

    /// Active children in content order.
    pub fn children(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let children = match &self.data(node)?.kind {
            NodeKind::Leaf => Vec::new(),
            NodeKind::Sequence { children } => children.clone(),
            NodeKind::Choice {
                alternatives,
                current,
            } => current
                .and_then(|i| alternatives[i])
                .into_iter()
                .collect(),
            NodeKind::Optional { child, present } => {
                child.filter(|_| *present).into_iter().collect()
            }
            NodeKind::Loop { items } => items.clone(),
            NodeKind::Separated { items, separators } => interleave(items, separators),
        };
        Ok(children)
    }

    /// Item count of a loop, or child count of a sequence.
    pub fn len(&self, node: NodeId) -> Result<usize> {
        match &self.data(node)?.kind {
            NodeKind::Sequence { children } => Ok(children.len()),
            NodeKind::Loop { items } | NodeKind::Separated { items, .. } => Ok(items.len()),
            _ => Err(self.mismatch(node, NodeShape::Loop)),
        }
    }

    // Sequence

    pub fn child(&self, node: NodeId, index: usize) -> Result<NodeId> {
        let children = self.sequence_children(node)?;
        children
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                node,
                index,
                len: children.len(),
            })
    }

    /// First child built from exactly `def`.
    pub fn child_by_def(&self, node: NodeId, def: DefId) -> Result<NodeId> {
        self.sequence_children(node)?
            .iter()
            .copied()
            .find(|child| self.nodes[child.index()].def == def)
            .ok_or(Error::NotAChild { node, def })
    }

    /// Child whose definition carries the field name `name`.
    pub fn field(&self, node: NodeId, name: &str) -> Result<NodeId> {
        self.sequence_children(node)?
            .iter()
            .copied()
            .find(|child| self.grammar.name(self.nodes[child.index()].def) == Some(name))
            .ok_or_else(|| Error::UnknownField {
                node,
                name: name.to_string(),
            })
    }

    fn sequence_children(&self, node: NodeId) -> Result<&[NodeId]> {
        match &self.data(node)?.kind {
            NodeKind::Sequence { children } => Ok(children),
            _ => Err(self.mismatch(node, NodeShape::Sequence)),
        }
    }

    // Choice

    /// Index of the alternative that matched last, if any.
    pub fn current_index(&self, node: NodeId) -> Result<Option<usize>> {
        match &self.data(node)?.kind {
            NodeKind::Choice { current, .. } => Ok(*current),
            _ => Err(self.mismatch(node, NodeShape::Choice)),
        }
    }

    pub fn current(&self, node: NodeId) -> Result<Option<NodeId>> {
        match &self.data(node)?.kind {
            NodeKind::Choice {
                alternatives,
                current,
            } => Ok(current.and_then(|i| alternatives[i])),
            _ => Err(self.mismatch(node, NodeShape::Choice)),
        }
    }

    /// Node of alternative `index`, created unset if it never matched.
    pub fn alternative(&mut self, node: NodeId, index: usize) -> Result<NodeId> {
        let (len, slot) = match &self.data(node)?.kind {
            NodeKind::Choice { alternatives, .. } => {
                (alternatives.len(), alternatives.get(index).copied())
            }
            _ => return Err(self.mismatch(node, NodeShape::Choice)),
        };
        match slot {
            None => Err(Error::IndexOutOfBounds { node, index, len }),
            Some(Some(existing)) => Ok(existing),
            Some(None) => {
                let def = self.choice_alternatives(node)[index];
                let created = self.alloc(def, Some(node), true);
                if let NodeKind::Choice { alternatives, .. } = &mut self.nodes[node.index()].kind {
                    alternatives[index] = Some(created);
                }
                Ok(created)
            }
        }
    }

    /// Node of the first alternative built from exactly `def`.
    pub fn alternative_by_def(&mut self, node: NodeId, def: DefId) -> Result<NodeId> {
        if self.shape(node)? != NodeShape::Choice {
            return Err(self.mismatch(node, NodeShape::Choice));
        }
        let index = self
            .choice_alternatives(node)
            .iter()
            .position(|alternative| *alternative == def)
            .ok_or(Error::NotAChild { node, def })?;
        self.alternative(node, index)
    }

    fn choice_alternatives(&self, node: NodeId) -> &[DefId] {
        match self.grammar.shape(self.nodes[node.index()].def) {
            Rule::Choice(alternatives) => alternatives,
            _ => &[],
        }
    }

    // Option

    pub fn is_present(&self, node: NodeId) -> Result<bool> {
        match &self.data(node)?.kind {
            NodeKind::Optional { present, .. } => Ok(*present),
            _ => Err(self.mismatch(node, NodeShape::Optional)),
        }
    }

    /// The wrapped node, created unset if the option was never present.
    pub fn optional_child(&mut self, node: NodeId) -> Result<NodeId> {
        let existing = match &self.data(node)?.kind {
            NodeKind::Optional { child, .. } => *child,
            _ => return Err(self.mismatch(node, NodeShape::Optional)),
        };
        if let Some(existing) = existing {
            return Ok(existing);
        }
        let item = match self.grammar.shape(self.nodes[node.index()].def) {
            Rule::Optional { item, .. } => *item,
            _ => return Err(self.mismatch(node, NodeShape::Optional)),
        };
        let created = self.alloc(item, Some(node), true);
        if let NodeKind::Optional { child, .. } = &mut self.nodes[node.index()].kind {
            *child = Some(created);
        }
        Ok(created)
    }

    // Loop and SeparatedLoop

    pub fn items(&self, node: NodeId) -> Result<&[NodeId]> {
        match &self.data(node)?.kind {
            NodeKind::Loop { items } | NodeKind::Separated { items, .. } => Ok(items),
            _ => Err(self.mismatch(node, NodeShape::Loop)),
        }
    }

    pub fn item(&self, node: NodeId, index: usize) -> Result<NodeId> {
        let items = self.items(node)?;
        items.get(index).copied().ok_or(Error::IndexOutOfBounds {
            node,
            index,
            len: items.len(),
        })
    }

    pub fn separators(&self, node: NodeId) -> Result<&[NodeId]> {
        match &self.data(node)?.kind {
            NodeKind::Separated { separators, .. } => Ok(separators),
            _ => Err(self.mismatch(node, NodeShape::Separated)),
        }
    }

    pub fn separator(&self, node: NodeId, index: usize) -> Result<NodeId> {
        let separators = self.separators(node)?;
        separators
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                node,
                index,
                len: separators.len(),
            })
    }

    /// Item definition, separator definition and bounds of a loop node.
    fn loop_rule(&self, node: NodeId) -> Result<LoopRule> {
        let def = self.data(node)?.def;
        match self.grammar.shape(def) {
            Rule::Loop { item, repetition } => Ok(LoopRule {
                item: *item,
                separator: None,
                repetition: *repetition,
            }),
            Rule::Separated {
                item,
                separator,
                default_separator,
                repetition,
            } => Ok(LoopRule {
                item: *item,
                separator: Some((*separator, default_separator.clone())),
                repetition: *repetition,
            }),
            _ => Err(self.mismatch(node, NodeShape::Loop)),
        }
    }
}

struct LoopRule {
    item: DefId,
    /// Separator definition and its explicit default text.
    separator: Option<(DefId, Option<String>)>,
    repetition: Repetition,
}

fn interleave(items: &[NodeId], separators: &[NodeId]) -> Vec<NodeId> {
    let mut out = Vec::with_capacity(items.len() + separators.len());
    for (i, item) in items.iter().enumerate() {
        out.push(*item);
        if let Some(separator) = separators.get(i) {
            out.push(*separator);
        }
    }
    out
}
