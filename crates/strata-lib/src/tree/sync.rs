//! Content synchronization and listeners.
//!
//! `set_content` resolves the whole split first and only then touches the
//! tree, so a rejected text leaves every node as it was. Assignment runs
//! top-down over the split and stores content bottom-up: each node that
//! receives content notifies its own listeners once, children before parents.
//! Afterwards the change travels up from the target node along active parent
//! links, recomposing and notifying each ancestor once.
//!
//! Nodes reset to unset (a Choice alternative that lost, an Option child that
//! became absent) are never notified. Replaced and removed loop elements are
//! released outright.

use std::rc::Rc;

use crate::grammar::{DefId, Rule};
use crate::search::{self, Split, SplitShape};
use crate::trace::{NoopTracer, Tracer};
use crate::{Error, Result};

use super::{ContentChange, ListenerId, LoopRule, NodeId, NodeKind, Tree};

impl Tree {
    /// Parse `text` as the node's definition and rebuild its structure.
    pub fn set_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.set_content_traced(node, text, &mut NoopTracer)
    }

    pub fn set_content_traced<T: Tracer>(
        &mut self,
        node: NodeId,
        text: &str,
        tracer: &mut T,
    ) -> Result<()> {
        let def = self.data(node)?.def;
        let grammar = Rc::clone(&self.grammar);
        let split = search::resolve(&grammar, def, text, tracer)?;
        self.assign(node, &split, text, tracer);
        self.propagate(node, tracer);
        Ok(())
    }

    pub fn add_listener(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&ContentChange) + 'static,
    ) -> Result<ListenerId> {
        let id = ListenerId(self.next_listener);
        self.data_mut(node)?.listeners.push((id, Box::new(listener)));
        self.next_listener += 1;
        Ok(id)
    }

    /// Returns whether the listener was registered on `node`.
    pub fn remove_listener(&mut self, node: NodeId, listener: ListenerId) -> Result<bool> {
        let listeners = &mut self.data_mut(node)?.listeners;
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != listener);
        Ok(listeners.len() != before)
    }

    /// Parse `text` as a new item and splice it in at `index`.
    ///
    /// In a separated loop that already has items, a separator is created
    /// from the loop's default separator text (or the separator definition's
    /// default content) between the new item and its neighbour.
    pub fn insert(&mut self, node: NodeId, index: usize, text: &str) -> Result<NodeId> {
        let LoopRule {
            item,
            separator,
            repetition,
        } = self.loop_rule(node)?;
        let len = self.items(node)?.len();
        if index > len {
            return Err(Error::IndexOutOfBounds { node, index, len });
        }
        if !repetition.admits(len + 1) {
            return Err(Error::CountOutOfBounds {
                node,
                count: len + 1,
                min: repetition.min,
                max: repetition.max,
            });
        }

        let tracer = &mut NoopTracer;
        let grammar = Rc::clone(&self.grammar);
        let item_split = search::resolve(&grammar, item, text, tracer)?;
        let separator = match separator {
            Some((def, explicit)) if len > 0 => {
                let sep_text = explicit
                    .or_else(|| grammar.default_content(def).map(str::to_string))
                    .ok_or(Error::MissingSeparator(node))?;
                let split = search::resolve(&grammar, def, &sep_text, tracer)?;
                Some((def, sep_text, split))
            }
            _ => None,
        };

        let created = self.spawn(item, node, &item_split, text, tracer);
        let separator = separator.map(|(def, sep_text, split)| {
            self.spawn(def, node, &split, &sep_text, tracer)
        });
        match &mut self.nodes[node.index()].kind {
            NodeKind::Loop { items } => items.insert(index, created),
            NodeKind::Separated { items, separators } => {
                items.insert(index, created);
                if let Some(separator) = separator {
                    // Goes after the new item, or before it when appended.
                    separators.insert(index.min(separators.len()), separator);
                }
            }
            _ => {}
        }

        self.recompose(node, tracer);
        self.propagate(node, tracer);
        Ok(created)
    }

    /// Append a new item.
    pub fn push(&mut self, node: NodeId, text: &str) -> Result<NodeId> {
        let len = self.items(node)?.len();
        self.insert(node, len, text)
    }

    /// Release item `index`, with the separator following it (or preceding
    /// it, for the last item). Handles to the released nodes go stale.
    pub fn remove(&mut self, node: NodeId, index: usize) -> Result<()> {
        let LoopRule { repetition, .. } = self.loop_rule(node)?;
        let len = self.items(node)?.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { node, index, len });
        }
        if !repetition.admits(len - 1) {
            return Err(Error::CountOutOfBounds {
                node,
                count: len - 1,
                min: repetition.min,
                max: repetition.max,
            });
        }

        let removed = match &mut self.nodes[node.index()].kind {
            NodeKind::Loop { items } => vec![items.remove(index)],
            NodeKind::Separated { items, separators } => {
                let mut removed = vec![items.remove(index)];
                if !separators.is_empty() {
                    let at = index.min(separators.len() - 1);
                    removed.push(separators.remove(at));
                }
                removed
            }
            _ => Vec::new(),
        };
        self.release(&removed);

        let tracer = &mut NoopTracer;
        self.recompose(node, tracer);
        self.propagate(node, tracer);
        Ok(())
    }

    /// Store a resolved split into `node` and its descendants.
    pub(super) fn assign<T: Tracer>(&mut self, node: NodeId, split: &Split, text: &str, tracer: &mut T) {
        let grammar = Rc::clone(&self.grammar);
        let def = self.nodes[node.index()].def;
        let kind = self.nodes[node.index()].kind.clone();

        match (&split.shape, grammar.shape(def), kind) {
            (SplitShape::Leaf, _, _) => {}
            (SplitShape::Sequence(parts), _, NodeKind::Sequence { children }) => {
                for (child, part) in children.into_iter().zip(parts) {
                    self.assign(child, part, text, tracer);
                }
            }
            (
                SplitShape::Choice { index, inner },
                Rule::Choice(defs),
                NodeKind::Choice {
                    mut alternatives,
                    current,
                },
            ) => {
                if let Some(previous) = current
                    && previous != *index
                    && let Some(loser) = alternatives[previous]
                {
                    self.reset(loser);
                }
                let child = match alternatives[*index] {
                    Some(existing) => existing,
                    None => self.alloc(defs[*index], Some(node), false),
                };
                alternatives[*index] = Some(child);
                self.nodes[node.index()].kind = NodeKind::Choice {
                    alternatives,
                    current: Some(*index),
                };
                self.assign(child, inner, text, tracer);
            }
            (SplitShape::Optional(inner), Rule::Optional { item, .. }, NodeKind::Optional { child, .. }) => {
                match inner {
                    None => {
                        if let Some(child) = child {
                            self.reset(child);
                        }
                        self.nodes[node.index()].kind = NodeKind::Optional {
                            child,
                            present: false,
                        };
                    }
                    Some(inner) => {
                        let child = match child {
                            Some(existing) => existing,
                            None => self.alloc(*item, Some(node), false),
                        };
                        self.nodes[node.index()].kind = NodeKind::Optional {
                            child: Some(child),
                            present: true,
                        };
                        self.assign(child, inner, text, tracer);
                    }
                }
            }
            (SplitShape::Loop(parts), Rule::Loop { item, .. }, NodeKind::Loop { items: old }) => {
                self.release(&old);
                let items = parts
                    .iter()
                    .map(|part| self.spawn(*item, node, part, text, tracer))
                    .collect();
                self.nodes[node.index()].kind = NodeKind::Loop { items };
            }
            (
                SplitShape::Separated { items, separators },
                Rule::Separated {
                    item, separator, ..
                },
                NodeKind::Separated {
                    items: old_items,
                    separators: old_separators,
                },
            ) => {
                self.release(&old_items);
                self.release(&old_separators);
                let items = items
                    .iter()
                    .map(|part| self.spawn(*item, node, part, text, tracer))
                    .collect();
                let separators = separators
                    .iter()
                    .map(|part| self.spawn(*separator, node, part, text, tracer))
                    .collect();
                self.nodes[node.index()].kind = NodeKind::Separated { items, separators };
            }
            _ => unreachable!("split shape follows the definition shape"),
        }

        self.store(node, text[split.start..split.end].to_string(), tracer);
    }

    fn spawn<T: Tracer>(
        &mut self,
        def: DefId,
        parent: NodeId,
        split: &Split,
        text: &str,
        tracer: &mut T,
    ) -> NodeId {
        let id = self.alloc(def, Some(parent), false);
        self.assign(id, split, text, tracer);
        id
    }

    /// Clear a subtree without notifying anyone. Loop elements inside it are
    /// released; everything else keeps its slot for reuse.
    fn reset(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let data = &mut self.nodes[id.index()];
            data.content = None;
            let released = match &mut data.kind {
                NodeKind::Leaf => Vec::new(),
                NodeKind::Sequence { children } => {
                    stack.extend(children.iter().copied());
                    Vec::new()
                }
                NodeKind::Choice {
                    alternatives,
                    current,
                } => {
                    stack.extend(current.take().and_then(|i| alternatives[i]));
                    Vec::new()
                }
                NodeKind::Optional { child, present } => {
                    *present = false;
                    stack.extend(*child);
                    Vec::new()
                }
                NodeKind::Loop { items } => std::mem::take(items),
                NodeKind::Separated { items, separators } => {
                    let mut released = std::mem::take(items);
                    released.append(separators);
                    released
                }
            };
            self.release(&released);
        }
    }

    /// Set `node` to the concatenation of its active children and notify.
    fn recompose<T: Tracer>(&mut self, node: NodeId, tracer: &mut T) {
        let content: String = self
            .children(node)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|child| self.nodes[child.index()].content.as_deref())
            .collect();
        self.store(node, content, tracer);
    }

    /// Carry a change from `node` up through its set, active ancestors.
    fn propagate<T: Tracer>(&mut self, node: NodeId, tracer: &mut T) {
        let mut current = node;
        while let Some(parent) = self.active_parent(current) {
            if self.nodes[parent.index()].content.is_none() {
                break;
            }
            self.recompose(parent, tracer);
            current = parent;
        }
    }

    fn store<T: Tracer>(&mut self, node: NodeId, content: String, tracer: &mut T) {
        tracer.trace_notify(node, &content);
        let data = &mut self.nodes[node.index()];
        let old = data.content.replace(content.clone());
        if data.listeners.is_empty() {
            return;
        }
        let change = ContentChange {
            node,
            old,
            new: content,
        };
        for (_, listener) in &mut data.listeners {
            listener(&change);
        }
    }
}
