//! Identity-only working forest.
//!
//! The reconciler mirrors every primitive it issues into one of these, so
//! it can compute current-state indices without querying the view. The
//! recording test double reuses it as its model.

use frond_snapshot::FlatEntry;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub(crate) struct ShadowForest<Id> {
    roots: Vec<Id>,
    children: HashMap<Id, Vec<Id>>,
    parents: HashMap<Id, Id>,
}

impl<Id: Clone + Eq + Hash> Default for ShadowForest<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Clone + Eq + Hash> ShadowForest<Id> {
    pub(crate) fn new() -> Self {
        Self {
            roots: Vec::new(),
            children: HashMap::new(),
            parents: HashMap::new(),
        }
    }

    /// Rebuild from a flattened forest. Entries must be in pre-order, so
    /// every parent is seen before its children.
    pub(crate) fn from_entries(entries: &[FlatEntry<Id>]) -> Self {
        let mut forest = Self::new();
        for entry in entries {
            let index = forest.child_count(entry.parent.as_ref());
            forest.insert(entry.id.clone(), entry.parent.as_ref(), index);
        }
        forest
    }

    pub(crate) fn contains(&self, id: &Id) -> bool {
        self.parents.contains_key(id) || self.roots.contains(id)
    }

    pub(crate) fn child_count(&self, parent: Option<&Id>) -> usize {
        self.child_ids(parent).len()
    }

    pub(crate) fn child_ids(&self, parent: Option<&Id>) -> &[Id] {
        match parent {
            None => &self.roots,
            Some(p) => self.children.get(p).map_or(&[], Vec::as_slice),
        }
    }

    /// Current `(parent, sibling index)` of a node.
    pub(crate) fn position(&self, id: &Id) -> Option<(Option<Id>, usize)> {
        if !self.contains(id) {
            return None;
        }
        let parent = self.parents.get(id).cloned();
        let index = self
            .child_ids(parent.as_ref())
            .iter()
            .position(|s| s == id)?;
        Some((parent, index))
    }

    pub(crate) fn insert(&mut self, id: Id, parent: Option<&Id>, index: usize) {
        match parent {
            None => self.roots.insert(index, id),
            Some(p) => {
                self.children
                    .entry(p.clone())
                    .or_default()
                    .insert(index, id.clone());
                self.parents.insert(id, p.clone());
            }
        }
    }

    /// Unlink a node from its sibling list, keeping its subtree attached.
    pub(crate) fn detach(&mut self, id: &Id) {
        let parent = self.parents.remove(id);
        let list = match parent.as_ref() {
            None => &mut self.roots,
            Some(p) => match self.children.get_mut(p) {
                Some(list) => list,
                None => return,
            },
        };
        if let Some(pos) = list.iter().position(|s| s == id) {
            list.remove(pos);
        }
    }

    /// Unlink a node and drop its entire subtree.
    pub(crate) fn remove_subtree(&mut self, id: &Id) {
        self.detach(id);
        let mut stack = vec![id.clone()];
        while let Some(cur) = stack.pop() {
            if let Some(kids) = self.children.remove(&cur) {
                for kid in kids {
                    self.parents.remove(&kid);
                    stack.push(kid);
                }
            }
        }
    }

    /// Pre-order traversal of the whole forest.
    pub(crate) fn preorder(&self) -> Vec<Id> {
        let mut out = Vec::new();
        let mut stack: Vec<&Id> = self.roots.iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id.clone());
            if let Some(kids) = self.children.get(id) {
                for kid in kids.iter().rev() {
                    stack.push(kid);
                }
            }
        }
        out
    }
}
