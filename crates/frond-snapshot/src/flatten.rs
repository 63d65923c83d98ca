//! Deterministic pre-order linearization of a snapshot.
//!
//! Diffing two forests with a 1-D sequence algorithm only works if both
//! sides linearize the same way. The contract here is strict: root items in
//! order, then each item's children in order, recursively. Two snapshots
//! holding the same forest always flatten to the same sequence.

use crate::identity::TreeItem;
use crate::snapshot::Snapshot;

/// One position in a flattened forest.
///
/// `path` holds the sibling index at every level from the root down to this
/// entry, so entries order lexicographically in pre-order and the last
/// component is the entry's index among its siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry<Id> {
    /// The item's identity.
    pub id: Id,
    /// Identity of the immediate parent; `None` for roots.
    pub parent: Option<Id>,
    /// Sibling indices from the root level down to this entry. Never empty.
    pub path: Vec<usize>,
}

impl<Id> FlatEntry<Id> {
    /// The entry's position among its siblings.
    #[must_use]
    pub fn index(&self) -> usize {
        *self.path.last().unwrap_or(&0)
    }

    /// Nesting depth; roots are at depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

impl<T: TreeItem> Snapshot<T> {
    /// Flatten the forest into its deterministic pre-order sequence.
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatEntry<T::Id>> {
        let mut out = Vec::with_capacity(self.len());
        let mut path = Vec::new();
        for (i, id) in self.roots.iter().enumerate() {
            path.push(i);
            self.flatten_into(id, None, &mut path, &mut out);
            path.pop();
        }
        out
    }

    fn flatten_into(
        &self,
        id: &T::Id,
        parent: Option<&T::Id>,
        path: &mut Vec<usize>,
        out: &mut Vec<FlatEntry<T::Id>>,
    ) {
        out.push(FlatEntry {
            id: id.clone(),
            parent: parent.cloned(),
            path: path.clone(),
        });
        if let Some(kids) = self.children.get(id) {
            for (i, kid) in kids.iter().enumerate() {
                path.push(i);
                self.flatten_into(kid, Some(id), path, out);
                path.pop();
            }
        }
    }
}
