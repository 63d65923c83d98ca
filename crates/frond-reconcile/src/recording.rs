//! A strict in-memory tree view for tests.
//!
//! [`RecordingView`] maintains its own model forest and panics the moment a
//! primitive arrives with an index that is invalid for its current state or
//! outside an update transaction. Tests assert against the recorded
//! operation log and the final forest shape.

use crate::forest::ShadowForest;
use crate::view::TreeView;
use frond_snapshot::FlatEntry;
use std::fmt;
use std::hash::Hash;

/// One recorded view primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOp<Id> {
    /// `begin_updates`.
    Begin { animated: bool },
    /// `end_updates`.
    End,
    /// `insert_item`.
    Insert {
        parent: Option<Id>,
        index: usize,
        id: Id,
    },
    /// `remove_item`, with the identity that sat at the removed position.
    Remove {
        parent: Option<Id>,
        index: usize,
        id: Id,
    },
    /// `move_item`, with the identity that was relocated.
    Move {
        from_parent: Option<Id>,
        from_index: usize,
        to_parent: Option<Id>,
        to_index: usize,
        id: Id,
    },
    /// `reload_all`.
    Reload,
}

/// Tree-view double that records operations and validates index semantics.
#[derive(Debug, Clone)]
pub struct RecordingView<Id> {
    forest: ShadowForest<Id>,
    ops: Vec<ViewOp<Id>>,
    depth: usize,
}

impl<Id: Clone + Eq + Hash + fmt::Debug> Default for RecordingView<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Clone + Eq + Hash + fmt::Debug> RecordingView<Id> {
    /// An empty view.
    #[must_use]
    pub fn new() -> Self {
        Self {
            forest: ShadowForest::new(),
            ops: Vec::new(),
            depth: 0,
        }
    }

    /// A view pre-populated with a flattened forest, with nothing recorded.
    #[must_use]
    pub fn primed(entries: &[FlatEntry<Id>]) -> Self {
        Self {
            forest: ShadowForest::from_entries(entries),
            ops: Vec::new(),
            depth: 0,
        }
    }

    /// Every operation received, in order.
    #[must_use]
    pub fn ops(&self) -> &[ViewOp<Id>] {
        &self.ops
    }

    /// Number of mutation primitives received (brackets and reloads
    /// excluded).
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    ViewOp::Insert { .. } | ViewOp::Remove { .. } | ViewOp::Move { .. }
                )
            })
            .count()
    }

    /// The forest as a fully expanded pre-order row list.
    #[must_use]
    pub fn expanded_order(&self) -> Vec<Id> {
        self.forest.preorder()
    }

    /// Current `(parent, sibling index)` of an item.
    #[must_use]
    pub fn position_of(&self, id: &Id) -> Option<(Option<Id>, usize)> {
        self.forest.position(id)
    }

    fn assert_in_transaction(&self, what: &str) {
        assert!(self.depth > 0, "{what} outside an update transaction");
    }

    fn resolve(&self, parent: Option<&Id>, index: usize, what: &str) -> Id {
        let kids = self.forest.child_ids(parent);
        assert!(
            index < kids.len(),
            "{what}: index {index} out of bounds for {:?} (len {})",
            parent,
            kids.len()
        );
        kids[index].clone()
    }
}

impl<Id: Clone + Eq + Hash + fmt::Debug> TreeView<Id> for RecordingView<Id> {
    fn child_count(&self, parent: Option<&Id>) -> usize {
        self.forest.child_count(parent)
    }

    fn child_at(&self, parent: Option<&Id>, index: usize) -> Option<Id> {
        self.forest.child_ids(parent).get(index).cloned()
    }

    fn is_expandable(&self, id: &Id) -> bool {
        self.forest.child_count(Some(id)) > 0
    }

    fn begin_updates(&mut self, animated: bool) {
        self.depth += 1;
        self.ops.push(ViewOp::Begin { animated });
    }

    fn end_updates(&mut self) {
        assert!(self.depth > 0, "end_updates without begin_updates");
        self.depth -= 1;
        self.ops.push(ViewOp::End);
    }

    fn insert_item(&mut self, parent: Option<&Id>, index: usize, id: &Id) {
        self.assert_in_transaction("insert_item");
        let len = self.forest.child_count(parent);
        assert!(
            index <= len,
            "insert_item: index {index} out of bounds for {parent:?} (len {len})"
        );
        assert!(
            !self.forest.contains(id),
            "insert_item: {id:?} is already in the view"
        );
        self.forest.insert(id.clone(), parent, index);
        self.ops.push(ViewOp::Insert {
            parent: parent.cloned(),
            index,
            id: id.clone(),
        });
    }

    fn remove_item(&mut self, parent: Option<&Id>, index: usize) {
        self.assert_in_transaction("remove_item");
        let id = self.resolve(parent, index, "remove_item");
        self.forest.remove_subtree(&id);
        self.ops.push(ViewOp::Remove {
            parent: parent.cloned(),
            index,
            id,
        });
    }

    fn move_item(
        &mut self,
        from_parent: Option<&Id>,
        from_index: usize,
        to_parent: Option<&Id>,
        to_index: usize,
    ) {
        self.assert_in_transaction("move_item");
        let id = self.resolve(from_parent, from_index, "move_item");
        self.forest.detach(&id);
        let len = self.forest.child_count(to_parent);
        assert!(
            to_index <= len,
            "move_item: target index {to_index} out of bounds for {to_parent:?} (len {len})"
        );
        self.forest.insert(id.clone(), to_parent, to_index);
        self.ops.push(ViewOp::Move {
            from_parent: from_parent.cloned(),
            from_index,
            to_parent: to_parent.cloned(),
            to_index,
            id,
        });
    }

    fn reload_all(&mut self) {
        self.assert_in_transaction("reload_all");
        self.ops.push(ViewOp::Reload);
    }
}
