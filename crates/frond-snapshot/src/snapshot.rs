//! The immutable forest value and its copy-on-write mutators.

use crate::identity::TreeItem;
use std::collections::HashMap;
use std::fmt;

/// Position selector for insert and move operations, relative to an
/// existing sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor<'a, Id> {
    /// Place immediately before this sibling.
    Before(&'a Id),
    /// Place immediately after this sibling.
    After(&'a Id),
}

impl<'a, Id> Anchor<'a, Id> {
    /// The sibling identity this anchor refers to.
    pub fn id(&self) -> &'a Id {
        match self {
            Self::Before(id) | Self::After(id) => id,
        }
    }
}

/// Error returned by snapshot mutators.
///
/// Structural problems are reported, never repaired: a mutator either
/// produces a snapshot that upholds every forest invariant or it fails
/// without producing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The parent given to `append` or `move_into` is not in the forest.
    UnknownParent { id: String },
    /// The anchor sibling is not in the forest (or was part of the batch
    /// being inserted, leaving it with no position to anchor against).
    UnknownAnchor { id: String },
    /// A mutator referenced an item that is not in the forest.
    UnknownIdentity { id: String },
    /// The same identity appeared twice in one batch of items.
    DuplicateIdentity { id: String },
    /// The operation would make an item an ancestor of itself.
    WouldCycle { id: String },
    /// An explicit index was past the end of the target sibling list.
    IndexOutOfBounds { index: usize, len: usize },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownParent { id } => write!(f, "unknown parent {id}"),
            Self::UnknownAnchor { id } => write!(f, "unknown anchor {id}"),
            Self::UnknownIdentity { id } => write!(f, "unknown item {id}"),
            Self::DuplicateIdentity { id } => {
                write!(f, "identity {id} appears more than once in batch")
            }
            Self::WouldCycle { id } => {
                write!(f, "operation would make {id} an ancestor of itself")
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for sibling list of length {len}")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

fn render_id<I: fmt::Debug>(id: &I) -> String {
    format!("{id:?}")
}

/// An immutable ordered forest of identity-bearing items.
///
/// Sibling order is significant and preserved verbatim by every mutator.
/// Each identity appears in exactly one place: inserting or moving an item
/// that already exists elsewhere relocates it (together with its subtree)
/// instead of duplicating it.
///
/// All mutators take `&self` and return a new snapshot; the receiver is
/// never modified.
#[derive(Clone)]
pub struct Snapshot<T: TreeItem> {
    pub(crate) roots: Vec<T::Id>,
    pub(crate) children: HashMap<T::Id, Vec<T::Id>>,
    pub(crate) items: HashMap<T::Id, T>,
    pub(crate) parents: HashMap<T::Id, T::Id>,
}

impl<T: TreeItem> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TreeItem> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("len", &self.items.len())
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl<T: TreeItem> PartialEq for Snapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.roots == other.roots
            && self.children == other.children
            && self.items == other.items
    }
}

impl<T: TreeItem> Snapshot<T> {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            children: HashMap::new(),
            items: HashMap::new(),
            parents: HashMap::new(),
        }
    }

    // --- Queries -----------------------------------------------------------

    /// Total number of items in the forest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the forest holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the forest contains this identity.
    #[must_use]
    pub fn contains(&self, id: &T::Id) -> bool {
        self.items.contains_key(id)
    }

    /// Number of children of `parent`, or of the root level when `None`.
    ///
    /// An identity absent from the forest has zero children.
    #[must_use]
    pub fn child_count(&self, parent: Option<&T::Id>) -> usize {
        self.child_ids(parent).len()
    }

    /// Ordered child identities of `parent`, or the root identities when
    /// `None`. Empty for leaves and for identities not in the forest.
    #[must_use]
    pub fn child_ids(&self, parent: Option<&T::Id>) -> &[T::Id] {
        match parent {
            None => &self.roots,
            Some(id) => self.children.get(id).map_or(&[], Vec::as_slice),
        }
    }

    /// Ordered children of `parent` materialized as items.
    pub fn children_of<'a>(
        &'a self,
        parent: Option<&T::Id>,
    ) -> impl Iterator<Item = &'a T> {
        self.child_ids(parent).iter().filter_map(|id| self.items.get(id))
    }

    /// The item stored under this identity, if any.
    #[must_use]
    pub fn item(&self, id: &T::Id) -> Option<&T> {
        self.items.get(id)
    }

    /// The identity of this item's parent, or `None` for roots and for
    /// identities not in the forest.
    #[must_use]
    pub fn parent_of(&self, id: &T::Id) -> Option<&T::Id> {
        self.parents.get(id)
    }

    /// The item's position among its siblings.
    #[must_use]
    pub fn index_of(&self, id: &T::Id) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        let siblings = self.child_ids(self.parents.get(id));
        siblings.iter().position(|s| s == id)
    }

    /// All identities in the forest, in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = &T::Id> {
        self.items.keys()
    }

    /// The subtree rooted at `id` in pre-order, including `id` itself.
    /// Empty if the identity is not in the forest.
    #[must_use]
    pub fn descendants(&self, id: &T::Id) -> Vec<T::Id> {
        let mut out = Vec::new();
        if self.contains(id) {
            self.collect_subtree(id, &mut out);
        }
        out
    }

    fn collect_subtree(&self, id: &T::Id, out: &mut Vec<T::Id>) {
        out.push(id.clone());
        if let Some(kids) = self.children.get(id) {
            for kid in kids {
                self.collect_subtree(kid, out);
            }
        }
    }

    /// Whether `anc` is `id` itself or an ancestor of `id`.
    fn is_self_or_ancestor(&self, anc: &T::Id, id: &T::Id) -> bool {
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            if cur == anc {
                return true;
            }
            cursor = self.parents.get(cur);
        }
        false
    }

    // --- Mutators ----------------------------------------------------------

    /// Append items at the end of `parent`'s child list (the root level when
    /// `None`). Items already in the forest are relocated with their
    /// subtrees; their stored values are replaced by the batch values.
    pub fn append(
        &self,
        items: Vec<T>,
        parent: Option<&T::Id>,
    ) -> Result<Self, SnapshotError> {
        let ids = batch_ids(&items)?;
        if let Some(p) = parent {
            if !self.contains(p) {
                return Err(SnapshotError::UnknownParent { id: render_id(p) });
            }
            // Relocating an item under its own descendant would close a cycle.
            for id in &ids {
                if self.contains(id) && self.is_self_or_ancestor(id, p) {
                    return Err(SnapshotError::WouldCycle { id: render_id(id) });
                }
            }
        }

        let mut next = self.clone();
        for (item, id) in items.into_iter().zip(&ids) {
            next.detach_if_present(id);
            next.attach_at_end(item, parent);
        }
        Ok(next)
    }

    /// Insert items immediately before or after an anchor sibling. Items
    /// already in the forest are relocated with their subtrees.
    pub fn insert(
        &self,
        items: Vec<T>,
        anchor: Anchor<'_, T::Id>,
    ) -> Result<Self, SnapshotError> {
        let ids = batch_ids(&items)?;
        let anchor_id = anchor.id();
        if !self.contains(anchor_id) {
            return Err(SnapshotError::UnknownAnchor { id: render_id(anchor_id) });
        }
        // The anchor must survive the batch detach with a position intact:
        // it may not be one of the inserted items nor live inside one of
        // their subtrees.
        for id in &ids {
            if self.contains(id) && self.is_self_or_ancestor(id, anchor_id) {
                return Err(if id == anchor_id {
                    SnapshotError::UnknownAnchor { id: render_id(id) }
                } else {
                    SnapshotError::WouldCycle { id: render_id(id) }
                });
            }
        }

        let mut next = self.clone();
        for id in &ids {
            next.detach_if_present(id);
        }
        let parent = next.parents.get(anchor_id).cloned();
        let anchor_index = next
            .sibling_position(parent.as_ref(), anchor_id)
            .ok_or_else(|| SnapshotError::UnknownAnchor { id: render_id(anchor_id) })?;
        let mut at = match anchor {
            Anchor::Before(_) => anchor_index,
            Anchor::After(_) => anchor_index + 1,
        };
        for item in items {
            next.attach_at(item, parent.as_ref(), at);
            at += 1;
        }
        Ok(next)
    }

    /// Delete items and their entire subtrees. Every listed identity must
    /// be in the forest; listing an item together with one of its ancestors
    /// is allowed (the ancestor's removal covers it).
    pub fn delete(&self, ids: &[T::Id]) -> Result<Self, SnapshotError> {
        for id in ids {
            if !self.contains(id) {
                return Err(SnapshotError::UnknownIdentity { id: render_id(id) });
            }
        }
        let mut next = self.clone();
        for id in ids {
            if next.contains(id) {
                next.detach_if_present(id);
                next.drop_subtree(id);
            }
        }
        Ok(next)
    }

    /// Move an existing item (with its subtree) next to an anchor sibling.
    pub fn move_to(
        &self,
        id: &T::Id,
        anchor: Anchor<'_, T::Id>,
    ) -> Result<Self, SnapshotError> {
        let item = self
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| SnapshotError::UnknownIdentity { id: render_id(id) })?;
        self.insert(vec![item], anchor)
    }

    /// Move an existing item (with its subtree) to an explicit position:
    /// child `index` of `parent`, or of the root level when `None`.
    ///
    /// `index` is evaluated after the item is detached from its old
    /// position, so moving within the same sibling list behaves like
    /// remove-then-insert.
    pub fn move_into(
        &self,
        id: &T::Id,
        parent: Option<&T::Id>,
        index: usize,
    ) -> Result<Self, SnapshotError> {
        let item = self
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| SnapshotError::UnknownIdentity { id: render_id(id) })?;
        if let Some(p) = parent {
            if !self.contains(p) {
                return Err(SnapshotError::UnknownParent { id: render_id(p) });
            }
            if self.is_self_or_ancestor(id, p) {
                return Err(SnapshotError::WouldCycle { id: render_id(id) });
            }
        }

        let mut next = self.clone();
        next.detach_if_present(id);
        let len = next.child_ids(parent).len();
        if index > len {
            return Err(SnapshotError::IndexOutOfBounds { index, len });
        }
        next.attach_at(item, parent, index);
        Ok(next)
    }

    // --- Internal forest surgery -------------------------------------------
    //
    // These run on the private clone inside a mutator. A detached item keeps
    // its subtree (children/parents of descendants stay intact); only the
    // link from its old sibling list is cut.

    fn sibling_position(&self, parent: Option<&T::Id>, id: &T::Id) -> Option<usize> {
        self.child_ids(parent).iter().position(|s| s == id)
    }

    fn sibling_list_mut(&mut self, parent: Option<&T::Id>) -> &mut Vec<T::Id> {
        match parent {
            None => &mut self.roots,
            Some(p) => self.children.entry(p.clone()).or_default(),
        }
    }

    fn detach_if_present(&mut self, id: &T::Id) {
        if !self.contains(id) {
            return;
        }
        let parent = self.parents.remove(id);
        let list = self.sibling_list_mut(parent.as_ref());
        if let Some(pos) = list.iter().position(|s| s == id) {
            list.remove(pos);
        }
    }

    fn attach_at_end(&mut self, item: T, parent: Option<&T::Id>) {
        let at = self.child_ids(parent).len();
        self.attach_at(item, parent, at);
    }

    fn attach_at(&mut self, item: T, parent: Option<&T::Id>, index: usize) {
        let id = item.id();
        self.sibling_list_mut(parent).insert(index, id.clone());
        if let Some(p) = parent {
            self.parents.insert(id.clone(), p.clone());
        }
        self.items.insert(id, item);
    }

    /// Remove a detached subtree's storage (items, child lists, parent
    /// links of descendants).
    fn drop_subtree(&mut self, id: &T::Id) {
        let mut stack = vec![id.clone()];
        while let Some(cur) = stack.pop() {
            if let Some(kids) = self.children.remove(&cur) {
                for kid in kids {
                    stack.push(kid);
                }
            }
            self.items.remove(&cur);
            self.parents.remove(&cur);
        }
    }
}

/// Collect and validate the identity of every item in a mutation batch.
fn batch_ids<T: TreeItem>(items: &[T]) -> Result<Vec<T::Id>, SnapshotError> {
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = item.id();
        if ids.contains(&id) {
            return Err(SnapshotError::DuplicateIdentity { id: render_id(&id) });
        }
        ids.push(id);
    }
    Ok(ids)
}
