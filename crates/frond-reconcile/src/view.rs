//! The boundary to the host tree view.

/// A live tree-shaped view that can be mutated incrementally.
///
/// Implementations adapt whatever widget actually renders the forest. The
/// reconciler only calls the mutation primitives between a
/// [`begin_updates`](TreeView::begin_updates)/[`end_updates`](TreeView::end_updates)
/// pair; the queries exist for the presentation layer and for test doubles.
///
/// # Index semantics
///
/// Every index is relative to the view's state at the moment the call is
/// made, not to a deferred batch:
///
/// - `insert_item(parent, index, id)` inserts a single childless node so
///   that it ends up at `index` among `parent`'s current children.
/// - `remove_item(parent, index)` removes the node at `index` together
///   with its entire subtree.
/// - `move_item(..)` detaches the node (keeping its subtree attached to
///   it), then inserts it at `to_index` evaluated against the
///   post-detach state.
pub trait TreeView<Id> {
    /// Number of children of `parent`, or of the root level when `None`.
    fn child_count(&self, parent: Option<&Id>) -> usize;

    /// Identity of the child at `index` under `parent`.
    fn child_at(&self, parent: Option<&Id>, index: usize) -> Option<Id>;

    /// Whether the node can be expanded (i.e. has children).
    fn is_expandable(&self, id: &Id) -> bool;

    /// Open an atomic update transaction. When `animated`, the host groups
    /// all operations until [`end_updates`](TreeView::end_updates) into a
    /// single animation pass.
    fn begin_updates(&mut self, animated: bool);

    /// Close the transaction opened by [`begin_updates`](TreeView::begin_updates).
    fn end_updates(&mut self);

    /// Insert `id` at `index` under `parent`.
    fn insert_item(&mut self, parent: Option<&Id>, index: usize, id: &Id);

    /// Remove the node at `index` under `parent`, subtree included.
    fn remove_item(&mut self, parent: Option<&Id>, index: usize);

    /// Relocate a node (with its subtree) between two positions.
    fn move_item(
        &mut self,
        from_parent: Option<&Id>,
        from_index: usize,
        to_parent: Option<&Id>,
        to_index: usize,
    );

    /// Discard incremental state and re-query everything from the data
    /// source. Used instead of scripting when animation is off and the
    /// script is large.
    fn reload_all(&mut self);
}
