//! Drag-and-drop requests over a snapshot.
//!
//! A drop is described as data ([`DropRequest`]), validated structurally
//! against the snapshot it would apply to, optionally retargeted by a
//! [`DropDelegate`], and finally resolved into a new snapshot with
//! [`apply_drop`]. The reconciliation path is unchanged: the resolved
//! snapshot goes through the normal diff-and-replay apply.

use bitflags::bitflags;
use frond_snapshot::{Anchor, Snapshot, SnapshotError, TreeItem};

bitflags! {
    /// Operations a drop source offers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DropOperations: u8 {
        const MOVE = 1;
        const COPY = 1 << 1;
        const DELETE = 1 << 2;
    }
}

/// Where the drop lands relative to its target item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    /// Onto the target: dragged items become its last children.
    On,
    /// Into the target's sibling list, just before it.
    Before,
    /// Into the target's sibling list, just after it.
    After,
}

/// A proposed drop of `dragged` items relative to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRequest<Id> {
    pub kind: DropKind,
    pub target: Id,
    pub dragged: Vec<Id>,
    pub operations: DropOperations,
}

/// A delegate's answer to a proposed drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retarget<Id> {
    /// Proceed, possibly with an adjusted request.
    Accept(DropRequest<Id>),
    /// Refuse the drop outright.
    Reject,
}

/// Hook for policy on top of the structural checks.
///
/// The default implementation accepts any structurally valid request
/// unchanged; override [`validate_drop`](DropDelegate::validate_drop) to
/// retarget or reject.
pub trait DropDelegate<T: TreeItem> {
    /// Decide whether (and where) a structurally valid drop may land.
    fn validate_drop(
        &self,
        _snapshot: &Snapshot<T>,
        request: DropRequest<T::Id>,
    ) -> Retarget<T::Id> {
        Retarget::Accept(request)
    }

    /// Resolve an accepted drop into the next snapshot.
    fn accept_drop(
        &self,
        snapshot: &Snapshot<T>,
        request: &DropRequest<T::Id>,
    ) -> Result<Snapshot<T>, SnapshotError> {
        apply_drop(snapshot, request)
    }
}

/// Reject requests no delegate could sensibly accept: empty payloads,
/// identities the snapshot does not hold, or a target inside a dragged
/// subtree.
pub fn validate_structurally<T: TreeItem>(
    snapshot: &Snapshot<T>,
    request: &DropRequest<T::Id>,
) -> bool {
    if request.dragged.is_empty() || request.operations.is_empty() {
        return false;
    }
    if !snapshot.contains(&request.target) {
        return false;
    }
    for id in &request.dragged {
        if !snapshot.contains(id) {
            return false;
        }
        if snapshot.descendants(id).contains(&request.target) {
            return false;
        }
    }
    true
}

/// Resolve a move drop into the snapshot that results from it.
///
/// Dragged items keep their listed order at the destination. `On` appends
/// them as the target's last children; `Before` and `After` place them in
/// the target's sibling list on the corresponding side.
pub fn apply_drop<T: TreeItem>(
    snapshot: &Snapshot<T>,
    request: &DropRequest<T::Id>,
) -> Result<Snapshot<T>, SnapshotError> {
    let mut next = snapshot.clone();
    match request.kind {
        DropKind::On => {
            for id in &request.dragged {
                let at = next.child_count(Some(&request.target));
                next = next.move_into(id, Some(&request.target), at)?;
            }
        }
        DropKind::Before => {
            for id in &request.dragged {
                next = next.move_to(id, Anchor::Before(&request.target))?;
            }
        }
        DropKind::After => {
            // Anchor on the previously placed item so order is preserved.
            let mut anchor = request.target.clone();
            for id in &request.dragged {
                next = next.move_to(id, Anchor::After(&anchor))?;
                anchor = id.clone();
            }
        }
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frond_snapshot::Snapshot;

    #[derive(Clone, Debug, PartialEq)]
    struct Row(&'static str);

    impl TreeItem for Row {
        type Id = &'static str;
        fn id(&self) -> Self::Id {
            self.0
        }
    }

    fn forest() -> Snapshot<Row> {
        Snapshot::new()
            .append(vec![Row("a"), Row("b"), Row("c")], None)
            .unwrap()
            .append(vec![Row("a1"), Row("a2")], Some(&"a"))
            .unwrap()
    }

    fn request(kind: DropKind, target: &'static str, dragged: Vec<&'static str>) -> DropRequest<&'static str> {
        DropRequest {
            kind,
            target,
            dragged,
            operations: DropOperations::MOVE,
        }
    }

    #[test]
    fn drop_on_appends_as_children() {
        let next = apply_drop(&forest(), &request(DropKind::On, "a", vec!["b", "c"])).unwrap();
        assert_eq!(next.child_ids(Some(&"a")), &["a1", "a2", "b", "c"]);
        assert_eq!(next.child_ids(None), &["a"]);
    }

    #[test]
    fn drop_before_keeps_dragged_order() {
        let next = apply_drop(&forest(), &request(DropKind::Before, "a", vec!["b", "c"])).unwrap();
        assert_eq!(next.child_ids(None), &["b", "c", "a"]);
    }

    #[test]
    fn drop_after_keeps_dragged_order() {
        let next = apply_drop(&forest(), &request(DropKind::After, "a", vec!["b", "c"])).unwrap();
        assert_eq!(next.child_ids(None), &["a", "b", "c"]);

        let next = apply_drop(&forest(), &request(DropKind::After, "c", vec!["a", "b"])).unwrap();
        assert_eq!(next.child_ids(None), &["c", "a", "b"]);
    }

    #[test]
    fn drop_moves_subtrees_intact() {
        let next = apply_drop(&forest(), &request(DropKind::On, "b", vec!["a"])).unwrap();
        assert_eq!(next.child_ids(Some(&"b")), &["a"]);
        assert_eq!(next.child_ids(Some(&"a")), &["a1", "a2"]);
    }

    #[test]
    fn drop_into_own_subtree_fails_structurally() {
        let bad = request(DropKind::On, "a1", vec!["a"]);
        assert!(!validate_structurally(&forest(), &bad));
        assert!(matches!(
            apply_drop(&forest(), &bad),
            Err(SnapshotError::WouldCycle { .. })
        ));
    }

    #[test]
    fn structural_checks_reject_degenerate_requests() {
        let s = forest();
        assert!(!validate_structurally(&s, &request(DropKind::On, "a", vec![])));
        assert!(!validate_structurally(&s, &request(DropKind::On, "zz", vec!["b"])));
        assert!(!validate_structurally(&s, &request(DropKind::On, "a", vec!["zz"])));
        let mut no_ops = request(DropKind::On, "a", vec!["b"]);
        no_ops.operations = DropOperations::empty();
        assert!(!validate_structurally(&s, &no_ops));
        assert!(validate_structurally(&s, &request(DropKind::Before, "a1", vec!["b"])));
    }

    #[test]
    fn default_delegate_accepts_valid_requests() {
        struct Plain;
        impl DropDelegate<Row> for Plain {}

        let s = forest();
        let req = request(DropKind::Before, "b", vec!["c"]);
        match Plain.validate_drop(&s, req.clone()) {
            Retarget::Accept(accepted) => {
                let next = Plain.accept_drop(&s, &accepted).unwrap();
                assert_eq!(next.child_ids(None), &["a", "c", "b"]);
            }
            Retarget::Reject => panic!("default delegate rejected a valid drop"),
        }
        assert_eq!(req.kind, DropKind::Before);
    }

    #[test]
    fn delegate_can_retarget_onto_parent() {
        // Drops aimed between leaves get redirected onto the leaves' parent.
        struct OntoParent;
        impl DropDelegate<Row> for OntoParent {
            fn validate_drop(
                &self,
                snapshot: &Snapshot<Row>,
                mut request: DropRequest<&'static str>,
            ) -> Retarget<&'static str> {
                if let Some(parent) = snapshot.parent_of(&request.target) {
                    request.target = *parent;
                    request.kind = DropKind::On;
                }
                Retarget::Accept(request)
            }
        }

        let s = forest();
        let req = request(DropKind::Before, "a1", vec!["b"]);
        let Retarget::Accept(accepted) = OntoParent.validate_drop(&s, req) else {
            panic!("retargeting delegate rejected");
        };
        assert_eq!(accepted.target, "a");
        assert_eq!(accepted.kind, DropKind::On);
        let next = OntoParent.accept_drop(&s, &accepted).unwrap();
        assert_eq!(next.child_ids(Some(&"a")), &["a1", "a2", "b"]);
    }
}
