//! Edit-script assembly: LCS classification, move inference, and the
//! cleanup passes that keep the script replayable.

use crate::myers::{Edit, shortest_edit};
use frond_snapshot::FlatEntry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// A paired removal and insertion of the same identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEdit<Id> {
    /// Where the item sat in the old forest.
    pub from: FlatEntry<Id>,
    /// Where the item sits in the new forest.
    pub to: FlatEntry<Id>,
}

/// The minimal set of operations turning one flattened forest into another.
///
/// Ordering guarantees:
/// - `removes` descend in old pre-order, so children precede their parents
///   and higher sibling indices precede lower ones;
/// - `inserts` ascend in new pre-order, so parents precede their children
///   and sibling indices ascend within each parent;
/// - `moves` carry both endpoint entries and contain no entry whose old and
///   new positions coincide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditScript<Id> {
    /// Pure removals (no matching insertion).
    pub removes: Vec<FlatEntry<Id>>,
    /// Pure insertions (no matching removal).
    pub inserts: Vec<FlatEntry<Id>>,
    /// Inferred moves.
    pub moves: Vec<MoveEdit<Id>>,
}

impl<Id> EditScript<Id> {
    /// Whether the script contains no operations at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removes.is_empty() && self.inserts.is_empty() && self.moves.is_empty()
    }

    /// Total number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.removes.len() + self.inserts.len() + self.moves.len()
    }
}

impl<Id> Default for EditScript<Id> {
    fn default() -> Self {
        Self {
            removes: Vec::new(),
            inserts: Vec::new(),
            moves: Vec::new(),
        }
    }
}

/// Compute the edit script between two flattened forests.
///
/// Both inputs must come from [`Snapshot::flatten`] (or uphold the same
/// contract): deterministic pre-order, no duplicate identities. Duplicates
/// make the result meaningless and are debug-asserted.
///
/// [`Snapshot::flatten`]: frond_snapshot::Snapshot::flatten
pub fn diff<Id>(old: &[FlatEntry<Id>], new: &[FlatEntry<Id>]) -> EditScript<Id>
where
    Id: Clone + Eq + Hash + fmt::Debug,
{
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("forest_diff", old = old.len(), new = new.len()).entered();

    debug_assert!(unique_ids(old), "duplicate identity in old sequence");
    debug_assert!(unique_ids(new), "duplicate identity in new sequence");

    let old_ids: Vec<&Id> = old.iter().map(|e| &e.id).collect();
    let new_ids: Vec<&Id> = new.iter().map(|e| &e.id).collect();
    let edits = shortest_edit(&old_ids, &new_ids);

    let mut removed: Vec<&FlatEntry<Id>> = Vec::new();
    let mut inserted: Vec<&FlatEntry<Id>> = Vec::new();
    let mut kept: Vec<(&FlatEntry<Id>, &FlatEntry<Id>)> = Vec::new();
    for edit in &edits {
        match edit {
            Edit::Keep { old_index, new_index } => kept.push((&old[*old_index], &new[*new_index])),
            Edit::Remove { old_index } => removed.push(&old[*old_index]),
            Edit::Insert { new_index } => inserted.push(&new[*new_index]),
        }
    }

    // Move inference: an identity that was both removed and inserted is one
    // move. A kept identity whose parent changed is also a move (the LCS
    // keeps it because its relative order survived, but the view still has
    // to relocate it). Index-only drift under an unchanged parent is not a
    // move: sibling insertions and removals shift those for free.
    let mut removed_by_id: HashMap<&Id, &FlatEntry<Id>> =
        removed.iter().map(|e| (&e.id, *e)).collect();

    let mut script = EditScript::default();
    for entry in inserted {
        match removed_by_id.remove(&entry.id) {
            Some(from) => {
                if from.parent != entry.parent || from.index() != entry.index() {
                    script.moves.push(MoveEdit {
                        from: from.clone(),
                        to: entry.clone(),
                    });
                }
            }
            None => script.inserts.push(entry.clone()),
        }
    }
    for entry in removed {
        if removed_by_id.contains_key(&entry.id) {
            script.removes.push(entry.clone());
        }
    }
    for (from, to) in &kept {
        if from.parent != to.parent {
            script.moves.push(MoveEdit {
                from: (*from).clone(),
                to: (*to).clone(),
            });
        }
    }

    demote_moves_out_of_removed_subtrees(&mut script, old, new);

    // Pre-order path order gives parents-before-children for insertions and
    // the reverse for removals.
    script.inserts.sort_by(|a, b| a.path.cmp(&b.path));
    script.removes.sort_by(|a, b| b.path.cmp(&a.path));

    #[cfg(feature = "tracing")]
    tracing::debug!(
        removes = script.removes.len(),
        inserts = script.inserts.len(),
        moves = script.moves.len(),
        "edit script computed"
    );

    script
}

/// A move whose source lies inside a subtree being removed cannot replay:
/// the subtree removal destroys the old copy first. Demote such moves to
/// pure insertions, and cascade to every entry that stays attached beneath
/// a demoted one in the new forest (their old copies die with the same
/// subtree).
fn demote_moves_out_of_removed_subtrees<Id>(
    script: &mut EditScript<Id>,
    old: &[FlatEntry<Id>],
    new: &[FlatEntry<Id>],
) where
    Id: Clone + Eq + Hash + fmt::Debug,
{
    if script.removes.is_empty() || script.moves.is_empty() {
        return;
    }

    let removed: HashSet<&Id> = script.removes.iter().map(|e| &e.id).collect();
    let old_parent: HashMap<&Id, Option<&Id>> =
        old.iter().map(|e| (&e.id, e.parent.as_ref())).collect();
    let doomed = |entry: &FlatEntry<Id>| {
        let mut cursor = entry.parent.as_ref();
        while let Some(p) = cursor {
            if removed.contains(p) {
                return true;
            }
            cursor = old_parent.get(p).copied().flatten();
        }
        false
    };

    let mut reinserted: HashSet<Id> = HashSet::new();
    let mut surviving = Vec::with_capacity(script.moves.len());
    for m in script.moves.drain(..) {
        if doomed(&m.from) {
            reinserted.insert(m.to.id.clone());
            script.inserts.push(m.to);
        } else {
            surviving.push(m);
        }
    }
    script.moves = surviving;
    if reinserted.is_empty() {
        return;
    }

    // Cascade in new pre-order: a kept entry still hanging beneath a
    // reinserted one had its old copy inside the same doomed subtree, so it
    // needs reinsertion too. Entries that are already insertions, or moves
    // arriving from outside the doomed subtree, keep their classification.
    let insert_ids: HashSet<Id> = script.inserts.iter().map(|e| e.id.clone()).collect();
    let move_ids: HashSet<Id> = script.moves.iter().map(|m| m.to.id.clone()).collect();
    let mut extra: Vec<FlatEntry<Id>> = Vec::new();
    for entry in new {
        let under_reinserted = entry
            .parent
            .as_ref()
            .is_some_and(|p| reinserted.contains(p));
        if under_reinserted && !insert_ids.contains(&entry.id) && !move_ids.contains(&entry.id) {
            reinserted.insert(entry.id.clone());
            extra.push(entry.clone());
        }
    }
    script.inserts.extend(extra);
}

fn unique_ids<Id: Eq + Hash>(entries: &[FlatEntry<Id>]) -> bool {
    let mut seen = HashSet::with_capacity(entries.len());
    entries.iter().all(|e| seen.insert(&e.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frond_snapshot::{Anchor, Snapshot, TreeItem};
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row(&'static str);

    impl TreeItem for Row {
        type Id = &'static str;
        fn id(&self) -> Self::Id {
            self.0
        }
    }

    fn roots(ids: &[&'static str]) -> Snapshot<Row> {
        Snapshot::new()
            .append(ids.iter().map(|i| Row(i)).collect(), None)
            .unwrap()
    }

    fn diff_snapshots(old: &Snapshot<Row>, new: &Snapshot<Row>) -> EditScript<&'static str> {
        diff(&old.flatten(), &new.flatten())
    }

    #[test]
    fn empty_against_empty() {
        let s: Snapshot<Row> = Snapshot::new();
        assert!(diff_snapshots(&s, &s).is_empty());
    }

    #[test]
    fn self_diff_is_empty() {
        let s = roots(&["a", "b", "c"])
            .append(vec![Row("a1"), Row("a2")], Some(&"a"))
            .unwrap();
        assert!(diff_snapshots(&s, &s).is_empty());
    }

    #[test]
    fn pure_insertions() {
        let old: Snapshot<Row> = Snapshot::new();
        let new = roots(&["a", "b"]);
        let script = diff_snapshots(&old, &new);
        assert!(script.removes.is_empty());
        assert!(script.moves.is_empty());
        let ids: Vec<_> = script.inserts.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn pure_removals_descend() {
        let old = roots(&["a", "b"])
            .append(vec![Row("a1")], Some(&"a"))
            .unwrap();
        let new: Snapshot<Row> = Snapshot::new();
        let script = diff_snapshots(&old, &new);
        assert!(script.inserts.is_empty());
        let ids: Vec<_> = script.removes.iter().map(|e| e.id).collect();
        // Descending pre-order: children before parents.
        assert_eq!(ids, vec!["b", "a1", "a"]);
    }

    #[test]
    fn single_relocation_is_one_move() {
        let old = roots(&["a", "b", "c"]);
        let new = old.move_to(&"c", Anchor::Before(&"a")).unwrap();
        let script = diff_snapshots(&old, &new);
        assert!(script.removes.is_empty());
        assert!(script.inserts.is_empty());
        assert_eq!(script.moves.len(), 1);
        let m = &script.moves[0];
        assert_eq!(m.from.id, "c");
        assert_eq!((m.from.index(), m.to.index()), (2, 0));
    }

    #[test]
    fn reparenting_is_one_move() {
        let old = roots(&["a", "b"])
            .append(vec![Row("x")], Some(&"a"))
            .unwrap();
        let new = old.move_into(&"x", Some(&"b"), 0).unwrap();
        let script = diff_snapshots(&old, &new);
        assert_eq!(script.moves.len(), 1);
        assert!(script.removes.is_empty());
        assert!(script.inserts.is_empty());
        let m = &script.moves[0];
        assert_eq!(m.from.parent, Some("a"));
        assert_eq!(m.to.parent, Some("b"));
    }

    #[test]
    fn kept_entry_with_changed_parent_becomes_move() {
        // Old: p -> [x], q.  New: q -> [x], p.
        // The LCS can keep x (order p, x, q vs p, q, x shares p..x or p..q),
        // but x changed parent and must still be relocated.
        let old = roots(&["p", "q"])
            .append(vec![Row("x")], Some(&"p"))
            .unwrap();
        let new = old.move_into(&"x", Some(&"q"), 0).unwrap();
        let script = diff_snapshots(&old, &new);
        let moved: Vec<_> = script.moves.iter().map(|m| m.from.id).collect();
        assert!(moved.contains(&"x"), "script: {script:?}");
        for m in &script.moves {
            assert!(
                m.from.parent != m.to.parent || m.from.index() != m.to.index(),
                "no-op move survived: {m:?}"
            );
        }
    }

    #[test]
    fn index_drift_from_sibling_insert_is_not_a_move() {
        let old = roots(&["a", "b"]);
        let new = old.insert(vec![Row("x")], Anchor::Before(&"a")).unwrap();
        let script = diff_snapshots(&old, &new);
        assert!(script.moves.is_empty());
        assert!(script.removes.is_empty());
        assert_eq!(script.inserts.len(), 1);
        assert_eq!(script.inserts[0].index(), 0);
    }

    #[test]
    fn scenario_mixed_insert_delete() {
        // roots [a, b], a -> [a1], b -> [b2]; insert [a2, a3] after a1,
        // insert [b1] before b2, delete [a1, b2].
        let old = roots(&["a", "b"])
            .append(vec![Row("a1")], Some(&"a"))
            .unwrap()
            .append(vec![Row("b2")], Some(&"b"))
            .unwrap();
        let new = old
            .insert(vec![Row("a2"), Row("a3")], Anchor::After(&"a1"))
            .unwrap()
            .insert(vec![Row("b1")], Anchor::Before(&"b2"))
            .unwrap()
            .delete(&["a1", "b2"])
            .unwrap();
        let script = diff_snapshots(&old, &new);
        assert!(script.moves.is_empty());
        let removed: Vec<_> = script.removes.iter().map(|e| e.id).collect();
        assert_eq!(removed, vec!["b2", "a1"]);
        let inserted: Vec<_> = script.inserts.iter().map(|e| (e.id, e.parent, e.index())).collect();
        assert_eq!(
            inserted,
            vec![
                ("a2", Some("a"), 0),
                ("a3", Some("a"), 1),
                ("b1", Some("b"), 0),
            ]
        );
    }

    #[test]
    fn scenario_cross_parent_moves() {
        // roots [a, b], a -> [a1, b2, a3], b -> [b1, a2];
        // move a2 before b2, then b2 after b1.
        let old = roots(&["a", "b"])
            .append(vec![Row("a1"), Row("b2"), Row("a3")], Some(&"a"))
            .unwrap()
            .append(vec![Row("b1"), Row("a2")], Some(&"b"))
            .unwrap();
        let new = old
            .move_to(&"a2", Anchor::Before(&"b2"))
            .unwrap()
            .move_to(&"b2", Anchor::After(&"b1"))
            .unwrap();
        assert_eq!(new.child_ids(Some(&"a")), &["a1", "a2", "a3"]);
        assert_eq!(new.child_ids(Some(&"b")), &["b1", "b2"]);

        let script = diff_snapshots(&old, &new);
        assert!(script.removes.is_empty());
        assert!(script.inserts.is_empty());
        assert_eq!(script.moves.len(), 2);
        let mut moved: Vec<_> = script.moves.iter().map(|m| m.from.id).collect();
        moved.sort_unstable();
        assert_eq!(moved, vec!["a2", "b2"]);
    }

    #[test]
    fn move_out_of_removed_subtree_demotes_to_insert() {
        // Delete p but relocate its child c (with grandchild d) to the root
        // level. The old copies die with p's subtree, so c and d come back
        // as insertions.
        let old = roots(&["p"])
            .append(vec![Row("c")], Some(&"p"))
            .unwrap()
            .append(vec![Row("d")], Some(&"c"))
            .unwrap();
        let new = old.move_into(&"c", None, 1).unwrap().delete(&["p"]).unwrap();
        assert_eq!(new.child_ids(None), &["c"]);

        let script = diff_snapshots(&old, &new);
        assert!(script.moves.is_empty(), "script: {script:?}");
        let removed: Vec<_> = script.removes.iter().map(|e| e.id).collect();
        assert_eq!(removed, vec!["p"]);
        let inserted: Vec<_> = script.inserts.iter().map(|e| e.id).collect();
        assert_eq!(inserted, vec!["c", "d"]);
    }

    #[test]
    fn value_change_without_structure_change_is_empty() {
        // Identity matching ignores item values; content refresh is the
        // presentation layer's concern.
        #[derive(Clone, Debug, PartialEq)]
        struct Versioned(&'static str, u32);
        impl TreeItem for Versioned {
            type Id = &'static str;
            fn id(&self) -> Self::Id {
                self.0
            }
        }
        let old = Snapshot::new()
            .append(vec![Versioned("a", 1)], None)
            .unwrap();
        let new = Snapshot::new()
            .append(vec![Versioned("a", 2)], None)
            .unwrap();
        assert!(diff(&old.flatten(), &new.flatten()).is_empty());
    }

    proptest! {
        #[test]
        fn no_op_stability_for_arbitrary_forests(
            layout in proptest::collection::vec(0usize..4, 1..12)
        ) {
            // Build a forest by attaching each item under one of the items
            // seen so far (or at the root), then diff it against itself.
            static NAMES: &[&str] = &[
                "n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7", "n8", "n9", "n10", "n11",
            ];
            let mut s: Snapshot<Row> = Snapshot::new();
            let mut placed: Vec<&'static str> = Vec::new();
            for (i, slot) in layout.iter().enumerate() {
                let name = NAMES[i];
                let parent: Option<&'static str> = if placed.is_empty() || *slot == 0 {
                    None
                } else {
                    Some(placed[(slot - 1) % placed.len()])
                };
                s = s.append(vec![Row(name)], parent.as_ref()).unwrap();
                placed.push(name);
            }
            prop_assert!(diff(&s.flatten(), &s.flatten()).is_empty());
        }
    }
}
