//! Edit-script replay.

use crate::forest::ShadowForest;
use crate::view::TreeView;
use frond_diff::EditScript;
use frond_snapshot::FlatEntry;
use std::fmt;
use std::hash::Hash;

/// Replay an edit script against a live view inside one update transaction.
///
/// `old` and `new` are the flattened forests the script was computed from.
/// A shadow copy of the old forest tracks the effect of every primitive, so
/// each index handed to the view is valid for the view's state at that
/// moment:
///
/// 1. Pure removals land first, in descending old pre-order (children
///    before parents), each at its current shadow position.
/// 2. One walk over the new flattening then settles every surviving entry
///    left to right: an entry absent from the shadow is inserted, and any
///    entry whose current shadow position disagrees with its target is
///    relocated. Pre-order guarantees a parent exists before its children
///    are placed, and because siblings settle in order, an entry's final
///    sibling index equals the count of already-settled siblings when its
///    turn comes, so `entry.index()` is valid at that moment.
///
/// Settling every entry (not just the script's insertions and moves) is
/// what keeps the walk convergent: the diff may keep an entry whose
/// siblings permuted around it, leaving it at a stale index once they are
/// relocated.
pub fn replay<Id, V>(
    script: &EditScript<Id>,
    old: &[FlatEntry<Id>],
    new: &[FlatEntry<Id>],
    view: &mut V,
    animated: bool,
) where
    Id: Clone + Eq + Hash + fmt::Debug,
    V: TreeView<Id> + ?Sized,
{
    let mut shadow = ShadowForest::from_entries(old);

    view.begin_updates(animated);

    for entry in &script.removes {
        // Already gone if an ancestor's removal was processed first; the
        // descending order makes that the exception, not the rule.
        let Some((parent, index)) = shadow.position(&entry.id) else {
            continue;
        };
        view.remove_item(parent.as_ref(), index);
        shadow.remove_subtree(&entry.id);
    }

    for entry in new {
        match shadow.position(&entry.id) {
            None => {
                view.insert_item(entry.parent.as_ref(), entry.index(), &entry.id);
                shadow.insert(entry.id.clone(), entry.parent.as_ref(), entry.index());
            }
            Some((cur_parent, cur_index)) => {
                if cur_parent.as_ref() == entry.parent.as_ref() && cur_index == entry.index() {
                    continue;
                }
                view.move_item(
                    cur_parent.as_ref(),
                    cur_index,
                    entry.parent.as_ref(),
                    entry.index(),
                );
                shadow.detach(&entry.id);
                shadow.insert(entry.id.clone(), entry.parent.as_ref(), entry.index());
            }
        }
    }

    view.end_updates();

    tracing::trace!(
        removes = script.removes.len(),
        inserts = script.inserts.len(),
        moves = script.moves.len(),
        "edit script replayed"
    );
}
