//! Identity contract for diffable items.

use std::fmt;
use std::hash::Hash;

/// An item that can live in a [`Snapshot`](crate::Snapshot).
///
/// The engine never inspects item content; it only requires a stable
/// identity for matching items across snapshots and value equality for
/// deciding whether an unchanged position still holds the same value.
///
/// Identity must be unique within a snapshot. The snapshot mutators enforce
/// this at the boundary, so the diff algorithm can assume it.
pub trait TreeItem: Clone + PartialEq {
    /// Stable key identifying this item across snapshots.
    ///
    /// Two items with equal ids are treated as the same logical item even
    /// when their values differ.
    type Id: Clone + Eq + Hash + fmt::Debug;

    /// The item's identity.
    fn id(&self) -> Self::Id;
}
