#![forbid(unsafe_code)]

//! Frond public facade crate.
//!
//! Re-exports the snapshot, diff, and reconcile layers behind one surface,
//! plus a lightweight prelude for day-to-day usage.
//!
//! The pipeline in one picture: immutable [`Snapshot`] values describe the
//! intended tree, [`diff`] turns two of them into an [`EditScript`], and an
//! [`Engine`] (or a thread-confined [`Coordinator`]) replays that script
//! against a live [`TreeView`] so the widget converges on the new snapshot.
//!
//! ```
//! use frond::prelude::*;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Note(&'static str);
//!
//! impl TreeItem for Note {
//!     type Id = &'static str;
//!     fn id(&self) -> Self::Id {
//!         self.0
//!     }
//! }
//!
//! let before = Snapshot::new()
//!     .append(vec![Note("inbox"), Note("archive")], None)?
//!     .append(vec![Note("draft")], Some(&"inbox"))?;
//! let after = before.move_to(&"draft", Anchor::After(&"archive"))?;
//!
//! let script = diff(&before.flatten(), &after.flatten());
//! assert_eq!(script.moves.len(), 1);
//! # Ok::<(), frond::Error>(())
//! ```

use std::fmt;

// --- Snapshot re-exports ---------------------------------------------------

pub use frond_snapshot::{Anchor, FlatEntry, Snapshot, SnapshotError, TreeItem};

// --- Diff re-exports -------------------------------------------------------

pub use frond_diff::{EditScript, MoveEdit, diff};

// --- Reconcile re-exports --------------------------------------------------

pub use frond_reconcile::{
    Coordinator, CoordinatorConfig, Disconnected, DropDelegate, DropKind, DropOperations,
    DropRequest, Engine, Retarget, TreeView, apply_drop, replay, validate_structurally,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for frond apps.
#[derive(Debug)]
pub enum Error {
    /// A snapshot mutator rejected its input.
    Snapshot(SnapshotError),
    /// The coordinating thread is gone.
    Disconnected,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::Disconnected => write!(f, "{Disconnected}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Snapshot(err) => Some(err),
            Self::Disconnected => None,
        }
    }
}

impl From<SnapshotError> for Error {
    fn from(err: SnapshotError) -> Self {
        Self::Snapshot(err)
    }
}

impl From<Disconnected> for Error {
    fn from(_: Disconnected) -> Self {
        Self::Disconnected
    }
}

/// Standard result type for frond APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Anchor, Coordinator, CoordinatorConfig, Engine, Error, Result, Snapshot, TreeItem,
        TreeView, diff,
    };

    pub use crate::{diffing, reconcile, snapshot};
}

pub use frond_diff as diffing;
pub use frond_reconcile as reconcile;
pub use frond_snapshot as snapshot;
