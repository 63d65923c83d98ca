#![forbid(unsafe_code)]

//! Immutable forest snapshots keyed by stable identity.
//!
//! A [`Snapshot`] is a value type holding an ordered forest of items. Every
//! mutation returns a new snapshot and leaves the receiver untouched, which
//! lets a coordinator hold an "old" and a "new" snapshot side by side while
//! diffing them without any locking.
//!
//! Items are opaque caller values bound by the [`TreeItem`] trait, which
//! contributes the one thing the engine needs: a stable, hashable identity.
//!
//! # Example
//!
//! ```
//! use frond_snapshot::{Snapshot, TreeItem};
//!
//! #[derive(Clone, PartialEq)]
//! struct Row(&'static str);
//!
//! impl TreeItem for Row {
//!     type Id = &'static str;
//!     fn id(&self) -> Self::Id {
//!         self.0
//!     }
//! }
//!
//! let s = Snapshot::new()
//!     .append(vec![Row("a"), Row("b")], None)
//!     .unwrap()
//!     .append(vec![Row("a1")], Some(&"a"))
//!     .unwrap();
//!
//! assert_eq!(s.child_count(None), 2);
//! assert_eq!(s.parent_of(&"a1"), Some(&"a"));
//! ```

pub mod flatten;
pub mod identity;
pub mod snapshot;

pub use flatten::FlatEntry;
pub use identity::TreeItem;
pub use snapshot::{Anchor, Snapshot, SnapshotError};
