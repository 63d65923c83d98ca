#![forbid(unsafe_code)]

//! Replaying edit scripts against a live tree view.
//!
//! The crate splits into four pieces:
//!
//! - [`TreeView`] is the boundary to the host widget: per-node queries plus
//!   insert/remove/move primitives inside begin/end update brackets.
//! - [`replay`] translates an [`EditScript`](frond_diff::EditScript) into
//!   primitives, keeping every index valid against the view's state at the
//!   moment each primitive lands.
//! - [`Engine`] and [`Coordinator`] own the current snapshot. The engine is
//!   the single-threaded transaction core; the coordinator wraps it in a
//!   dedicated thread so `snapshot()` and `apply()` can be called from
//!   anywhere while all view mutation stays serialized.
//! - [`dragdrop`] is the re-targeting protocol for drag-and-drop glue:
//!   validate a request against a snapshot, then turn an accepted request
//!   into mutator calls.

pub mod coordinator;
pub mod dragdrop;
mod forest;
pub mod reconcile;
#[cfg(any(test, feature = "test-helpers"))]
pub mod recording;
pub mod view;

pub use coordinator::{Coordinator, CoordinatorConfig, Disconnected, Engine};
pub use dragdrop::{
    DropDelegate, DropKind, DropOperations, DropRequest, Retarget, apply_drop,
    validate_structurally,
};
pub use reconcile::replay;
pub use view::TreeView;
