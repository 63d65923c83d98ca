#![forbid(unsafe_code)]

//! Edit-script computation between two flattened forests.
//!
//! The diff runs in two passes. A Myers O(ND) longest-common-subsequence
//! pass over item identities classifies every position as kept, removed, or
//! inserted. A move-inference pass then pairs each identity that was both
//! removed and inserted into a single move, and drops moves whose old and
//! new positions coincide.
//!
//! Inputs must not contain duplicate identities. Snapshots cannot produce
//! such sequences, so this is a debug-asserted precondition rather than a
//! runtime error.

pub mod myers;
pub mod script;

pub use script::{EditScript, MoveEdit, diff};
