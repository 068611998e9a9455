//! Topofind graph engine
//!
//! The consumer side of the find/hide query language: a read-only element
//! snapshot (nodes, edges, open attribute bags, box containment), selector
//! evaluation, the cascading visibility algorithm, and the find highlighter.
//!
//! The engines never mutate elements. The cascade takes an immutable
//! snapshot and returns hidden-id sets; the stateful wrappers
//! ([`HideEngine`], [`FindEngine`]) only remember their own previous output
//! so that clearing a query fully reverts it. Applying the sets to a
//! mutable rendered graph, and re-running layout, is the caller's job.

pub mod cascade;
pub mod element;
pub mod find;
pub mod select;

pub use cascade::{compute_hidden, EdgeMode, HiddenSet, HideEngine, HideOutcome};
pub use element::{AttrBag, AttrValue, Edge, Node, Snapshot};
pub use find::{find_matches, FindEngine, FindOutcome};
pub use select::{matches_and, matches_exp, matches_or, select_or, Attributed};
