//! Topofind find/hide query language
//!
//! A small boolean predicate language for highlighting ("find") or removing
//! ("hide") elements of a rendered topology graph. Free text such as
//! `httpin > 5 and namespace = foo` is rewritten into a canonical token
//! stream, split into OR-of-AND clauses, and resolved against an injectable
//! field table into the three-level selector model:
//!
//! - `SelectExp` — one attribute test
//! - `SelectAnd` — conjunction of tests against a single target kind
//! - `SelectOr`  — disjunction of conjunctions
//!
//! The language intentionally supports only one level of OR-of-ANDs, left to
//! right, with no grouping. A single AND clause must not mix node and edge
//! criteria.
//!
//! Parsing is pure: fields that imply a display option (e.g. filtering on
//! `rank` implies wanting rank badges visible) report a [`DisplayHint`] with
//! the parsed query instead of firing a callback mid-parse.

pub mod fields;
pub mod normalize;
pub mod parser;
pub mod selector;

pub use fields::{DisplayHint, FieldTable};
pub use normalize::Normalizer;
pub use parser::{parse_find_query, parse_hide_query, parse_query, ParseError, QueryError};
pub use selector::{
    ParsedQuery, QueryKind, SelectAnd, SelectExp, SelectOp, SelectOr, SelectValue, Target,
};
