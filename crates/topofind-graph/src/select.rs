//! Selector evaluation
//!
//! A pure filter: an element matches a `SelectOr` iff it matches at least
//! one `SelectAnd` branch, and matches a branch iff every leaf test passes
//! against its attribute bag. Output preserves the relative order of the
//! input collection.
//!
//! String operators compare string renditions (an absent attribute reads as
//! the empty string); the ordering comparisons are numeric and never match
//! an absent or non-numeric attribute; `truthy`/`falsy` test presence and
//! truthiness.

use topofind_dsl::{SelectAnd, SelectExp, SelectOp, SelectOr};

use crate::element::{AttrBag, AttrValue, Edge, Node};

/// Anything carrying an attribute bag can be selected against.
pub trait Attributed {
    fn attrs(&self) -> &AttrBag;
}

impl Attributed for Node {
    fn attrs(&self) -> &AttrBag {
        &self.attrs
    }
}

impl Attributed for Edge {
    fn attrs(&self) -> &AttrBag {
        &self.attrs
    }
}

/// Numeric view of an attribute; numeric-looking text is accepted.
fn attr_number(value: &AttrValue) -> Option<f64> {
    match value {
        AttrValue::Number(n) => Some(*n),
        AttrValue::Text(s) => s.trim().parse::<f64>().ok(),
        AttrValue::Flag(_) => None,
    }
}

/// Evaluate one leaf test against an attribute bag.
pub fn matches_exp(attrs: &AttrBag, exp: &SelectExp) -> bool {
    let value = attrs.get(&exp.attr);

    match exp.op {
        SelectOp::Truthy => value.is_some_and(AttrValue::is_truthy),
        SelectOp::Falsy => !value.is_some_and(AttrValue::is_truthy),
        SelectOp::Greater | SelectOp::GreaterEqual | SelectOp::Less | SelectOp::LessEqual => {
            let (Some(lhs), Some(rhs)) = (
                value.and_then(attr_number),
                exp.val.as_ref().and_then(|v| v.as_number()),
            ) else {
                return false;
            };
            match exp.op {
                SelectOp::Greater => lhs > rhs,
                SelectOp::GreaterEqual => lhs >= rhs,
                SelectOp::Less => lhs < rhs,
                _ => lhs <= rhs,
            }
        }
        _ => {
            let lhs = value.map(AttrValue::rendition).unwrap_or_default();
            let rhs = exp.val.as_ref().map(|v| v.rendition()).unwrap_or_default();
            match exp.op {
                SelectOp::Equal => lhs == rhs,
                SelectOp::NotEqual => lhs != rhs,
                SelectOp::Contains => lhs.contains(&rhs),
                SelectOp::NotContains => !lhs.contains(&rhs),
                SelectOp::StartsWith => lhs.starts_with(&rhs),
                SelectOp::NotStartsWith => !lhs.starts_with(&rhs),
                SelectOp::EndsWith => lhs.ends_with(&rhs),
                SelectOp::NotEndsWith => !lhs.ends_with(&rhs),
                _ => unreachable!("handled above"),
            }
        }
    }
}

/// All tests in the branch pass.
pub fn matches_and(attrs: &AttrBag, and: &SelectAnd) -> bool {
    and.iter().all(|exp| matches_exp(attrs, exp))
}

/// At least one branch passes.
pub fn matches_or(attrs: &AttrBag, or: &SelectOr) -> bool {
    or.iter().any(|and| matches_and(attrs, and))
}

/// Filter a collection, preserving input order.
pub fn select_or<'a, E: Attributed>(elems: &'a [E], or: &SelectOr) -> Vec<&'a E> {
    elems.iter().filter(|e| matches_or(e.attrs(), or)).collect()
}
