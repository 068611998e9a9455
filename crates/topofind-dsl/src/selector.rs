//! Selector data model
//!
//! The parsed, structured form of a find/hide query. A query is a
//! disjunction ([`SelectOr`]) of conjunctions ([`SelectAnd`]) of leaf
//! attribute tests ([`SelectExp`]). Node and edge criteria are kept in
//! separate selectors; `None` for either side means "no constraint of that
//! kind was present", which is distinct from an empty selector that matches
//! nothing.

use serde::{Deserialize, Serialize};

// ============================================================================
// Operators
// ============================================================================

/// Leaf predicate operator.
///
/// `Truthy`/`Falsy` are presence pseudo-operators used for unary (boolean)
/// attributes and for numeric fields compared against a non-numeric marker
/// (`httpin = NaN` means "no inbound http activity recorded").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectOp {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Truthy,
    Falsy,
}

impl SelectOp {
    /// The symbolic form as typed by the user (presence pseudo-ops have none).
    pub fn symbol(&self) -> &'static str {
        match self {
            SelectOp::Equal => "=",
            SelectOp::NotEqual => "!=",
            SelectOp::Greater => ">",
            SelectOp::GreaterEqual => ">=",
            SelectOp::Less => "<",
            SelectOp::LessEqual => "<=",
            SelectOp::Contains => "*=",
            SelectOp::NotContains => "!*=",
            SelectOp::StartsWith => "^=",
            SelectOp::NotStartsWith => "!^=",
            SelectOp::EndsWith => "$=",
            SelectOp::NotEndsWith => "!$=",
            SelectOp::Truthy => "truthy",
            SelectOp::Falsy => "falsy",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<SelectOp> {
        Some(match symbol {
            "=" => SelectOp::Equal,
            "!=" => SelectOp::NotEqual,
            ">" => SelectOp::Greater,
            ">=" => SelectOp::GreaterEqual,
            "<" => SelectOp::Less,
            "<=" => SelectOp::LessEqual,
            "*=" => SelectOp::Contains,
            "!*=" => SelectOp::NotContains,
            "^=" => SelectOp::StartsWith,
            "!^=" => SelectOp::NotStartsWith,
            "$=" => SelectOp::EndsWith,
            "!$=" => SelectOp::NotEndsWith,
            _ => return None,
        })
    }

    /// True for `!=`, `!*=`, `!^=`, `!$=`.
    pub fn is_negation(&self) -> bool {
        matches!(
            self,
            SelectOp::NotEqual
                | SelectOp::NotContains
                | SelectOp::NotStartsWith
                | SelectOp::NotEndsWith
        )
    }

    /// True for the ordering comparisons, which require a numeric value.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            SelectOp::Greater | SelectOp::GreaterEqual | SelectOp::Less | SelectOp::LessEqual
        )
    }
}

// ============================================================================
// Values and leaf predicates
// ============================================================================

/// Right-hand operand of a leaf predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectValue {
    Text(String),
    Number(f64),
}

impl SelectValue {
    pub fn text(s: impl Into<String>) -> SelectValue {
        SelectValue::Text(s.into())
    }

    pub fn number(n: f64) -> SelectValue {
        SelectValue::Number(n)
    }

    /// String rendition used by the string-comparing operators. Whole
    /// numbers render without a decimal point so `grpc = 5` matches an
    /// attribute decorated as `5.0`.
    pub fn rendition(&self) -> String {
        match self {
            SelectValue::Text(s) => s.clone(),
            SelectValue::Number(n) => render_number(*n),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SelectValue::Number(n) => Some(*n),
            SelectValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

pub(crate) fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// One attribute test: `attr op val`.
///
/// Comparison operators carry a numeric value (construction through the
/// parser guarantees this); presence pseudo-ops carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectExp {
    pub attr: String,
    pub op: SelectOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<SelectValue>,
}

impl SelectExp {
    pub fn new(attr: impl Into<String>, op: SelectOp, val: SelectValue) -> SelectExp {
        SelectExp {
            attr: attr.into(),
            op,
            val: Some(val),
        }
    }

    /// Presence test (`truthy`/`falsy`), no value.
    pub fn presence(attr: impl Into<String>, op: SelectOp) -> SelectExp {
        SelectExp {
            attr: attr.into(),
            op,
            val: None,
        }
    }
}

/// Conjunction of leaf tests, all against the same target kind.
pub type SelectAnd = Vec<SelectExp>;

/// Disjunction of conjunctions. Empty means "matches nothing".
pub type SelectOr = Vec<SelectAnd>;

// ============================================================================
// Targets and parsed queries
// ============================================================================

/// The element kind a predicate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Node,
    Edge,
}

/// Which input field a query came from; used to tag error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Find,
    Hide,
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKind::Find => write!(f, "Find"),
            QueryKind::Hide => write!(f, "Hide"),
        }
    }
}

/// Result of parsing one find/hide text field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Disjunctive selector over node criteria, `None` when the query names
    /// no node field.
    pub node_selector: Option<SelectOr>,
    /// Disjunctive selector over edge criteria, `None` when the query names
    /// no edge field.
    pub edge_selector: Option<SelectOr>,
    /// Display options the query implies, deduplicated, in first-reference
    /// order. Only populated on successful parses.
    pub hints: Vec<crate::fields::DisplayHint>,
}

impl ParsedQuery {
    /// True when the query constrains nothing (empty or blank input).
    pub fn is_empty(&self) -> bool {
        self.node_selector.is_none() && self.edge_selector.is_none()
    }
}
