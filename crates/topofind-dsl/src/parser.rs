//! Query parser
//!
//! Splits normalized text into OR clauses and AND terms, parses each term,
//! and folds the resolved predicates into the node/edge selector pair.
//!
//! Grammar (informal):
//!
//! ```text
//! query      := clause (" OR " clause)*
//! clause     := term (" AND " term)*
//! term       := unary | field_term
//! unary      := ["!"] operand
//! field_term := field op value
//! op         := "!=" | "!*=" | "!$=" | "!^=" | ">=" | "<=" | "*=" | "$=" | "^=" | "=" | ">" | "<"
//! ```
//!
//! Operator detection is a substring search in a fixed precedence order so
//! multi-character operators win over their single-character prefixes
//! (`!=` before `=`, `>=` before `>`).
//!
//! All failures are user input errors: they yield a short message and "no
//! selector", never a panic. The caller keeps its previous valid state until
//! the user corrects the text.

use thiserror::Error;

use crate::fields::{DisplayHint, FieldTable, ResolvedSelector};
use crate::normalize::Normalizer;
use crate::selector::{ParsedQuery, QueryKind, SelectAnd, SelectOp, SelectOr, Target};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("No valid operator found in expression")]
    MissingOperator,
    #[error("Invalid Node or Edge operand")]
    InvalidUnaryOperand,
    #[error("Invalid operand [{0}]")]
    InvalidOperand(String),
    #[error("Invalid expression. Can not AND node and edge criteria.")]
    MixedTargets,
    #[error("Can not use 'AND' with 'name' operand")]
    NameConjunction,
    #[error("Invalid {label} [{value}]. Expected {expected}")]
    InvalidEnumValue {
        label: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("Invalid value [{0}]. Expected a numeric value (use '.' for decimals)")]
    NonNumericValue(String),
    #[error("Invalid rank range [{0}]. Expected a number between 1..100")]
    RankRange(String),
    #[error("Invalid operator [{0}] for numeric condition")]
    NumericOperator(String),
}

/// A parse error tagged with the input field that produced it
/// (`Find: ...` / `Hide: ...`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {source}")]
pub struct QueryError {
    pub kind: QueryKind,
    #[source]
    pub source: ParseError,
}

// ============================================================================
// Parsing
// ============================================================================

/// Operators in detection precedence order: multi-character operators must
/// be found before their single-character prefixes.
const OPERATOR_PRECEDENCE: &[&str] = &[
    "!=", "!*=", "!$=", "!^=", ">=", "<=", "*=", "$=", "^=", "=", ">", "<", "!",
];

/// Parse one find/hide text field against a view's field table.
///
/// Empty or blank input yields an empty [`ParsedQuery`] (no constraint, as
/// opposed to a constraint matching nothing).
pub fn parse_query(text: &str, table: &FieldTable) -> Result<ParsedQuery, ParseError> {
    let prepared = Normalizer::new().normalize(text);
    if prepared.is_empty() {
        return Ok(ParsedQuery::default());
    }

    let mut or_node: SelectOr = Vec::new();
    let mut or_edge: SelectOr = Vec::new();
    let mut hints: Vec<DisplayHint> = Vec::new();

    // separate selectors per disjunctive clause, stitched together at the
    // end; this is what lets a query mix node and edge criteria across OR
    for clause in prepared.split(" OR ") {
        let terms: Vec<&str> = clause.split(" AND ").collect();
        let conjunctive = terms.len() > 1;

        let mut and_node: SelectAnd = Vec::new();
        let mut and_edge: SelectAnd = Vec::new();
        let mut target: Option<Target> = None;

        for term in terms {
            let resolved = parse_term(term.trim(), conjunctive, table, &mut hints)?;

            match target {
                None => target = Some(resolved.target),
                Some(t) if t != resolved.target => return Err(ParseError::MixedTargets),
                Some(_) => {}
            }

            match (resolved.target, resolved.selector) {
                (Target::Node, ResolvedSelector::One(exp)) => and_node.push(exp),
                (Target::Node, ResolvedSelector::All(exps)) => and_node.extend(exps),
                // an already-disjunctive resolution splices straight into
                // the outer OR rather than nesting
                (Target::Node, ResolvedSelector::Any(branches)) => or_node.extend(branches),
                (Target::Edge, ResolvedSelector::One(exp)) => and_edge.push(exp),
                (Target::Edge, ResolvedSelector::All(exps)) => and_edge.extend(exps),
                (Target::Edge, ResolvedSelector::Any(branches)) => or_edge.extend(branches),
            }
        }

        if !and_node.is_empty() {
            or_node.push(and_node);
        }
        if !and_edge.is_empty() {
            or_edge.push(and_edge);
        }
    }

    Ok(ParsedQuery {
        node_selector: (!or_node.is_empty()).then_some(or_node),
        edge_selector: (!or_edge.is_empty()).then_some(or_edge),
        hints,
    })
}

/// [`parse_query`] with errors tagged `Find:`.
pub fn parse_find_query(text: &str, table: &FieldTable) -> Result<ParsedQuery, QueryError> {
    parse_query(text, table).map_err(|source| QueryError {
        kind: QueryKind::Find,
        source,
    })
}

/// [`parse_query`] with errors tagged `Hide:`.
pub fn parse_hide_query(text: &str, table: &FieldTable) -> Result<ParsedQuery, QueryError> {
    parse_query(text, table).map_err(|source| QueryError {
        kind: QueryKind::Hide,
        source,
    })
}

fn parse_term(
    term: &str,
    conjunctive: bool,
    table: &FieldTable,
    hints: &mut Vec<DisplayHint>,
) -> Result<crate::fields::ResolvedTerm, ParseError> {
    let Some(op_symbol) = OPERATOR_PRECEDENCE.iter().find(|op| term.contains(**op)) else {
        // no operator: a single word is a unary term, anything longer is
        // a syntax error
        if term.split(' ').count() > 1 {
            return Err(ParseError::MissingOperator);
        }
        return table
            .resolve_unary(term, false, hints)
            .ok_or(ParseError::InvalidUnaryOperand);
    };

    let (field, val) = term.split_once(op_symbol).unwrap_or((term, ""));

    if *op_symbol == "!" {
        // negated unary: `! mtls` (normalized from `not mtls`)
        return table
            .resolve_unary(val.trim(), true, hints)
            .ok_or(ParseError::InvalidUnaryOperand);
    }

    let op = SelectOp::from_symbol(op_symbol).expect("symbolic operator");
    table.resolve_binary(field.trim(), op, val.trim(), conjunctive, hints)
}
