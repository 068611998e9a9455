//! Find highlighter
//!
//! Purely additive visual emphasis: matched elements get their `isFind`
//! mark set, previously matched elements get it cleared. No visibility
//! side effects and no cascade — find runs against the current element
//! set, hidden elements included.

use tracing::debug;

use topofind_dsl::SelectOr;

use crate::element::Snapshot;
use crate::select::matches_or;

/// Ids matching a find selector pair: nodes first, then edges, each in
/// snapshot order.
pub fn find_matches(
    snapshot: &Snapshot,
    node_selector: Option<&SelectOr>,
    edge_selector: Option<&SelectOr>,
) -> Vec<String> {
    let mut matched = Vec::new();

    if let Some(or) = node_selector {
        matched.extend(
            snapshot
                .nodes
                .iter()
                .filter(|n| matches_or(&n.attrs, or))
                .map(|n| n.id.clone()),
        );
    }
    if let Some(or) = edge_selector {
        matched.extend(
            snapshot
                .edges
                .iter()
                .filter(|e| matches_or(&e.attrs, or))
                .map(|e| e.id.clone()),
        );
    }

    matched
}

/// What one recompute asks the caller to do: clear the `isFind` mark on
/// `cleared`, set it on `matched`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOutcome {
    pub cleared: Vec<String>,
    pub matched: Vec<String>,
}

/// Single-owner highlight state for one graph view.
#[derive(Debug, Default)]
pub struct FindEngine {
    matched: Vec<String>,
}

impl FindEngine {
    pub fn new() -> FindEngine {
        FindEngine::default()
    }

    /// The currently highlighted ids, as of the last `recompute`.
    pub fn matched(&self) -> &[String] {
        &self.matched
    }

    pub fn recompute(
        &mut self,
        snapshot: &Snapshot,
        node_selector: Option<&SelectOr>,
        edge_selector: Option<&SelectOr>,
    ) -> FindOutcome {
        let cleared = std::mem::take(&mut self.matched);
        self.matched = find_matches(snapshot, node_selector, edge_selector);

        debug!(matched = self.matched.len(), "find highlight complete");

        FindOutcome {
            cleared,
            matched: self.matched.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Edge, Node};
    use topofind_dsl::{parse_query, FieldTable};

    fn snapshot() -> Snapshot {
        let mut a = Node::new("a");
        a.attrs.set("app", "reviews");
        let mut b = Node::new("b");
        b.attrs.set("app", "ratings");
        let mut e = Edge::new("ab", "a", "b");
        e.attrs.set("protocol", "http");
        Snapshot::new(vec![a, b], vec![e])
    }

    #[test]
    fn highlights_are_additive_and_reversible() {
        let snap = snapshot();
        let table = FieldTable::traffic_graph();
        let mut engine = FindEngine::new();

        let q = parse_query("app = reviews", &table).unwrap();
        let out = engine.recompute(&snap, q.node_selector.as_ref(), None);
        assert!(out.cleared.is_empty());
        assert_eq!(out.matched, vec!["a".to_string()]);

        // a changed find clears the old marks first
        let q = parse_query("protocol = http", &table).unwrap();
        let out = engine.recompute(&snap, None, q.edge_selector.as_ref());
        assert_eq!(out.cleared, vec!["a".to_string()]);
        assert_eq!(out.matched, vec!["ab".to_string()]);

        // clearing the find text clears everything
        let out = engine.recompute(&snap, None, None);
        assert_eq!(out.cleared, vec!["ab".to_string()]);
        assert!(out.matched.is_empty());
    }

    #[test]
    fn mixed_selectors_report_nodes_then_edges() {
        let snap = snapshot();
        let table = FieldTable::traffic_graph();
        let q = parse_query("app = reviews OR protocol = http", &table).unwrap();
        let matched = find_matches(&snap, q.node_selector.as_ref(), q.edge_selector.as_ref());
        assert_eq!(matched, vec!["a".to_string(), "ab".to_string()]);
    }
}
