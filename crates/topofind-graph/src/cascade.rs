//! Visibility cascade
//!
//! Derives a consistent hidden-element set from a hide selector pair, the
//! edge-visibility mode, and one snapshot. Hiding is destructive in effect
//! but the computation here is pure: the caller applies the returned id
//! sets to its own mutable graph and re-runs layout.
//!
//! Structural invariants enforced:
//! - no visible edge keeps an invisible endpoint
//! - a node whose edges are all hidden disappears too, unless it carries no
//!   edges at all or is an explicit idle node the user chose to keep
//! - a box node with no visible descendant disappears; only empty boxes are
//!   hidden, never a directly-matched box
//!
//! For a fixed snapshot, selector, and edge mode the hidden set is a pure
//! function of its inputs; the box-collapse fixpoint converges to the same
//! result regardless of traversal order because the hidden set only grows.

use ahash::AHashSet;
use tracing::debug;

use topofind_dsl::SelectOr;

use crate::element::Snapshot;
use crate::select::matches_or;

/// Global edge-visibility policy, applied independently of the hide query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeMode {
    #[default]
    All,
    None,
    Unhealthy,
}

/// The ids left hidden by one cascade run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HiddenSet {
    pub nodes: AHashSet<String>,
    pub edges: AHashSet<String>,
}

impl HiddenSet {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Run the cascade once over `snapshot`.
///
/// `node_selector` / `edge_selector` of `None` mean the hide text named no
/// criteria of that kind; with both `None` and `EdgeMode::All` the result
/// is empty.
pub fn compute_hidden(
    snapshot: &Snapshot,
    node_selector: Option<&SelectOr>,
    edge_selector: Option<&SelectOr>,
    edge_mode: EdgeMode,
) -> HiddenSet {
    let mut hidden = HiddenSet::default();

    if node_selector.is_none() && edge_selector.is_none() && edge_mode == EdgeMode::All {
        return hidden;
    }

    // direct matches
    if let Some(or) = node_selector {
        for node in &snapshot.nodes {
            if matches_or(&node.attrs, or) {
                hidden.nodes.insert(node.id.clone());
            }
        }
    }
    let mut direct_edge_hit = false;
    if let Some(or) = edge_selector {
        for edge in &snapshot.edges {
            if matches_or(&edge.attrs, or) {
                hidden.edges.insert(edge.id.clone());
                direct_edge_hit = true;
            }
        }
    }

    // hiding edges starves the nodes that only had those edges; explicit
    // idle nodes are kept, the user opted in to seeing them
    if direct_edge_hit {
        for node in &snapshot.nodes {
            if hidden.nodes.contains(&node.id) || node.attrs.is_truthy("isIdle") {
                continue;
            }
            let mut edges = snapshot.edges_of(&node.id).peekable();
            if edges.peek().is_some() && edges.all(|e| hidden.edges.contains(&e.id)) {
                hidden.nodes.insert(node.id.clone());
            }
        }
    }

    // an edge cannot stay visible with a hidden endpoint
    for edge in &snapshot.edges {
        if hidden.nodes.contains(&edge.source) || hidden.nodes.contains(&edge.target) {
            hidden.edges.insert(edge.id.clone());
        }
    }

    // revert direct box hits; only empty boxes are hidden
    hidden.nodes.retain(|id| {
        snapshot.node(id).map(|n| !n.is_box).unwrap_or(true)
    });

    // edge mode applies on top of the selector, to edges only
    match edge_mode {
        EdgeMode::All => {}
        EdgeMode::None => {
            hidden.edges.extend(snapshot.edges.iter().map(|e| e.id.clone()));
        }
        EdgeMode::Unhealthy => {
            for edge in &snapshot.edges {
                if !edge.attrs.is_truthy("healthStatus") {
                    hidden.edges.insert(edge.id.clone());
                }
            }
        }
    }

    // collapse boxes whose descendants are all hidden; hiding a box can
    // empty an enclosing box, so iterate to the fixed point
    loop {
        let mut changed = false;
        for node in snapshot.nodes.iter().filter(|n| n.is_box) {
            if hidden.nodes.contains(&node.id) {
                continue;
            }
            let empty = snapshot
                .descendants(node)
                .iter()
                .all(|d| hidden.nodes.contains(&d.id));
            if empty {
                hidden.nodes.insert(node.id.clone());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    debug!(
        hidden_nodes = hidden.nodes.len(),
        hidden_edges = hidden.edges.len(),
        "hide cascade complete"
    );

    hidden
}

// ============================================================================
// Stateful wrapper
// ============================================================================

/// What one recompute asks the caller to do: restore the previously hidden
/// elements that are still part of the snapshot, then hide `hidden`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HideOutcome {
    pub restored_nodes: Vec<String>,
    pub restored_edges: Vec<String>,
    pub hidden: HiddenSet,
}

/// Single-owner hide state for one graph view.
///
/// Remembers the previous run's hidden set so that a changed (or cleared)
/// hide text fully reverts the prior hide before the new one applies.
/// Elements that left the snapshot entirely are dropped, not restored.
#[derive(Debug, Default)]
pub struct HideEngine {
    hidden: HiddenSet,
}

impl HideEngine {
    pub fn new() -> HideEngine {
        HideEngine::default()
    }

    /// The currently hidden set, as of the last `recompute`.
    pub fn hidden(&self) -> &HiddenSet {
        &self.hidden
    }

    pub fn recompute(
        &mut self,
        snapshot: &Snapshot,
        node_selector: Option<&SelectOr>,
        edge_selector: Option<&SelectOr>,
        edge_mode: EdgeMode,
    ) -> HideOutcome {
        let mut restored_nodes: Vec<String> = self
            .hidden
            .nodes
            .iter()
            .filter(|id| snapshot.contains_node(id))
            .cloned()
            .collect();
        let mut restored_edges: Vec<String> = self
            .hidden
            .edges
            .iter()
            .filter(|id| snapshot.contains_edge(id))
            .cloned()
            .collect();
        restored_nodes.sort();
        restored_edges.sort();

        let hidden = compute_hidden(snapshot, node_selector, edge_selector, edge_mode);
        self.hidden = hidden.clone();

        HideOutcome {
            restored_nodes,
            restored_edges,
            hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Edge, Node};
    use topofind_dsl::{parse_query, FieldTable};

    fn node(id: &str, ns: &str) -> Node {
        let mut n = Node::new(id);
        n.attrs.set("namespace", ns);
        n
    }

    fn hide(snapshot: &Snapshot, text: &str, mode: EdgeMode) -> HiddenSet {
        let q = parse_query(text, &FieldTable::traffic_graph()).unwrap();
        compute_hidden(
            snapshot,
            q.node_selector.as_ref(),
            q.edge_selector.as_ref(),
            mode,
        )
    }

    #[test]
    fn no_selector_and_all_edges_hides_nothing() {
        let snap = Snapshot::new(vec![node("a", "ns1")], vec![]);
        assert!(hide(&snap, "", EdgeMode::All).is_empty());
    }

    #[test]
    fn orphaned_edges_follow_hidden_nodes() {
        let snap = Snapshot::new(
            vec![node("a", "ns1"), node("b", "ns2")],
            vec![Edge::new("ab", "a", "b")],
        );
        let hidden = hide(&snap, "namespace = ns1", EdgeMode::All);
        assert!(hidden.nodes.contains("a"));
        assert!(hidden.edges.contains("ab"));
        // b lost its only edge but was not itself selected and the starved
        // rule only fires when an edge was hidden directly
        assert!(!hidden.nodes.contains("b"));
    }

    #[test]
    fn starved_nodes_follow_hidden_edges() {
        let mut e = Edge::new("ab", "a", "b");
        e.attrs.set("protocol", "tcp");
        let snap = Snapshot::new(vec![node("a", "ns1"), node("b", "ns1")], vec![e]);

        let hidden = hide(&snap, "protocol = tcp", EdgeMode::All);
        assert!(hidden.edges.contains("ab"));
        assert!(hidden.nodes.contains("a"));
        assert!(hidden.nodes.contains("b"));
    }

    #[test]
    fn idle_nodes_survive_edge_starvation() {
        let mut idle = node("a", "ns1");
        idle.attrs.set("isIdle", true);
        let mut e = Edge::new("ab", "a", "b");
        e.attrs.set("protocol", "tcp");
        let snap = Snapshot::new(vec![idle, node("b", "ns1")], vec![e]);

        let hidden = hide(&snap, "protocol = tcp", EdgeMode::All);
        assert!(!hidden.nodes.contains("a"));
        assert!(hidden.nodes.contains("b"));
    }

    #[test]
    fn nodes_without_edges_survive_edge_starvation() {
        let mut e = Edge::new("ab", "a", "b");
        e.attrs.set("protocol", "tcp");
        let snap = Snapshot::new(
            vec![node("a", "ns1"), node("b", "ns1"), node("lonely", "ns1")],
            vec![e],
        );
        let hidden = hide(&snap, "protocol = tcp", EdgeMode::All);
        assert!(!hidden.nodes.contains("lonely"));
    }

    #[test]
    fn directly_matched_boxes_are_not_hidden() {
        let mut b = node("box1", "ns1");
        b.is_box = true;
        let mut child = node("child", "ns2");
        child.parent = Some("box1".into());
        let snap = Snapshot::new(vec![b, child], vec![]);

        // the box matches ns1 but still has a visible child
        let hidden = hide(&snap, "namespace = ns1", EdgeMode::All);
        assert!(!hidden.nodes.contains("box1"));
        assert!(!hidden.nodes.contains("child"));
    }

    #[test]
    fn empty_boxes_collapse_transitively() {
        let mut outer = Node::new("outer");
        outer.is_box = true;
        let mut inner = Node::new("inner");
        inner.is_box = true;
        inner.parent = Some("outer".into());
        let mut leaf = node("leaf", "ns1");
        leaf.parent = Some("inner".into());
        let snap = Snapshot::new(vec![outer, inner, leaf], vec![]);

        let hidden = hide(&snap, "namespace = ns1", EdgeMode::All);
        assert!(hidden.nodes.contains("leaf"));
        assert!(hidden.nodes.contains("inner"));
        assert!(hidden.nodes.contains("outer"));
    }

    #[test]
    fn edge_mode_none_hides_every_edge() {
        let snap = Snapshot::new(
            vec![node("a", "ns1"), node("b", "ns1")],
            vec![Edge::new("ab", "a", "b")],
        );
        let hidden = hide(&snap, "", EdgeMode::None);
        assert!(hidden.edges.contains("ab"));
        assert!(hidden.nodes.is_empty());
    }

    #[test]
    fn edge_mode_unhealthy_keeps_edges_with_health_status() {
        let mut healthy = Edge::new("h", "a", "b");
        healthy.attrs.set("healthStatus", "Healthy");
        let unhealthy = Edge::new("u", "a", "b");
        let snap = Snapshot::new(vec![node("a", "ns1"), node("b", "ns1")], vec![healthy, unhealthy]);

        let hidden = hide(&snap, "", EdgeMode::Unhealthy);
        assert!(!hidden.edges.contains("h"));
        assert!(hidden.edges.contains("u"));
    }

    #[test]
    fn cascade_is_idempotent_per_inputs() {
        let mut e = Edge::new("ab", "a", "b");
        e.attrs.set("protocol", "tcp");
        let snap = Snapshot::new(vec![node("a", "ns1"), node("b", "ns2")], vec![e]);

        let first = hide(&snap, "namespace = ns1 OR protocol = tcp", EdgeMode::All);
        let second = hide(&snap, "namespace = ns1 OR protocol = tcp", EdgeMode::All);
        assert_eq!(first, second);
    }

    #[test]
    fn engine_restores_previous_hides() {
        let snap = Snapshot::new(
            vec![node("a", "ns1"), node("b", "ns2")],
            vec![Edge::new("ab", "a", "b")],
        );
        let table = FieldTable::traffic_graph();
        let mut engine = HideEngine::new();

        let q = parse_query("namespace = ns1", &table).unwrap();
        let out = engine.recompute(&snap, q.node_selector.as_ref(), None, EdgeMode::All);
        assert!(out.restored_nodes.is_empty());
        assert!(out.hidden.nodes.contains("a"));

        // clearing the hide text restores exactly what the last run hid
        let out = engine.recompute(&snap, None, None, EdgeMode::All);
        assert_eq!(out.restored_nodes, vec!["a".to_string()]);
        assert_eq!(out.restored_edges, vec!["ab".to_string()]);
        assert!(out.hidden.is_empty());
    }

    #[test]
    fn engine_drops_elements_missing_from_the_snapshot() {
        let snap = Snapshot::new(
            vec![node("a", "ns1"), node("b", "ns2")],
            vec![Edge::new("ab", "a", "b")],
        );
        let table = FieldTable::traffic_graph();
        let mut engine = HideEngine::new();

        let q = parse_query("namespace = ns1", &table).unwrap();
        engine.recompute(&snap, q.node_selector.as_ref(), None, EdgeMode::All);

        // node a and its edge left the snapshot; they are not restored
        let smaller = Snapshot::new(vec![node("b", "ns2")], vec![]);
        let out = engine.recompute(&smaller, None, None, EdgeMode::All);
        assert!(out.restored_nodes.is_empty());
        assert!(out.restored_edges.is_empty());
    }
}
