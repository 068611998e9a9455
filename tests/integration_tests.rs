//! Integration tests for the complete find/hide pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - query text → parser → selector pair
//! - selector pair → evaluation → find highlight
//! - selector pair → visibility cascade → hidden sets
//!
//! Run with: cargo test --test integration_tests

use topofind_dsl::{parse_find_query, parse_hide_query, FieldTable};
use topofind_graph::{
    compute_hidden, find_matches, Edge, EdgeMode, FindEngine, HideEngine, Node, Snapshot,
};

fn node(id: &str, namespace: &str, app: &str) -> Node {
    let mut n = Node::new(id);
    n.attrs.set("namespace", namespace);
    n.attrs.set("app", app);
    n
}

fn edge(id: &str, source: &str, target: &str, protocol: &str, rate: f64) -> Edge {
    let mut e = Edge::new(id, source, target);
    e.attrs.set("protocol", protocol);
    e.attrs.set("http", rate);
    e
}

/// A small bookinfo-shaped topology: ingress -> productpage -> reviews ->
/// ratings, with productpage and reviews boxed by namespace.
fn bookinfo() -> Snapshot {
    let mut ns_box = Node::new("box-bookinfo");
    ns_box.is_box = true;

    let mut productpage = node("productpage", "bookinfo", "productpage");
    productpage.parent = Some("box-bookinfo".into());
    productpage.attrs.set("httpIn", 8.2);

    let mut reviews = node("reviews", "bookinfo", "reviews");
    reviews.parent = Some("box-bookinfo".into());
    reviews.attrs.set("httpIn", 4.1);

    let ingress = node("ingress", "istio-system", "ingressgateway");
    let mut ratings = node("ratings", "bookinfo2", "ratings");
    ratings.attrs.set("isIdle", true);

    Snapshot::new(
        vec![ns_box, ingress, productpage, reviews, ratings],
        vec![
            edge("e1", "ingress", "productpage", "http", 8.2),
            edge("e2", "productpage", "reviews", "http", 4.1),
            edge("e3", "reviews", "ratings", "tcp", 0.0),
        ],
    )
}

// ============================================================================
// Parse → find
// ============================================================================

#[test]
fn test_find_by_namespace() {
    let snap = bookinfo();
    let q = parse_find_query("ns = bookinfo", &FieldTable::traffic_graph()).unwrap();
    let matched = find_matches(&snap, q.node_selector.as_ref(), q.edge_selector.as_ref());
    assert_eq!(matched, vec!["productpage".to_string(), "reviews".to_string()]);
}

#[test]
fn test_find_mixed_node_and_edge_criteria_across_or() {
    let snap = bookinfo();
    let q = parse_find_query(
        "app = ratings or protocol = tcp",
        &FieldTable::traffic_graph(),
    )
    .unwrap();
    let matched = find_matches(&snap, q.node_selector.as_ref(), q.edge_selector.as_ref());
    assert_eq!(matched, vec!["ratings".to_string(), "e3".to_string()]);
}

#[test]
fn test_find_numeric_rate() {
    let snap = bookinfo();
    let q = parse_find_query("httpin > 5", &FieldTable::traffic_graph()).unwrap();
    let matched = find_matches(&snap, q.node_selector.as_ref(), q.edge_selector.as_ref());
    assert_eq!(matched, vec!["productpage".to_string()]);
}

#[test]
fn test_find_name_sugar_matches_any_name_attribute() {
    let snap = bookinfo();
    let q = parse_find_query("name = reviews", &FieldTable::traffic_graph()).unwrap();
    let matched = find_matches(&snap, q.node_selector.as_ref(), q.edge_selector.as_ref());
    assert_eq!(matched, vec!["reviews".to_string()]);
}

#[test]
fn test_find_does_not_disturb_hide_state() {
    let snap = bookinfo();
    let table = FieldTable::traffic_graph();

    let hide = parse_hide_query("ns = bookinfo2", &table).unwrap();
    let hidden = compute_hidden(
        &snap,
        hide.node_selector.as_ref(),
        hide.edge_selector.as_ref(),
        EdgeMode::All,
    );
    assert!(hidden.nodes.contains("ratings"));

    // find still sees the hidden element; highlight has no cascade
    let find = parse_find_query("app = ratings", &table).unwrap();
    let matched = find_matches(&snap, find.node_selector.as_ref(), find.edge_selector.as_ref());
    assert_eq!(matched, vec!["ratings".to_string()]);
}

// ============================================================================
// Parse → hide cascade
// ============================================================================

#[test]
fn test_hide_namespace_cascades_to_edges() {
    // spec scenario: hiding ns1 hides A and the A->B edge; B stays visible
    let snap = Snapshot::new(
        vec![node("a", "ns1", "a"), node("b", "ns2", "b")],
        vec![edge("ab", "a", "b", "http", 1.0)],
    );
    let q = parse_hide_query("namespace = ns1", &FieldTable::traffic_graph()).unwrap();
    let hidden = compute_hidden(
        &snap,
        q.node_selector.as_ref(),
        q.edge_selector.as_ref(),
        EdgeMode::All,
    );

    assert!(hidden.nodes.contains("a"));
    assert!(hidden.edges.contains("ab"));
    assert!(!hidden.nodes.contains("b"));
}

#[test]
fn test_hide_edges_starves_nodes_but_spares_idle() {
    let snap = bookinfo();
    let q = parse_hide_query("protocol = tcp", &FieldTable::traffic_graph()).unwrap();
    let hidden = compute_hidden(
        &snap,
        q.node_selector.as_ref(),
        q.edge_selector.as_ref(),
        EdgeMode::All,
    );

    assert!(hidden.edges.contains("e3"));
    // ratings lost its only edge but is an explicit idle node
    assert!(!hidden.nodes.contains("ratings"));
    // reviews keeps e2, stays visible
    assert!(!hidden.nodes.contains("reviews"));
}

#[test]
fn test_hide_whole_namespace_collapses_its_box() {
    let snap = bookinfo();
    let q = parse_hide_query("ns = bookinfo", &FieldTable::traffic_graph()).unwrap();
    let hidden = compute_hidden(
        &snap,
        q.node_selector.as_ref(),
        q.edge_selector.as_ref(),
        EdgeMode::All,
    );

    assert!(hidden.nodes.contains("productpage"));
    assert!(hidden.nodes.contains("reviews"));
    assert!(hidden.nodes.contains("box-bookinfo"));
    // every edge touched a hidden node
    assert!(hidden.edges.contains("e1"));
    assert!(hidden.edges.contains("e2"));
    assert!(hidden.edges.contains("e3"));
    assert!(!hidden.nodes.contains("ingress"));
}

#[test]
fn test_hide_engine_round_trip_restores_everything() {
    let snap = bookinfo();
    let table = FieldTable::traffic_graph();
    let mut engine = HideEngine::new();

    let q = parse_hide_query("ns = bookinfo", &table).unwrap();
    let out = engine.recompute(
        &snap,
        q.node_selector.as_ref(),
        q.edge_selector.as_ref(),
        EdgeMode::All,
    );
    let hidden_before = out.hidden.clone();
    assert!(!hidden_before.is_empty());

    let out = engine.recompute(&snap, None, None, EdgeMode::All);
    let mut expected_nodes: Vec<String> = hidden_before.nodes.iter().cloned().collect();
    expected_nodes.sort();
    assert_eq!(out.restored_nodes, expected_nodes);
    assert!(out.hidden.is_empty());
}

#[test]
fn test_edge_mode_applies_without_hide_text() {
    let snap = bookinfo();
    let hidden = compute_hidden(&snap, None, None, EdgeMode::None);
    assert_eq!(hidden.edges.len(), snap.edges.len());
    assert!(hidden.nodes.is_empty());
}

// ============================================================================
// Engines together
// ============================================================================

#[test]
fn test_find_and_hide_run_against_the_same_snapshot() {
    let snap = bookinfo();
    let table = FieldTable::traffic_graph();
    let mut hide_engine = HideEngine::new();
    let mut find_engine = FindEngine::new();

    let hide = parse_hide_query("protocol = tcp", &table).unwrap();
    hide_engine.recompute(
        &snap,
        hide.node_selector.as_ref(),
        hide.edge_selector.as_ref(),
        EdgeMode::All,
    );

    let find = parse_find_query("httpin > 5", &table).unwrap();
    let out = find_engine.recompute(&snap, find.node_selector.as_ref(), find.edge_selector.as_ref());
    assert_eq!(out.matched, vec!["productpage".to_string()]);

    // user error in the hide field: previous hidden state is kept, the
    // caller just surfaces the message
    let err = parse_hide_query("protocol = tcp AND httpin > 5", &table).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Hide: Invalid expression. Can not AND node and edge criteria."
    );
    assert!(!hide_engine.hidden().is_empty());
}

#[test]
fn test_snapshot_json_round_trip() {
    let snap = bookinfo();
    let json = serde_json::to_string(&snap).unwrap();
    let back: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snap, back);
}
