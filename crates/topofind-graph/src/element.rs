//! Element snapshot model
//!
//! Nodes and edges carry open, string-keyed attribute bags rather than a
//! closed struct per element type; arbitrary attributes (k8s labels, rate
//! counters, health status) are decorated upstream by graph construction.
//! An absent attribute is a first-class outcome, distinct from `false`,
//! `0`, or the empty string.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Attribute bags
// ============================================================================

/// One attribute value: text, number, or boolean flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// String rendition used by the string-comparing operators; whole
    /// numbers render without a decimal point.
    pub fn rendition(&self) -> String {
        match self {
            AttrValue::Text(s) => s.clone(),
            AttrValue::Flag(b) => b.to_string(),
            AttrValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Flag(_) | AttrValue::Text(_) => None,
        }
    }

    /// Presence-style truthiness: false flags, zero/NaN numbers, and empty
    /// strings are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Flag(b) => *b,
            AttrValue::Number(n) => *n != 0.0 && !n.is_nan(),
            AttrValue::Text(s) => !s.is_empty(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> AttrValue {
        AttrValue::Text(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> AttrValue {
        AttrValue::Number(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> AttrValue {
        AttrValue::Flag(b)
    }
}

/// Typed wrapper over the open attribute map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrBag(AHashMap<String, AttrValue>);

impl AttrBag {
    pub fn new() -> AttrBag {
        AttrBag::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, val: impl Into<AttrValue>) {
        self.0.insert(key.into(), val.into());
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(AttrValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(AttrValue::as_number)
    }

    /// Truthiness of an attribute; absent is falsy.
    pub fn is_truthy(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(AttrValue::is_truthy)
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for AttrBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> AttrBag {
        AttrBag(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// Elements
// ============================================================================

/// A topology node. Boxes (groups) contain child nodes via the children's
/// `parent` reference; a box's visibility is derived from its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, rename = "isBox", skip_serializing_if = "std::ops::Not::not")]
    pub is_box: bool,
    #[serde(default)]
    pub attrs: AttrBag,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Node {
        Node {
            id: id.into(),
            parent: None,
            is_box: false,
            attrs: AttrBag::new(),
        }
    }
}

/// A directed edge between two nodes of the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub attrs: AttrBag,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Edge {
        Edge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            attrs: AttrBag::new(),
        }
    }
}

/// One immutable snapshot of the rendered topology.
///
/// Edge endpoints are assumed valid: a dangling endpoint is a precondition
/// violation by the graph-construction collaborator, not a handled error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Snapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Snapshot {
        Snapshot { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.iter().any(|e| e.id == id)
    }

    /// All edges touching `node_id`, as source or target.
    pub fn edges_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges
            .iter()
            .filter(move |e| e.source == node_id || e.target == node_id)
    }

    /// Transitive non-box members of a box node. Nested boxes are traversed
    /// but not themselves reported; a box with only empty sub-boxes has no
    /// descendants.
    pub fn descendants<'a>(&'a self, box_node: &Node) -> Vec<&'a Node> {
        let mut result = Vec::new();
        if !box_node.is_box {
            return result;
        }

        for child in self
            .nodes
            .iter()
            .filter(|n| n.parent.as_deref() == Some(box_node.id.as_str()))
        {
            if child.is_box {
                result.extend(self.descendants(child));
            } else {
                result.push(child);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_attributes_are_distinct_from_falsy_values() {
        let mut attrs = AttrBag::new();
        attrs.set("present", 0.0);

        assert!(attrs.get("present").is_some());
        assert!(!attrs.is_truthy("present"));
        assert!(attrs.get("absent").is_none());
        assert!(!attrs.is_truthy("absent"));
    }

    #[test]
    fn descendants_traverse_nested_boxes() {
        let mut outer = Node::new("outer");
        outer.is_box = true;
        let mut inner = Node::new("inner");
        inner.is_box = true;
        inner.parent = Some("outer".into());
        let mut leaf = Node::new("leaf");
        leaf.parent = Some("inner".into());

        let snap = Snapshot::new(vec![outer, inner, leaf], vec![]);
        let outer = snap.node("outer").unwrap();
        let ids: Vec<&str> = snap.descendants(outer).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["leaf"]);
    }

    #[test]
    fn snapshot_deserializes_from_json() {
        let json = r#"{
            "nodes": [
                {"id": "a", "attrs": {"namespace": "ns1", "httpIn": 5.5, "isIdle": true}},
                {"id": "box", "isBox": true}
            ],
            "edges": [
                {"id": "e", "source": "a", "target": "a", "attrs": {"protocol": "http"}}
            ]
        }"#;
        let snap: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.nodes.len(), 2);
        assert!(snap.node("box").unwrap().is_box);
        assert_eq!(snap.node("a").unwrap().attrs.number("httpIn"), Some(5.5));
        assert_eq!(snap.edges[0].attrs.text("protocol"), Some("http"));
    }
}
