//! Field resolver
//!
//! Maps field mnemonics (`ns`, `svc`, `rt`, ...) to canonical attribute
//! names and target kinds, producing leaf predicates. One resolver serves
//! every topology view; each view injects its own [`FieldTable`] (the
//! traffic graph and the mesh overview share the grammar but not the
//! vocabulary).
//!
//! Some fields resolve to more than one predicate:
//! - `name` is sugar for "any of app, service, workload, or aggregate
//!   value"; non-negated it contributes one OR branch per attribute,
//!   negated it contributes a single AND branch (De Morgan).
//! - `healthy` negated expands to "status is none of Healthy / No health
//!   information / Not Ready".
//!
//! Fields that imply a display option report a [`DisplayHint`] instead of
//! firing a callback, keeping resolution pure.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::parser::ParseError;
use crate::selector::{SelectAnd, SelectExp, SelectOp, SelectValue, Target};

// ============================================================================
// Display hints
// ============================================================================

/// A display option a query implies (using a filter implies wanting to see
/// the thing being filtered). The caller decides whether the option is
/// already on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayHint {
    Rank,
    SecurityBadges,
    ResponseTimeLabels,
    ThroughputLabels,
    IdleNodes,
}

impl DisplayHint {
    /// Informational notice shown to the user when the caller turns the
    /// option on for a find/hide expression.
    pub fn notice(&self) -> &'static str {
        match self {
            DisplayHint::Rank => "Enabling \"Rank\" display option for find/hide expression",
            DisplayHint::SecurityBadges => {
                "Enabling \"Security\" display option for find/hide expression"
            }
            DisplayHint::ResponseTimeLabels => {
                "Enabling \"Response Time\" edge labels for find/hide expression"
            }
            DisplayHint::ThroughputLabels => {
                "Enabling \"Throughput\" edge labels for find/hide expression"
            }
            DisplayHint::IdleNodes => {
                "Enabling \"Idle nodes\" display option for find/hide expression"
            }
        }
    }
}

fn push_hint(hints: &mut Vec<DisplayHint>, hint: Option<DisplayHint>) {
    if let Some(hint) = hint {
        if !hints.contains(&hint) {
            hints.push(hint);
        }
    }
}

// ============================================================================
// Field tables
// ============================================================================

/// Health status names shared by every view.
const STATUS_HEALTHY: &str = "Healthy";
const STATUS_NA: &str = "No health information";
const STATUS_NOT_READY: &str = "Not Ready";

/// Allowed values of an enumerated field: `(spelling, canonical)` pairs plus
/// the text used in the rejection message.
struct EnumSpec {
    values: &'static [(&'static str, &'static str)],
    label: &'static str,
    expected: &'static str,
}

enum BinaryKind {
    /// Plain string attribute test.
    Text,
    /// Numeric attribute; comparisons require a numeric value, `=`/`!=`
    /// against a non-numeric marker degrade to a presence test.
    Numeric,
    /// Numeric, additionally validated to lie in 1..=100.
    Rank,
    /// Value restricted to an enumerated set, short forms canonicalized.
    Enumerated(EnumSpec),
    /// Sugar over several name-like attributes.
    Name(&'static [&'static str]),
}

struct BinaryField {
    attr: &'static str,
    target: Target,
    kind: BinaryKind,
    hint: Option<DisplayHint>,
}

enum UnaryKind {
    /// truthy / falsy on a boolean-like attribute.
    Flag,
    /// `> 0` / `<= 0` on a numeric attribute (mtls percentage, label counts).
    NumericPresence,
    /// Bespoke expansion over the health status attribute.
    Healthy,
}

struct UnaryField {
    attr: &'static str,
    target: Target,
    kind: UnaryKind,
    hint: Option<DisplayHint>,
}

/// Per-view vocabulary: binary fields, unary fields, and whether dynamic
/// `label:` fields are recognized.
pub struct FieldTable {
    binary: HashMap<&'static str, BinaryField>,
    unary: HashMap<&'static str, UnaryField>,
    labels: bool,
}

/// A term resolved against the table. `One` joins the enclosing AND clause,
/// `All` splices several conjuncts into it, `Any` contributes whole OR
/// branches directly.
pub(crate) enum ResolvedSelector {
    One(SelectExp),
    All(Vec<SelectExp>),
    Any(Vec<SelectAnd>),
}

pub(crate) struct ResolvedTerm {
    pub target: Target,
    pub selector: ResolvedSelector,
}

impl ResolvedTerm {
    fn one(target: Target, exp: SelectExp) -> ResolvedTerm {
        ResolvedTerm {
            target,
            selector: ResolvedSelector::One(exp),
        }
    }
}

/// Sanitize a dynamic field name (e.g. `label:topology.kiali.io/zone`) into
/// a safe attribute identifier, matching how the graph decorates label
/// attributes onto nodes.
pub fn to_safe_field_name(field: &str) -> String {
    field
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

impl FieldTable {
    /// The traffic-graph vocabulary (legacy and current renderers share it).
    pub fn traffic_graph() -> FieldTable {
        let mut t = FieldTable {
            binary: HashMap::new(),
            unary: HashMap::new(),
            labels: true,
        };

        // nodes...
        t.text(&["app"], Target::Node, "app", None);
        t.text(&["cluster"], Target::Node, "cluster", None);
        t.text(&["ns", "namespace"], Target::Node, "namespace", None);
        t.text(&["op", "operation"], Target::Node, "aggregateValue", None);
        t.text(&["svc", "service"], Target::Node, "service", None);
        t.text(&["version"], Target::Node, "version", None);
        t.text(&["wl", "workload"], Target::Node, "workload", None);
        t.numeric(&["grpcin"], Target::Node, "grpcIn", None);
        t.numeric(&["grpcout"], Target::Node, "grpcOut", None);
        t.numeric(&["httpin"], Target::Node, "httpIn", None);
        t.numeric(&["httpout"], Target::Node, "httpOut", None);
        t.numeric(&["tcpin"], Target::Node, "tcpIn", None);
        t.numeric(&["tcpout"], Target::Node, "tcpOut", None);
        t.binary.insert(
            "rank",
            BinaryField {
                attr: "rank",
                target: Target::Node,
                kind: BinaryKind::Rank,
                hint: Some(DisplayHint::Rank),
            },
        );
        t.binary.insert(
            "name",
            BinaryField {
                attr: "name",
                target: Target::Node,
                kind: BinaryKind::Name(&["aggregateValue", "app", "service", "workload"]),
                hint: None,
            },
        );
        t.binary.insert(
            "node",
            BinaryField {
                attr: "nodeType",
                target: Target::Node,
                kind: BinaryKind::Enumerated(EnumSpec {
                    values: &[
                        ("aggregate", "aggregate"),
                        ("op", "aggregate"),
                        ("operation", "aggregate"),
                        ("app", "app"),
                        ("svc", "service"),
                        ("service", "service"),
                        ("unknown", "unknown"),
                        ("wl", "workload"),
                        ("workload", "workload"),
                    ],
                    label: "node type",
                    expected: "app | operation | service | unknown | workload",
                }),
                hint: None,
            },
        );

        // edges...
        t.text(
            &["destprincipal"],
            Target::Edge,
            "destPrincipal",
            Some(DisplayHint::SecurityBadges),
        );
        t.text(
            &["sourceprincipal"],
            Target::Edge,
            "sourcePrincipal",
            Some(DisplayHint::SecurityBadges),
        );
        t.text(&["protocol"], Target::Edge, "protocol", None);
        t.numeric(&["grpc"], Target::Edge, "grpc", None);
        t.numeric(&["%grpcerr", "%grpcerror"], Target::Edge, "grpcPercentErr", None);
        t.numeric(&["%grpctraffic"], Target::Edge, "grpcPercentReq", None);
        t.numeric(&["http"], Target::Edge, "http", None);
        t.numeric(&["%httperr", "%httperror"], Target::Edge, "httpPercentErr", None);
        t.numeric(&["%httptraffic"], Target::Edge, "httpPercentReq", None);
        t.numeric(&["tcp"], Target::Edge, "tcp", None);
        t.numeric(
            &["rt", "responsetime"],
            Target::Edge,
            "responseTime",
            Some(DisplayHint::ResponseTimeLabels),
        );
        t.numeric(
            &["throughput"],
            Target::Edge,
            "throughput",
            Some(DisplayHint::ThroughputLabels),
        );

        // unary node operands...
        t.flag(&["cb", "circuitbreaker"], Target::Node, "hasCB", None);
        t.flag(&["dead"], Target::Node, "isDead", None);
        t.flag(&["fi", "faultinjection"], Target::Node, "hasFaultInjection", None);
        t.flag(&["idle"], Target::Node, "isIdle", Some(DisplayHint::IdleNodes));
        t.flag(&["inaccessible"], Target::Node, "isInaccessible", None);
        t.flag(&["mirroring"], Target::Node, "hasMirroring", None);
        t.flag(&["outside", "outsider"], Target::Node, "isOutside", None);
        t.flag(&["rr", "requestrouting"], Target::Node, "hasRequestRouting", None);
        t.flag(&["rto", "requesttimeout"], Target::Node, "hasRequestTimeout", None);
        t.flag(&["se", "serviceentry"], Target::Node, "isServiceEntry", None);
        t.flag(&["sc", "sidecar"], Target::Node, "isOutOfMesh", None);
        t.flag(
            &["tcpts", "tcptrafficshifting"],
            Target::Node,
            "hasTCPTrafficShifting",
            None,
        );
        t.flag(&["ts", "trafficshifting"], Target::Node, "hasTrafficShifting", None);
        t.flag(&["trafficsource", "root"], Target::Node, "isRoot", None);
        t.flag(&["vs", "virtualservice"], Target::Node, "hasVS", None);
        t.flag(&["we", "workloadentry"], Target::Node, "hasWorkloadEntry", None);
        t.unary.insert(
            "healthy",
            UnaryField {
                attr: "healthStatus",
                target: Target::Node,
                kind: UnaryKind::Healthy,
                hint: None,
            },
        );

        // unary edge operands...
        t.unary.insert(
            "mtls",
            UnaryField {
                attr: "isMTLS",
                target: Target::Edge,
                kind: UnaryKind::NumericPresence,
                hint: Some(DisplayHint::SecurityBadges),
            },
        );
        t.flag(&["traffic"], Target::Edge, "hasTraffic", None);

        t
    }

    /// The mesh-overview vocabulary: a handful of infra fields, no edge
    /// criteria beyond mtls.
    pub fn mesh() -> FieldTable {
        let mut t = FieldTable {
            binary: HashMap::new(),
            unary: HashMap::new(),
            labels: true,
        };

        t.text(&["cluster"], Target::Node, "cluster", None);
        t.text(&["name"], Target::Node, "infraName", None);
        t.text(&["ns", "namespace"], Target::Node, "namespace", None);
        t.binary.insert(
            "node",
            BinaryField {
                attr: "nodeType",
                target: Target::Node,
                kind: BinaryKind::Enumerated(EnumSpec {
                    values: &[("box", "box"), ("infra", "infra")],
                    label: "node type",
                    expected: "box | infra",
                }),
                hint: None,
            },
        );
        for key in ["type", "infratype"] {
            t.binary.insert(
                key,
                BinaryField {
                    attr: "infraType",
                    target: Target::Node,
                    kind: BinaryKind::Enumerated(EnumSpec {
                        values: &[
                            ("cluster", "cluster"),
                            ("istiod", "istiod"),
                            ("kiali", "kiali"),
                            ("namespace", "namespace"),
                            ("metricstore", "metricStore"),
                            ("ms", "metricStore"),
                            ("prom", "metricStore"),
                            ("prometheus", "metricStore"),
                            ("tracestore", "traceStore"),
                            ("ts", "traceStore"),
                            ("jaeger", "traceStore"),
                            ("tempo", "traceStore"),
                        ],
                        label: "infra type",
                        expected: "cluster | istiod | kiali | metricStore | namespace | traceStore",
                    }),
                    hint: None,
                },
            );
        }

        t.flag(&["inaccessible"], Target::Node, "isInaccessible", None);
        t.flag(&["outside", "outsider"], Target::Node, "isOutside", None);
        t.unary.insert(
            "healthy",
            UnaryField {
                attr: "healthStatus",
                target: Target::Node,
                kind: UnaryKind::Healthy,
                hint: None,
            },
        );
        t.unary.insert(
            "mtls",
            UnaryField {
                attr: "isMTLS",
                target: Target::Edge,
                kind: UnaryKind::NumericPresence,
                hint: None,
            },
        );

        t
    }

    fn text(
        &mut self,
        keys: &[&'static str],
        target: Target,
        attr: &'static str,
        hint: Option<DisplayHint>,
    ) {
        for key in keys {
            self.binary.insert(
                key,
                BinaryField {
                    attr,
                    target,
                    kind: BinaryKind::Text,
                    hint,
                },
            );
        }
    }

    fn numeric(
        &mut self,
        keys: &[&'static str],
        target: Target,
        attr: &'static str,
        hint: Option<DisplayHint>,
    ) {
        for key in keys {
            self.binary.insert(
                key,
                BinaryField {
                    attr,
                    target,
                    kind: BinaryKind::Numeric,
                    hint,
                },
            );
        }
    }

    fn flag(
        &mut self,
        keys: &[&'static str],
        target: Target,
        attr: &'static str,
        hint: Option<DisplayHint>,
    ) {
        for key in keys {
            self.unary.insert(
                key,
                UnaryField {
                    attr,
                    target,
                    kind: UnaryKind::Flag,
                    hint,
                },
            );
        }
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolve a binary term `field op val`.
    pub(crate) fn resolve_binary(
        &self,
        field: &str,
        op: SelectOp,
        val: &str,
        conjunctive: bool,
        hints: &mut Vec<DisplayHint>,
    ) -> Result<ResolvedTerm, ParseError> {
        let key = field.to_lowercase();

        let Some(spec) = self.binary.get(key.as_str()) else {
            // dynamic label fields bypass the fixed table; label keys keep
            // their original case
            if self.labels && field.starts_with("label:") {
                return Ok(ResolvedTerm::one(
                    Target::Node,
                    SelectExp::new(to_safe_field_name(field), op, SelectValue::text(val)),
                ));
            }
            return Err(ParseError::InvalidOperand(field.to_string()));
        };

        let term = match &spec.kind {
            BinaryKind::Text => ResolvedTerm::one(
                spec.target,
                SelectExp::new(spec.attr, op, SelectValue::text(val)),
            ),
            BinaryKind::Numeric => {
                ResolvedTerm::one(spec.target, numeric_exp(spec.attr, op, val)?)
            }
            BinaryKind::Rank => {
                let in_range = val
                    .trim()
                    .parse::<f64>()
                    .is_ok_and(|n| (1.0..=100.0).contains(&n));
                if !in_range {
                    return Err(ParseError::RankRange(val.to_string()));
                }
                ResolvedTerm::one(spec.target, numeric_exp(spec.attr, op, val)?)
            }
            BinaryKind::Enumerated(spec_enum) => {
                let wanted = val.to_lowercase();
                let canonical = spec_enum
                    .values
                    .iter()
                    .find(|(spelling, _)| *spelling == wanted)
                    .map(|(_, canonical)| *canonical)
                    .ok_or_else(|| ParseError::InvalidEnumValue {
                        label: spec_enum.label,
                        value: wanted.clone(),
                        expected: spec_enum.expected,
                    })?;
                ResolvedTerm::one(
                    spec.target,
                    SelectExp::new(spec.attr, op, SelectValue::text(canonical)),
                )
            }
            BinaryKind::Name(attrs) => {
                if conjunctive {
                    return Err(ParseError::NameConjunction);
                }
                let exps: Vec<SelectExp> = attrs
                    .iter()
                    .map(|attr| SelectExp::new(*attr, op, SelectValue::text(val)))
                    .collect();
                // negating an OR over names requires De Morgan's AND
                let selector = if op.is_negation() {
                    ResolvedSelector::Any(vec![exps])
                } else {
                    ResolvedSelector::Any(exps.into_iter().map(|e| vec![e]).collect())
                };
                ResolvedTerm {
                    target: spec.target,
                    selector,
                }
            }
        };

        push_hint(hints, spec.hint);
        Ok(term)
    }

    /// Resolve a unary term (`mtls`, `! healthy`, `label:region`, ...).
    /// `None` means the operand is unknown.
    pub(crate) fn resolve_unary(
        &self,
        operand: &str,
        negated: bool,
        hints: &mut Vec<DisplayHint>,
    ) -> Option<ResolvedTerm> {
        let key = operand.to_lowercase();

        let Some(spec) = self.unary.get(key.as_str()) else {
            // a bare label term tests whether the label is present at all
            if self.labels && operand.starts_with("label:") {
                return Some(ResolvedTerm::one(
                    Target::Node,
                    numeric_presence(&to_safe_field_name(operand), negated),
                ));
            }
            return None;
        };

        let term = match spec.kind {
            UnaryKind::Flag => ResolvedTerm::one(
                spec.target,
                SelectExp::presence(
                    spec.attr,
                    if negated { SelectOp::Falsy } else { SelectOp::Truthy },
                ),
            ),
            UnaryKind::NumericPresence => {
                ResolvedTerm::one(spec.target, numeric_presence(spec.attr, negated))
            }
            UnaryKind::Healthy => {
                if negated {
                    let exps = [STATUS_HEALTHY, STATUS_NA, STATUS_NOT_READY]
                        .iter()
                        .map(|status| {
                            SelectExp::new(spec.attr, SelectOp::NotEqual, SelectValue::text(*status))
                        })
                        .collect();
                    ResolvedTerm {
                        target: spec.target,
                        selector: ResolvedSelector::All(exps),
                    }
                } else {
                    ResolvedTerm::one(
                        spec.target,
                        SelectExp::new(spec.attr, SelectOp::Equal, SelectValue::text(STATUS_HEALTHY)),
                    )
                }
            }
        };

        push_hint(hints, spec.hint);
        Some(term)
    }
}

/// `> 0` / `<= 0` presence test on a numeric attribute.
fn numeric_presence(attr: &str, negated: bool) -> SelectExp {
    let op = if negated { SelectOp::LessEqual } else { SelectOp::Greater };
    SelectExp::new(attr, op, SelectValue::number(0.0))
}

/// Shared numeric-selector rule. Comparisons require a numeric value;
/// `=`/`!=` against a non-numeric marker degrade to a presence test, so
/// `httpin = NaN` means "no inbound http activity recorded".
fn numeric_exp(attr: &str, op: SelectOp, val: &str) -> Result<SelectExp, ParseError> {
    // "NaN" parses as a float here, but it is the "no value recorded" marker
    let parsed = val.trim().parse::<f64>().ok().filter(|n| !n.is_nan());

    match op {
        SelectOp::Greater | SelectOp::GreaterEqual | SelectOp::Less | SelectOp::LessEqual => {
            match parsed {
                Some(n) => Ok(SelectExp::new(attr, op, SelectValue::number(n))),
                None => Err(ParseError::NonNumericValue(val.to_string())),
            }
        }
        SelectOp::Equal => Ok(match parsed {
            Some(n) => SelectExp::new(attr, op, SelectValue::number(n)),
            None => SelectExp::presence(attr, SelectOp::Falsy),
        }),
        SelectOp::NotEqual => Ok(match parsed {
            Some(n) => SelectExp::new(attr, op, SelectValue::number(n)),
            None => SelectExp::presence(attr, SelectOp::Truthy),
        }),
        _ => Err(ParseError::NumericOperator(op.symbol().to_string())),
    }
}
