//! Trigger conditions and the trigger evaluator.
//!
//! A trigger pairs an event type with a single field condition. The
//! evaluator is a pure predicate: it never errors, and anything it cannot
//! interpret (absent field, unknown operator, mismatched types) is simply
//! not a match.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;

/// The kind of domain event a workflow listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// A new insight was produced.
    OnInsight,
    /// A prediction was produced.
    OnPrediction,
    /// A tracked entity changed.
    OnEntityChange,
    /// A risk assessment was produced.
    OnRisk,
    /// Any other domain event.
    OnEvent,
}

impl TriggerType {
    /// Returns the wire name of the trigger type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnInsight => "on_insight",
            Self::OnPrediction => "on_prediction",
            Self::OnEntityChange => "on_entity_change",
            Self::OnRisk => "on_risk",
            Self::OnEvent => "on_event",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a trigger condition.
///
/// Operators outside the supported set are kept verbatim in `Unknown` so
/// that stored workflows round-trip; they never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Gt,
    Lt,
    Eq,
    Contains,
    Unknown(String),
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "gt" => Self::Gt,
            "lt" => Self::Lt,
            "eq" => Self::Eq,
            "contains" => Self::Contains,
            _ => Self::Unknown(value),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Gt => "gt".to_string(),
            Operator::Lt => "lt".to_string(),
            Operator::Eq => "eq".to_string(),
            Operator::Contains => "contains".to_string(),
            Operator::Unknown(raw) => raw,
        }
    }
}

/// A single-field condition evaluated against an event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Top-level payload field to inspect.
    pub field: String,
    pub operator: Operator,
    /// Value the field is compared against.
    pub value: JsonValue,
}

impl Condition {
    /// Creates a new condition.
    #[must_use]
    pub fn new(field: impl Into<String>, operator: Operator, value: JsonValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// The trigger attached to a workflow version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    /// Node id for telemetry correlation. Triggers without one emit no telemetry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub condition: Condition,
}

impl Trigger {
    /// Creates a trigger without a telemetry node id.
    #[must_use]
    pub fn new(trigger_type: TriggerType, condition: Condition) -> Self {
        Self {
            trigger_type,
            node_id: None,
            condition,
        }
    }

    /// Sets the telemetry node id.
    #[must_use]
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Returns true if the payload satisfies this trigger's condition.
    #[must_use]
    pub fn matches(&self, payload: &JsonValue) -> bool {
        evaluate(&self.condition, payload)
    }
}

/// Evaluates a condition against an event payload.
///
/// - An absent field is never a match.
/// - `gt`/`lt` compare number with number or string with string; any other
///   pairing is not a match.
/// - `eq` is strict JSON equality, except that numbers compare by value.
/// - `contains` checks membership for arrays and substring containment of
///   the string forms otherwise.
/// - Unknown operators are never a match.
#[must_use]
pub fn evaluate(condition: &Condition, payload: &JsonValue) -> bool {
    let Some(actual) = payload.get(&condition.field) else {
        return false;
    };
    let expected = &condition.value;

    match &condition.operator {
        Operator::Gt => compare(actual, expected) == Some(Ordering::Greater),
        Operator::Lt => compare(actual, expected) == Some(Ordering::Less),
        Operator::Eq => values_equal(actual, expected),
        Operator::Contains => match actual {
            JsonValue::Array(items) => items.iter().any(|item| values_equal(item, expected)),
            other => string_form(other).contains(&string_form(expected)),
        },
        Operator::Unknown(raw) => {
            tracing::debug!(operator = %raw, field = %condition.field, "unknown trigger operator");
            false
        }
    }
}

fn compare(actual: &JsonValue, expected: &JsonValue) -> Option<Ordering> {
    match (actual, expected) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Renders a value the way a user would type it: strings without quotes,
/// integral floats without a trailing `.0`.
fn string_form(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
