use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::index::{FieldValue, IndexDocument, IndexField};

/// Typed value a predicate compares a field against.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Date(DateTime<Utc>),
    Number(f64),
}

impl Scalar {
    /// Dates go to the index as epoch milliseconds, matching the stored documents.
    fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => json!(text),
            Self::Date(date) => json!(date.timestamp_millis()),
            Self::Number(number) => json!(number),
        }
    }

    fn compare(&self, value: FieldValue<'_>) -> Option<Ordering> {
        match (value, self) {
            (FieldValue::Keyword(actual), Self::Text(expected)) => Some(actual.cmp(expected.as_str())),
            (FieldValue::Date(Some(actual)), Self::Date(expected)) => Some(actual.cmp(expected)),
            (FieldValue::Number(Some(actual)), Self::Number(expected)) => actual.partial_cmp(expected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    pub value: Scalar,
    pub inclusive: bool,
}

impl RangeBound {
    pub fn exclusive(value: Scalar) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }

    pub fn inclusive(value: Scalar) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }
}

/// Index-level condition produced from a registry filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Term {
        field: IndexField,
        value: Scalar,
    },
    Terms {
        field: IndexField,
        values: Vec<Scalar>,
    },
    Range {
        field: IndexField,
        lower: Option<RangeBound>,
        upper: Option<RangeBound>,
    },
    /// Case-sensitive, unanchored substring.
    Contains {
        field: IndexField,
        needle: String,
    },
    /// At least one of the inner predicates holds.
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    pub fn term(field: IndexField, value: Scalar) -> Self {
        Self::Term { field, value }
    }

    /// Elasticsearch query DSL for this predicate.
    pub fn to_query(&self) -> Value {
        match self {
            Self::Term { field, value } => json!({ "term": { field.name(): value.to_json() } }),
            Self::Terms { field, values } => {
                let values: Vec<Value> = values.iter().map(Scalar::to_json).collect();
                json!({ "terms": { field.name(): values } })
            }
            Self::Range {
                field,
                lower,
                upper,
            } => {
                let mut bounds = serde_json::Map::new();
                if let Some(bound) = lower {
                    let operator = if bound.inclusive { "gte" } else { "gt" };
                    bounds.insert(operator.to_string(), bound.value.to_json());
                }
                if let Some(bound) = upper {
                    let operator = if bound.inclusive { "lte" } else { "lt" };
                    bounds.insert(operator.to_string(), bound.value.to_json());
                }
                json!({ "range": { field.name(): bounds } })
            }
            Self::Contains { field, needle } => json!({
                "wildcard": { field.name(): { "value": format!("*{}*", escape_wildcard(needle)) } }
            }),
            Self::AnyOf(predicates) => {
                let should: Vec<Value> = predicates.iter().map(Predicate::to_query).collect();
                json!({ "bool": { "should": should, "minimum_should_match": 1 } })
            }
        }
    }

    /// Evaluates the predicate against a stored document.
    pub fn matches(&self, document: &IndexDocument) -> bool {
        match self {
            Self::Term { field, value } => {
                value.compare(document.field(*field)) == Some(Ordering::Equal)
            }
            Self::Terms { field, values } => values
                .iter()
                .any(|value| value.compare(document.field(*field)) == Some(Ordering::Equal)),
            Self::Range {
                field,
                lower,
                upper,
            } => {
                let actual = document.field(*field);
                let above = lower.as_ref().map_or(true, |bound| {
                    // `compare` orders the document value against the bound.
                    match bound.value.compare(actual) {
                        Some(Ordering::Greater) => true,
                        Some(Ordering::Equal) => bound.inclusive,
                        _ => false,
                    }
                });
                let below = upper.as_ref().map_or(true, |bound| {
                    match bound.value.compare(actual) {
                        Some(Ordering::Less) => true,
                        Some(Ordering::Equal) => bound.inclusive,
                        _ => false,
                    }
                });
                above && below
            }
            Self::Contains { field, needle } => match document.field(*field) {
                FieldValue::Keyword(actual) => actual.contains(needle.as_str()),
                _ => false,
            },
            Self::AnyOf(predicates) => predicates.iter().any(|inner| inner.matches(document)),
        }
    }
}

/// Full search body: every predicate in a non-scoring `bool.filter`.
pub fn to_query_body(predicates: &[Predicate]) -> Value {
    let filter: Vec<Value> = predicates.iter().map(Predicate::to_query).collect();
    json!({
        "query": { "bool": { "filter": filter } },
        "sort": [{ "createdAt": "asc" }, { "id": "asc" }]
    })
}

fn escape_wildcard(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
