//! # Row Filters
//!
//! Filter expressions over row fields, combined with AND logic. Mass
//! "select all" actions resolve their targets from the active filter set on
//! the server, never from a client-submitted id list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive substring match on string fields
    Contains,
    /// Value is one of a list
    In,
}

/// A single filter condition on one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterExpr {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Gt, value)
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Contains, Value::String(needle.into()))
    }

    /// Whether a row's field map satisfies this condition.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        let actual = match fields.get(&self.field) {
            Some(v) if !v.is_null() => v,
            // Absent and null only match an explicit eq-null condition.
            _ => return self.operator == FilterOperator::Eq && self.value.is_null(),
        };

        match self.operator {
            FilterOperator::Eq => actual == &self.value,
            FilterOperator::Neq => actual != &self.value,
            FilterOperator::Gt => compare(actual, &self.value).map_or(false, |o| o > 0),
            FilterOperator::Gte => compare(actual, &self.value).map_or(false, |o| o >= 0),
            FilterOperator::Lt => compare(actual, &self.value).map_or(false, |o| o < 0),
            FilterOperator::Lte => compare(actual, &self.value).map_or(false, |o| o <= 0),
            FilterOperator::Contains => match (actual.as_str(), self.value.as_str()) {
                (Some(haystack), Some(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
            FilterOperator::In => self
                .value
                .as_array()
                .map_or(false, |list| list.contains(actual)),
        }
    }
}

/// Orders two values of the same family; mixed families do not compare.
fn compare(a: &Value, b: &Value) -> Option<i8> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64()?, y.as_f64()?);
            Some(if x < y {
                -1
            } else if x > y {
                1
            } else {
                0
            })
        }
        (Value::String(x), Value::String(y)) => Some(match x.cmp(y) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        }),
        _ => None,
    }
}

/// Conditions combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSet {
    pub filters: Vec<FilterExpr>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.filters.iter().all(|f| f.matches(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_eq_and_neq() {
        let f = FilterExpr::eq("status", json!("active"));
        assert!(f.matches(&fields(json!({"status": "active"}))));
        assert!(!f.matches(&fields(json!({"status": "done"}))));

        let f = FilterExpr::new("status", FilterOperator::Neq, json!("done"));
        assert!(f.matches(&fields(json!({"status": "active"}))));
    }

    #[test]
    fn test_ordering_operators() {
        let f = FilterExpr::gt("qty", json!(5));
        assert!(f.matches(&fields(json!({"qty": 6}))));
        assert!(!f.matches(&fields(json!({"qty": 5}))));
        // Mixed families never order.
        assert!(!f.matches(&fields(json!({"qty": "six"}))));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let f = FilterExpr::contains("name", "WiD");
        assert!(f.matches(&fields(json!({"name": "Widget"}))));
        assert!(!f.matches(&fields(json!({"name": "Gadget"}))));
    }

    #[test]
    fn test_in_list() {
        let f = FilterExpr::new("origin", FilterOperator::In, json!(["UA", "PL"]));
        assert!(f.matches(&fields(json!({"origin": "PL"}))));
        assert!(!f.matches(&fields(json!({"origin": "US"}))));
    }

    #[test]
    fn test_absent_field_matches_only_eq_null() {
        let f = FilterExpr::eq("origin", Value::Null);
        assert!(f.matches(&fields(json!({"name": "x"}))));
        assert!(f.matches(&fields(json!({"origin": null}))));
        let f = FilterExpr::eq("origin", json!("UA"));
        assert!(!f.matches(&fields(json!({"name": "x"}))));
    }

    #[test]
    fn test_filter_set_is_conjunction() {
        let set = FilterSet::new()
            .and(FilterExpr::eq("status", json!("active")))
            .and(FilterExpr::gt("qty", json!(0)));
        assert!(set.matches(&fields(json!({"status": "active", "qty": 2}))));
        assert!(!set.matches(&fields(json!({"status": "active", "qty": 0}))));
    }
}
