// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan queries: one equality filter, one sort field, paging

use crate::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// Equality filter on a single field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

/// A scan over one collection
///
/// Without `sort_by`, documents come back in insertion order. Sorting is
/// stable, ascending unless `descending` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub sort_by: Option<String>,
    pub descending: bool,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl Query {
    /// Every document in insertion order
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matching(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    pub fn sorted_by_desc(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self.descending = true;
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Run the query over documents held in insertion order
    pub fn apply<'a>(&self, docs: impl Iterator<Item = &'a Document>) -> Vec<Document> {
        let mut matched: Vec<&Document> = docs
            .filter(|doc| self.filter.as_ref().map_or(true, |f| f.matches(doc)))
            .collect();

        if let Some(field) = &self.sort_by {
            if self.descending {
                matched.sort_by(|a, b| compare_values(b.get(field), a.get(field)));
            } else {
                matched.sort_by(|a, b| compare_values(a.get(field), b.get(field)));
            }
        }

        let page = matched.into_iter().skip(self.skip);
        match self.limit {
            Some(limit) => page.take(limit).cloned().collect(),
            None => page.cloned().collect(),
        }
    }
}

/// Total order over optional JSON values: missing < null < bool < number < string < other
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => compare_numbers(x, y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn compare_numbers(x: &serde_json::Number, y: &serde_json::Number) -> Ordering {
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x.cmp(&y);
    }
    let x = x.as_f64().unwrap_or(f64::NAN);
    let y = y.as_f64().unwrap_or(f64::NAN);
    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
