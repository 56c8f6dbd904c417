//! Object-store access. The store itself is external; this module only
//! describes the calls the hooks make and ships a REST and an in-memory
//! implementation.

use crate::types::error::AppError;
use crate::types::record::Record;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub mod collaborations;
pub mod memory;
pub mod models;
pub mod paging;
pub mod parse_service;
pub mod repository;
pub mod users;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` when no record has that id.
    async fn get(&self, class_name: &str, id: &str) -> Result<Option<Record>, AppError>;

    async fn find(&self, query: &Query) -> Result<Vec<Record>, AppError>;

    async fn count(&self, query: &Query) -> Result<u64, AppError>;

    /// Creates the record when it has no id, updates it otherwise.
    async fn save(&self, record: &Record) -> Result<Record, AppError>;

    /// Writes only `fields` onto an existing record; every other key keeps
    /// its stored value.
    async fn update(&self, class_name: &str, id: &str, fields: &Map<String, Value>) -> Result<(), AppError>;

    async fn destroy(&self, class_name: &str, id: &str) -> Result<(), AppError>;

    /// Verifies credentials and returns the user record.
    async fn log_in(&self, username: &str, password: &str) -> Result<Record, AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Equal(String, Value),
    NotEqual(String, Value),
    ContainedIn(String, Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub class_name: String,
    pub constraints: Vec<Constraint>,
    pub limit: Option<u64>,
    pub skip: u64,
}

impl Query {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            constraints: vec![],
            limit: None,
            skip: 0,
        }
    }

    pub fn equal_to(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::Equal(field.to_string(), value.into()));
        self
    }

    pub fn not_equal_to(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.constraints
            .push(Constraint::NotEqual(field.to_string(), value.into()));
        self
    }

    pub fn contained_in<V: Into<Value>>(
        mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.constraints.push(Constraint::ContainedIn(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Renders the constraints as the backend's `where` document.
    pub fn to_where(&self) -> Value {
        let mut per_field: Map<String, Value> = Map::new();
        for constraint in &self.constraints {
            let (field, op, value) = match constraint {
                Constraint::Equal(f, v) => (f, "$eq", v.clone()),
                Constraint::NotEqual(f, v) => (f, "$ne", v.clone()),
                Constraint::ContainedIn(f, vs) => (f, "$in", Value::Array(vs.clone())),
            };
            let ops = per_field
                .entry(field.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(ops) = ops {
                ops.insert(op.to_string(), value);
            }
        }

        // a lone equality is written as the bare value
        for ops in per_field.values_mut() {
            let bare = match ops {
                Value::Object(m) if m.len() == 1 => m.get("$eq").cloned(),
                _ => None,
            };
            if let Some(v) = bare {
                *ops = v;
            }
        }
        Value::Object(per_field)
    }

    pub fn matches(&self, record: &Record) -> bool {
        if record.class_name != self.class_name {
            return false;
        }
        self.constraints.iter().all(|c| match c {
            Constraint::Equal(f, v) => field_value(record, f).is_some_and(|x| values_match(x, v)),
            Constraint::NotEqual(f, v) => !field_value(record, f).is_some_and(|x| values_match(x, v)),
            Constraint::ContainedIn(f, vs) => field_value(record, f)
                .is_some_and(|x| vs.iter().any(|v| values_match(x, v))),
        })
    }
}

fn field_value<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}

/// Pointers compare by class and id; everything else structurally.
pub fn values_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) if x.contains_key("objectId") && y.contains_key("objectId") => {
            x.get("objectId") == y.get("objectId") && x.get("className") == y.get("className")
        }
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
