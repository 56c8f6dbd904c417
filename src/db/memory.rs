use crate::db::{ObjectStore, Query};
use crate::types::class;
use crate::types::error::AppError;
use crate::types::record::Record;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    // insertion order is the query order
    records: HashMap<String, Vec<Record>>,
    passwords: HashMap<String, String>,
    destroyed: Vec<(String, String)>,
    // (class, id, keys written) of every partial update
    updates: Vec<(String, String, Vec<String>)>,
    failing_classes: HashSet<String>,
}

/// In-process object store with the same query semantics as the backend.
/// Backs the integration tests and local runs without a backend.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    find_calls: AtomicUsize,
    save_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_password(&self, username: &str, password: &str) {
        self.tables()
            .passwords
            .insert(username.to_string(), password.to_string());
    }

    /// Makes every later save or destroy on `class_name` fail.
    pub fn fail_writes_to(&self, class_name: &str) {
        self.tables().failing_classes.insert(class_name.to_string());
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Full saves and partial updates alike.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// `(class, id)` of every destroyed record, in order.
    pub fn destroyed(&self) -> Vec<(String, String)> {
        self.tables().destroyed.clone()
    }

    /// Keys sent by each partial update of `class_name`, in order.
    pub fn updated_keys(&self, class_name: &str) -> Vec<Vec<String>> {
        self.tables()
            .updates
            .iter()
            .filter(|(c, _, _)| c == class_name)
            .map(|(_, _, keys)| keys.clone())
            .collect()
    }

    pub fn destroyed_in(&self, class_name: &str) -> usize {
        self.tables()
            .destroyed
            .iter()
            .filter(|(c, _)| c == class_name)
            .count()
    }

    pub fn all_of(&self, class_name: &str) -> Vec<Record> {
        self.tables()
            .records
            .get(class_name)
            .cloned()
            .unwrap_or_default()
    }

    fn check_writable(tables: &Tables, class_name: &str) -> Result<(), AppError> {
        if tables.failing_classes.contains(class_name) {
            return Err(AppError::upstream(500, format!("writes to {class_name} are failing")));
        }
        Ok(())
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, class_name: &str, id: &str) -> Result<Option<Record>, AppError> {
        Ok(self
            .tables()
            .records
            .get(class_name)
            .and_then(|rows| rows.iter().find(|r| r.id.as_deref() == Some(id)))
            .cloned())
    }

    async fn find(&self, query: &Query) -> Result<Vec<Record>, AppError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        let matching = tables
            .records
            .get(&query.class_name)
            .into_iter()
            .flatten()
            .filter(|r| query.matches(r))
            .skip(query.skip as usize);
        Ok(match query.limit {
            Some(limit) => matching.take(limit as usize).cloned().collect(),
            None => matching.cloned().collect(),
        })
    }

    async fn count(&self, query: &Query) -> Result<u64, AppError> {
        let tables = self.tables();
        Ok(tables
            .records
            .get(&query.class_name)
            .into_iter()
            .flatten()
            .filter(|r| query.matches(r))
            .count() as u64)
    }

    async fn save(&self, record: &Record) -> Result<Record, AppError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables();
        Self::check_writable(&tables, &record.class_name)?;

        let mut saved = record.clone();
        let stamp = now();
        saved.set("updatedAt", stamp.clone());
        let rows = tables.records.entry(record.class_name.clone()).or_default();
        match &record.id {
            Some(id) => match rows.iter_mut().find(|r| r.id.as_deref() == Some(id.as_str())) {
                Some(existing) => {
                    if let Some(created) = existing.get("createdAt").cloned() {
                        saved.set("createdAt", created);
                    }
                    *existing = saved.clone();
                }
                None => {
                    saved.set("createdAt", stamp);
                    rows.push(saved.clone());
                }
            },
            None => {
                saved.id = Some(Uuid::new_v4().simple().to_string()[..10].to_string());
                saved.set("createdAt", stamp);
                rows.push(saved.clone());
            }
        }
        Ok(saved)
    }

    async fn update(&self, class_name: &str, id: &str, fields: &Map<String, Value>) -> Result<(), AppError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables();
        Self::check_writable(&tables, class_name)?;

        let rows = tables.records.entry(class_name.to_string()).or_default();
        let existing = rows
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| AppError::NotFound(format!("{class_name} {id}")))?;
        let Value::Object(mut merged) = Value::from(existing.clone()) else {
            return Err(AppError::Internal(format!("{class_name} {id} is not an object")));
        };
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
        merged.insert("updatedAt".into(), Value::String(now()));
        *existing = Record::try_from(Value::Object(merged))?;

        tables.updates.push((
            class_name.to_string(),
            id.to_string(),
            fields.keys().cloned().collect(),
        ));
        Ok(())
    }

    async fn destroy(&self, class_name: &str, id: &str) -> Result<(), AppError> {
        let mut tables = self.tables();
        Self::check_writable(&tables, class_name)?;
        let rows = tables.records.entry(class_name.to_string()).or_default();
        let before = rows.len();
        rows.retain(|r| r.id.as_deref() != Some(id));
        if rows.len() == before {
            return Err(AppError::NotFound(format!("{class_name} {id}")));
        }
        tables
            .destroyed
            .push((class_name.to_string(), id.to_string()));
        Ok(())
    }

    async fn log_in(&self, username: &str, password: &str) -> Result<Record, AppError> {
        let tables = self.tables();
        let known = tables
            .passwords
            .get(username)
            .is_some_and(|stored| stored == password);
        if !known {
            return Err(AppError::upstream(404, "Invalid username/password."));
        }
        tables
            .records
            .get(class::USER)
            .into_iter()
            .flatten()
            .find(|r| r.get("username") == Some(&Value::String(username.to_string())))
            .cloned()
            .ok_or_else(|| AppError::upstream(404, "Invalid username/password."))
    }
}
