use crate::schema::{SchemaEndpoint, TableSchema};
use crate::types::error::AppError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCall {
    Fetch(String),
    Create(String),
    Update(String),
    Drop(String),
}

/// Schema endpoint kept in memory. Mirrors the backend's rules: creating an
/// existing table fails, updating or dropping a missing one fails.
#[derive(Default)]
pub struct MemorySchemaEndpoint {
    tables: Mutex<BTreeMap<String, TableSchema>>,
    calls: Mutex<Vec<SchemaCall>>,
}

impl MemorySchemaEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, BTreeMap<String, TableSchema>> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: SchemaCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    pub fn insert(&self, table: &str, schema: TableSchema) {
        self.tables().insert(table.to_string(), schema);
    }

    pub fn table(&self, table: &str) -> Option<TableSchema> {
        self.tables().get(table).cloned()
    }

    pub fn calls(&self) -> Vec<SchemaCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

fn missing(table: &str) -> AppError {
    AppError::upstream(400, format!("Class {table} does not exist."))
}

#[async_trait]
impl SchemaEndpoint for MemorySchemaEndpoint {
    async fn fetch(&self, table: &str) -> Result<TableSchema, AppError> {
        self.record(SchemaCall::Fetch(table.to_string()));
        self.tables().get(table).cloned().ok_or_else(|| missing(table))
    }

    async fn create(&self, table: &str, schema: &TableSchema) -> Result<(), AppError> {
        self.record(SchemaCall::Create(table.to_string()));
        let mut tables = self.tables();
        if tables.contains_key(table) {
            return Err(AppError::upstream(400, format!("Class {table} already exists.")));
        }
        let mut schema = schema.clone();
        schema.class_name = Some(table.to_string());
        tables.insert(table.to_string(), schema);
        Ok(())
    }

    async fn update(&self, table: &str, schema: &TableSchema) -> Result<(), AppError> {
        self.record(SchemaCall::Update(table.to_string()));
        let mut tables = self.tables();
        let existing = tables.get_mut(table).ok_or_else(|| missing(table))?;
        existing.fields.extend(schema.fields.clone());
        if let Some(clp) = &schema.class_level_permissions {
            existing.class_level_permissions = Some(clp.clone());
        }
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<(), AppError> {
        self.record(SchemaCall::Drop(table.to_string()));
        self.tables()
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| missing(table))
    }
}
