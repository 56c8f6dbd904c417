use crate::db::{paging, ObjectStore, Query};
use crate::types::acl::Acl;
use crate::types::error::AppError;
use crate::types::record::{Pointer, Record};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Typed reads and writes over an [`ObjectStore`]. Per-class lookups live in
/// the sibling modules as further `impl Repository` blocks.
#[derive(Clone)]
pub struct Repository {
    pub(crate) store: Arc<dyn ObjectStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub async fn get(&self, class_name: &str, id: &str) -> Result<Record, AppError> {
        self.store
            .get(class_name, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{class_name} {id}")))
    }

    pub async fn fetch(&self, pointer: &Pointer) -> Result<Record, AppError> {
        self.get(&pointer.class_name, &pointer.object_id).await
    }

    pub async fn all(&self, query: Query) -> Result<Vec<Record>, AppError> {
        paging::get_all(self.store(), query).await
    }

    pub async fn first(&self, query: Query) -> Result<Option<Record>, AppError> {
        paging::first(self.store(), query).await
    }

    pub async fn count(&self, query: Query) -> Result<u64, AppError> {
        self.store.count(&query).await
    }

    pub async fn save(&self, record: &Record) -> Result<Record, AppError> {
        self.store.save(record).await
    }

    /// Writes just `fields` onto the stored record.
    pub async fn update_fields(&self, record: &Record, fields: Map<String, Value>) -> Result<(), AppError> {
        self.store.update(&record.class_name, record.id()?, &fields).await
    }

    pub async fn save_acl(&self, record: &Record, acl: &Acl) -> Result<(), AppError> {
        let mut fields = Map::new();
        fields.insert("ACL".into(), serde_json::to_value(acl)?);
        self.update_fields(record, fields).await
    }

    pub async fn destroy(&self, record: &Record) -> Result<(), AppError> {
        self.store.destroy(&record.class_name, record.id()?).await
    }
}
