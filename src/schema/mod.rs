//! Per-table schema and class-level-permission synchronisation.

use crate::schema::clp::ClassLevelPermissions;
use crate::types::class;
use crate::types::collaboration::Role;
use crate::types::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod clp;
pub mod memory;
pub mod rest;

pub const FIELD_TYPE_POINTER: &str = "Pointer";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "targetClass", default, skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,
}

impl FieldSchema {
    pub fn pointer_to(target: &str) -> Self {
        Self {
            field_type: FIELD_TYPE_POINTER.to_string(),
            target_class: Some(target.to_string()),
        }
    }
}

/// A table's schema document; writes send only the parts that are set.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TableSchema {
    #[serde(rename = "className", default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldSchema>,
    #[serde(
        rename = "classLevelPermissions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub class_level_permissions: Option<ClassLevelPermissions>,
}

impl TableSchema {
    pub fn with_permissions(clp: ClassLevelPermissions) -> Self {
        Self {
            class_level_permissions: Some(clp),
            ..Default::default()
        }
    }

    /// Names of the fields pointing at media items.
    pub fn media_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, f)| {
                f.field_type == FIELD_TYPE_POINTER
                    && f.target_class.as_deref() == Some(class::MEDIA_ITEM)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// The backend's schema REST endpoint.
#[async_trait]
pub trait SchemaEndpoint: Send + Sync {
    async fn fetch(&self, table: &str) -> Result<TableSchema, AppError>;
    async fn create(&self, table: &str, schema: &TableSchema) -> Result<(), AppError>;
    async fn update(&self, table: &str, schema: &TableSchema) -> Result<(), AppError>;
    async fn drop_table(&self, table: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SchemaPermissionSync {
    endpoint: Arc<dyn SchemaEndpoint>,
}

impl SchemaPermissionSync {
    pub fn new(endpoint: Arc<dyn SchemaEndpoint>) -> Self {
        Self { endpoint }
    }

    /// `None` on any failure; callers read that as "no permissions yet".
    pub async fn read_table_schema(&self, table: &str) -> Option<TableSchema> {
        match self.endpoint.fetch(table).await {
            Ok(schema) => Some(schema),
            Err(err) => {
                debug!("No schema for {table}: {err}");
                None
            }
        }
    }

    pub async fn write_table_schema(
        &self,
        table: &str,
        partial: &TableSchema,
        create: bool,
    ) -> Result<(), AppError> {
        if create {
            self.endpoint.create(table, partial).await
        } else {
            self.endpoint.update(table, partial).await
        }
    }

    /// Create, and on any failure retry as an update.
    pub async fn upsert_table_schema(&self, table: &str, partial: &TableSchema) -> Result<(), AppError> {
        if let Err(err) = self.write_table_schema(table, partial, true).await {
            debug!("Creating schema {table} failed ({err}), updating instead");
            return self.write_table_schema(table, partial, false).await;
        }
        Ok(())
    }

    pub async fn drop_table(&self, table: &str) -> Result<(), AppError> {
        self.endpoint.drop_table(table).await
    }

    /// Pushes one collaborator's role (or removal) into the table's
    /// class-level permissions.
    pub async fn sync_collaborator(
        &self,
        table: &str,
        user_id: &str,
        role: Role,
        deleting: bool,
    ) -> Result<(), AppError> {
        let mut clp = self
            .read_table_schema(table)
            .await
            .and_then(|s| s.class_level_permissions)
            .unwrap_or_default();
        clp.apply_collaborator(user_id, role, deleting);
        let result = self
            .upsert_table_schema(table, &TableSchema::with_permissions(clp))
            .await;
        if let Err(err) = &result {
            warn!("Could not update permissions of {table} for {user_id}: {err}");
        }
        result
    }

    /// Initial permissions for a new content table. Create only; failure
    /// aborts the model save.
    pub async fn init_table_permissions<'a>(
        &self,
        table: &str,
        owner_id: &str,
        roster: impl IntoIterator<Item = (&'a str, Role)>,
    ) -> Result<(), AppError> {
        let clp = ClassLevelPermissions::for_roster(owner_id, roster);
        self.write_table_schema(table, &TableSchema::with_permissions(clp), true)
            .await
    }
}
