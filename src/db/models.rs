use crate::db::repository::Repository;
use crate::db::Query;
use crate::types::class;
use crate::types::error::AppError;
use crate::types::model::{DRAFT_OWNER_FIELD, FIELD_TYPE_REFERENCE};
use crate::types::record::{Pointer, Record};

impl Repository {
    pub async fn model_fields(&self, model: &Pointer) -> Result<Vec<Record>, AppError> {
        self.all(Query::new(class::MODEL_FIELD).equal_to("model", model))
            .await
    }

    pub async fn fields_of_models(&self, models: &[Pointer]) -> Result<Vec<Record>, AppError> {
        if models.is_empty() {
            return Ok(vec![]);
        }
        self.all(Query::new(class::MODEL_FIELD).contained_in("model", models))
            .await
    }

    /// Reference-typed fields of `models`, skipping those of `excluded`.
    pub async fn reference_fields(
        &self,
        models: &[Pointer],
        excluded: &Pointer,
    ) -> Result<Vec<Record>, AppError> {
        if models.is_empty() {
            return Ok(vec![]);
        }
        self.all(
            Query::new(class::MODEL_FIELD)
                .contained_in("model", models)
                .not_equal_to("model", excluded)
                .equal_to("type", FIELD_TYPE_REFERENCE),
        )
        .await
    }

    pub async fn content_rows(&self, table: &str) -> Result<Vec<Record>, AppError> {
        self.all(Query::new(table)).await
    }

    pub async fn draft_of(&self, table: &str, row_id: &str) -> Result<Option<Record>, AppError> {
        self.first(Query::new(table).equal_to(DRAFT_OWNER_FIELD, Pointer::new(table, row_id)))
            .await
    }
}
