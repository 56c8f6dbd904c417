use crate::db::{ObjectStore, Query};
use crate::types::error::AppError;
use crate::types::record::Record;

/// The backend caps a single query, so "all" is read page by page.
pub const PAGE_SIZE: u64 = 90;

/// Reads every record matching `query`, one page at a time, until a page
/// comes back empty. Order is the store's order across pages.
pub async fn get_all(store: &dyn ObjectStore, query: Query) -> Result<Vec<Record>, AppError> {
    let mut records = Vec::new();
    let mut offset = 0;
    loop {
        let page = store
            .find(&query.clone().limit(PAGE_SIZE).skip(offset))
            .await?;
        if page.is_empty() {
            return Ok(records);
        }
        offset += PAGE_SIZE;
        records.extend(page);
    }
}

pub async fn first(store: &dyn ObjectStore, query: Query) -> Result<Option<Record>, AppError> {
    Ok(store.find(&query.limit(1)).await?.into_iter().next())
}
