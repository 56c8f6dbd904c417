use crate::db::parse_service::{check_status, ParseConnection};
use crate::schema::{SchemaEndpoint, TableSchema};
use crate::types::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// `/schemas/{table}` on the backend, always called with the master key.
#[derive(Clone)]
pub struct RestSchemaEndpoint {
    client: Client,
    connection: ParseConnection,
}

impl RestSchemaEndpoint {
    pub fn new(connection: ParseConnection) -> Result<Self, AppError> {
        Ok(Self {
            client: ParseConnection::client()?,
            connection,
        })
    }

    fn url(&self, table: &str) -> String {
        self.connection
            .url(&format!("schemas/{}", urlencoding::encode(table)))
    }
}

#[async_trait]
impl SchemaEndpoint for RestSchemaEndpoint {
    async fn fetch(&self, table: &str) -> Result<TableSchema, AppError> {
        let req = self.connection.authorize(self.client.get(self.url(table)));
        Ok(check_status(req.send().await?).await?.json().await?)
    }

    async fn create(&self, table: &str, schema: &TableSchema) -> Result<(), AppError> {
        debug!("POST schema {table}");
        let req = self.connection.authorize(self.client.post(self.url(table)));
        check_status(req.json(schema).send().await?).await?;
        Ok(())
    }

    async fn update(&self, table: &str, schema: &TableSchema) -> Result<(), AppError> {
        debug!("PUT schema {table}");
        let req = self.connection.authorize(self.client.put(self.url(table)));
        check_status(req.json(schema).send().await?).await?;
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<(), AppError> {
        debug!("DELETE schema {table}");
        let req = self.connection.authorize(self.client.delete(self.url(table)));
        check_status(req.send().await?).await?;
        Ok(())
    }
}
