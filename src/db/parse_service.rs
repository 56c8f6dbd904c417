use crate::db::{ObjectStore, Query};
use crate::types::class;
use crate::types::error::AppError;
use crate::types::record::Record;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Connection details shared by the object-store and schema clients.
#[derive(Clone, Debug)]
pub struct ParseConnection {
    pub server_url: String,
    pub app_id: String,
    pub master_key: String,
}

impl ParseConnection {
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.server_url.trim_end_matches('/'), path)
    }

    pub fn client() -> Result<Client, AppError> {
        Ok(ClientBuilder::new()
            .user_agent("chisel-guard/0.1 (+reqwest)")
            .tcp_nodelay(true)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(30))
            .build()?)
    }

    /// Application id plus master key; every hook runs with master rights.
    pub fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("X-Parse-Application-Id", &self.app_id)
            .header("X-Parse-Master-Key", &self.master_key)
            .header("Content-Type", "application/json")
    }
}

#[derive(Deserialize)]
struct ParseErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

/// Turns a non-success backend reply into `AppError::Upstream`.
pub async fn check_status(res: Response) -> Result<Response, AppError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let parsed: Option<ParseErrorBody> = serde_json::from_str(&body).ok();
    Err(AppError::Upstream {
        status: status.as_u16(),
        code: parsed.as_ref().and_then(|p| p.code).map(|c| c.to_string()),
        message: parsed.and_then(|p| p.error).unwrap_or(body),
    })
}

#[derive(Deserialize)]
struct FindResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Deserialize)]
struct WriteResponse {
    #[serde(rename = "objectId", default)]
    object_id: Option<String>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    updated_at: Option<String>,
}

/// Object store reached over the backend's REST API.
#[derive(Clone)]
pub struct ParseService {
    pub(crate) client: Client,
    pub(crate) connection: ParseConnection,
}

impl ParseService {
    pub fn new(connection: ParseConnection) -> Result<Self, AppError> {
        info!("Using object store at {}", connection.server_url);
        Ok(Self {
            client: ParseConnection::client()?,
            connection,
        })
    }

    fn class_path(class_name: &str) -> String {
        match class_name {
            class::USER => "users".to_string(),
            "_Role" => "roles".to_string(),
            other => format!("classes/{}", urlencoding::encode(other)),
        }
    }

    fn object_path(class_name: &str, id: &str) -> String {
        format!("{}/{}", Self::class_path(class_name), urlencoding::encode(id))
    }

    async fn run_query(&self, query: &Query, count_only: bool) -> Result<FindResponse, AppError> {
        let url = self.connection.url(&Self::class_path(&query.class_name));
        let mut params: Vec<(&str, String)> = vec![("where", query.to_where().to_string())];
        if count_only {
            params.push(("count", "1".into()));
            params.push(("limit", "0".into()));
        } else {
            if let Some(limit) = query.limit {
                params.push(("limit", limit.to_string()));
            }
            if query.skip > 0 {
                params.push(("skip", query.skip.to_string()));
            }
        }
        debug!("GET {url} {params:?}");
        let res = self
            .connection
            .authorize(self.client.get(url))
            .query(&params)
            .send()
            .await?;
        Ok(check_status(res).await?.json().await?)
    }
}

#[async_trait]
impl ObjectStore for ParseService {
    async fn get(&self, class_name: &str, id: &str) -> Result<Option<Record>, AppError> {
        let url = self.connection.url(&Self::object_path(class_name, id));
        let res = self.connection.authorize(self.client.get(url)).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = check_status(res).await?.json().await?;
        Ok(Some(Record::from_json(class_name, body)?))
    }

    async fn find(&self, query: &Query) -> Result<Vec<Record>, AppError> {
        self.run_query(query, false)
            .await?
            .results
            .into_iter()
            .map(|v| Record::from_json(&query.class_name, v))
            .collect()
    }

    async fn count(&self, query: &Query) -> Result<u64, AppError> {
        Ok(self.run_query(query, true).await?.count.unwrap_or(0))
    }

    async fn save(&self, record: &Record) -> Result<Record, AppError> {
        let body = record.to_write_body();
        let req = match &record.id {
            Some(id) => self
                .client
                .put(self.connection.url(&Self::object_path(&record.class_name, id))),
            None => self
                .client
                .post(self.connection.url(&Self::class_path(&record.class_name))),
        };
        let res = self.connection.authorize(req).json(&body).send().await?;
        let written: WriteResponse = check_status(res).await?.json().await?;

        let mut saved = record.clone();
        if let Some(id) = written.object_id {
            saved.id = Some(id);
        }
        if let Some(created) = written.created_at {
            saved.set("createdAt", created);
        }
        if let Some(updated) = written.updated_at {
            saved.set("updatedAt", updated);
        }
        Ok(saved)
    }

    async fn update(&self, class_name: &str, id: &str, fields: &Map<String, Value>) -> Result<(), AppError> {
        let url = self.connection.url(&Self::object_path(class_name, id));
        debug!("PUT {url} {:?}", fields.keys().collect::<Vec<_>>());
        let res = self
            .connection
            .authorize(self.client.put(url))
            .json(fields)
            .send()
            .await?;
        check_status(res).await?;
        Ok(())
    }

    async fn destroy(&self, class_name: &str, id: &str) -> Result<(), AppError> {
        let url = self.connection.url(&Self::object_path(class_name, id));
        let res = self.connection.authorize(self.client.delete(url)).send().await?;
        check_status(res).await?;
        Ok(())
    }

    async fn log_in(&self, username: &str, password: &str) -> Result<Record, AppError> {
        let res = self
            .client
            .get(self.connection.url("login"))
            .header("X-Parse-Application-Id", &self.connection.app_id)
            .header("X-Parse-Revocable-Session", "1")
            .query(&[("username", username), ("password", password)])
            .send()
            .await?;
        let body: Value = check_status(res).await?.json().await?;
        Record::from_json(class::USER, body)
    }
}
