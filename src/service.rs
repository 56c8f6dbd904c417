use crate::billing::plan::PlanResolver;
use crate::billing::service::BillingService;
use crate::billing::BillingProvider;
use crate::cascade::CascadingDeleter;
use crate::config::EnvConfig;
use crate::db::repository::Repository;
use crate::db::ObjectStore;
use crate::propagation::queue::PropagationQueue;
use crate::propagation::CollaborationPropagator;
use crate::schema::{SchemaEndpoint, SchemaPermissionSync};
use crate::types::error::AppError;
use crate::utils::mail::Mailer;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Settings {
    pub webhook_key: String,
    /// Public frontend URL used in invite links.
    pub site_url: String,
    pub mail_from: String,
}

impl From<&EnvConfig> for Settings {
    fn from(config: &EnvConfig) -> Self {
        Self {
            webhook_key: config.webhook_key.clone(),
            site_url: config.site_url.clone(),
            mail_from: config.mail_from.clone(),
        }
    }
}

/// Everything a request handler needs, shared across workers.
pub struct Services {
    pub repo: Repository,
    pub schema: SchemaPermissionSync,
    pub deleter: CascadingDeleter,
    pub propagation: PropagationQueue,
    pub plans: PlanResolver,
    pub billing: BillingService,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub http: Client,
    pub settings: Settings,
}

impl Services {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        schema: Arc<dyn SchemaEndpoint>,
        billing: Option<Arc<dyn BillingProvider>>,
        mailer: Option<Arc<dyn Mailer>>,
        settings: Settings,
    ) -> Result<Self, AppError> {
        let repo = Repository::new(store);
        let schema = SchemaPermissionSync::new(schema);
        let propagator = CollaborationPropagator::new(repo.clone(), schema.clone());
        let http = ClientBuilder::new()
            .user_agent("chisel-guard/0.1 (+reqwest)")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            deleter: CascadingDeleter::new(repo.clone(), schema.clone()),
            propagation: PropagationQueue::new(Arc::new(propagator)),
            plans: PlanResolver::new(repo.clone(), billing.clone()),
            billing: BillingService::new(repo.clone(), billing),
            repo,
            schema,
            mailer,
            http,
            settings,
        })
    }
}
