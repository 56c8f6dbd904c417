#![allow(dead_code)]

use actix_web::{web, App};
use async_trait::async_trait;
use chisel_guard::billing::{
    BillingPlan, BillingProvider, Customer, List, PaymentSource, Subscription, SubscriptionItem,
    SubscriptionUpdate,
};
use chisel_guard::db::memory::MemoryStore;
use chisel_guard::db::ObjectStore;
use chisel_guard::schema::clp::ClassLevelPermissions;
use chisel_guard::schema::memory::MemorySchemaEndpoint;
use chisel_guard::schema::{FieldSchema, TableSchema};
use chisel_guard::service::{Services, Settings};
use chisel_guard::types::acl::Acl;
use chisel_guard::types::class;
use chisel_guard::types::collaboration::Role;
use chisel_guard::types::error::AppError;
use chisel_guard::types::mail::SendEmail;
use chisel_guard::types::record::{Pointer, Record};
use chisel_guard::types::user::Actor;
use chisel_guard::utils::mail::Mailer;
use serde_json::{json, Map};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const WEBHOOK_KEY: &str = "test-webhook-key";
pub const SITE_URL: &str = "https://cms.test";

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub schema: Arc<MemorySchemaEndpoint>,
    pub billing: Option<Arc<FakeBilling>>,
    pub mailer: Arc<RecordingMailer>,
    pub services: Arc<Services>,
}

impl TestContext {
    pub fn new() -> TestContext {
        Self::build(None)
    }

    pub fn with_billing(billing: FakeBilling) -> TestContext {
        Self::build(Some(Arc::new(billing)))
    }

    fn build(billing: Option<Arc<FakeBilling>>) -> TestContext {
        let store = Arc::new(MemoryStore::new());
        let schema = Arc::new(MemorySchemaEndpoint::new());
        let mailer = Arc::new(RecordingMailer::default());
        let provider = billing.clone().map(|b| b as Arc<dyn BillingProvider>);
        let services = Services::new(
            store.clone(),
            schema.clone(),
            provider,
            Some(mailer.clone() as Arc<dyn Mailer>),
            Settings {
                webhook_key: WEBHOOK_KEY.to_string(),
                site_url: SITE_URL.to_string(),
                mail_from: "noreply@cms.test".to_string(),
            },
        )
        .expect("Failed to build services");

        TestContext {
            store,
            schema,
            billing,
            mailer,
            services: Arc::new(services),
        }
    }

    pub fn create_app(
        &self,
    ) -> actix_web::App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(Arc::clone(&self.services)))
            .configure(chisel_guard::routes::configure_routes)
    }

    pub async fn seed(&self, record: Record) -> Record {
        self.store.save(&record).await.expect("Failed to seed record")
    }

    pub async fn reload(&self, record: &Record) -> Record {
        self.store
            .get(&record.class_name, record.id.as_deref().expect("record has no id"))
            .await
            .expect("Failed to reload record")
            .expect("record is gone")
    }

    pub async fn exists(&self, record: &Record) -> bool {
        self.store
            .get(&record.class_name, record.id.as_deref().expect("record has no id"))
            .await
            .expect("Failed to read record")
            .is_some()
    }

    pub async fn user(&self, username: &str) -> Record {
        self.seed(
            Record::new(class::USER)
                .with("username", username)
                .with("email", username),
        )
        .await
    }

    /// Site owned by `owner`, readable and writable by the owner only.
    pub async fn site(&self, owner: &Record) -> Record {
        let owner_id = owner.id.as_deref().expect("owner has no id");
        self.seed(
            Record::new(class::SITE)
                .with("owner", pointer(owner))
                .with("name", "Test Site")
                .with_acl(Acl::owned_by(owner_id)),
        )
        .await
    }

    /// Model plus its content table schema with the owner's permissions and
    /// a media pointer field.
    pub async fn model(&self, site: &Record, owner: &Record, table: &str, name_id: &str) -> Record {
        let owner_id = owner.id.as_deref().expect("owner has no id");
        let mut schema =
            TableSchema::with_permissions(ClassLevelPermissions::for_roster(owner_id, Vec::<(&str, Role)>::new()));
        schema
            .fields
            .insert("cover".to_string(), FieldSchema::pointer_to(class::MEDIA_ITEM));
        self.schema.insert(table, schema);

        self.seed(
            Record::new(class::MODEL)
                .with("site", pointer(site))
                .with("tableName", table)
                .with("nameId", name_id)
                .with_acl(Acl::owned_by(owner_id)),
        )
        .await
    }

    pub async fn field(&self, model: &Record, owner: &Record) -> Record {
        self.seed(
            Record::new(class::MODEL_FIELD)
                .with("model", pointer(model))
                .with("type", "Short Text")
                .with_acl(Acl::owned_by(owner.id.as_deref().expect("owner has no id"))),
        )
        .await
    }

    pub async fn media(&self, site: &Record, owner: &Record) -> Record {
        self.seed(
            Record::new(class::MEDIA_ITEM)
                .with("site", pointer(site))
                .with_acl(Acl::owned_by(owner.id.as_deref().expect("owner has no id"))),
        )
        .await
    }

    /// Unsaved collaboration, as a before-save trigger would see it.
    pub fn collaboration(&self, site: &Record, user: &Record, role: &str) -> Record {
        Record::new(class::COLLABORATION)
            .with("site", pointer(site))
            .with("user", pointer(user))
            .with("role", role)
    }

    pub async fn saved_collaboration(&self, site: &Record, user: &Record, role: &str) -> Record {
        let owner = site.pointer("owner").expect("site has no owner");
        let record = self
            .collaboration(site, user, role)
            .with_acl(Acl::owned_by(&owner.object_id));
        self.seed(record).await
    }
}

pub fn pointer(record: &Record) -> Pointer {
    record.to_pointer().expect("record has no id")
}

pub fn actor(user: &Record) -> Actor {
    Actor {
        id: user.id.clone().expect("user has no id"),
        username: user.str_field("username").map(str::to_string),
        email: user.str_field("email").map(str::to_string),
    }
}

pub fn actor_json(user: &Record) -> serde_json::Value {
    json!({
        "objectId": user.id,
        "username": user.str_field("username"),
        "email": user.str_field("email"),
    })
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SendEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: SendEmail) -> Result<String, AppError> {
        self.sent.lock().unwrap().push(email);
        Ok("{\"id\":\"mail_1\"}".to_string())
    }
}

/// Billing provider kept in memory.
#[derive(Default)]
pub struct FakeBilling {
    pub customers: Mutex<HashMap<String, Customer>>,
    pub sources: Mutex<HashMap<String, Vec<PaymentSource>>>,
    /// Every customer lookup fails when set.
    pub unreachable: bool,
}

impl FakeBilling {
    pub fn with_customer(self, customer: Customer) -> Self {
        self.customers
            .lock()
            .unwrap()
            .insert(customer.id.clone(), customer);
        self
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }
}

pub fn customer(id: &str, subscription: Option<Subscription>) -> Customer {
    Customer {
        id: id.to_string(),
        deleted: false,
        email: None,
        default_source: None,
        subscriptions: List {
            data: subscription.into_iter().collect(),
            has_more: false,
        },
    }
}

pub fn subscription(id: &str, status: &str, product: Option<&str>) -> Subscription {
    Subscription {
        id: id.to_string(),
        status: status.to_string(),
        plan: product.map(|p| BillingPlan {
            id: format!("plan_{p}"),
            product: Some(p.to_string()),
        }),
        items: List {
            data: vec![SubscriptionItem {
                id: format!("si_{id}"),
            }],
            has_more: false,
        },
        cancel_at_period_end: false,
        extra: Map::new(),
    }
}

fn source(id: &str) -> PaymentSource {
    PaymentSource {
        id: id.to_string(),
        extra: Map::new(),
    }
}

#[async_trait]
impl BillingProvider for FakeBilling {
    async fn retrieve_customer(&self, customer_id: &str) -> Result<Option<Customer>, AppError> {
        if self.unreachable {
            return Err(AppError::upstream(500, "billing provider is down"));
        }
        Ok(self.customers.lock().unwrap().get(customer_id).cloned())
    }

    async fn create_customer(&self, email: Option<&str>, source_token: &str) -> Result<Customer, AppError> {
        let mut customers = self.customers.lock().unwrap();
        let id = format!("cus_{}", customers.len() + 1);
        let source_id = format!("src_{source_token}");
        let mut created = customer(&id, None);
        created.email = email.map(str::to_string);
        created.default_source = Some(source_id.clone());
        customers.insert(id.clone(), created.clone());
        self.sources.lock().unwrap().insert(id, vec![source(&source_id)]);
        Ok(created)
    }

    async fn set_default_source(&self, customer_id: &str, source_id: &str) -> Result<Customer, AppError> {
        let mut customers = self.customers.lock().unwrap();
        let customer = customers
            .get_mut(customer_id)
            .ok_or_else(|| AppError::upstream(404, "No such customer"))?;
        customer.default_source = Some(source_id.to_string());
        Ok(customer.clone())
    }

    async fn list_sources(&self, customer_id: &str) -> Result<Vec<PaymentSource>, AppError> {
        Ok(self
            .sources
            .lock()
            .unwrap()
            .get(customer_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_source(&self, customer_id: &str, source_token: &str) -> Result<PaymentSource, AppError> {
        let created = source(&format!("src_{source_token}"));
        self.sources
            .lock()
            .unwrap()
            .entry(customer_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn delete_source(&self, customer_id: &str, source_id: &str) -> Result<(), AppError> {
        if let Some(sources) = self.sources.lock().unwrap().get_mut(customer_id) {
            sources.retain(|s| s.id != source_id);
        }
        let mut customers = self.customers.lock().unwrap();
        if let Some(customer) = customers.get_mut(customer_id) {
            if customer.default_source.as_deref() == Some(source_id) {
                customer.default_source = None;
            }
        }
        Ok(())
    }

    async fn create_subscription(&self, customer_id: &str, plan_id: &str) -> Result<Subscription, AppError> {
        let mut customers = self.customers.lock().unwrap();
        let customer = customers
            .get_mut(customer_id)
            .ok_or_else(|| AppError::upstream(404, "No such customer"))?;
        let mut created = subscription(&format!("sub_{customer_id}"), "active", None);
        created.plan = Some(BillingPlan {
            id: plan_id.to_string(),
            product: None,
        });
        customer.subscriptions.data = vec![created.clone()];
        Ok(created)
    }

    async fn update_subscription(
        &self,
        subscription_id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<Subscription, AppError> {
        let mut customers = self.customers.lock().unwrap();
        let found = customers
            .values_mut()
            .flat_map(|c| c.subscriptions.data.iter_mut())
            .find(|s| s.id == subscription_id)
            .ok_or_else(|| AppError::upstream(404, "No such subscription"))?;
        if let Some((_, plan)) = &update.item_plan {
            found.plan = Some(BillingPlan {
                id: plan.clone(),
                product: None,
            });
        }
        if let Some(cancel) = update.cancel_at_period_end {
            found.cancel_at_period_end = cancel;
        }
        Ok(found.clone())
    }
}
