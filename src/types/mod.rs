pub mod acl;
pub mod collaboration;
pub mod error;
pub mod mail;
pub mod model;
pub mod pay_plan;
pub mod record;
pub mod response;
pub mod site;
pub mod user;

/// Backend class names.
pub mod class {
    pub const SITE: &str = "Site";
    pub const MODEL: &str = "Model";
    pub const MODEL_FIELD: &str = "ModelField";
    pub const MEDIA_ITEM: &str = "MediaItem";
    pub const COLLABORATION: &str = "Collaboration";
    pub const PAY_PLAN: &str = "PayPlan";
    pub const USER: &str = "_User";
}
