use actix_web::{http::StatusCode, test};
use chisel_guard::schema::clp::ClassLevelPermissions;
use chisel_guard::schema::TableSchema;
use chisel_guard::types::acl::Acl;
use chisel_guard::types::class;
use chisel_guard::types::record::Record;
use chisel_guard::utils::webutils::WEBHOOK_KEY_HEADER;
use serde_json::{json, Value};
use std::time::Duration;

mod common;
use common::{actor_json, pointer, TestContext, WEBHOOK_KEY};

fn trigger(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((WEBHOOK_KEY_HEADER, WEBHOOK_KEY))
        .set_json(body)
}

/// Waits for queued propagation to land.
async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn test_triggers_require_webhook_key() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/triggers/_User/beforeSave")
        .insert_header((WEBHOOK_KEY_HEADER, "wrong"))
        .set_json(json!({"object": {"email": "a@example.com"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/triggers/_User/beforeSave")
        .set_json(json!({"object": {"email": "a@example.com"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // the backend never sends the key as a bearer token
    let req = test::TestRequest::post()
        .uri("/triggers/_User/beforeSave")
        .insert_header(("Authorization", format!("Bearer {}", WEBHOOK_KEY)))
        .set_json(json!({"object": {"email": "a@example.com"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = trigger("/triggers/_User/beforeSave", json!({"object": {"email": "a@example.com"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_open() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"success": true}));
}

#[tokio::test]
async fn test_user_before_save_copies_email_to_username() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;

    let req = trigger(
        "/triggers/_User/beforeSave",
        json!({"master": true, "object": {"username": "old", "email": "new@example.com"}}),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["username"], "new@example.com");
}

#[tokio::test]
async fn test_user_after_save_claims_pending_invites() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let owner = ctx.user("owner@example.com").await;
    let site = ctx.site(&owner).await;
    ctx.model(&site, &owner, "ct_posts", "posts").await;
    let invite = ctx
        .seed(
            Record::new(class::COLLABORATION)
                .with("site", pointer(&site))
                .with("email", "invited@example.com")
                .with("role", "EDITOR"),
        )
        .await;
    let user = ctx.user("invited@example.com").await;
    let user_id = user.id.clone().unwrap();

    let req = trigger(
        "/triggers/_User/afterSave",
        json!({"object": Value::from(user.clone())}),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let claimed = ctx.reload(&invite).await;
    assert_eq!(claimed.pointer("user"), Some(pointer(&user)));
    assert_eq!(claimed.str_field("email"), Some(""));

    eventually(|| {
        let ctx = &ctx;
        let site = &site;
        let user_id = user_id.clone();
        async move {
            ctx.reload(site)
                .await
                .acl
                .is_some_and(|acl| acl.read_access(&user_id))
        }
    })
    .await;
    let clp = ctx
        .schema
        .table("ct_posts")
        .unwrap()
        .class_level_permissions
        .unwrap();
    assert!(clp.granted_to(&user_id).contains(&"create"));
}

#[tokio::test]
async fn test_claimed_invite_grants_its_user_and_admin_siblings() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let owner = ctx.user("owner@example.com").await;
    let admin = ctx.user("admin@example.com").await;
    let editor = ctx.user("editor@example.com").await;
    let site = ctx.site(&owner).await;
    ctx.saved_collaboration(&site, &admin, "ADMIN").await;
    ctx.saved_collaboration(&site, &editor, "EDITOR").await;
    let invite = ctx
        .seed(
            Record::new(class::COLLABORATION)
                .with("site", pointer(&site))
                .with("email", "invited@example.com")
                .with("role", "EDITOR")
                .with_acl(Acl::owned_by(owner.id.as_deref().unwrap())),
        )
        .await;
    let user = ctx.user("invited@example.com").await;

    let req = trigger(
        "/triggers/_User/afterSave",
        json!({"object": Value::from(user.clone())}),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let claimed = ctx.reload(&invite).await;
    let acl = claimed.acl.unwrap();
    let id = |u: &Record| u.id.clone().unwrap();
    assert!(acl.read_access(&id(&user)) && acl.write_access(&id(&user)));
    assert!(acl.read_access(&id(&admin)) && acl.write_access(&id(&admin)));
    assert!(acl.write_access(&id(&owner)));
    assert!(!acl.contains(&id(&editor)));

    // the claim only touches its own keys
    let keys = ctx.store.updated_keys(class::COLLABORATION);
    let mut first = keys[0].clone();
    first.sort();
    assert_eq!(first, ["ACL", "email", "user"]);
}

#[tokio::test]
async fn test_site_before_save_enforces_quota() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let plan = ctx
        .seed(
            Record::new(class::PAY_PLAN)
                .with("priceMonthly", 0)
                .with("limitSites", 1),
        )
        .await;
    let owner = ctx
        .seed(
            Record::new(class::USER)
                .with("username", "owner@example.com")
                .with("email", "owner@example.com")
                .with("payPlan", pointer(&plan)),
        )
        .await;
    let new_site = json!({"className": "Site", "owner": pointer(&owner), "name": "Blog"});

    let req = trigger(
        "/triggers/Site/beforeSave",
        json!({"user": actor_json(&owner), "object": new_site}),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let existing = ctx.site(&owner).await;
    let req = trigger(
        "/triggers/Site/beforeSave",
        json!({"user": actor_json(&owner), "object": new_site}),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "QUOTA_EXCEEDED");

    // updates are not creations
    let req = trigger(
        "/triggers/Site/beforeSave",
        json!({"user": actor_json(&owner), "object": Value::from(existing)}),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // master bypasses the quota
    let req = trigger(
        "/triggers/Site/beforeSave",
        json!({"master": true, "object": new_site}),
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_site_before_save_requires_user() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;

    let req = trigger(
        "/triggers/Site/beforeSave",
        json!({"object": {"className": "Site", "name": "Blog"}}),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_model_before_save_stamps_roster() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let owner = ctx.user("owner@example.com").await;
    let admin = ctx.user("admin@example.com").await;
    let editor = ctx.user("editor@example.com").await;
    let site = ctx.site(&owner).await;
    ctx.saved_collaboration(&site, &admin, "ADMIN").await;
    ctx.saved_collaboration(&site, &editor, "EDITOR").await;

    let req = trigger(
        "/triggers/Model/beforeSave",
        json!({
            "user": actor_json(&owner),
            "object": {"className": "Model", "site": pointer(&site), "tableName": "ct_news", "nameId": "news"},
        }),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let acl = &body["success"]["ACL"];
    let id = |r: &Record| r.id.clone().unwrap();
    assert_eq!(acl[id(&owner)], json!({"read": true, "write": true}));
    assert_eq!(acl[id(&admin)], json!({"read": true, "write": true}));
    assert_eq!(acl[id(&editor)], json!({"read": true}));

    let clp = ctx.schema.table("ct_news").unwrap().class_level_permissions.unwrap();
    assert_eq!(clp.granted_to(&id(&owner)).len(), 6);
    assert_eq!(clp.granted_to(&id(&admin)).len(), 6);
    assert_eq!(
        clp.granted_to(&id(&editor)),
        vec!["get", "find", "create", "update", "delete"]
    );
}

#[tokio::test]
async fn test_model_before_save_fails_when_table_exists() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let owner = ctx.user("owner@example.com").await;
    let site = ctx.site(&owner).await;
    ctx.schema.insert(
        "ct_news",
        TableSchema::with_permissions(ClassLevelPermissions::default()),
    );

    let req = trigger(
        "/triggers/Model/beforeSave",
        json!({
            "user": actor_json(&owner),
            "object": {"className": "Model", "site": pointer(&site), "tableName": "ct_news"},
        }),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_model_before_delete_keeps_model_record() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let owner = ctx.user("owner@example.com").await;
    let site = ctx.site(&owner).await;
    let model = ctx.model(&site, &owner, "ct_posts", "posts").await;
    ctx.seed(Record::new("ct_posts").with("title", "a")).await;
    ctx.seed(Record::new("ct_posts").with("title", "b")).await;

    let req = trigger(
        "/triggers/Model/beforeDelete",
        json!({"user": actor_json(&owner), "object": Value::from(model.clone())}),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.store.destroyed_in("ct_posts"), 2);
    assert!(ctx.exists(&model).await);
    assert!(ctx.schema.table("ct_posts").is_none());
}

#[tokio::test]
async fn test_site_before_delete_denied_for_stranger() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let owner = ctx.user("owner@example.com").await;
    let stranger = ctx.user("stranger@example.com").await;
    let site = ctx.site(&owner).await;
    ctx.model(&site, &owner, "ct_posts", "posts").await;

    let req = trigger(
        "/triggers/Site/beforeDelete",
        json!({"user": actor_json(&stranger), "object": Value::from(site)}),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "ACCESS_DENIED");
    assert!(ctx.store.destroyed().is_empty());
}

#[tokio::test]
async fn test_field_and_media_get_roster_acl() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let owner = ctx.user("owner@example.com").await;
    let viewer = ctx.user("viewer@example.com").await;
    let site = ctx.site(&owner).await;
    let model = ctx.model(&site, &owner, "ct_posts", "posts").await;
    ctx.saved_collaboration(&site, &viewer, "VIEWER").await;
    let viewer_id = viewer.id.clone().unwrap();

    let req = trigger(
        "/triggers/ModelField/beforeSave",
        json!({"user": actor_json(&owner), "object": {"model": pointer(&model), "type": "Short Text"}}),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["success"]["ACL"][&viewer_id], json!({"read": true}));

    let req = trigger(
        "/triggers/MediaItem/beforeSave",
        json!({"user": actor_json(&owner), "object": {"site": pointer(&site)}}),
    )
    .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["success"]["ACL"][&viewer_id], json!({"read": true}));
}

#[tokio::test]
async fn test_collaboration_before_save_sets_own_acl_and_queues() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;
    let owner = ctx.user("owner@example.com").await;
    let editor = ctx.user("editor@example.com").await;
    let site = ctx.site(&owner).await;
    let model = ctx.model(&site, &owner, "ct_posts", "posts").await;
    let editor_id = editor.id.clone().unwrap();

    let req = trigger(
        "/triggers/Collaboration/beforeSave",
        json!({
            "user": actor_json(&owner),
            "object": Value::from(ctx.collaboration(&site, &editor, "EDITOR")),
        }),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"]["ACL"][&editor_id], json!({"read": true, "write": true}));

    eventually(|| {
        let ctx = &ctx;
        let model = &model;
        let editor_id = editor_id.clone();
        async move {
            ctx.reload(model)
                .await
                .acl
                .is_some_and(|acl| acl.read_access(&editor_id))
        }
    })
    .await;
}

#[tokio::test]
async fn test_unknown_trigger_is_not_found() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.create_app()).await;

    let req = trigger("/triggers/Site/afterDelete", json!({"object": {}})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = trigger("/triggers/Widget/beforeSave", json!({"object": {}})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
