use chisel_guard::cascade::ModelDeletion;
use chisel_guard::schema::memory::SchemaCall;
use chisel_guard::types::acl::Acl;
use chisel_guard::types::class;
use chisel_guard::types::error::AppError;
use chisel_guard::types::model::DRAFT_OWNER_FIELD;
use chisel_guard::types::record::Record;
use serde_json::json;

mod common;
use common::{actor, pointer, TestContext};

const TABLE: &str = "ct_posts";

/// Published row with a cover image, plus its draft with its own cover.
async fn row_with_draft(ctx: &TestContext, site: &Record, owner: &Record) -> (Record, Record) {
    let cover = ctx.media(site, owner).await;
    let row = ctx
        .seed(Record::new(TABLE).with("title", "Hello").with("cover", pointer(&cover)))
        .await;
    let draft_cover = ctx.media(site, owner).await;
    let draft = ctx
        .seed(
            Record::new(TABLE)
                .with("title", "Hello (draft)")
                .with("cover", pointer(&draft_cover))
                .with(DRAFT_OWNER_FIELD, pointer(&row)),
        )
        .await;
    (row, draft)
}

fn reference_validations(names: &[&str]) -> serde_json::Value {
    json!({"models": {"active": true, "modelsList": names}})
}

#[tokio::test]
async fn test_delete_model_denied_without_rights() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let stranger = ctx.user("stranger@example.com").await;
    let site = ctx.site(&owner).await;
    let model = ctx.model(&site, &owner, TABLE, "posts").await;
    ctx.field(&model, &owner).await;
    row_with_draft(&ctx, &site, &owner).await;
    let saves_before = ctx.store.save_calls();

    let result = ctx
        .services
        .deleter
        .delete_model(&actor(&stranger), &model, ModelDeletion::default())
        .await;

    assert!(matches!(result, Err(AppError::AccessDenied)));
    assert!(ctx.store.destroyed().is_empty());
    assert_eq!(ctx.store.save_calls(), saves_before);
    assert!(!ctx
        .schema
        .calls()
        .iter()
        .any(|c| matches!(c, SchemaCall::Drop(_))));
    assert!(ctx.schema.table(TABLE).is_some());
}

#[tokio::test]
async fn test_delete_model_removes_rows_drafts_and_media() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let site = ctx.site(&owner).await;
    let model = ctx.model(&site, &owner, TABLE, "posts").await;
    let fields = [ctx.field(&model, &owner).await, ctx.field(&model, &owner).await];
    let unrelated_media = ctx.media(&site, &owner).await;

    let n = 3;
    for _ in 0..n {
        row_with_draft(&ctx, &site, &owner).await;
    }

    let report = ctx
        .services
        .deleter
        .delete_model(&actor(&owner), &model, ModelDeletion::default())
        .await
        .unwrap();

    assert_eq!(report.failure_count(), 0);
    assert_eq!(ctx.store.destroyed_in(TABLE), 2 * n);
    assert_eq!(ctx.store.destroyed_in(class::MEDIA_ITEM), 2 * n);
    assert!(ctx.store.all_of(TABLE).is_empty());
    assert!(ctx.exists(&unrelated_media).await);
    for field in &fields {
        assert!(!ctx.exists(field).await);
    }
    assert!(!ctx.exists(&model).await);
    assert!(ctx.schema.table(TABLE).is_none());
}

#[tokio::test]
async fn test_delete_model_scrubs_references() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let site = ctx.site(&owner).await;
    let posts = ctx.model(&site, &owner, TABLE, "posts").await;
    let pages = ctx.model(&site, &owner, "ct_pages", "pages").await;
    let reference = ctx
        .seed(
            Record::new(class::MODEL_FIELD)
                .with("model", pointer(&pages))
                .with("type", "Reference")
                .with("validations", reference_validations(&["authors", "posts", "tags"])),
        )
        .await;

    ctx.services
        .deleter
        .delete_model(&actor(&owner), &posts, ModelDeletion::default())
        .await
        .unwrap();

    let reference = ctx.reload(&reference).await;
    assert_eq!(
        reference.get("validations").unwrap(),
        &reference_validations(&["authors", "tags"])
    );
    assert_eq!(reference.str_field("type"), Some("Reference"));
    assert_eq!(ctx.store.updated_keys(class::MODEL_FIELD), vec![vec!["validations".to_string()]]);
    assert!(ctx.exists(&pages).await);
}

#[tokio::test]
async fn test_delete_model_keeps_references_when_asked() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let site = ctx.site(&owner).await;
    let posts = ctx.model(&site, &owner, TABLE, "posts").await;
    let pages = ctx.model(&site, &owner, "ct_pages", "pages").await;
    let reference = ctx
        .seed(
            Record::new(class::MODEL_FIELD)
                .with("model", pointer(&pages))
                .with("type", "Reference")
                .with("validations", reference_validations(&["posts", "tags"])),
        )
        .await;

    let opts = ModelDeletion {
        delete_references: false,
        delete_record: false,
    };
    ctx.services
        .deleter
        .delete_model(&actor(&owner), &posts, opts)
        .await
        .unwrap();

    let reference = ctx.reload(&reference).await;
    assert_eq!(
        reference.get("validations").unwrap(),
        &reference_validations(&["posts", "tags"])
    );
    // the store removes the record itself in this mode
    assert!(ctx.exists(&posts).await);
}

#[tokio::test]
async fn test_delete_content_item_checks_draft_rights_first() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let editor = ctx.user("editor@example.com").await;
    let site = ctx.site(&owner).await;
    ctx.model(&site, &owner, TABLE, "posts").await;

    let row = ctx.seed(Record::new(TABLE).with("title", "Public")).await;
    ctx.seed(
        Record::new(TABLE)
            .with(DRAFT_OWNER_FIELD, pointer(&row))
            .with_acl(Acl::owned_by(owner.id.as_deref().unwrap())),
    )
    .await;

    let result = ctx
        .services
        .deleter
        .delete_content_item(&actor(&editor), TABLE, row.id.as_deref().unwrap())
        .await;

    assert!(matches!(result, Err(AppError::AccessDenied)));
    assert!(ctx.store.destroyed().is_empty());
    assert_eq!(ctx.store.all_of(TABLE).len(), 2);
}

#[tokio::test]
async fn test_delete_content_item_missing_row() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;

    let result = ctx
        .services
        .deleter
        .delete_content_item(&actor(&owner), TABLE, "nope")
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_delete_site_clears_models_and_collaborations() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let editor = ctx.user("editor@example.com").await;
    let site = ctx.site(&owner).await;
    let posts = ctx.model(&site, &owner, TABLE, "posts").await;
    let pages = ctx.model(&site, &owner, "ct_pages", "pages").await;
    row_with_draft(&ctx, &site, &owner).await;
    let collaboration = ctx.saved_collaboration(&site, &editor, "EDITOR").await;

    let other_site = ctx.site(&owner).await;
    let other_model = ctx.model(&other_site, &owner, "ct_other", "other").await;

    let report = ctx
        .services
        .deleter
        .delete_site(&actor(&owner), &site)
        .await
        .unwrap();

    assert_eq!(report.failure_count(), 0);
    assert!(!ctx.exists(&posts).await);
    assert!(!ctx.exists(&pages).await);
    assert!(!ctx.exists(&collaboration).await);
    assert_eq!(ctx.store.destroyed_in(TABLE), 2);
    assert!(ctx.schema.table(TABLE).is_none());
    assert!(ctx.schema.table("ct_pages").is_none());
    assert!(ctx.exists(&other_model).await);
    assert!(ctx.schema.table("ct_other").is_some());
    // the site record itself is left to the store
    assert!(ctx.exists(&site).await);
}

#[tokio::test]
async fn test_delete_site_denied_for_editor() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let editor = ctx.user("editor@example.com").await;
    let site = ctx.site(&owner).await;
    ctx.model(&site, &owner, TABLE, "posts").await;

    let result = ctx.services.deleter.delete_site(&actor(&editor), &site).await;

    assert!(matches!(result, Err(AppError::AccessDenied)));
    assert!(ctx.store.destroyed().is_empty());
}
