use super::*;

async fn test_ctx() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext { storage }
}

#[tokio::test]
async fn action_with_favorite_updates_and_returns_record() {
    let ctx = test_ctx().await;
    let contact = ctx.storage.create_empty_contact().await.expect("contact");

    let outcome = contact_action(
        &ctx,
        ContactActionForm {
            contact_id: Some(contact.id.0.clone()),
            favorite: Some("true".into()),
        },
    )
    .await
    .expect("action");

    match outcome {
        ActionOutcome::Updated(updated) => {
            assert_eq!(updated.id, contact.id);
            assert!(updated.favorite);
        }
        other => panic!("expected update, got {other:?}"),
    }
}

#[tokio::test]
async fn action_without_favorite_creates_blank_contact() {
    let ctx = test_ctx().await;

    let outcome = contact_action(&ctx, ContactActionForm::default())
        .await
        .expect("action");

    match outcome {
        ActionOutcome::Created(contact) => {
            assert!(!contact.favorite);
            assert!(contact.first.is_none());
        }
        other => panic!("expected create, got {other:?}"),
    }
}

#[tokio::test]
async fn favorite_without_contact_id_is_a_precondition_failure() {
    let ctx = test_ctx().await;

    let err = contact_action(
        &ctx,
        ContactActionForm {
            contact_id: None,
            favorite: Some("true".into()),
        },
    )
    .await
    .expect_err("must reject");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = contact_action(
        &ctx,
        ContactActionForm {
            contact_id: Some("   ".into()),
            favorite: Some("true".into()),
        },
    )
    .await
    .expect_err("must reject blank id");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn favorite_string_parses_strictly() {
    let ctx = test_ctx().await;
    let contact = ctx.storage.create_empty_contact().await.expect("contact");
    ctx.storage
        .set_favorite(&contact.id, true)
        .await
        .expect("seed");

    // Anything other than the literal "true" clears the flag.
    let outcome = contact_action(
        &ctx,
        ContactActionForm {
            contact_id: Some(contact.id.0.clone()),
            favorite: Some("TRUE".into()),
        },
    )
    .await
    .expect("action");
    match outcome {
        ActionOutcome::Updated(updated) => assert!(!updated.favorite),
        other => panic!("expected update, got {other:?}"),
    }
}

#[tokio::test]
async fn favorite_for_unknown_contact_is_not_found() {
    let ctx = test_ctx().await;

    let err = contact_action(
        &ctx,
        ContactActionForm {
            contact_id: Some("missing".into()),
            favorite: Some("true".into()),
        },
    )
    .await
    .expect_err("must reject");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn get_and_delete_report_not_found() {
    let ctx = test_ctx().await;
    let missing = ContactId("missing".into());

    let err = get_contact(&ctx, &missing).await.expect_err("get");
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = delete_contact(&ctx, &missing).await.expect_err("delete");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn list_maps_to_summaries() {
    let ctx = test_ctx().await;
    let contact = ctx.storage.create_empty_contact().await.expect("contact");
    update_contact(
        &ctx,
        &contact.id,
        &ContactUpdate {
            first: Some("Ada".into()),
            last: Some("Lovelace".into()),
            ..Default::default()
        },
    )
    .await
    .expect("update");

    let summaries = list_contacts(&ctx, None).await.expect("list");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].first.as_deref(), Some("Ada"));
    assert!(!summaries[0].favorite);
}
