use super::*;

#[tokio::test]
async fn fresh_contact_starts_unfavorited() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let contact = storage.create_empty_contact().await.expect("contact");
    assert!(!contact.favorite);
    assert!(contact.first.is_none());
    assert!(contact.last.is_none());
    assert!(!contact.id.0.is_empty());
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("contacts_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("contacts.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn generated_ids_are_unique() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let a = storage.create_empty_contact().await.expect("a");
    let b = storage.create_empty_contact().await.expect("b");
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn set_favorite_persists_and_round_trips() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let contact = storage.create_empty_contact().await.expect("contact");

    let updated = storage
        .set_favorite(&contact.id, true)
        .await
        .expect("set favorite")
        .expect("contact exists");
    assert!(updated.favorite);

    let reloaded = storage
        .get_contact(&contact.id)
        .await
        .expect("get")
        .expect("contact exists");
    assert!(reloaded.favorite);
}

#[tokio::test]
async fn set_favorite_on_unknown_id_returns_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let missing = storage
        .set_favorite(&ContactId("nope".into()), true)
        .await
        .expect("set favorite");
    assert!(missing.is_none());
}

#[tokio::test]
async fn update_contact_keeps_absent_fields() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let contact = storage.create_empty_contact().await.expect("contact");

    storage
        .update_contact(
            &contact.id,
            &ContactUpdate {
                first: Some("Ada".into()),
                last: Some("Lovelace".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .expect("contact exists");

    let updated = storage
        .update_contact(
            &contact.id,
            &ContactUpdate {
                notes: Some("met at RustConf".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .expect("contact exists");

    assert_eq!(updated.first.as_deref(), Some("Ada"));
    assert_eq!(updated.last.as_deref(), Some("Lovelace"));
    assert_eq!(updated.notes.as_deref(), Some("met at RustConf"));
    assert!(!updated.favorite, "profile edits do not touch the flag");
}

#[tokio::test]
async fn list_filters_by_name_substring() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let ada = storage.create_empty_contact().await.expect("ada");
    let grace = storage.create_empty_contact().await.expect("grace");

    storage
        .update_contact(
            &ada.id,
            &ContactUpdate {
                first: Some("Ada".into()),
                last: Some("Lovelace".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update ada");
    storage
        .update_contact(
            &grace.id,
            &ContactUpdate {
                first: Some("Grace".into()),
                last: Some("Hopper".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update grace");

    let hits = storage.list_contacts(Some("love")).await.expect("list");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, ada.id);

    let all = storage.list_contacts(None).await.expect("list");
    assert_eq!(all.len(), 2);

    let blank = storage.list_contacts(Some("   ")).await.expect("list");
    assert_eq!(blank.len(), 2, "whitespace-only query lists everything");
}

#[tokio::test]
async fn list_orders_by_last_then_first() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let hopper = storage.create_empty_contact().await.expect("hopper");
    let lovelace = storage.create_empty_contact().await.expect("lovelace");

    storage
        .update_contact(
            &lovelace.id,
            &ContactUpdate {
                first: Some("Ada".into()),
                last: Some("Lovelace".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    storage
        .update_contact(
            &hopper.id,
            &ContactUpdate {
                first: Some("Grace".into()),
                last: Some("hopper".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    let all = storage.list_contacts(None).await.expect("list");
    assert_eq!(all[0].id, hopper.id, "ordering is case-insensitive");
    assert_eq!(all[1].id, lovelace.id);
}

#[tokio::test]
async fn delete_removes_contact() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let contact = storage.create_empty_contact().await.expect("contact");

    assert!(storage.delete_contact(&contact.id).await.expect("delete"));
    assert!(storage
        .get_contact(&contact.id)
        .await
        .expect("get")
        .is_none());
    assert!(!storage.delete_contact(&contact.id).await.expect("delete"));
}
