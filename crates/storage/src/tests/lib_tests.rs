use super::*;
use chrono::Duration;

fn ts(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).expect("timestamp")
}

#[tokio::test]
async fn empty_slot_loads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.load_credential_token().await.expect("load").is_none());
    assert!(!storage.delete_credential_token().await.expect("delete"));
}

#[tokio::test]
async fn saves_and_loads_credential_token() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let issued = ts(1_700_000_000);
    let expires = issued + Duration::days(7);

    storage
        .save_credential_token("tok-1", issued, expires)
        .await
        .expect("save");

    let stored = storage
        .load_credential_token()
        .await
        .expect("load")
        .expect("present");
    assert_eq!(stored.token, "tok-1");
    assert_eq!(stored.issued_at, issued);
    assert_eq!(stored.expires_at, expires);
}

#[tokio::test]
async fn saving_again_replaces_the_single_slot() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let issued = ts(1_700_000_000);
    storage
        .save_credential_token("old", issued, issued + Duration::days(7))
        .await
        .expect("save old");
    storage
        .save_credential_token("new", issued, issued + Duration::days(7))
        .await
        .expect("save new");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credential_token")
        .fetch_one(&storage.pool)
        .await
        .expect("count");
    assert_eq!(count, 1);
    let stored = storage
        .load_credential_token()
        .await
        .expect("load")
        .expect("present");
    assert_eq!(stored.token, "new");
}

#[tokio::test]
async fn delete_clears_the_slot() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let issued = ts(1_700_000_000);
    storage
        .save_credential_token("tok", issued, issued + Duration::days(7))
        .await
        .expect("save");

    assert!(storage.delete_credential_token().await.expect("delete"));
    assert!(storage.load_credential_token().await.expect("load").is_none());
}

#[tokio::test]
async fn expired_token_is_purged_on_read() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let issued = ts(1_700_000_000);
    let expires = issued + Duration::days(7);
    storage
        .save_credential_token("tok", issued, expires)
        .await
        .expect("save");

    let live = storage
        .load_unexpired_credential_token(expires - Duration::seconds(1))
        .await
        .expect("load live");
    assert_eq!(live.map(|t| t.token).as_deref(), Some("tok"));

    let expired = storage
        .load_unexpired_credential_token(expires)
        .await
        .expect("load expired");
    assert!(expired.is_none());
    assert!(storage.load_credential_token().await.expect("load").is_none());
}

#[test]
fn memory_url_has_no_filesystem_path() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/session.db?mode=rwc"),
        Some(PathBuf::from("./data/session.db"))
    );
}
