//! URL store integration tests: alias uniqueness, ownership-gated delete and
//! owner-scoped listing. These exercise positive and negative paths against a
//! real on-disk store.

use anyhow::Result;
use tempfile::{TempDir, tempdir};

use curtail::storage::StoreError;
use curtail::storage::sqlite::SqliteStore;

async fn open_store(tmp: &TempDir) -> SqliteStore {
    SqliteStore::new(tmp.path().join("curtail.db"))
        .await
        .expect("open store")
}

#[tokio::test]
async fn save_then_resolve_returns_target() -> Result<()> {
    let tmp = tempdir()?;
    let store = open_store(&tmp).await;

    let id = store.save_url("https://example.com/a", "abc123", 1).await?;
    assert!(id > 0);
    assert_eq!(store.get_url("abc123").await?, "https://example.com/a");
    Ok(())
}

#[tokio::test]
async fn duplicate_alias_rejected_and_original_unchanged() -> Result<()> {
    let tmp = tempdir()?;
    let store = open_store(&tmp).await;

    store.save_url("https://example.com/first", "dup", 1).await?;
    // Second save with the same alias must lose, whoever the owner is.
    let err = store.save_url("https://example.com/second", "dup", 2).await.unwrap_err();
    assert!(matches!(err, StoreError::AliasExists), "got {err:?}");

    assert_eq!(store.get_url("dup").await?, "https://example.com/first");
    let owner1 = store.get_user_urls(1).await?;
    assert_eq!(owner1.len(), 1);
    assert_eq!(owner1[0].user_id, 1);
    assert!(store.get_user_urls(2).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn delete_requires_ownership() -> Result<()> {
    let tmp = tempdir()?;
    let store = open_store(&tmp).await;

    store.save_url("https://example.com", "mine", 1).await?;
    let err = store.delete_url("mine", 2, false).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOwned), "got {err:?}");
    // No partial deletion: the record is still resolvable.
    assert_eq!(store.get_url("mine").await?, "https://example.com");

    // The owner can delete it.
    store.delete_url("mine", 1, false).await?;
    assert!(matches!(store.get_url("mine").await.unwrap_err(), StoreError::NotFound));
    Ok(())
}

#[tokio::test]
async fn admin_override_deletes_any_record() -> Result<()> {
    let tmp = tempdir()?;
    let store = open_store(&tmp).await;

    store.save_url("https://example.com", "theirs", 1).await?;
    store.delete_url("theirs", 2, true).await?;
    assert!(matches!(store.get_url("theirs").await.unwrap_err(), StoreError::NotFound));
    Ok(())
}

#[tokio::test]
async fn delete_unknown_alias_is_not_found_even_for_admin() -> Result<()> {
    let tmp = tempdir()?;
    let store = open_store(&tmp).await;

    let err = store.delete_url("missing", 1, false).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound), "got {err:?}");
    let err = store.delete_url("missing", 1, true).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn list_by_owner_is_scoped_and_ordered() -> Result<()> {
    let tmp = tempdir()?;
    let store = open_store(&tmp).await;

    store.save_url("https://example.com/1", "a1", 1).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.save_url("https://example.com/2", "a2", 1).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.save_url("https://example.com/3", "a3", 1).await?;
    store.save_url("https://example.com/x", "b1", 2).await?;

    let urls = store.get_user_urls(1).await?;
    let aliases: Vec<&str> = urls.iter().map(|u| u.alias.as_str()).collect();
    assert_eq!(aliases, vec!["a3", "a2", "a1"], "most recently updated first");
    assert!(urls.iter().all(|u| u.user_id == 1));
    assert!(urls.iter().all(|u| u.updated_at >= u.created_at));

    // Deleting another owner's record leaves this listing untouched.
    store.delete_url("b1", 2, false).await?;
    let after = store.get_user_urls(1).await?;
    assert_eq!(after.len(), 3);

    // Unknown owner: empty listing, not an error.
    assert!(store.get_user_urls(999).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_saves_have_exactly_one_winner() -> Result<()> {
    let tmp = tempdir()?;
    let store = open_store(&tmp).await;

    let s1 = store.clone();
    let s2 = store.clone();
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { s1.save_url("https://example.com/one", "race", 1).await }),
        tokio::spawn(async move { s2.save_url("https://example.com/two", "race", 2).await }),
    );
    let results = [r1?, r2?];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let losses = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::AliasExists)))
        .count();
    assert_eq!((wins, losses), (1, 1), "exactly one save must win");
    Ok(())
}

#[tokio::test]
async fn save_resolve_delete_scenario() -> Result<()> {
    let tmp = tempdir()?;
    let store = open_store(&tmp).await;

    let id = store.save_url("https://example.com", "abc123", 1).await?;
    assert!(id > 0);
    assert_eq!(store.get_url("abc123").await?, "https://example.com");

    let err = store.delete_url("abc123", 2, false).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOwned));

    store.delete_url("abc123", 2, true).await?;
    assert!(matches!(store.get_url("abc123").await.unwrap_err(), StoreError::NotFound));
    Ok(())
}
