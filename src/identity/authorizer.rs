//! Authorization gate for mutating operations.
//!
//! Create and list paths are gated by the verified principal id alone; delete
//! additionally consults the identity provider for the caller's CURRENT admin
//! status. A token-carried or cached admin claim never reaches the store.

use tracing::info;

use crate::clients::sso::SsoClient;
use crate::error::AppResult;
use crate::storage::sqlite::SqliteStore;

/// Delete `alias` on behalf of `principal_id`.
///
/// Admin status is resolved per call; the ownership check and the deletion
/// themselves run inside one store transaction, so the decision cannot go
/// stale between check and mutation.
pub async fn delete_url(
    store: &SqliteStore,
    sso: &dyn SsoClient,
    alias: &str,
    principal_id: i64,
) -> AppResult<()> {
    let is_admin = sso.is_admin(principal_id).await?;
    crate::tprintln!("authz.delete alias={} user={} is_admin={}", alias, principal_id, is_admin);
    store.delete_url(alias, principal_id, is_admin).await?;
    info!(alias = alias, user_id = principal_id, is_admin = is_admin, "url deleted");
    Ok(())
}
