//! Persistent URL records
//! ----------------------
//! Owns the alias -> target relation and its invariants: alias uniqueness
//! among live rows (engine-enforced), immutable ownership, and the
//! transaction-scoped ownership check on delete.

pub mod sqlite;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored alias -> target mapping. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct UrlRecord {
    pub id: i64,
    pub url: String,
    pub alias: String,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("alias already exists")]
    AliasExists,
    #[error("url not found")]
    NotFound,
    #[error("url not owned by caller")]
    NotOwned,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Internal(sqlx::Error),
}

impl StoreError {
    /// Classify a driver error: unique-constraint violations surface as
    /// `AliasExists` (the constraint is the collision check, there is no
    /// pre-read), infrastructure faults as `Unavailable`, the rest as
    /// unclassified internal errors.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AliasExists,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Internal(err),
        }
    }
}
