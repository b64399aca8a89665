use serde::{Deserialize, Serialize};

/// Authenticated caller identity derived from a verified session token.
/// Admin status is deliberately absent: privilege can change after token
/// issuance, so it is re-resolved against the identity provider per
/// privileged operation instead of being carried here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub email: String,
}
