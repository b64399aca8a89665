//! Caller identity: principal extraction from verified session tokens, and the
//! authorization gate composing identity, admin resolution and the URL store.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod verifier;
pub mod authorizer;

pub use principal::Principal;
pub use verifier::{AuthError, TokenVerifier};
