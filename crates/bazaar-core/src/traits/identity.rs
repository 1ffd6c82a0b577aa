//! Bearer token resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::UserId;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The caller's user id.
    pub user_id: UserId,
    /// Name shown to the other participant and in notifications.
    pub display_name: String,
}

/// Turns a bearer token into an [`Identity`].
///
/// Implementations return an `Unauthorized` error for missing, malformed,
/// or expired tokens.
#[async_trait]
pub trait IdentityResolver: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve the identity behind a token.
    async fn resolve(&self, token: &str) -> AppResult<Identity>;
}
