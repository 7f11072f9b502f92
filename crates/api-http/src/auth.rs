// Request Authentication Seam
//
// The portal fronts this service with its own session layer; by the time
// a request arrives here, identity travels in trusted headers. The trait
// keeps that assumption swappable.

use axum::http::HeaderMap;

use transdoc_core::domain::UserId;

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl AuthContext {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }
}

pub trait AuthProvider: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, ApiError>;
}

/// Reads `x-user-id` / `x-user-role` headers set by the fronting proxy.
pub struct HeaderAuthProvider;

impl AuthProvider for HeaderAuthProvider {
    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
        let user_id = headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("missing x-user-id header".to_string()))?;

        let is_admin = headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|role| role.eq_ignore_ascii_case("admin"));

        Ok(AuthContext {
            user_id: user_id.to_string(),
            is_admin,
        })
    }
}
