// Transdoc HTTP API Surface

mod auth;
mod dto;
mod error;
mod routes;

pub use auth::{AuthContext, AuthProvider, HeaderAuthProvider};
pub use error::ApiError;
pub use routes::{router, AppState};
