//! 认证模块
//!
//! Identity is external: a token-issuing service shares `JWT_SECRET` with
//! this server and mints bearer tokens carrying `{user_id, role}`. This
//! module only validates tokens and injects [`CurrentUser`] into requests;
//! there is no login endpoint here.

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService, Role};
pub use middleware::{require_admin, require_auth};
