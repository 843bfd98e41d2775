pub mod auth;
pub mod permission;

pub use auth::auth_middleware;
pub use permission::{authorize, require_capabilities};
