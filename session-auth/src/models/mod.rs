pub mod permission;
pub mod session;

pub use permission::{
    any_role_has_all, any_role_has_any, has_all, has_any, Capability, Requirement, Role,
};
pub use session::Session;
