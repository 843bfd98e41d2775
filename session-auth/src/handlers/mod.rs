pub mod metrics;
pub mod session;

pub use session::{authorize, login, logout, refresh, session};
