pub mod directory;
pub mod error;
pub mod jwt;
pub mod memory;
pub mod metrics;
pub mod redis;
pub mod session;
pub mod store;

pub use directory::{CredentialLookup, Credentials, InMemoryDirectory, RoleLookup};
pub use error::{SessionError, StoreError};
pub use jwt::{AccessClaims, JwtService, RefreshClaims, TokenPair};
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use session::{AuthSession, SessionService};
pub use store::SessionStore;
