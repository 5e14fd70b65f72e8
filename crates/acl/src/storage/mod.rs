//! Store implementations
//!
//! - [`memory`]: DashMap-backed stores for tests and single-process use
//! - `postgres`: PostgreSQL stores (feature `storage-postgres`)

pub mod memory;
#[cfg(feature = "storage-postgres")]
pub mod postgres;

pub use memory::{MemoryAccessEntryStore, MemoryCredentialNameStore, MemoryCredentialVersionStore};
#[cfg(feature = "storage-postgres")]
pub use postgres::{PostgresConfig, PostgresStore};
