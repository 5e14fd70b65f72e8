//! Infrastructure traits for storage

mod store;

pub use store::{AccessEntryStore, CredentialNameStore, CredentialVersionStore};
