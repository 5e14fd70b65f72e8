//! Access-control services
//!
//! - [`AccessControlDataService`]: the ACL engine (list, upsert, delete,
//!   capability checks)
//! - [`PermissionService`]: capability checks for an authenticated caller
//! - [`AccessControlHandler`]: authorization and masking for ACL requests
//! - [`EntryLocks`]: per-(credential, actor) critical sections for upserts

mod data;
mod handler;
mod locks;
mod permission;

pub use data::AccessControlDataService;
pub use handler::AccessControlHandler;
pub use locks::EntryLocks;
pub use permission::PermissionService;
