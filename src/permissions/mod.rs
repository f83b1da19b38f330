mod gate;
mod memory;
mod types;

pub use gate::{GateOutcome, PermissionGate, PermissionService};
pub use memory::InMemoryPermissions;
pub use types::{Permission, PermissionSet, LEGACY_STORAGE_MAX_API_LEVEL};
