pub mod auth;
pub mod drink_id;

pub use auth::{enforce_permission, require_permission, PermissionGate};
pub use drink_id::require_drink_id;
