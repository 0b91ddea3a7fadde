// handlers/mod.rs - route handlers
//
// Public routes take no credentials; every other drinks route is wrapped in a
// permission gate by the router (see app.rs) and receives the verified
// claims as an extension.
pub mod drinks;
pub mod fallback;
pub mod health;

pub use drinks::{create_drink, delete_drink, list_drinks, list_drinks_detail, update_drink};
pub use fallback::{method_not_allowed, not_found};
pub use health::health;
