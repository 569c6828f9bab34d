//! HTTP server for the storefront.
//!
//! - Application state shared by the handlers
//! - Router configuration

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
