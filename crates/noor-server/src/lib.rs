//! Noor server: HTTP surface and seed tooling around the search core.

pub mod routes;
pub mod seed;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
