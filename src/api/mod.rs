//! HTTP transport: route table, shared state, and one handler module per
//! resource. Handlers validate payload shape, then hand off to the services.

mod directors;
mod films;
mod genres;
mod mpa;
mod reviews;
mod users;

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
