//! HTTP API for the ML worker

pub mod handlers;
pub mod routes;

pub use routes::create_router;
