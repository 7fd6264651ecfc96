//! Web gateway: Axum router, handlers, and DTOs.

pub mod server;
pub mod types;

pub use server::{AppState, router, start_server};
