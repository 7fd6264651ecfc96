//! Community justice case management.
//!
//! Citizens register and request a role, administrators approve them,
//! judges track conflict cases through a fixed workflow with 15/30-day
//! deadlines, and administrators oversee statistics, exports, and the
//! audit trail. Storage is PostgreSQL; the gateway is JSON over Axum.

pub mod cases;
pub mod channels;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod stats;
pub mod users;
