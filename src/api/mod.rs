//! API Module
//!
//! HTTP handlers and routing for the cache service REST API.
//!
//! # Endpoints
//! - `GET /cache/:key` - Orchestrated read with cache status
//! - `PUT /cache/:key` - Write-through to the remote tier
//! - `GET /info` - Diagnostic snapshot
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
