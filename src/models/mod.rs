//! Request and Response models for the cache service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{validate_key, ReadQuery, WriteRequest, MAX_KEY_LENGTH};
pub use responses::{ErrorResponse, HealthResponse, InfoResponse, ReadResponse, WriteResponse};
