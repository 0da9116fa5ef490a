//! Record Module
//!
//! Canonical cache-record shape, request fingerprints, tier selection and
//! the encryption envelope for private records.

mod cipher;
mod codec;
mod model;
mod request;

pub use cipher::{Cipher, DataKey};
pub use codec::{RecordCodec, Tier};
pub use model::{Body, CacheRecord, Headers};
pub use request::{CacheProfile, CacheRequest, Connection, Expiration};

#[cfg(test)]
pub(crate) use cipher::testing;
