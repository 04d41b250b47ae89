//! Content-addressed blob storage for uploaded images.
//!
//! Blobs are keyed by the SHA-256 of their bytes and grouped in a named
//! bucket, so identical uploads share storage.

mod error;
mod hash;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use hash::ContentHash;
pub use traits::{BlobStore, BoxReader};
