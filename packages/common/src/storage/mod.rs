mod error;
mod id;
mod traits;

pub mod filesystem;
pub mod memory;

pub use error::StorageError;
pub use id::BlobId;
pub use traits::{Blob, BlobInfo, BlobStore};
