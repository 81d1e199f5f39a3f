//! Image reassembly and persistence.

pub mod persist;
pub mod reassembler;
pub mod store;

pub use persist::{resolve_image_type, ImagePersister};
pub use reassembler::ImageReassembler;
pub use store::{BlobStore, FsBlobStore, SavedBlob};
