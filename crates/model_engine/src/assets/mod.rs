//! Asset loading
//!
//! Turns files on disk into CPU-side data ready for upload: OBJ/MTL geometry
//! through `tobj`, vertex de-duplication, and RGBA8 images.

pub mod dedup;
pub mod image_loader;
pub mod obj_loader;

#[cfg(test)]
mod dedup_tests;

pub use dedup::{remove_duplicates, MeshData};
pub use image_loader::ImageData;
pub use obj_loader::{FaceCorner, GeometryData, MaterialInfo, MaterialRange, ObjLoader};

use std::path::PathBuf;

/// Model and texture loading errors
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    /// The geometry loader rejected the file
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Loader message
        reason: String,
    },

    /// A face corner references an attribute that does not exist
    #[error("Face corner {corner} references {attribute} {index}, but only {len} exist")]
    IndexOutOfRange {
        /// Corner position in the face stream
        corner: usize,
        /// Attribute kind
        attribute: &'static str,
        /// Offending index
        index: u32,
        /// Number of attributes available
        len: usize,
    },

    /// More unique vertices than a 32-bit index can address
    #[error("Model has more than u32::MAX unique vertices")]
    TooManyVertices,

    /// The file parsed but contains no faces
    #[error("Model {0} contains no faces")]
    Empty(PathBuf),

    /// A referenced image could not be loaded
    #[error("Failed to load image {path}: {reason}")]
    Image {
        /// Image file
        path: PathBuf,
        /// Decoder message
        reason: String,
    },
}
