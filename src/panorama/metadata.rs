//! Panorama metadata module
//!
//! Builds GPano XMP packets and splices them into JPEG and PNG byte streams.

mod crc;
mod injector;
pub mod inspect;
pub mod jpeg;
pub mod png;
pub mod xmp;

pub use crc::Crc32;
pub use injector::MetadataInjector;
pub use inspect::{read_panorama_metadata, PanoramaInfo};
pub use xmp::{XmpPanoramaMetadata, XmpSettings};
