//! Graphic record decoding and BMP export.

mod bmp;
mod decoder;

pub use decoder::{BitmapDecoder, ManifestEntry};
