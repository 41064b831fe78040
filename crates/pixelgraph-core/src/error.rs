//! Error types for buffer addressing and core operations.

use crate::{PixelFormat, Rect};
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by core buffer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A region addressed against a buffer does not lie within its bounds.
    #[error("region {region} exceeds buffer bounds {width}x{height}")]
    RegionOutOfBounds {
        /// The offending region
        region: Rect,
        /// Buffer width
        width: u32,
        /// Buffer height
        height: u32,
    },

    /// Buffer dimensions are unusable.
    #[error("invalid dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Why they were rejected
        reason: String,
    },

    /// A pixel slice does not match the expected region size.
    #[error("pixel slice holds {got} floats, region {region} needs {expected}")]
    SliceSize {
        /// The region being read or written
        region: Rect,
        /// Required slice length
        expected: usize,
        /// Provided slice length
        got: usize,
    },

    /// Raw byte data does not match width * height * bytes_per_pixel.
    #[error("raw data holds {got} bytes, {width}x{height} {format} needs {expected}")]
    DataSize {
        /// Buffer width
        width: u32,
        /// Buffer height
        height: u32,
        /// Declared format
        format: PixelFormat,
        /// Required byte length
        expected: usize,
        /// Provided byte length
        got: usize,
    },
}
