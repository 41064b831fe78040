//! # pixelgraph-core
//!
//! Core types shared by every crate in the pixelgraph workspace.
//!
//! This crate defines the data model over which operation graphs are
//! evaluated:
//!
//! - [`Rect`] - Integer region used to address buffers and evaluation tiles
//! - [`Rgba`] - Working color value with sRGB transfer helpers
//! - [`PixelFormat`] - Stored channel depth and layout of a buffer
//! - [`Buffer`] - Caller-owned 2D pixel store
//! - [`Tile`] - RGBA f32 working pixels for one evaluation step
//! - [`Error`] - Failure modes for buffer addressing
//!
//! # Working format
//!
//! Buffers may store pixels at any supported depth and layout, but all
//! graph evaluation happens on interleaved RGBA `f32` in [0, 1]. A
//! [`Buffer`] decodes into that working format on read and encodes back on
//! write, so leaf operations never see storage formats.
//!
//! # Example
//!
//! ```rust
//! use pixelgraph_core::{Buffer, PixelFormat, Rect, Rgba};
//!
//! let mut buf = Buffer::new(64, 64, PixelFormat::RGBA_U8);
//! buf.fill(Rgba::new(1.0, 0.0, 0.0, 1.0));
//!
//! let mut pixels = vec![0.0f32; 16 * 16 * 4];
//! buf.read_rect(Rect::new(0, 0, 16, 16), &mut pixels).unwrap();
//! assert_eq!(pixels[0], 1.0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod buffer;
mod color;
mod error;
mod format;
mod rect;
mod tile;

pub use buffer::Buffer;
pub use color::{linear_to_srgb, srgb_to_linear, Rgba};
pub use error::{Error, Result};
pub use format::{ChannelDepth, ChannelLayout, PixelFormat};
pub use rect::Rect;
pub use tile::Tile;
