//! Stored pixel formats.
//!
//! A [`PixelFormat`] describes how a [`Buffer`](crate::Buffer) lays out its
//! bytes: a [`ChannelDepth`] (component type) crossed with a
//! [`ChannelLayout`] (component count and meaning). Evaluation never works
//! on stored formats directly; buffers decode to RGBA `f32` on read and
//! encode on write.

/// Component type of a stored pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelDepth {
    /// 8-bit unsigned, [0, 255] maps to [0.0, 1.0]
    U8,
    /// 16-bit unsigned little-endian, [0, 65535] maps to [0.0, 1.0]
    U16,
    /// 16-bit IEEE half float, little-endian
    F16,
    /// 32-bit IEEE float, little-endian
    F32,
}

impl ChannelDepth {
    /// Size of one component in bytes.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Component count and meaning of a stored pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// Single gray component
    Gray,
    /// Gray plus alpha
    GrayAlpha,
    /// Red, green, blue
    Rgb,
    /// Red, green, blue, alpha
    Rgba,
}

impl ChannelLayout {
    /// Number of components per pixel.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Whether the layout carries an alpha component.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::GrayAlpha | Self::Rgba)
    }
}

/// Full stored format of a buffer pixel.
///
/// # Example
///
/// ```rust
/// use pixelgraph_core::PixelFormat;
///
/// assert_eq!(PixelFormat::RGBA_U8.bytes_per_pixel(), 4);
/// assert_eq!(PixelFormat::RGBA_F32.bytes_per_pixel(), 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    /// Component type
    pub depth: ChannelDepth,
    /// Component layout
    pub layout: ChannelLayout,
}

impl PixelFormat {
    /// Interleaved RGBA, 8 bits per component.
    pub const RGBA_U8: PixelFormat = PixelFormat::new(ChannelDepth::U8, ChannelLayout::Rgba);
    /// Interleaved RGB, 8 bits per component.
    pub const RGB_U8: PixelFormat = PixelFormat::new(ChannelDepth::U8, ChannelLayout::Rgb);
    /// Single gray channel, 8 bits.
    pub const GRAY_U8: PixelFormat = PixelFormat::new(ChannelDepth::U8, ChannelLayout::Gray);
    /// Interleaved RGBA, 16 bits per component.
    pub const RGBA_U16: PixelFormat = PixelFormat::new(ChannelDepth::U16, ChannelLayout::Rgba);
    /// Interleaved RGBA half float.
    pub const RGBA_F16: PixelFormat = PixelFormat::new(ChannelDepth::F16, ChannelLayout::Rgba);
    /// Interleaved RGBA full float.
    pub const RGBA_F32: PixelFormat = PixelFormat::new(ChannelDepth::F32, ChannelLayout::Rgba);

    /// Creates a format from depth and layout.
    #[inline]
    pub const fn new(depth: ChannelDepth, layout: ChannelLayout) -> Self {
        Self { depth, layout }
    }

    /// Size of one stored pixel in bytes.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.depth.bytes() * self.layout.channels()
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}-{:?}", self.layout, self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(PixelFormat::GRAY_U8.bytes_per_pixel(), 1);
        assert_eq!(PixelFormat::RGB_U8.bytes_per_pixel(), 3);
        assert_eq!(PixelFormat::RGBA_U16.bytes_per_pixel(), 8);
        assert_eq!(PixelFormat::RGBA_F16.bytes_per_pixel(), 8);
        assert_eq!(PixelFormat::RGBA_F32.bytes_per_pixel(), 16);
    }

    #[test]
    fn test_layout_alpha() {
        assert!(ChannelLayout::Rgba.has_alpha());
        assert!(ChannelLayout::GrayAlpha.has_alpha());
        assert!(!ChannelLayout::Rgb.has_alpha());
    }
}
