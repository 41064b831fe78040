//! Caller-owned 2D pixel store.
//!
//! A [`Buffer`] holds raw bytes in a declared [`PixelFormat`] and converts
//! to and from the RGBA `f32` working format at its edges. The engine never
//! allocates or frees buffers on the caller's behalf; it borrows a source
//! buffer immutably and a destination buffer exclusively for the duration
//! of one call.
//!
//! # Abyss semantics
//!
//! Reads are defined for any region: pixels outside the buffer extent
//! decode as transparent black. Writes must lie fully within bounds and
//! fail otherwise, before touching any byte.

use crate::{ChannelDepth, ChannelLayout, Error, PixelFormat, Rect, Result, Rgba};
use half::f16;

/// An addressable 2D pixel store with a declared stored format.
///
/// # Example
///
/// ```rust
/// use pixelgraph_core::{Buffer, PixelFormat, Rect, Rgba};
///
/// let mut buf = Buffer::new(32, 32, PixelFormat::RGBA_U8);
/// buf.fill(Rgba::new(0.0, 1.0, 0.0, 1.0));
/// assert_eq!(buf.pixel(5, 5).g, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Buffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Buffer {
    /// Creates a zero-filled buffer.
    ///
    /// Zero bytes decode to transparent black for alpha layouts and opaque
    /// black for alpha-less layouts.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            data: vec![0; len],
        }
    }

    /// Creates a buffer taking ownership of raw bytes in the given format.
    pub fn from_bytes(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(Error::DataSize {
                width,
                height,
                format,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Buffer width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Declared stored format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Size of one stored pixel in bytes.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// The buffer's full extent as a rectangle at the origin.
    #[inline]
    pub fn extent(&self) -> Rect {
        Rect::from_size(self.width as i32, self.height as i32)
    }

    /// Raw stored bytes, row-major.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Fills the whole buffer with one color.
    pub fn fill(&mut self, color: Rgba) {
        let bpp = self.bytes_per_pixel();
        let mut encoded = [0u8; 16];
        encode_pixel(color.to_array(), self.format, &mut encoded[..bpp]);
        for px in self.data.chunks_exact_mut(bpp) {
            px.copy_from_slice(&encoded[..bpp]);
        }
    }

    /// Decodes the pixel at (x, y).
    ///
    /// Out-of-bounds coordinates decode as transparent black.
    pub fn pixel(&self, x: i32, y: i32) -> Rgba {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Rgba::TRANSPARENT;
        }
        let bpp = self.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        Rgba::from_array(decode_pixel(&self.data[offset..offset + bpp], self.format))
    }

    /// Encodes one pixel at (x, y).
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) -> Result<()> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Err(Error::RegionOutOfBounds {
                region: Rect::new(x, y, 1, 1),
                width: self.width,
                height: self.height,
            });
        }
        let bpp = self.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        encode_pixel(color.to_array(), self.format, &mut self.data[offset..offset + bpp]);
        Ok(())
    }

    /// Decodes `rect` into interleaved RGBA f32 working pixels.
    ///
    /// `out` must hold exactly `rect.area() * 4` floats. The region may
    /// extend beyond the buffer extent; outside pixels decode as
    /// transparent black.
    pub fn read_rect(&self, rect: Rect, out: &mut [f32]) -> Result<()> {
        let expected = rect.area() as usize * 4;
        if out.len() != expected {
            return Err(Error::SliceSize {
                region: rect,
                expected,
                got: out.len(),
            });
        }
        if rect.is_empty() {
            return Ok(());
        }

        let bpp = self.bytes_per_pixel();
        let bw = self.width as i32;
        let bh = self.height as i32;

        for row in 0..rect.height {
            let y = rect.y + row;
            let out_row = &mut out[(row as usize * rect.width as usize) * 4..]
                [..rect.width as usize * 4];
            if y < 0 || y >= bh {
                out_row.fill(0.0);
                continue;
            }
            for col in 0..rect.width {
                let x = rect.x + col;
                let dst = &mut out_row[col as usize * 4..col as usize * 4 + 4];
                if x < 0 || x >= bw {
                    dst.fill(0.0);
                } else {
                    let offset = (y as usize * self.width as usize + x as usize) * bpp;
                    dst.copy_from_slice(&decode_pixel(
                        &self.data[offset..offset + bpp],
                        self.format,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Encodes interleaved RGBA f32 working pixels into `rect`.
    ///
    /// Unlike reads, writes must lie fully within the buffer extent; an
    /// out-of-bounds region fails before any byte is modified.
    pub fn write_rect(&mut self, rect: Rect, pixels: &[f32]) -> Result<()> {
        let expected = rect.area() as usize * 4;
        if pixels.len() != expected {
            return Err(Error::SliceSize {
                region: rect,
                expected,
                got: pixels.len(),
            });
        }
        if rect.is_empty() {
            return Ok(());
        }
        if !self.extent().contains_rect(&rect) {
            return Err(Error::RegionOutOfBounds {
                region: rect,
                width: self.width,
                height: self.height,
            });
        }

        let bpp = self.bytes_per_pixel();
        for row in 0..rect.height {
            let y = (rect.y + row) as usize;
            for col in 0..rect.width {
                let x = (rect.x + col) as usize;
                let src_off = (row as usize * rect.width as usize + col as usize) * 4;
                let px: [f32; 4] = [
                    pixels[src_off],
                    pixels[src_off + 1],
                    pixels[src_off + 2],
                    pixels[src_off + 3],
                ];
                let offset = (y * self.width as usize + x) * bpp;
                encode_pixel(px, self.format, &mut self.data[offset..offset + bpp]);
            }
        }
        Ok(())
    }
}

/// Decodes one stored pixel to working RGBA.
///
/// Gray replicates to all three color channels; layouts without alpha
/// decode with alpha 1.0.
fn decode_pixel(bytes: &[u8], format: PixelFormat) -> [f32; 4] {
    let n = format.layout.channels();
    let mut c = [0.0f32; 4];
    for (i, v) in c.iter_mut().take(n).enumerate() {
        *v = decode_component(bytes, i, format.depth);
    }
    match format.layout {
        ChannelLayout::Gray => [c[0], c[0], c[0], 1.0],
        ChannelLayout::GrayAlpha => [c[0], c[0], c[0], c[1]],
        ChannelLayout::Rgb => [c[0], c[1], c[2], 1.0],
        ChannelLayout::Rgba => c,
    }
}

/// Encodes one working RGBA pixel into stored bytes.
///
/// Gray layouts store Rec. 709 luma; integer depths clamp to [0, 1] before
/// quantizing, float depths store components as-is.
fn encode_pixel(px: [f32; 4], format: PixelFormat, out: &mut [u8]) {
    let luma = 0.2126 * px[0] + 0.7152 * px[1] + 0.0722 * px[2];
    let components: [f32; 4] = match format.layout {
        ChannelLayout::Gray => [luma, 0.0, 0.0, 0.0],
        ChannelLayout::GrayAlpha => [luma, px[3], 0.0, 0.0],
        ChannelLayout::Rgb => [px[0], px[1], px[2], 0.0],
        ChannelLayout::Rgba => px,
    };
    for (i, v) in components
        .iter()
        .take(format.layout.channels())
        .enumerate()
    {
        encode_component(*v, out, i, format.depth);
    }
}

#[inline]
fn decode_component(bytes: &[u8], index: usize, depth: ChannelDepth) -> f32 {
    match depth {
        ChannelDepth::U8 => bytes[index] as f32 / 255.0,
        ChannelDepth::U16 => {
            let off = index * 2;
            u16::from_le_bytes([bytes[off], bytes[off + 1]]) as f32 / 65535.0
        }
        ChannelDepth::F16 => {
            let off = index * 2;
            f16::from_le_bytes([bytes[off], bytes[off + 1]]).to_f32()
        }
        ChannelDepth::F32 => {
            let off = index * 4;
            f32::from_le_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
        }
    }
}

#[inline]
fn encode_component(v: f32, bytes: &mut [u8], index: usize, depth: ChannelDepth) {
    match depth {
        ChannelDepth::U8 => {
            bytes[index] = (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        }
        ChannelDepth::U16 => {
            let q = (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16;
            bytes[index * 2..index * 2 + 2].copy_from_slice(&q.to_le_bytes());
        }
        ChannelDepth::F16 => {
            bytes[index * 2..index * 2 + 2].copy_from_slice(&f16::from_f32(v).to_le_bytes());
        }
        ChannelDepth::F32 => {
            bytes[index * 4..index * 4 + 4].copy_from_slice(&v.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_zero_filled() {
        let buf = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        assert_eq!(buf.pixel(0, 0), Rgba::TRANSPARENT);
        assert_eq!(buf.bytes().len(), 4 * 4 * 4);
    }

    #[test]
    fn test_from_bytes_size_check() {
        let err = Buffer::from_bytes(2, 2, PixelFormat::RGBA_U8, vec![0; 15]);
        assert!(err.is_err());
        assert!(Buffer::from_bytes(2, 2, PixelFormat::RGBA_U8, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_fill_and_pixel() {
        let mut buf = Buffer::new(3, 3, PixelFormat::RGBA_U8);
        buf.fill(Rgba::new(1.0, 0.0, 0.0, 1.0));
        let px = buf.pixel(2, 2);
        assert_relative_eq!(px.r, 1.0);
        assert_relative_eq!(px.a, 1.0);
    }

    #[test]
    fn test_pixel_abyss() {
        let buf = Buffer::new(2, 2, PixelFormat::RGBA_F32);
        assert_eq!(buf.pixel(-1, 0), Rgba::TRANSPARENT);
        assert_eq!(buf.pixel(0, 5), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_gray_round_trip() {
        let mut buf = Buffer::new(1, 1, PixelFormat::GRAY_U8);
        buf.set_pixel(0, 0, Rgba::gray(0.5)).unwrap();
        let px = buf.pixel(0, 0);
        assert_relative_eq!(px.r, px.g);
        assert_relative_eq!(px.r, 0.5, epsilon = 0.01);
        assert_relative_eq!(px.a, 1.0);
    }

    #[test]
    fn test_rgb_drops_alpha() {
        let mut buf = Buffer::new(1, 1, PixelFormat::RGB_U8);
        buf.set_pixel(0, 0, Rgba::new(0.2, 0.4, 0.6, 0.1)).unwrap();
        assert_relative_eq!(buf.pixel(0, 0).a, 1.0);
    }

    #[test]
    fn test_read_rect_with_abyss() {
        let mut buf = Buffer::new(2, 2, PixelFormat::RGBA_F32);
        buf.fill(Rgba::WHITE);
        let rect = Rect::new(-1, -1, 3, 3);
        let mut out = vec![0.0f32; 9 * 4];
        buf.read_rect(rect, &mut out).unwrap();
        // Top-left corner is outside the extent
        assert_eq!(&out[0..4], &[0.0, 0.0, 0.0, 0.0]);
        // Center (1,1) of the read maps to buffer (0,0)
        assert_eq!(&out[(4 * 4)..(4 * 4 + 4)], &[1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_write_rect_bounds_enforced() {
        let mut buf = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        let pixels = vec![1.0f32; 2 * 2 * 4];
        assert!(buf.write_rect(Rect::new(3, 3, 2, 2), &pixels).is_err());
        assert!(buf.write_rect(Rect::new(2, 2, 2, 2), &pixels).is_ok());
        assert_relative_eq!(buf.pixel(3, 3).r, 1.0);
        assert_eq!(buf.pixel(0, 0), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_write_rect_slice_size() {
        let mut buf = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        let short = vec![0.0f32; 3];
        assert!(buf.write_rect(Rect::new(0, 0, 2, 2), &short).is_err());
    }

    #[test]
    fn test_f16_precision() {
        let mut buf = Buffer::new(1, 1, PixelFormat::RGBA_F16);
        buf.set_pixel(0, 0, Rgba::new(0.25, 0.5, 0.75, 1.0)).unwrap();
        let px = buf.pixel(0, 0);
        assert_relative_eq!(px.r, 0.25, epsilon = 1e-3);
        assert_relative_eq!(px.b, 0.75, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_area_read_write() {
        let mut buf = Buffer::new(4, 4, PixelFormat::RGBA_U8);
        let mut empty: [f32; 0] = [];
        buf.read_rect(Rect::default(), &mut empty).unwrap();
        buf.write_rect(Rect::default(), &empty).unwrap();
    }
}
