use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use radiometry::color::Color;

/// Maps linear radiance to an 8-bit channel: exponential exposure followed by gamma 2.2.
fn tone_map(value: f32) -> u8 {
    let encoded = (1.0 - (-value).exp()).powf(1.0 / 2.2) * 255.0 + 0.5;
    encoded.clamp(0.0, 255.0) as u8
}

/// Writes a 24-bit uncompressed BMP: 2-byte magic, 12-byte file header, 40-byte info header,
/// then bottom-to-top rows of BGR triples padded to 4-byte boundaries. `pixels` is row-major
/// with row 0 at the top.
pub fn write_bmp(path: &Path, width: u32, height: u32, pixels: &[Color]) -> io::Result<()> {
    assert_eq!(pixels.len(), (width * height) as usize);

    let row_size = (24 * width + 31) / 32 * 4;
    let padding_size = (row_size - width * 3) as usize;
    let pixel_data_offset = 2u32 + 12 + 40;
    let file_size = pixel_data_offset + row_size * height;

    let mut out = BufWriter::new(File::create(path)?);

    // Magic.
    out.write_all(b"BM")?;

    // File header: size, two reserved words, offset to pixel data.
    out.write_all(&file_size.to_le_bytes())?;
    out.write_all(&0u16.to_le_bytes())?;
    out.write_all(&0u16.to_le_bytes())?;
    out.write_all(&pixel_data_offset.to_le_bytes())?;

    // Info header. Positive height means bottom-up row order.
    out.write_all(&40u32.to_le_bytes())?;
    out.write_all(&(width as i32).to_le_bytes())?;
    out.write_all(&(height as i32).to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?; // planes
    out.write_all(&24u16.to_le_bytes())?; // bits per pixel
    out.write_all(&0u32.to_le_bytes())?; // compression
    out.write_all(&(row_size * height).to_le_bytes())?; // bitmap size
    out.write_all(&0i32.to_le_bytes())?; // x resolution
    out.write_all(&0i32.to_le_bytes())?; // y resolution
    out.write_all(&0u32.to_le_bytes())?; // colors
    out.write_all(&0u32.to_le_bytes())?; // important colors

    let padding = [0u8; 3];
    for y in (0..height).rev() {
        for x in 0..width {
            let color = pixels[(y * width + x) as usize];
            out.write_all(&[tone_map(color.b), tone_map(color.g), tone_map(color.r)])?;
        }
        if padding_size > 0 {
            out.write_all(&padding[..padding_size])?;
        }
    }
    out.flush()
}
