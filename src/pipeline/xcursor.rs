// Xcursor bitmap decoding for cursor-theme thumbnails.
//
// Only one image per file is decoded: the one whose nominal size is closest
// to the requested pixel size. The decoded bitmap's own dimensions may
// differ from the request; layout must use the returned dimensions.

use anyhow::{Result, anyhow};
use byteorder::{LittleEndian, ReadBytesExt};
use image::{Rgba, RgbaImage};
use std::io::{Cursor, Read};
use std::path::Path;

const XCURSOR_MAGIC: &[u8] = b"Xcur";
const XCURSOR_VERSION: u32 = 0x0001_0000;
const XCURSOR_IMAGE_TYPE: u32 = 0xfffd_0002;
const IMAGE_HEADER_SIZE: u32 = 36;
const MAX_DIMENSION: u32 = 0x7fff;

/// Decode the cursor image whose nominal size best matches `size`.
///
/// A missing file or unrecognized format is a try-next-candidate signal,
/// not an error.
pub fn load_cursor(path: &Path, size: u32) -> Option<RgbaImage> {
    match decode_best_size(path, size) {
        Ok(image) => Some(image),
        Err(err) => {
            tracing::debug!("cursor candidate {} skipped: {err}", path.display());
            None
        }
    }
}

fn decode_best_size(path: &Path, size: u32) -> Result<RgbaImage> {
    let data = std::fs::read(path)?;
    let mut cursor = Cursor::new(data.as_slice());

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if magic != XCURSOR_MAGIC {
        return Err(anyhow!("not an Xcursor file"));
    }

    let header_size = cursor.read_u32::<LittleEndian>()?;
    if header_size != 16 {
        return Err(anyhow!("invalid Xcursor header size: {header_size}"));
    }

    let version = cursor.read_u32::<LittleEndian>()?;
    if version != XCURSOR_VERSION {
        return Err(anyhow!("unsupported Xcursor version: 0x{version:08x}"));
    }

    let ntoc = cursor.read_u32::<LittleEndian>()?;

    // (nominal size, chunk position) of the best match so far
    let mut best: Option<(u32, u32)> = None;
    for _ in 0..ntoc {
        let chunk_type = cursor.read_u32::<LittleEndian>()?;
        let chunk_subtype = cursor.read_u32::<LittleEndian>()?;
        let chunk_position = cursor.read_u32::<LittleEndian>()?;

        if chunk_type != XCURSOR_IMAGE_TYPE {
            continue;
        }
        let better = match best {
            Some((nominal, _)) => chunk_subtype.abs_diff(size) < nominal.abs_diff(size),
            None => true,
        };
        if better {
            best = Some((chunk_subtype, chunk_position));
        }
    }

    let Some((_, position)) = best else {
        return Err(anyhow!("no image chunks"));
    };
    decode_image_chunk(&mut cursor, position)
}

fn decode_image_chunk(cursor: &mut Cursor<&[u8]>, position: u32) -> Result<RgbaImage> {
    cursor.set_position(position as u64);

    let chunk_header = cursor.read_u32::<LittleEndian>()?;
    let chunk_type = cursor.read_u32::<LittleEndian>()?;
    let _nominal_size = cursor.read_u32::<LittleEndian>()?;
    if chunk_type != XCURSOR_IMAGE_TYPE {
        return Err(anyhow!("chunk at {position} is not an image"));
    }
    if chunk_header != IMAGE_HEADER_SIZE {
        return Err(anyhow!("invalid image chunk header: {chunk_header}"));
    }

    let version = cursor.read_u32::<LittleEndian>()?;
    if version != 1 {
        return Err(anyhow!("unsupported image version: {version}"));
    }

    let width = cursor.read_u32::<LittleEndian>()?;
    let height = cursor.read_u32::<LittleEndian>()?;
    let _xhot = cursor.read_u32::<LittleEndian>()?;
    let _yhot = cursor.read_u32::<LittleEndian>()?;
    let _delay = cursor.read_u32::<LittleEndian>()?;

    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(anyhow!("implausible image dimensions {width}x{height}"));
    }

    // Pixels are packed 32-bit ARGB words
    let mut pixels = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let argb = cursor.read_u32::<LittleEndian>()?;
            let alpha = (argb >> 24) as u8;
            let red = (argb >> 16) as u8;
            let green = (argb >> 8) as u8;
            let blue = argb as u8;
            pixels.put_pixel(x, y, Rgba([red, green, blue, alpha]));
        }
    }

    Ok(pixels)
}

/// Serialize square single-frame cursor images as an Xcursor byte stream,
/// one `(nominal size, dimension, packed ARGB fill)` entry per image.
#[cfg(test)]
pub(crate) fn synthetic_cursor_bytes(entries: &[(u32, u32, u32)]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(XCURSOR_MAGIC);
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&XCURSOR_VERSION.to_le_bytes());
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    let toc_end = 16 + 12 * entries.len() as u32;
    let mut position = toc_end;
    for (nominal, dim, _) in entries {
        data.extend_from_slice(&XCURSOR_IMAGE_TYPE.to_le_bytes());
        data.extend_from_slice(&nominal.to_le_bytes());
        data.extend_from_slice(&position.to_le_bytes());
        position += IMAGE_HEADER_SIZE + dim * dim * 4;
    }

    for (nominal, dim, argb) in entries {
        data.extend_from_slice(&IMAGE_HEADER_SIZE.to_le_bytes());
        data.extend_from_slice(&XCURSOR_IMAGE_TYPE.to_le_bytes());
        data.extend_from_slice(&nominal.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes()); // image version
        data.extend_from_slice(&dim.to_le_bytes()); // width
        data.extend_from_slice(&dim.to_le_bytes()); // height
        data.extend_from_slice(&1u32.to_le_bytes()); // xhot
        data.extend_from_slice(&1u32.to_le_bytes()); // yhot
        data.extend_from_slice(&0u32.to_le_bytes()); // delay
        for _ in 0..dim * dim {
            data.extend_from_slice(&argb.to_le_bytes());
        }
    }

    data
}
