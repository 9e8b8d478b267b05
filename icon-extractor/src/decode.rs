use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{ImageFormat, ImageReader, RgbaImage};

use crate::error::{Error, Result};

/// Decodes a TGA file into an RGBA bitmap.
///
/// TGA files carry no signature so the format is forced instead of guessed.
/// Sources without an alpha channel come out fully opaque.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let file = File::open(path)?;
    let reader = ImageReader::with_format(BufReader::new(file), ImageFormat::Tga);
    let img = reader.decode().map_err(Error::Decode)?;
    Ok(img.into_rgba8())
}
