use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt};
use image::RgbaImage;

use crate::error::{Error, Result};

const DATA_TYPE_TRUE_COLOR: u8 = 2;
const ORIGIN_UPPER_LEFT: u8 = 1 << 5;

/// Fixed 18-byte TGA file header.
///
/// Fields are kept exactly as stored on disk. Nothing here is validated, the
/// header only serves as metadata next to the decoded pixels.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: u8,
    pub color_map_origin: u16,
    pub color_map_length: u16,
    pub color_map_depth: u8,
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    pub pixel_depth: u8,
    pub image_descriptor: u8,
}

impl TgaHeader {
    pub const SIZE: usize = 18;

    /// Header of an uncompressed true-color image stored top to bottom.
    pub fn new(w: u16, h: u16, bits_per_pixel: u8) -> Self {
        let alpha_bits = if bits_per_pixel == 32 { 8 } else { 0 };
        Self {
            id_length: 0,
            color_map_type: 0,
            image_type: DATA_TYPE_TRUE_COLOR,
            color_map_origin: 0,
            color_map_length: 0,
            color_map_depth: 0,
            x_origin: 0,
            y_origin: 0,
            width: w,
            height: h,
            pixel_depth: bits_per_pixel,
            image_descriptor: ORIGIN_UPPER_LEFT | alpha_bits,
        }
    }

    /// Parses the header from the start of `rdr`, consuming at most 18 bytes.
    pub fn read_from<R: Read>(rdr: &mut R) -> Result<Self> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        rdr.take(Self::SIZE as u64).read_to_end(&mut buf)?;
        if buf.len() < Self::SIZE {
            return Err(Error::TruncatedHeader { len: buf.len() });
        }
        Ok(Cursor::new(buf).read_le()?)
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Result<Self> {
        Ok(Cursor::new(bytes).read_le()?)
    }

    pub fn write<W: Write + Seek>(&self, wrt: &mut W) -> Result<()> {
        wrt.write_le(self)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<[u8; Self::SIZE]> {
        let mut cursor = Cursor::new([0u8; Self::SIZE]);
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

impl fmt::Display for TgaHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}, {}bpp", self.width, self.height, self.pixel_depth)
    }
}

/// Reads the header of a TGA file without touching the pixel data.
pub fn read_tga_header(path: &Path) -> Result<TgaHeader> {
    let mut file = File::open(path)?;
    TgaHeader::read_from(&mut file)
}

/// Writes `img` as an uncompressed 32-bit TGA file.
pub fn write_tga(path: &Path, img: &RgbaImage) -> Result<()> {
    let (w, h) = img.dimensions();
    let too_big = |_| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, "image too big for TGA"));
    let hdr = TgaHeader::new(w.try_into().map_err(too_big)?, h.try_into().map_err(too_big)?, 32);

    let mut writer = BufWriter::new(File::create(path)?);
    hdr.write(&mut writer)?;
    for pixel in img.pixels() {
        let [r, g, b, a] = pixel.0;
        writer.write_all(&[b, g, r, a])?;
    }
    writer.flush()?;
    Ok(())
}
