use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::canvas::apply_canvas;
use crate::decode::load_rgba;
use crate::error::{Error, Result};

pub struct Converter {
    output_dir: PathBuf,
}

impl Converter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn ensure_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// `<output_dir>/<stem>.png` for the given input file.
    pub fn output_path_for(&self, input: &Path) -> Result<PathBuf> {
        let stem = input
            .file_stem()
            .ok_or_else(|| Error::InvalidPath(input.to_owned()))?;
        let mut file_name = stem.to_owned();
        file_name.push(".png");
        Ok(self.output_dir.join(file_name))
    }

    /// Decodes `input`, centers it on the canvas and writes the PNG,
    /// replacing any existing file of the same name.
    pub fn convert(&self, input: &Path) -> Result<PathBuf> {
        let img = load_rgba(input)?;
        let canvas = apply_canvas(&img);
        let output_path = self.output_path_for(input)?;
        // The folder may have been removed since the batch started
        self.ensure_output_dir()?;
        write_png(&output_path, &canvas)?;
        Ok(output_path)
    }
}

pub fn write_png(path: &Path, img: &RgbaImage) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    img.write_to(&mut writer, ImageFormat::Png).map_err(Error::Encode)?;
    writer.flush()?;
    Ok(())
}
