use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated TGA header ({len} of {} bytes)", crate::tga::TgaHeader::SIZE)]
    TruncatedHeader { len: usize },

    #[error("invalid TGA header: {0}")]
    Header(#[from] binrw::Error),

    #[error("cannot decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("cannot encode PNG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("path has no file name: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, Error>;
