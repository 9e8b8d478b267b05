//! Converts Entropia Universe cache icons (TGA) into 320x320 PNG files.

#[macro_use]
extern crate log;

pub mod batch;
pub mod canvas;
pub mod convert;
pub mod decode;
pub mod error;
pub mod listing;
pub mod locate;
pub mod settings;
pub mod tga;

pub use batch::{run_batch, start_batch, BatchEvent, BatchHandle, BatchResult, BatchState, Canceller, FileOutcome};
pub use canvas::{apply_canvas, CANVAS_SIZE};
pub use convert::Converter;
pub use error::{Error, Result};
pub use listing::{list_icons, Selection};
pub use locate::CacheLocator;
pub use settings::{JsonSettingsStore, Settings, SettingsStore};
pub use tga::TgaHeader;
