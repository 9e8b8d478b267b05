use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::tga::{read_tga_header, TgaHeader};

pub fn is_tga_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("tga"))
        .unwrap_or(false)
}

/// Version sub-folder of the icon cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFolder {
    pub name: String,
    pub icon_count: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Version(String),
}

impl Selection {
    pub fn from_version(version: Option<String>) -> Self {
        version.map(Selection::Version).unwrap_or(Selection::All)
    }
}

#[derive(Debug, Clone)]
pub struct IconEntry {
    pub path: PathBuf,
    pub header: Option<TgaHeader>,
}

fn tga_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_tga_file(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Sub-folders of `cache_root` holding at least one TGA file, sorted by name.
pub fn detect_versions(cache_root: &Path) -> Result<Vec<VersionFolder>> {
    let mut versions = Vec::new();
    for path in subdirectories(cache_root)? {
        let icon_count = tga_files_in(&path)?.len();
        if icon_count == 0 {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        versions.push(VersionFolder { name, icon_count, path });
    }
    versions.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(versions)
}

/// TGA files of the selected version folder(s), sorted by path.
///
/// Files lying directly in `cache_root` are included when all versions are
/// selected. An unknown version yields an empty list.
pub fn list_icons(cache_root: &Path, selection: &Selection) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    match selection {
        Selection::All => {
            files.extend(tga_files_in(cache_root)?);
            for dir in subdirectories(cache_root)? {
                files.extend(tga_files_in(&dir)?);
            }
        }
        Selection::Version(name) => {
            let dir = cache_root.join(name);
            if dir.is_dir() {
                files.extend(tga_files_in(&dir)?);
            } else {
                debug!("Version folder {} does not exist", dir.display());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Pairs every file with its header. Unreadable headers are left out, the
/// file itself stays in the list.
pub fn describe_icons(paths: &[PathBuf]) -> Vec<IconEntry> {
    paths
        .iter()
        .map(|path| {
            let header = read_tga_header(path)
                .map_err(|e| debug!("Cannot read header of {}: {}", path.display(), e))
                .ok();
            IconEntry { path: path.clone(), header }
        })
        .collect()
}
