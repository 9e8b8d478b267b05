//! Discovery of the game's icon cache folder.
//!
//! Candidates are tried in a fixed order: the default installation path, the
//! game folder inside every known Steam root, then the game folder inside every
//! library listed in a root's `libraryfolders.vdf`. The first candidate that
//! holds at least one TGA file wins. Nothing here fails: unreadable locations
//! are simply skipped.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::listing::is_tga_file;

/// Icon cache location relative to the game installation folder
const CACHE_SUBDIR: &str = "public_users_data/cache/icon";
const STEAM_GAME_DIR: &str = "steamapps/common/Entropia Universe";
const LIBRARY_MANIFEST: &str = "steamapps/libraryfolders.vdf";

#[cfg(windows)]
const DEFAULT_CACHE_PATH: Option<&str> = Some("C:/ProgramData/Entropia Universe/public_users_data/cache/icon");
#[cfg(not(windows))]
const DEFAULT_CACHE_PATH: Option<&str> = None;

pub struct CacheLocator {
    default_path: Option<PathBuf>,
    steam_roots: Vec<PathBuf>,
}

impl CacheLocator {
    pub fn new(default_path: Option<PathBuf>, steam_roots: Vec<PathBuf>) -> Self {
        Self { default_path, steam_roots }
    }

    pub fn for_current_platform() -> Self {
        Self::new(DEFAULT_CACHE_PATH.map(PathBuf::from), steam_roots())
    }

    /// All candidate cache folders in search order, without duplicates.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut result: Vec<PathBuf> = Vec::new();
        let mut push = |path: PathBuf| {
            if !result.contains(&path) {
                result.push(path);
            }
        };

        if let Some(path) = &self.default_path {
            push(path.clone());
        }
        for root in &self.steam_roots {
            push(steam_cache_dir(root));
            for library in read_library_folders(root) {
                push(steam_cache_dir(&library));
            }
        }
        result
    }

    pub fn locate(&self) -> Option<PathBuf> {
        let found = self.candidates().into_iter().find(|dir| {
            let ok = contains_icons(dir);
            debug!("Cache candidate {}: {}", dir.display(), if ok { "accepted" } else { "rejected" });
            ok
        });
        match &found {
            Some(dir) => info!("Found icon cache in {}", dir.display()),
            None => info!("Icon cache not found"),
        }
        found
    }
}

fn steam_cache_dir(library: &Path) -> PathBuf {
    library.join(STEAM_GAME_DIR).join(CACHE_SUBDIR)
}

/// True if `dir` exists and has a TGA file somewhere below it.
pub fn contains_icons(dir: &Path) -> bool {
    dir.is_dir()
        && WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .any(|e| e.file_type().is_file() && is_tga_file(e.path()))
}

fn read_library_folders(steam_root: &Path) -> Vec<PathBuf> {
    let manifest = steam_root.join(LIBRARY_MANIFEST);
    match fs::read_to_string(&manifest) {
        Ok(text) => parse_library_folders(&text),
        Err(e) => {
            debug!("Cannot read {}: {}", manifest.display(), e);
            Vec::new()
        }
    }
}

/// Extracts every `"path"` value from a Steam `libraryfolders.vdf` file.
///
/// This is a line based scan rather than a real KeyValues parser. Values
/// store back-slashes doubled, which is undone by plain substitution.
pub fn parse_library_folders(text: &str) -> Vec<PathBuf> {
    text.lines()
        .filter_map(|line| {
            let mut quoted = line.split('"').skip(1).step_by(2);
            let key = quoted.next()?;
            if !key.eq_ignore_ascii_case("path") {
                return None;
            }
            let value = quoted.next()?;
            Some(PathBuf::from(value.replace("\\\\", "\\")))
        })
        .collect()
}

#[cfg(windows)]
fn steam_roots() -> Vec<PathBuf> {
    use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
    use winreg::RegKey;

    let lookups = [
        (HKEY_CURRENT_USER, "Software\\Valve\\Steam", "SteamPath"),
        (HKEY_LOCAL_MACHINE, "SOFTWARE\\WOW6432Node\\Valve\\Steam", "InstallPath"),
        (HKEY_LOCAL_MACHINE, "SOFTWARE\\Valve\\Steam", "InstallPath"),
    ];
    lookups
        .iter()
        .filter_map(|&(hive, subkey, value)| {
            let key = RegKey::predef(hive).open_subkey(subkey).ok()?;
            key.get_value::<String, _>(value).ok()
        })
        .map(PathBuf::from)
        .collect()
}

#[cfg(not(windows))]
fn steam_roots() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    [".steam/steam", ".local/share/Steam", "Library/Application Support/Steam"]
        .iter()
        .map(|sub| home.join(sub))
        .filter(|path| path.is_dir())
        .collect()
}
