#[macro_use]
extern crate log;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use icon_extractor::batch::{start_batch, BatchEvent};
use icon_extractor::listing::{describe_icons, detect_versions, list_icons, Selection};
use icon_extractor::settings::{JsonSettingsStore, Settings, SettingsStore};
use icon_extractor::tga::{read_tga_header, TgaHeader};
use icon_extractor::{CacheLocator, Converter};

type Result<T> = std::result::Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Entropia Universe icon extractor")]
pub struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Verbose output
    #[clap(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the game's icon cache folder
    Locate,

    /// List version folders of the icon cache
    Versions {
        /// Icon cache folder (located automatically if omitted)
        #[clap(long)]
        cache: Option<PathBuf>,
    },

    /// List icon files with their dimensions
    List {
        /// Icon cache folder (located automatically if omitted)
        #[clap(long)]
        cache: Option<PathBuf>,

        /// Only list icons of this version folder
        #[clap(long)]
        folder: Option<String>,
    },

    /// Show TGA header metadata
    Info {
        /// Input TGA files
        #[clap(required = true)]
        tga_files: Vec<PathBuf>,
    },

    /// Convert icons to 320x320 PNG files
    Convert {
        /// Input TGA files (all icons of the cache if omitted)
        tga_files: Vec<PathBuf>,

        /// Icon cache folder (located automatically if omitted)
        #[clap(long)]
        cache: Option<PathBuf>,

        /// Only convert icons of this version folder
        #[clap(long)]
        folder: Option<String>,

        /// Output directory (remembered for later runs)
        #[clap(short = 'O')]
        output_dir: Option<PathBuf>,
    },

    /// Show or change the remembered output directory
    Config {
        /// New output directory
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },

    /// Open the output directory in the file manager
    Open,
}

fn load_settings(store: Option<&JsonSettingsStore>) -> Settings {
    match store.map(|s| s.load()) {
        Some(Ok(settings)) => settings,
        Some(Err(e)) => {
            warn!("Ignoring saved settings: {}", e);
            Settings::default()
        }
        None => Settings::default(),
    }
}

fn save_settings(store: Option<&JsonSettingsStore>, settings: &Settings) {
    if let Some(store) = store {
        if let Err(e) = store.save(settings) {
            warn!("Cannot save settings to {}: {}", store.path().display(), e);
        }
    }
}

fn resolve_cache(cache: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = cache {
        return Ok(dir);
    }
    CacheLocator::for_current_platform()
        .locate()
        .ok_or_else(|| "Icon cache not found - is Entropia Universe installed? Select it with --cache".into())
}

fn print_tga_metadata(path: &Path, hdr: &TgaHeader) {
    println!("TGA Metadata ({}):", path.display());
    println!("  id_length         {}", hdr.id_length);
    println!("  color_map_type    {}", hdr.color_map_type);
    println!("  image_type        {}", hdr.image_type);
    println!("  color_map_origin  {}", hdr.color_map_origin);
    println!("  color_map_length  {}", hdr.color_map_length);
    println!("  color_map_depth   {}", hdr.color_map_depth);
    println!("  origin            {}x{}", hdr.x_origin, hdr.y_origin);
    println!("  size              {}x{}", hdr.width, hdr.height);
    println!("  pixel_depth       {}", hdr.pixel_depth);
    println!("  image_descriptor  {:#04x}", hdr.image_descriptor);
    println!();
}

fn show_info(tga_files: &[PathBuf]) {
    for path in tga_files {
        match read_tga_header(path) {
            Ok(hdr) => print_tga_metadata(path, &hdr),
            Err(e) => eprintln!("{}: {}", path.display(), e),
        }
    }
}

fn show_versions(cache: Option<PathBuf>) -> Result<()> {
    let cache_dir = resolve_cache(cache)?;
    let versions = detect_versions(&cache_dir)?;
    if versions.is_empty() {
        println!("No version folders with icons in {}", cache_dir.display());
        return Ok(());
    }
    let total: usize = versions.iter().map(|v| v.icon_count).sum();
    println!("{}", cache_dir.display());
    for v in &versions {
        println!("  {:20} {} icons", v.name, v.icon_count);
    }
    println!("Found {} version folders ({} icons)", versions.len(), total);
    Ok(())
}

fn show_list(cache: Option<PathBuf>, folder: Option<String>) -> Result<()> {
    let cache_dir = resolve_cache(cache)?;
    let files = list_icons(&cache_dir, &Selection::from_version(folder))?;
    for entry in describe_icons(&files) {
        let rel_path = entry.path.strip_prefix(&cache_dir).unwrap_or(&entry.path);
        match entry.header {
            Some(hdr) => println!("{:50} {}", rel_path.display(), hdr),
            None => println!("{:50} ?", rel_path.display()),
        }
    }
    println!("Found {} icon files", files.len());
    Ok(())
}

fn convert(
    tga_files: Vec<PathBuf>,
    cache: Option<PathBuf>,
    folder: Option<String>,
    output_dir: Option<PathBuf>,
    store: Option<&JsonSettingsStore>,
) -> Result<()> {
    let mut settings = load_settings(store);
    if let Some(dir) = output_dir {
        settings.output_dir = dir;
        save_settings(store, &settings);
    }

    let files = if tga_files.is_empty() {
        let cache_dir = resolve_cache(cache)?;
        list_icons(&cache_dir, &Selection::from_version(folder))?
    } else {
        tga_files
    };
    if files.is_empty() {
        println!("No files selected for extraction.");
        return Ok(());
    }

    let handle = start_batch(files, Converter::new(&settings.output_dir));
    let canceller = handle.canceller();
    if let Err(e) = ctrlc::set_handler(move || canceller.cancel()) {
        warn!("Cannot install Ctrl-C handler: {}", e);
    }

    for event in handle.events() {
        match event {
            BatchEvent::Started { total } => {
                println!("Extracting {} icons to {}", total, settings.output_dir.display())
            }
            BatchEvent::Progress { index, total, file_name } => println!("[{}/{}] {}", index, total, file_name),
            BatchEvent::FileDone { file_name, output_path } => {
                info!("Extracted: {} -> {}", file_name, output_path.display())
            }
            BatchEvent::Finished(_) | BatchEvent::Failed { .. } => break,
        }
    }

    let result = handle.join()?;
    if result.is_cancelled() {
        println!("Cancelled after {} of {} icons", result.processed, result.total);
    }
    println!("Extracted {}/{} icons", result.succeeded, result.total);
    println!("Output location: {}", settings.output_dir.display());

    save_settings(store, &settings);
    Ok(())
}

fn configure(output_dir: Option<PathBuf>, store: Option<&JsonSettingsStore>) -> Result<()> {
    let mut settings = load_settings(store);
    if let Some(dir) = output_dir {
        settings.output_dir = dir;
        let store = store.ok_or("No configuration directory available on this platform")?;
        store.save(&settings)?;
    }
    println!("Output directory: {}", settings.output_dir.display());
    if let Some(store) = store {
        println!("Settings file:    {}", store.path().display());
    }
    Ok(())
}

fn open_output_dir(store: Option<&JsonSettingsStore>) -> Result<()> {
    let settings = load_settings(store);
    fs::create_dir_all(&settings.output_dir)?;
    open::that(&settings.output_dir)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if args.verbose {
        println!("icon-extractor {}", env!("CARGO_PKG_VERSION"));
    }

    let store = JsonSettingsStore::at_default_location();
    let store = store.as_ref();

    match args.command {
        Command::Locate => match CacheLocator::for_current_platform().locate() {
            Some(dir) => println!("{}", dir.display()),
            None => return Err("Icon cache not found - is Entropia Universe installed? Select it with --cache".into()),
        },
        Command::Versions { cache } => show_versions(cache)?,
        Command::List { cache, folder } => show_list(cache, folder)?,
        Command::Info { tga_files } => show_info(&tga_files),
        Command::Convert { tga_files, cache, folder, output_dir } => {
            convert(tga_files, cache, folder, output_dir, store)?
        }
        Command::Config { output_dir } => configure(output_dir, store)?,
        Command::Open => open_output_dir(store)?,
    }

    Ok(())
}
