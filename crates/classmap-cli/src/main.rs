use anyhow::Context;
use clap::{Parser, Subcommand};
use classmap_core::{Autoloader, AutoloaderConfig, RecordingHost, Resolution};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Default configuration file looked up in the current directory
const DEFAULT_CONFIG_FILE: &str = "classmap.yaml";

/// classmap - build and query the type name -> source file map
#[derive(Parser, Debug, Clone)]
#[command(name = "classmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to classmap.yaml / classmap.json configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Scan root, `DIR` for a flat root or `DIR/*` for a recursive one (repeatable)
    #[arg(long = "root", value_name = "ROOT", global = true)]
    roots: Vec<String>,

    /// Include path appended to the host search path (repeatable)
    #[arg(long = "include", value_name = "DIR", global = true)]
    includes: Vec<PathBuf>,

    /// Class map cache file
    #[arg(long, value_name = "FILE", global = true)]
    cache_file: Option<PathBuf>,

    /// Source file extension
    #[arg(long, value_name = "EXT", global = true)]
    extension: Option<String>,

    /// Never read or write the cache file
    #[arg(long, global = true)]
    no_cache: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Write a default classmap.yaml in the current directory
    Init,

    /// Rescan all roots and write the cache file
    Build,

    /// Print every mapped type, sorted by name
    List {
        /// Print as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Print the file defining a type; exits with status 1 when unresolved
    Resolve {
        /// Type name to resolve
        name: String,
    },

    /// Delete the cache file
    Clear,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set RUST_LOG=debug for detailed logs
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Command::Init => init_config(Path::new(DEFAULT_CONFIG_FILE)),
        Command::Build => build(&mut open_autoloader(&cli)?),
        Command::List { json } => list(&mut open_autoloader(&cli)?, *json),
        Command::Resolve { name } => resolve(&mut open_autoloader(&cli)?, name),
        Command::Clear => clear(&mut open_autoloader(&cli)?),
    }
}

fn open_autoloader(cli: &Cli) -> anyhow::Result<Autoloader> {
    let config = load_config(cli)?;
    debug!("Scan roots: {:?}", config.scan_roots());
    Ok(Autoloader::new(config))
}

/// Write a default configuration file
fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    AutoloaderConfig::init_file(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

/// Load configuration from file (if any) and apply command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<AutoloaderConfig> {
    let mut config = match &cli.config {
        Some(path) => AutoloaderConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                AutoloaderConfig::from_file(&default_path)
                    .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE))?
            } else {
                AutoloaderConfig::default()
            }
        }
    };

    if !cli.roots.is_empty() {
        config.set_scan_roots(cli.roots.iter().map(String::as_str));
    }
    for include in &cli.includes {
        config.add_include_path(include.clone());
    }
    if let Some(cache_file) = &cli.cache_file {
        config.set_cache_file(Some(cache_file.clone()));
    }
    if let Some(extension) = &cli.extension {
        config.extension = extension.trim_start_matches('.').to_string();
    }
    if cli.no_cache {
        config.set_no_cache(true);
    }

    Ok(config)
}

fn build(autoloader: &mut Autoloader) -> anyhow::Result<()> {
    let report = autoloader.rebuild().context("Failed to build class map")?;

    println!(
        "Mapped {} types from {} files",
        autoloader.current_map().len(),
        report.files_scanned
    );
    for shadowed in &report.shadowed {
        println!(
            "warning: {} in {} shadows {}",
            shadowed.name,
            shadowed.replacement.display(),
            shadowed.previous.display()
        );
    }
    match autoloader.config().cache_file() {
        Some(path) if !autoloader.config().no_cache => {
            info!("Cache written to {:?}", path);
            println!("Cache written to {}", path.display());
        }
        _ => println!("Cache disabled, nothing written"),
    }
    Ok(())
}

fn list(autoloader: &mut Autoloader, json: bool) -> anyhow::Result<()> {
    let map = autoloader.class_map().context("Failed to load class map")?;

    if json {
        let entries: BTreeMap<&str, String> = map
            .iter()
            .map(|(name, path)| (name, path.display().to_string()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (name, path) in map.sorted() {
            println!("{}\t{}", name, path.display());
        }
    }
    Ok(())
}

fn resolve(autoloader: &mut Autoloader, name: &str) -> anyhow::Result<()> {
    let mut host = RecordingHost::new();
    let mut registration = autoloader.register(&mut host);

    match registration
        .resolve(name)
        .with_context(|| format!("Failed to resolve {}", name))?
    {
        Resolution::Loaded(path) | Resolution::AlreadyLoaded(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Resolution::Unresolved => {
            drop(registration);
            eprintln!("Error: type '{}' not found in any scan root", name);
            std::process::exit(1);
        }
    }
}

fn clear(autoloader: &mut Autoloader) -> anyhow::Result<()> {
    let path = autoloader.config().cache_file().map(Path::to_path_buf);
    let removed = autoloader.clear_cache().context("Failed to clear cache")?;

    match (removed, path) {
        (true, Some(path)) => println!("Removed {}", path.display()),
        (false, Some(path)) => println!("No cache file at {}", path.display()),
        (_, None) => println!("No cache file configured"),
    }
    Ok(())
}
