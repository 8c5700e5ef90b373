//! modelscope-fs: read-only storage driver for ModelScope repositories.
//!
//! The driver lets a file-listing host browse a ModelScope model or dataset
//! repository and obtain download links for its files. Write and archive
//! operations are not supported; the repository is treated as an immutable
//! published artifact.
//!
//! # Modules
//!
//! - [`browser`]: The [`RepositoryBrowser`] façade (listing, link resolution)
//! - [`driver`]: Host contract ([`StorageDriver`]) and [`DriverRegistry`]
//! - [`config`]: Driver settings and their validation
//! - [`remote`]: API response schema and the outbound HTTP transport
//! - [`cascade`]: Ordered fallback over URL variants
//! - [`error`]: Error types for driver operations

pub mod browser;
pub mod cascade;
pub mod config;
pub mod driver;
pub mod error;
pub mod object;
pub mod remote;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

pub use browser::RepositoryBrowser;
pub use config::{DriverConfig, ResourceKind};
pub use driver::{DriverRegistry, StorageDriver};
pub use error::DriverError;
pub use object::ExposedObject;
pub use remote::transport::CancelToken;

/// Registers this driver with a host registry.
pub fn register(registry: &mut DriverRegistry) {
    registry.register(browser::DRIVER_NAME, browser::construct);
}

/// The modelscope-fs CLI application.
#[derive(Parser)]
#[command(name = "modelscope-fs")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Repository selection, shared by all subcommands.
#[derive(clap::Args)]
struct SourceArgs {
    /// JSON file with driver settings (model_id, resource_type, revision, default_root).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository id, e.g. 'org/name'.
    #[arg(long, global = true, env = "MODELSCOPE_MODEL_ID")]
    model_id: Option<String>,

    /// Resource kind ('model' or 'dataset').
    #[arg(long, global = true, env = "MODELSCOPE_RESOURCE_TYPE")]
    resource_type: Option<String>,

    /// Revision to browse (falls back to 'master', then 'main').
    #[arg(long, global = true, env = "MODELSCOPE_REVISION")]
    revision: Option<String>,

    /// Subpath shown when listing the repository root.
    #[arg(long, global = true, env = "MODELSCOPE_DEFAULT_ROOT")]
    default_root: Option<String>,

    /// Abort after this many seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[arg(long, global = true, hide = true, env = "MODELSCOPE_ENDPOINT")]
    endpoint: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List the direct children of a directory.
    List(ListArgs),
    /// Resolve a download URL for a file.
    Link(LinkCmdArgs),
    /// Show the validated driver settings without contacting the API.
    Info,
}

/// Arguments for the list subcommand.
#[derive(clap::Args)]
struct ListArgs {
    /// Directory to list (defaults to the repository root).
    path: Option<String>,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the link subcommand.
#[derive(clap::Args)]
struct LinkCmdArgs {
    /// File path as returned by `list`.
    path: String,

    /// Follow the API redirect and print the final download URL.
    #[arg(long)]
    redirect: bool,
}

/// Run the modelscope-fs CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), DriverError> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("modelscope-fs {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Read-only browser for ModelScope repositories.");
        println!();
        println!("Run 'modelscope-fs --help' for usage information.");
        return Ok(());
    };

    let config = load_config(&cli.source)?;
    let browser = match cli.source.endpoint.as_deref() {
        Some(endpoint) => RepositoryBrowser::initialize(&config)?.with_endpoint(endpoint),
        None => RepositoryBrowser::initialize(&config)?,
    };
    let cancel = match cli.source.timeout {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };

    match command {
        Commands::List(args) => run_list(&browser, args, &cancel),
        Commands::Link(args) => run_link(&browser, args, &cancel),
        Commands::Info => run_info(&browser),
    }
}

/// Merges the config file (if any) with explicit flags; flags win.
fn load_config(source: &SourceArgs) -> Result<DriverConfig, DriverError> {
    let mut config = match source.config.as_deref() {
        Some(path) => DriverConfig::from_json_file(path)?,
        None => DriverConfig::default(),
    };

    if let Some(model_id) = &source.model_id {
        config.model_id = model_id.clone();
    }
    if let Some(resource_type) = &source.resource_type {
        config.resource_type = resource_type.clone();
    }
    if let Some(revision) = &source.revision {
        config.revision = revision.clone();
    }
    if let Some(default_root) = &source.default_root {
        config.default_root = default_root.clone();
    }

    Ok(config)
}

/// Execute the list subcommand.
fn run_list(
    driver: &dyn StorageDriver,
    args: ListArgs,
    cancel: &CancelToken,
) -> Result<(), DriverError> {
    let dir = ExposedObject::dir(args.path.as_deref().unwrap_or(driver.root_path()));
    let objects = driver.list(&dir, cancel)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.output.as_str() {
        "json" => {
            serde_json::to_writer_pretty(&mut out, &objects).map_err(std::io::Error::from)?;
            writeln!(out)?;
        }
        _ => {
            for object in &objects {
                let kind = if object.is_dir { 'd' } else { '-' };
                writeln!(
                    out,
                    "{} {:>12} {:>11} {}",
                    kind, object.size, object.modified, object.path
                )?;
            }
        }
    }

    Ok(())
}

/// Execute the link subcommand.
fn run_link(
    driver: &dyn StorageDriver,
    args: LinkCmdArgs,
    cancel: &CancelToken,
) -> Result<(), DriverError> {
    let file = ExposedObject::file(args.path);
    let link = driver.link(
        &file,
        driver::LinkArgs {
            redirect: args.redirect,
        },
        cancel,
    )?;
    println!("{}", link.url);
    Ok(())
}

/// Execute the info subcommand.
fn run_info(browser: &RepositoryBrowser) -> Result<(), DriverError> {
    let info = StorageDriver::info(browser);
    let config = browser.config();
    println!("driver:   {}", info.name);
    println!("kind:     {}", config.kind);
    println!("repo:     {}", config.repo_id);
    println!("revision: {}", config.revision);
    if let Some(subpath) = &config.default_subpath {
        println!("default:  {}", subpath);
    }
    Ok(())
}
