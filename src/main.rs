use clap::{Parser, Subcommand};
use gallery_manifest::{ManifestBuilder, config, naming, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gallery-manifest")]
#[command(about = "Ordered image manifests for photo galleries")]
#[command(long_about = "\
Ordered image manifests for photo galleries

Lists the photographs in a directory, newest first by the capture time
embedded in each file. Photos without an embedded capture time follow,
ordered by file modification time.

Directory structure:

  public/images/
  ├── a.jpg
  ├── b.png
  └── webp/            # Pre-converted siblings (optional)
      ├── a.webp       # When this directory has images, it is served
      └── b.webp       # instead of the originals

Run 'gallery-manifest gen-config' to generate a documented gallery.toml.")]
#[command(version = env!("GALLERY_VERSION"))]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Original image directory (overrides directories.original)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the manifest as JSON; exits non-zero when degraded
    Manifest {
        /// Include per-image timestamps and selection details
        #[arg(long)]
        verbose: bool,
    },
    /// Print a human-readable report of the manifest
    Check,
    /// Print the file that should be served for an original filename
    Resolve { filename: String },
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Command::Manifest { verbose } => {
            let response = ManifestBuilder::new(load_site_config(&cli)?).build();
            let json = if *verbose {
                serde_json::to_string_pretty(&response)?
            } else {
                serde_json::to_string_pretty(&response.body())?
            };
            println!("{}", json);
            if !response.status.is_ok() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Check => {
            let response = ManifestBuilder::new(load_site_config(&cli)?).build();
            output::print_manifest_output(&response);
            if !response.status.is_ok() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Resolve { filename } => {
            let resolved = naming::resolve_preferred(&load_site_config(&cli)?, filename);
            println!("{}", resolved.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the config file and apply command-line overrides.
fn load_site_config(cli: &Cli) -> Result<config::ManifestConfig, config::ConfigError> {
    let site_config = config::load_config(&cli.config)?;
    match &cli.source {
        Some(source) => site_config.with_original(source),
        None => Ok(site_config),
    }
}

/// Log to stderr so stdout carries only command output. `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
