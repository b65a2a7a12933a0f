use chrono::Local;
use clap::{Parser, Subcommand};
use journalmk::config::{self, JournalConfig};
use journalmk::convert::CommandConverter;
use journalmk::journal::{self, BuildSettings, JournalPaths};
use journalmk::{output, typeset};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Flags for the full build.
#[derive(clap::Args, Clone)]
struct BuildArgs {
    /// Disable the export cache and re-export every note
    #[arg(long)]
    no_cache: bool,

    /// Write journal.tex but do not run the typeset command
    #[arg(long)]
    no_typeset: bool,

    /// Do not open the finished PDF
    #[arg(long)]
    no_open: bool,
}

#[derive(Parser)]
#[command(name = "journalmk")]
#[command(about = "Assemble per-project note files into one PDF journal")]
#[command(long_about = "\
Assemble per-project note files into one PDF journal

Notes directories anywhere below the root are collected, every note is
exported to PDF (cached between runs), and a LaTeX document including all
of them is written and typeset.

Project structure:

  projects/
  ├── journalmk.toml               # Config (optional, all keys have defaults)
  ├── journal_template.tex         # Preamble override (optional)
  ├── project_a/
  │   └── _notes/                  # Notes directory
  │       ├── journalmk.json       # {\"part\": ..., \"chapter\": ..., \"section\": ...}
  │       ├── 2024-03-14.xopp      # Dated by file name
  │       └── whiteboard.jpg       # Dated by creation time
  └── tmp/                         # Export cache

Journal types:
  chronological  year → month → week
  topological    part → chapter → section from journalmk.json,
                 everything else under \"Unsorted\"

Run 'journalmk gen-config' to generate a documented journalmk.toml.")]
#[command(version)]
struct Cli {
    /// Config file; relative paths inside it resolve against its directory
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: scan → export → tree → emit → typeset
    Build(BuildArgs),
    /// List notes directories and notes
    Scan,
    /// Print the document outline without exporting anything
    Tree,
    /// Print a stock journalmk.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Scan => {
            let (journal_config, base) = load(&cli.config)?;
            let paths = JournalPaths::resolve(&journal_config, &base);
            let directories = journal::discover(&journal_config, &paths)?;
            output::print_scan_output(&directories, &paths.root);
        }
        Command::Tree => {
            let (journal_config, base) = load(&cli.config)?;
            let outline = journal::outline(&journal_config, &base, Local::now().naive_local())?;
            output::print_tree_outline(&outline.tree, &base);
        }
        Command::Build(args) => {
            let (journal_config, base) = load(&cli.config)?;
            init_thread_pool(&journal_config.processing);
            let converter = CommandConverter::from_config(&journal_config);
            let settings = BuildSettings::new(!args.no_cache);

            println!("==> Building journal in {}", base.display());
            let report = journal::build(&journal_config, &base, &converter, &settings)?;
            output::print_build_report(&report, &base);

            if !args.no_typeset {
                println!("==> Typesetting {}", report.document.display());
                let pdf = typeset::typeset(&report.document, &journal_config.typeset.command)?;
                if journal_config.typeset.open && !args.no_open {
                    typeset::open_pdf(&pdf)?;
                }
            }

            if report.render.failures.is_empty() {
                println!("==> Finished");
            } else {
                println!(
                    "==> Finished with {} failed exports",
                    report.render.failures.len()
                );
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config and the directory its relative paths resolve against.
fn load(config_path: &Path) -> Result<(JournalConfig, PathBuf), config::ConfigError> {
    let journal_config = config::load_config(config_path)?;
    let dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok((journal_config, config::resolve_path(dir, ".")))
}

/// Initialize the tracing subscriber; `RUST_LOG` overrides the default filter.
///
/// Logs go to stderr so stdout carries only the reports.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "journalmk=info".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
