//! CLI application for renaming and annotating purchase-order PDFs.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, inspect};

/// Purchase-order renamer - name PDFs after their order number, date and
/// supplier, and outline the supplier zone on an annotated copy
#[derive(Parser)]
#[command(name = "porder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Without a command, the default input directory is processed
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename and annotate every PDF in a directory
    Batch(batch::BatchArgs),

    /// Show what would be read from a single file
    Inspect(inspect::InspectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Batch(args)) => batch::run(args),
        Some(Commands::Inspect(args)) => inspect::run(args),
        None => batch::run(batch::BatchArgs::default()),
    }
}
