use clap::Parser;
use std::path::PathBuf;
use std::process;

use context_grab::clipboard::SystemClipboard;
use context_grab::config::load_config;
use context_grab::context::PrettierFormatter;
use context_grab::errors::{GrabError, Result};
use context_grab::grab::ContextGrab;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: context-grab <projectRoot> <relativeFilePath> <symbolName>";

/// Collects a symbol and everything it depends on into one file.
#[derive(Parser)]
#[command(
    name = "context-grab",
    version,
    about = "Collects a symbol and everything it depends on into one file"
)]
struct Cli {
    /// Project root directory
    root: PathBuf,
    /// Entry file, relative to the project root
    file: PathBuf,
    /// Function, method or type to start from
    symbol: String,
    /// Maximum traversal depth (overrides the config file)
    #[arg(short, long)]
    depth: Option<u32>,
    /// Enable debug logging
    #[arg(long)]
    debug: bool,
    /// Print the final document to stdout
    #[arg(long)]
    stdout: bool,
    /// Do not copy the document to the clipboard
    #[arg(long)]
    no_clipboard: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e {
            GrabError::Usage { message } => {
                eprintln!("{}", message);
                eprintln!("{}", USAGE);
            }
            other => eprintln!("Error: {}", other),
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli.root)?;
    if let Some(depth) = cli.depth {
        config.depth = depth;
    }
    if cli.debug {
        config.debug = true;
    }
    if cli.no_clipboard {
        config.clipboard = false;
    }
    init_tracing(config.log_directive());

    let grab = ContextGrab::new(&cli.root, config)?;
    let formatter = PrettierFormatter::from_config(grab.config());
    let clipboard = if grab.config().clipboard {
        match SystemClipboard::detect() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                warn!(error = %e, "clipboard unavailable");
                None
            }
        }
    } else {
        None
    };

    let result = grab.run(&cli.file, &cli.symbol, formatter, clipboard).await?;

    if !result.entry_found {
        eprintln!(
            "Warning: '{}' is not defined in {}",
            cli.symbol,
            cli.file.display()
        );
    }
    if cli.stdout {
        print!("{}", result.text);
        return Ok(());
    }
    println!(
        "Grabbed {} symbols and {} imports in {}ms",
        result.entity_count, result.import_count, result.duration_ms
    );
    if let Some(path) = &result.path {
        println!("  Written to {}", path.display());
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise the level follows the config flags.
fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
