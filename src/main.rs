use anyhow::{bail, Context, Result};
use clap::Parser;
use slesp::{convert_file, ConvertOptions, Rgb565Recoder};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, SystemTime};
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "slesp")]
#[command(about = "Convert SquareLine Studio projects to ESPHome LVGL YAML")]
struct Cli {
    /// SquareLine project file (.spj)
    input: PathBuf,

    /// Write the YAML to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Copy the YAML to the clipboard
    #[arg(short, long)]
    clipboard: bool,

    /// Print the YAML to stdout (default when no other output is chosen)
    #[arg(short, long)]
    stdout: bool,

    /// Keep running and convert again whenever the input changes
    #[arg(short, long)]
    monitor: bool,

    /// Log decoding details
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn print_to_stdout(&self) -> bool {
        self.stdout || (self.output.is_none() && !self.clipboard)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = ConvertOptions::for_input(&cli.input, cli.output.as_deref());

    if !cli.monitor {
        return run_once(&cli, &options);
    }

    if !cli.input.exists() {
        bail!("Project file not found: {}", cli.input.display());
    }

    let mut last_modified = modified(&cli.input);
    loop {
        if let Err(e) = run_once(&cli, &options) {
            tracing::error!("{:#}", e);
        }

        tracing::info!("Watching {} for changes...", cli.input.display());
        loop {
            sleep(POLL_INTERVAL);
            let new_time = modified(&cli.input);
            if new_time.is_some() && new_time != last_modified {
                last_modified = new_time;
                tracing::info!("Change detected, converting again");
                break;
            }
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Convert once and hand the YAML to every selected output.
///
/// Outputs are independent: one failing does not stop the others.
fn run_once(cli: &Cli, options: &ConvertOptions) -> Result<()> {
    let document = convert_file(&cli.input, options, &Rgb565Recoder)
        .with_context(|| format!("Failed to convert {}", cli.input.display()))?;
    let yaml = document.to_yaml()?;

    let mut failures = 0;

    if cli.print_to_stdout() {
        print!("{yaml}");
    }

    if cli.clipboard {
        match copy_to_clipboard(&yaml) {
            Ok(()) => tracing::info!("YAML copied to clipboard"),
            Err(e) => {
                tracing::error!("{:#}", e);
                failures += 1;
            }
        }
    }

    if let Some(path) = &cli.output {
        match std::fs::write(path, &yaml) {
            Ok(()) => tracing::info!("YAML written to {}", path.display()),
            Err(e) => {
                tracing::error!("Failed to write {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} output(s) failed", failures);
    }
    Ok(())
}

fn copy_to_clipboard(yaml: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
    clipboard
        .set_text(yaml)
        .context("Failed to copy YAML to clipboard")?;
    Ok(())
}
