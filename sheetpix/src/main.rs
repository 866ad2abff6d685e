use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use sheetpix_core::{Extractor, ExtractorConfig, Progress};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

mod formatter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "sheetpix")]
#[command(about = "Extract the images of an Excel workbook into sheet/column folders", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the .xlsx workbook
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output directory (overrides the configuration)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Don't print progress lines
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Write log records to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for scripting
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        formatter::print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    config.validate().context("Invalid configuration")?;
    log::debug!("Configuration: {:?}", config);

    if !cli.file.is_file() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let (tx, rx) = mpsc::channel::<Progress>();
    let file = cli.file.clone();
    let worker = thread::spawn(move || Extractor::with_config(config).extract(&file, &tx));

    let show_progress = !cli.quiet && matches!(cli.format, OutputFormat::Human);
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => {
                if show_progress {
                    formatter::print_progress(&event);
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let report = worker
        .join()
        .map_err(|_| anyhow::anyhow!("Extraction thread panicked"))?
        .with_context(|| format!("Failed to extract images from {}", cli.file.display()))?;

    match cli.format {
        OutputFormat::Human => formatter::print_human(&cli.file, &report),
        OutputFormat::Json => formatter::print_json(&cli.file, &report)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ExtractorConfig> {
    if let Some(config_path) = path {
        return ExtractorConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // Try to load default config from current directory if it exists
    let default_config_path = PathBuf::from("sheetpix.toml");
    if default_config_path.exists() {
        ExtractorConfig::from_file(&default_config_path).with_context(|| {
            format!(
                "Failed to load config from {}",
                default_config_path.display()
            )
        })
    } else {
        Ok(ExtractorConfig::default())
    }
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
        builder.write_style(env_logger::WriteStyle::Never);
    }

    builder
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "sheetpix",
            "book.xlsx",
            "-o",
            "out",
            "--format",
            "json",
            "-vv",
            "--quiet",
        ])
        .unwrap();
        assert_eq!(cli.file, PathBuf::from("book.xlsx"));
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_file_is_required() {
        assert!(Cli::try_parse_from(["sheetpix"]).is_err());
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "output_dir = \"pictures\"\nsanitize_names = false\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("pictures"));
        assert!(!config.sanitize_names);
        assert_eq!(config.default_sheet_name, "Sheet1");
    }

    #[test]
    fn test_missing_config_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/sheetpix.toml"))).is_err());
    }
}
