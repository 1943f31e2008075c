use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use flags::CompressionFlag;
use mrf_extractor::{ByteSource, ExtractConfig, Extractor, LineSink, OutputTarget};
use std::path::PathBuf;

mod flags;

#[derive(Parser, Debug)]
#[command(name = "mrf-extract")]
#[command(
    about = "Extract filtered file URLs from a machine-readable file index",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Index file (.json.gz or .json); `-` reads standard input
    input: PathBuf,

    /// Output file, one URL per line; `-` writes to standard output
    #[arg(short, long, default_value = "urls.txt")]
    output: PathBuf,

    /// TOML config file (flags and environment override its values)
    #[arg(long, env = "MRF_CONFIG")]
    config: Option<PathBuf>,

    /// Field whose array lists the files
    #[arg(long, env = "MRF_TARGET_KEY")]
    target_key: Option<String>,

    /// Required network subdomain of the file host
    #[arg(long, env = "MRF_SUBDOMAIN")]
    subdomain: Option<String>,

    /// Case-insensitive text the description must contain
    #[arg(long, env = "MRF_DESCRIPTION_CONTAINS")]
    description_contains: Option<String>,

    /// Vendor domain of the file host (`<subdomain>.mrf.<vendor-domain>`)
    #[arg(long)]
    vendor_domain: Option<String>,

    /// Full URL regex; capture group 1 must be the subdomain
    #[arg(long)]
    url_pattern: Option<String>,

    /// Input encoding
    #[arg(long, value_enum)]
    compression: Option<CompressionFlag>,

    /// Log progress every N records (0 disables)
    #[arg(long)]
    progress_interval: Option<u64>,

    /// Write URLs in sorted order
    #[arg(long)]
    sorted: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long)]
    quiet: bool,
}

pub fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for the JSON summary
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let target = OutputTarget::from_path(&cli.output);
    if cli.json && target == OutputTarget::Stdout {
        anyhow::bail!("--json cannot be combined with `--output -` (both write to stdout)");
    }

    let config = build_config(&cli)?;
    log::debug!("Effective config: {config:?}");

    let extractor = Extractor::new(config).context("Invalid extraction settings")?;
    let source = ByteSource::from_path(&cli.input);
    let mut sink = LineSink::new(target).sorted(extractor.config().sorted_output);

    let summary = extractor.run(&source, &mut sink).with_context(|| {
        format!(
            "Failed to extract URLs from {} into {}",
            source.name().display(),
            cli.output.display()
        )
    })?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serialize run summary")?
        );
    }
    Ok(())
}

/// Defaults, then the config file, then environment and flags
fn build_config(cli: &Cli) -> Result<ExtractConfig> {
    let mut config = match &cli.config {
        Some(path) => ExtractConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExtractConfig::default(),
    };

    if let Some(key) = &cli.target_key {
        config.target_key = key.clone();
    }
    if let Some(subdomain) = &cli.subdomain {
        config.filter.subdomain = subdomain.clone();
    }
    if let Some(needle) = &cli.description_contains {
        config.filter.description_contains = needle.clone();
    }
    if let Some(domain) = &cli.vendor_domain {
        config.filter.vendor_domain = domain.clone();
    }
    if let Some(pattern) = &cli.url_pattern {
        config.filter.url_pattern = Some(pattern.clone());
    }
    if let Some(compression) = cli.compression {
        config.compression = compression.as_domain();
    }
    if let Some(interval) = cli.progress_interval {
        config.progress_interval = interval;
    }
    if cli.sorted {
        config.sorted_output = true;
    }

    Ok(config)
}
