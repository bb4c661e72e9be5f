use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;

use cardforge::{
    Catalog, CatalogProvider, DefaultFetcher, ForgeConfig, OutputFormat, Pipeline, PortraitPolicy,
};

#[derive(Parser, Debug)]
#[command(name = "cardforge", version)]
struct Cli {
    /// Catalog JSON (institutions, names, programs).
    #[arg(long)]
    catalog: PathBuf,

    /// Config JSON. Defaults apply to every missing field.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output image path. Without an extension, the format's extension is appended.
    #[arg(long)]
    out: PathBuf,

    /// Seed for a reproducible card.
    #[arg(long)]
    seed: Option<u64>,

    /// Output format; overrides the config.
    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    /// JPEG quality; overrides the config.
    #[arg(long)]
    quality: Option<u8>,

    /// Font directory loaded before system fonts.
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// Fail instead of drawing a placeholder when the portrait cannot be loaded.
    #[arg(long, default_value_t = false)]
    require_portrait: bool,

    /// Log level.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log: LogLevel,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Jpeg,
    Png,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(cli.log))
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&cli)?;
    let out_path = output_path(&cli.out, config.output);
    let catalog = Catalog::from_json_file(&cli.catalog)?;
    let provider = CatalogProvider::new(catalog, config.card_size()?)?;
    let fetcher = DefaultFetcher::new(config.fetch.timeout())?;
    let pipeline = Pipeline::new(config, Box::new(provider), Box::new(fetcher))?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let out = pipeline.run(&mut rng)?;

    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&out_path, &out.bytes)
        .with_context(|| format!("write image '{}'", out_path.display()))?;

    eprintln!(
        "wrote {} ({}, {} at {})",
        out_path.display(),
        out.content_type,
        out.document.display_name,
        out.document.institution_name
    );
    Ok(())
}

/// `--out` without an extension gets the one of the chosen format.
fn output_path(out: &Path, format: OutputFormat) -> PathBuf {
    if out.extension().is_some() {
        out.to_path_buf()
    } else {
        out.with_extension(format.extension())
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<ForgeConfig> {
    let mut config = match &cli.config {
        Some(path) => ForgeConfig::from_json_file(path)?,
        None => ForgeConfig::default(),
    };
    match (cli.format, cli.quality) {
        (Some(FormatChoice::Png), _) => config.output = OutputFormat::Png,
        (Some(FormatChoice::Jpeg), q) => {
            let quality = q.unwrap_or(cardforge::encode::DEFAULT_JPEG_QUALITY);
            config.output = OutputFormat::Jpeg { quality };
        }
        (None, Some(quality)) => config.output = OutputFormat::Jpeg { quality },
        (None, None) => {}
    }
    if let Some(dir) = &cli.font_dir {
        config.fonts.dir = Some(dir.clone());
    }
    if cli.require_portrait {
        config.portrait_policy = PortraitPolicy::Required;
    }
    config.validate()?;
    Ok(config)
}
