//! Command line entry point: print the box tree of a page as JSON.

use anyhow::Result;
use boxtree_chrome::{DriverConfig, Persistence, Report, parse_target, run};
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;
use std::fs::File;
use std::io::{self, BufWriter, Write as _};
use std::path::PathBuf;
use std::process::exit;

/// Render a page in headless Chrome and dump its geometric box tree.
#[derive(Parser, Debug)]
#[command(name = "boxtree", version, about)]
#[allow(clippy::struct_excessive_bools, reason = "each flag is an independent switch")]
struct Cli {
    /// URL or local HTML file to extract
    url: String,

    /// Viewport width in CSS pixels
    #[arg(short = 'W', long, default_value_t = 1200)]
    width: u32,

    /// Viewport height in CSS pixels
    #[arg(short = 'H', long, default_value_t = 800)]
    height: u32,

    /// How long to wait for the page: 0 DOM ready, 1 load, 2 almost idle, 3 idle
    #[arg(short = 'P', long, default_value_t = 1)]
    persistence: u8,

    /// Include a full-page screenshot
    #[arg(short = 's', long)]
    screenshot: bool,

    /// Capture the pixels of image boxes
    #[arg(short = 'I', long)]
    download_images: bool,

    /// Chrome or Chromium binary
    #[arg(long, env = "CHROME_BIN")]
    chrome: Option<PathBuf>,

    /// Disable web font stylesheets before extracting
    #[arg(long)]
    disable_web_fonts: bool,

    /// Write the JSON here instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn driver_config(&self) -> Result<DriverConfig> {
        let mut config = DriverConfig::new(parse_target(&self.url)?);
        config.width = self.width;
        config.height = self.height;
        config.persistence = Persistence::from_level(self.persistence);
        config.screenshot = self.screenshot;
        config.download_images = self.download_images;
        config.chrome.clone_from(&self.chrome);
        config.disable_web_fonts = self.disable_web_fonts;
        Ok(config)
    }
}

fn write_report(report: &Report, cli: &Cli) -> Result<()> {
    let mut out: Box<dyn io::Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    if cli.pretty {
        serde_json::to_writer_pretty(&mut out, report)?;
    } else {
        serde_json::to_writer(&mut out, report)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

async fn run_cli(cli: &Cli) -> Result<()> {
    let config = cli.driver_config()?;
    let report = run(&config).await?;
    write_report(&report, cli)
}

#[tokio::main]
async fn main() {
    let _log_init: Result<(), _> = Builder::from_env(Env::default().filter_or("RUST_LOG", "warn"))
        .is_test(false)
        .try_init();
    let cli = Cli::parse();
    if let Err(err) = run_cli(&cli).await {
        error!("error: {err:#}");
        exit(1);
    }
}
