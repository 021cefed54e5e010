use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use article_scraper::{logging, utils, Extractor, Profile, ScraperConfig};
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the article page or video-note share link
    #[arg(short, long)]
    url: String,

    /// Kind of upstream document
    #[arg(short, long, value_enum, default_value_t = Profile::Article)]
    profile: Profile,

    /// Where to save the record (defaults to SCRAPER_OUTPUT_PATH)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the record without saving it
    #[arg(long)]
    no_save: bool,

    /// Per-attempt request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Maximum number of fetch attempts
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env and SCRAPER_* first, flags override
    let mut config = ScraperConfig::from_env();
    logging::init("info");
    let args = Args::parse();

    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(n) = args.max_attempts {
        config.max_attempts = n.max(1);
    }
    if let Some(path) = args.output {
        config.output_path = path;
    }

    let extractor = Extractor::new(&config).context("failed to set up extractor")?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            on_ctrl_c.cancel();
        }
    });

    let record = extractor
        .extract(&args.url, args.profile, &cancel)
        .await
        .with_context(|| format!("extraction failed for {}", args.url))?;

    println!("{}", serde_json::to_string_pretty(&record)?);

    if !args.no_save {
        utils::persist_record(&record, &config.output_path);
    }

    Ok(())
}
