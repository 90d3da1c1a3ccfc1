use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use themegen::catalog::AssetDescriptor;
use themegen::cli::CliOptions;
use themegen::client::Txt2ImgClient;
use themegen::config::setup_logging;
use themegen::driver::{RunSummary, run};
use themegen::select::{PrintViewer, Selector, SystemViewer, Viewer};
use tracing::{error, info};

fn print_catalog(assets: &[AssetDescriptor]) {
    for asset in assets {
        println!(
            "{}/{} ({}x{}): {}",
            asset.subdirectory, asset.filename, asset.width, asset.height, asset.prompt
        );
    }
}

async fn generate_all<V: Viewer>(
    cli: &CliOptions,
    assets: &[AssetDescriptor],
    viewer: V,
) -> Result<()> {
    let options = cli.run_options();
    let client = Txt2ImgClient::new(&options.settings).context("Failed to build HTTP client")?;
    let selector = Selector::new(&cli.temp_dir, viewer);

    info!("--- Starting UI Asset Generation ---");
    info!("{} asset(s), service at {}", assets.len(), client.endpoint());

    let mut input = io::stdin().lock();
    let mut output = io::stdout();
    let outcomes = run(
        assets,
        &options,
        &client,
        &selector,
        &mut input,
        &mut output,
    )
    .await?;

    let summary = RunSummary::from_outcomes(&outcomes);
    info!(
        "--- Asset Generation Complete --- saved {}, skipped {}, failed {}",
        summary.saved, summary.skipped, summary.failed
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = CliOptions::parse();

    setup_logging(cli.debug, cli.quiet).context("Failed to set up logging")?;

    let assets = cli.assets().context("Failed to load the asset catalog")?;
    if assets.is_empty() {
        error!("No assets match the requested categories");
        return Ok(());
    }

    if cli.list {
        print_catalog(&assets);
        return Ok(());
    }

    if cli.no_viewer {
        generate_all(&cli, &assets, PrintViewer).await
    } else {
        generate_all(&cli, &assets, SystemViewer).await
    }
}
