//! Walks the catalog: generate, pick, save, next.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::catalog::AssetDescriptor;
use crate::client::{GenerationRequest, GenerationSettings, Generator};
use crate::error::ThemegenError;
use crate::persist::{asset_path, save_asset};
use crate::select::{Selector, Viewer, remove_quietly};

/// Knobs for a run.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Must already exist, the run refuses to start otherwise
    pub output_root: PathBuf,
    /// Sampling config for every request
    pub settings: GenerationSettings,
    /// Leave assets that are already on disk alone
    pub skip_existing: bool,
}

impl RunOptions {
    /// Defaults for everything but the output root.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            settings: GenerationSettings::default(),
            skip_existing: false,
        }
    }
}

/// What happened to one catalog entry.
#[derive(Debug)]
pub enum AssetOutcome {
    /// Written to this path
    Saved(PathBuf),
    /// Already on disk and `skip_existing` was set
    Skipped(PathBuf),
    /// Gave up on this one
    Failed {
        /// The asset's output filename
        filename: String,
        /// Why
        error: ThemegenError,
    },
}

impl AssetOutcome {
    /// True for [AssetOutcome::Saved]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    /// True for [AssetOutcome::Failed]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Counts per outcome kind.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// Assets written
    pub saved: usize,
    /// Assets left alone
    pub skipped: usize,
    /// Assets that failed
    pub failed: usize,
}

impl RunSummary {
    /// Tallies a finished run.
    pub fn from_outcomes(outcomes: &[AssetOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                match outcome {
                    AssetOutcome::Saved(_) => summary.saved += 1,
                    AssetOutcome::Skipped(_) => summary.skipped += 1,
                    AssetOutcome::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }
}

/// Checks the output root is there before any work starts.
pub fn check_output_root(root: &Path) -> Result<(), ThemegenError> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(ThemegenError::MissingOutputRoot(root.to_path_buf()))
    }
}

/// Processes every asset in order, one at a time.
///
/// Only a missing output root comes back as `Err`. Per-asset failures are
/// logged and recorded in the returned outcomes, and the run moves on. If the
/// operator's input closes, the remaining assets aren't attempted since no
/// selection could be made for them.
pub async fn run<G, V, R, W>(
    assets: &[AssetDescriptor],
    options: &RunOptions,
    generator: &G,
    selector: &Selector<V>,
    input: &mut R,
    output: &mut W,
) -> Result<Vec<AssetOutcome>, ThemegenError>
where
    G: Generator,
    V: Viewer,
    R: BufRead,
    W: Write,
{
    check_output_root(&options.output_root)?;

    let mut outcomes = Vec::with_capacity(assets.len());
    for asset in assets {
        let target = asset_path(&options.output_root, &asset.subdirectory, &asset.filename);
        if options.skip_existing && target.exists() {
            info!("Skipping {}, already exists", target.display());
            outcomes.push(AssetOutcome::Skipped(target));
            continue;
        }

        match process_asset(asset, options, generator, selector, input, output).await {
            Ok(path) => {
                info!("Success! Saved to {}", path.display());
                outcomes.push(AssetOutcome::Saved(path));
            }
            Err(err) => {
                error!("Error: {} failed: {err}", asset.filename);
                let stop = err.is_fatal();
                outcomes.push(AssetOutcome::Failed {
                    filename: asset.filename.clone(),
                    error: err,
                });
                if stop {
                    warn!(
                        "Stopping, {} asset(s) not attempted",
                        assets.len() - outcomes.len()
                    );
                    break;
                }
            }
        }
    }
    Ok(outcomes)
}

async fn process_asset<G, V, R, W>(
    asset: &AssetDescriptor,
    options: &RunOptions,
    generator: &G,
    selector: &Selector<V>,
    input: &mut R,
    output: &mut W,
) -> Result<PathBuf, ThemegenError>
where
    G: Generator,
    V: Viewer,
    R: BufRead,
    W: Write,
{
    let request = GenerationRequest::new(asset, &options.settings);
    info!(
        "Requesting: {} ({}x{}) [batch={}, model={}, sampler={}, steps={}]",
        asset.filename,
        asset.width,
        asset.height,
        request.batch_size,
        request.override_settings.sd_model_checkpoint,
        request.sampler_name,
        request.steps
    );

    debug!("{}: generating", asset.filename);
    let result = generator.generate(&request).await?;

    debug!("{}: selecting from {} candidates", asset.filename, result.len());
    let selected = selector.select(&result, asset, input, output)?;

    match save_asset(
        &options.output_root,
        &asset.subdirectory,
        &asset.filename,
        &selected.bytes,
    ) {
        Ok(path) => {
            remove_quietly(&selected.temp_path);
            Ok(path)
        }
        Err(err) => {
            warn!(
                "The chosen image is still at {}",
                selected.temp_path.display()
            );
            Err(err)
        }
    }
}
