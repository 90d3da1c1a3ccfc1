//! CLI parser
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::catalog::{self, AssetDescriptor};
use crate::client::GenerationSettings;
use crate::constants::{
    DEFAULT_API_URL, DEFAULT_CFG_SCALE, DEFAULT_CLIP_SKIP, DEFAULT_MODEL_CHECKPOINT,
    DEFAULT_OUTPUT_DIR, DEFAULT_SAMPLER, DEFAULT_STEPS, DEFAULT_TIMEOUT_SECONDS,
};
use crate::driver::RunOptions;
use crate::error::ThemegenError;

#[derive(Parser, Debug)]
#[command(name = "themegen")]
#[command(about = "Generate a themed UI asset set via a local txt2img API, picking each image by hand")]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "THEMEGEN_DEBUG")]
    /// Enable debug logging. Env: THEMEGEN_DEBUG
    pub debug: bool,

    #[clap(long, short, help = "Only log warnings and errors")]
    /// Quieter logging, prompts and candidate paths are still shown
    pub quiet: bool,

    #[clap(long, default_value = DEFAULT_API_URL, env = "THEMEGEN_API_URL")]
    /// Base URL of the txt2img service, defaults to `http://127.0.0.1:7860`.
    /// Env: THEMEGEN_API_URL
    pub api_url: Url,

    #[clap(long, short, default_value = DEFAULT_OUTPUT_DIR, env = "THEMEGEN_OUTPUT_DIR")]
    /// Output root, must already exist. Assets go in `<dir>/<category>/<file>`.
    /// Env: THEMEGEN_OUTPUT_DIR
    pub output_dir: PathBuf,

    #[clap(long, default_value = ".", env = "THEMEGEN_TEMP_DIR")]
    /// Where candidate images are written while you choose.
    /// Env: THEMEGEN_TEMP_DIR
    pub temp_dir: PathBuf,

    #[clap(long, short, env = "THEMEGEN_CATALOG")]
    /// JSON file with the assets to generate, eg `catalog.json`. Uses the
    /// built-in theme if unset.
    /// Env: THEMEGEN_CATALOG
    pub catalog: Option<PathBuf>,

    #[clap(long = "category")]
    /// Only generate assets in this category (repeatable), eg `icons`
    pub categories: Vec<String>,

    #[clap(long, default_value = DEFAULT_MODEL_CHECKPOINT, env = "THEMEGEN_MODEL")]
    /// Model checkpoint title. Env: THEMEGEN_MODEL
    pub model: String,

    #[clap(long, default_value = DEFAULT_SAMPLER)]
    /// Sampler name
    pub sampler: String,

    #[clap(long, default_value_t = DEFAULT_STEPS)]
    /// Sampling steps
    pub steps: u32,

    #[clap(long, default_value_t = DEFAULT_CFG_SCALE)]
    /// Guidance scale
    pub cfg_scale: f32,

    #[clap(long, default_value_t = DEFAULT_CLIP_SKIP)]
    /// CLIP layers to skip
    pub clip_skip: u32,

    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECONDS, env = "THEMEGEN_TIMEOUT_SECS")]
    /// Per-request timeout in seconds. Env: THEMEGEN_TIMEOUT_SECS
    pub timeout_secs: u64,

    #[clap(long, help = "Don't regenerate assets that already exist")]
    /// Skip assets already in the output tree
    pub skip_existing: bool,

    #[clap(long, help = "Print candidate paths instead of opening a viewer")]
    /// Never launch an image viewer
    pub no_viewer: bool,

    #[clap(long, help = "Print the catalog and exit")]
    /// List assets and exit
    pub list: bool,
}

impl CliOptions {
    /// The sampling config these options describe.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            api_url: self.api_url.clone(),
            model_checkpoint: self.model.clone(),
            sampler_name: self.sampler.clone(),
            steps: self.steps,
            cfg_scale: self.cfg_scale,
            clip_skip: self.clip_skip,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    /// The catalog to run: `--catalog` or the built-in one, narrowed by `--category`.
    pub fn assets(&self) -> Result<Vec<AssetDescriptor>, ThemegenError> {
        let assets = match &self.catalog {
            Some(path) => catalog::load_catalog(path)?,
            None => catalog::builtin(),
        };
        Ok(catalog::filter_categories(assets, &self.categories))
    }

    /// Driver options.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            output_root: self.output_dir.clone(),
            settings: self.generation_settings(),
            skip_existing: self.skip_existing,
        }
    }
}
