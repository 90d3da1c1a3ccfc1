//! Shared constants/defaults for things
//!

use std::time::Duration;

/// Where the generated theme goes unless told otherwise
pub const DEFAULT_OUTPUT_DIR: &str = "theme_assets";

/// Default base URL of the local txt2img service
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:7860";

/// Path of the txt2img endpoint, appended to the base URL
pub const TXT2IMG_PATH: &str = "/sdapi/v1/txt2img";

/// Number of candidates requested per asset
pub const BATCH_SIZE: u8 = 4;

/// Seed value that makes the service pick a random seed per call
pub const RANDOM_SEED: i64 = -1;

/// Default checkpoint selected via override settings
pub const DEFAULT_MODEL_CHECKPOINT: &str = "animagineXLV31_v31.safetensors [e3c47aedb0]";

/// Default sampler
pub const DEFAULT_SAMPLER: &str = "DPM++ 2M";

/// Default number of sampling steps
pub const DEFAULT_STEPS: u32 = 20;

/// Default classifier-free guidance scale
pub const DEFAULT_CFG_SCALE: f32 = 7.0;

/// Stop CLIP two layers from the end, gives fewer nonsense images on anime checkpoints
pub const DEFAULT_CLIP_SKIP: u32 = 2;

/// Default time we'll wait on a single generation request, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

/// [DEFAULT_TIMEOUT_SECONDS] as a [Duration]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECONDS);

/// Prefix for scratch files holding candidates while the operator picks one
pub const TEMP_FILE_PREFIX: &str = "temp";
