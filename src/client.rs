//! txt2img client for a local Stable Diffusion WebUI style service.
//!
//! One POST per asset, a fixed batch of candidates back, no retries. The
//! operator reruns the tool if something didn't come through.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::catalog::AssetDescriptor;
use crate::constants::{
    BATCH_SIZE, DEFAULT_API_URL, DEFAULT_CFG_SCALE, DEFAULT_CLIP_SKIP, DEFAULT_MODEL_CHECKPOINT,
    DEFAULT_SAMPLER, DEFAULT_STEPS, DEFAULT_TIMEOUT, RANDOM_SEED, TXT2IMG_PATH,
};
use crate::error::ThemegenError;
use crate::prompt::compose;

/// How much of an error body we keep in messages
const ERROR_BODY_LIMIT: usize = 512;

/// Sampling configuration shared by every request in a run.
#[derive(Clone, Debug)]
pub struct GenerationSettings {
    /// Base URL of the service, eg `http://127.0.0.1:7860`
    pub api_url: Url,
    /// Checkpoint the service should switch to for the request
    pub model_checkpoint: String,
    /// Sampler name as the service knows it
    pub sampler_name: String,
    /// Sampling steps
    pub steps: u32,
    /// Guidance scale
    pub cfg_scale: f32,
    /// CLIP layers to skip from the end
    pub clip_skip: u32,
    /// Upper bound on a single request
    pub timeout: Duration,
}

impl Default for GenerationSettings {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            model_checkpoint: DEFAULT_MODEL_CHECKPOINT.to_string(),
            sampler_name: DEFAULT_SAMPLER.to_string(),
            steps: DEFAULT_STEPS,
            cfg_scale: DEFAULT_CFG_SCALE,
            clip_skip: DEFAULT_CLIP_SKIP,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GenerationSettings {
    /// Full URL of the txt2img endpoint. Any path prefix and query on the base
    /// URL are kept, a fragment is dropped.
    pub fn endpoint(&self) -> Result<Url, ThemegenError> {
        let mut url = self.api_url.clone();
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| {
                ThemegenError::ServiceUnavailable(format!(
                    "Invalid API URL {}: cannot be a base",
                    self.api_url
                ))
            })?
            .pop_if_empty()
            .extend(TXT2IMG_PATH.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

/// Checkpoint overrides applied for the duration of one request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverrideSettings {
    /// Model checkpoint title
    pub sd_model_checkpoint: String,
    /// CLIP skip
    #[serde(rename = "CLIP_stop_at_last_layers")]
    pub clip_stop_at_last_layers: u32,
}

/// Request body for POST /sdapi/v1/txt2img
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Positive prompt
    pub prompt: String,
    /// Negative prompt
    pub negative_prompt: String,
    /// Sampler name
    pub sampler_name: String,
    /// Sampling steps
    pub steps: u32,
    /// Guidance scale
    pub cfg_scale: f32,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Candidates per request, always [BATCH_SIZE]
    pub batch_size: u8,
    /// Hires fix, always off
    pub enable_hr: bool,
    /// Per-request model selection
    pub override_settings: OverrideSettings,
    /// Put the service's settings back once we're done
    pub override_settings_restore_afterwards: bool,
    /// [RANDOM_SEED], so each call gets a fresh seed
    pub seed: i64,
    /// Face restoration, always off
    pub restore_faces: bool,
    /// Tiling, always off
    pub tiling: bool,
}

impl GenerationRequest {
    /// Builds the request for one asset.
    pub fn new(asset: &AssetDescriptor, settings: &GenerationSettings) -> Self {
        let composed = compose(asset);
        Self {
            prompt: composed.positive,
            negative_prompt: composed.negative,
            sampler_name: settings.sampler_name.clone(),
            steps: settings.steps,
            cfg_scale: settings.cfg_scale,
            width: asset.width,
            height: asset.height,
            batch_size: BATCH_SIZE,
            enable_hr: false,
            override_settings: OverrideSettings {
                sd_model_checkpoint: settings.model_checkpoint.clone(),
                clip_stop_at_last_layers: settings.clip_skip,
            },
            override_settings_restore_afterwards: true,
            seed: RANDOM_SEED,
            restore_faces: false,
            tiling: false,
        }
    }
}

/// The candidates for one asset, base64 encoded as they came off the wire.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GenerationResult {
    /// Encoded images in service order
    pub images: Vec<String>,
}

impl GenerationResult {
    /// Number of candidates
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True when there's nothing to pick from
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[derive(Deserialize, Debug)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    info: Option<String>,
}

/// Something that turns a request into a batch of candidates.
pub trait Generator {
    /// Makes a single attempt at generating the batch.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<GenerationResult, ThemegenError>>;
}

/// [Generator] backed by the real HTTP service.
#[derive(Clone, Debug)]
pub struct Txt2ImgClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl Txt2ImgClient {
    /// Builds a client with the configured timeout. Connections aren't reused
    /// between requests.
    pub fn new(settings: &GenerationSettings) -> Result<Self, ThemegenError> {
        let endpoint = settings.endpoint()?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// The URL requests are sent to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Generator for Txt2ImgClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ThemegenError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(ThemegenError::ServiceUnavailable(format!(
                "txt2img returned {status}: {}",
                truncate(&String::from_utf8_lossy(&bytes))
            )));
        }

        let parsed: Txt2ImgResponse = serde_json::from_slice(&bytes).map_err(|err| {
            ThemegenError::ServiceUnavailable(format!("Failed to parse txt2img JSON: {err}"))
        })?;

        if let Some(info) = parsed.info.as_deref() {
            debug!("txt2img info: {}", truncate(info));
        }

        match parsed.images {
            Some(images) if !images.is_empty() => Ok(GenerationResult { images }),
            _ => {
                debug!("API Response: {}", truncate(&String::from_utf8_lossy(&bytes)));
                Err(ThemegenError::EmptyResult)
            }
        }
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_fixed_sampling_config() {
        let asset = AssetDescriptor::new("icons", "icon_folder.png", 128, 96, "a folder");
        let request = GenerationRequest::new(&asset, &GenerationSettings::default());
        let body = serde_json::to_value(&request).expect("serialize request");

        assert_eq!(body["batch_size"], 4);
        assert_eq!(body["seed"], -1);
        assert_eq!(body["width"], 128);
        assert_eq!(body["height"], 96);
        assert_eq!(body["sampler_name"], "DPM++ 2M");
        assert_eq!(body["steps"], 20);
        assert_eq!(body["cfg_scale"], 7.0);
        assert_eq!(body["enable_hr"], false);
        assert_eq!(body["override_settings_restore_afterwards"], true);
        assert_eq!(
            body["override_settings"]["sd_model_checkpoint"],
            DEFAULT_MODEL_CHECKPOINT
        );
        assert_eq!(body["override_settings"]["CLIP_stop_at_last_layers"], 2);
        assert!(
            body["prompt"]
                .as_str()
                .is_some_and(|p| p.starts_with("a folder"))
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let settings = GenerationSettings {
            api_url: Url::parse("http://gpu-box:7860/sd/").expect("url"),
            ..GenerationSettings::default()
        };
        assert_eq!(
            settings.endpoint().expect("endpoint").as_str(),
            "http://gpu-box:7860/sd/sdapi/v1/txt2img"
        );
        assert_eq!(
            GenerationSettings::default()
                .endpoint()
                .expect("endpoint")
                .as_str(),
            "http://127.0.0.1:7860/sdapi/v1/txt2img"
        );
    }

    #[test]
    fn endpoint_keeps_query_out_of_the_path() {
        let settings = GenerationSettings {
            api_url: Url::parse("http://gpu:7860/?token=abc#frag").expect("url"),
            ..GenerationSettings::default()
        };
        let endpoint = settings.endpoint().expect("endpoint");
        assert_eq!(endpoint.path(), "/sdapi/v1/txt2img");
        assert_eq!(endpoint.query(), Some("token=abc"));
        assert_eq!(endpoint.as_str(), "http://gpu:7860/sdapi/v1/txt2img?token=abc");

        let opaque = GenerationSettings {
            api_url: Url::parse("mailto:someone@example.org").expect("url"),
            ..GenerationSettings::default()
        };
        assert!(opaque.endpoint().is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "é".repeat(ERROR_BODY_LIMIT + 10);
        assert_eq!(truncate(&long).chars().count(), ERROR_BODY_LIMIT);
        assert_eq!(truncate("short"), "short");
    }
}
