//! Turns an asset's subject into the full positive/negative prompt pair.

use crate::catalog::AssetDescriptor;

/// House style, appended to every positive prompt so the set looks consistent.
pub const STYLE_PROMPT: &str = "masterpiece, best quality, UI design, game UI, \
dark academia aesthetic, gothic chic, elegant, ornate, intricate details, \
atmospheric lighting, muted colors, design-tic, emotional, \
dark polished wood, wrought iron filigree, gold and silver inlay, aged paper.";

/// Base negative prompt, every request's negative prompt starts with this.
pub const NEGATIVE_PROMPT: &str = "(worst quality, low quality, normal quality:1.4), ugly, blurry, \
text, signature, watermark, username, artist name, jpeg artifacts, noisy, \
3d render, photorealistic, photo, realistic, human, face, body.";

const POSITIVE_CLAUSES: &[&str] = &[
    "no text",
    "no watermark",
    "no signature",
    "no logo",
    "no UI chrome",
    "highly detailed",
    "sharp focus",
    "centered",
    "clean",
    "flat",
    "2d illustration",
    "concept art",
    "no human",
    "no face",
    "no animal",
];

const NEGATIVE_CLAUSES: &[&str] = &[
    "border",
    "frame",
    "logo",
    "icon",
    "emoji",
    "cartoon",
    "comic",
    "manga",
    "distorted",
    "cropped",
    "cut-off",
    "out of frame",
    "nsfw",
    "nude",
    "naked",
    "text",
    "watermark",
    "signature",
    "artist name",
    "bad anatomy",
    "bad proportions",
    "extra limbs",
    "missing limbs",
    "deformed",
    "mutated",
    "blurry",
    "lowres",
    "jpeg artifacts",
];

/// The two strings sent to the service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComposedPrompt {
    /// What we want
    pub positive: String,
    /// What we don't
    pub negative: String,
}

/// Merges the asset's subject with the fixed clauses and global style.
pub fn compose(asset: &AssetDescriptor) -> ComposedPrompt {
    let positive = format!(
        "{}, {}, {STYLE_PROMPT}",
        asset.prompt,
        POSITIVE_CLAUSES.join(", ")
    );
    let negative = format!("{NEGATIVE_PROMPT}, {}", NEGATIVE_CLAUSES.join(", "));
    ComposedPrompt { positive, negative }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin;

    #[test]
    fn every_builtin_prompt_keeps_subject_and_style() {
        for asset in builtin() {
            let composed = compose(&asset);
            assert!(composed.positive.contains(&asset.prompt));
            assert!(composed.positive.starts_with(&asset.prompt));
            assert!(composed.positive.ends_with(STYLE_PROMPT));
            assert!(composed.negative.starts_with(NEGATIVE_PROMPT));
        }
    }

    #[test]
    fn clauses_are_included() {
        let asset = AssetDescriptor::new("icons", "icon_folder.png", 128, 128, "a folder");
        let composed = compose(&asset);
        assert!(composed.positive.contains("no UI chrome, highly detailed"));
        assert!(composed.negative.contains("border, frame, logo"));
        assert!(composed.negative.ends_with("jpeg artifacts"));
    }

    #[test]
    fn compose_is_deterministic() {
        let asset = AssetDescriptor::new("cursors", "cursor_hand.png", 32, 32, "a hand");
        assert_eq!(compose(&asset), compose(&asset));
    }
}
