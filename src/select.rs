//! Showing the candidates to a human and asking which one to keep.

use std::io::{BufRead, Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use base64::Engine;
use base64::engine::general_purpose;
use tracing::{debug, warn};

use crate::catalog::AssetDescriptor;
use crate::client::GenerationResult;
use crate::constants::TEMP_FILE_PREFIX;
use crate::error::ThemegenError;

/// Opens an image file somewhere the operator can see it.
pub trait Viewer {
    /// Returns false when nothing was opened, the caller prints the path instead.
    fn open(&self, path: &Path) -> bool;
}

/// Hands files to the desktop's default image viewer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemViewer;

impl Viewer for SystemViewer {
    fn open(&self, path: &Path) -> bool {
        match viewer_command(path) {
            Some(command) => launch_detached(command),
            None => false,
        }
    }
}

/// Starts the viewer without waiting on it, so every candidate can be on
/// screen at once. A background thread reaps the child when it exits.
fn launch_detached(mut command: Command) -> bool {
    let mut child = match command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            warn!("Failed to launch image viewer: {err}");
            return false;
        }
    };
    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => debug!("Image viewer exited with {status}"),
        Ok(_) => {}
        Err(err) => debug!("Couldn't wait on image viewer: {err}"),
    });
    true
}

fn viewer_command(path: &Path) -> Option<Command> {
    if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(path);
        Some(command)
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(path);
        Some(command)
    } else if has_display() {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        Some(command)
    } else {
        None
    }
}

fn has_display() -> bool {
    std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
}

/// Never opens anything, for headless boxes and `--no-viewer`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrintViewer;

impl Viewer for PrintViewer {
    fn open(&self, _path: &Path) -> bool {
        false
    }
}

/// A decoded candidate sitting in a scratch file.
#[derive(Debug)]
struct Candidate {
    bytes: Vec<u8>,
    path: PathBuf,
    dimensions: Option<(u32, u32)>,
}

/// The image the operator picked.
#[derive(Debug, Eq, PartialEq)]
pub struct SelectedAsset {
    /// Decoded image bytes
    pub bytes: Vec<u8>,
    /// Scratch file still holding the image, removed once it's been saved
    pub temp_path: PathBuf,
}

/// Decodes one candidate, tolerating a `data:image/...;base64,` prefix.
pub fn decode_candidate(encoded: &str) -> Result<Vec<u8>, ThemegenError> {
    let payload = match encoded.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| {
                ThemegenError::InvalidPayload("data URL without payload".to_string())
            })?,
        None => encoded,
    };
    Ok(general_purpose::STANDARD.decode(payload.trim())?)
}

/// Scratch file path for candidate `index` of `asset`.
pub fn candidate_path(
    temp_dir: &Path,
    asset: &AssetDescriptor,
    index: usize,
    ext: &str,
) -> PathBuf {
    temp_dir.join(format!("{TEMP_FILE_PREFIX}_{}_{index}.{ext}", asset.filename))
}

/// Parses a 1-based choice into a 0-based index.
pub fn parse_selection(input: &str, count: usize) -> Result<usize, ThemegenError> {
    let trimmed = input.trim();
    match trimmed.parse::<usize>() {
        Ok(choice) if (1..=count).contains(&choice) => Ok(choice - 1),
        _ => Err(ThemegenError::InvalidSelectionInput(trimmed.to_string())),
    }
}

/// Removes scratch files, ignoring anything that goes wrong.
pub fn remove_quietly(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        debug!("Couldn't remove {}: {err}", path.display());
    }
}

/// Puts candidates in front of the operator and collects a choice.
#[derive(Clone, Debug)]
pub struct Selector<V> {
    temp_dir: PathBuf,
    viewer: V,
}

impl<V: Viewer> Selector<V> {
    /// Candidates are written under `temp_dir`.
    pub fn new(temp_dir: impl Into<PathBuf>, viewer: V) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            viewer,
        }
    }

    /// Shows every candidate, then blocks until the operator picks one.
    pub fn select<R: BufRead, W: Write>(
        &self,
        result: &GenerationResult,
        asset: &AssetDescriptor,
        input: &mut R,
        output: &mut W,
    ) -> Result<SelectedAsset, ThemegenError> {
        if result.is_empty() {
            return Err(ThemegenError::EmptyResult);
        }

        let decoded = result
            .images
            .iter()
            .enumerate()
            .map(|(index, encoded)| {
                let bytes = decode_candidate(encoded)?;
                let format = image::guess_format(&bytes).map_err(|err| {
                    ThemegenError::InvalidPayload(format!("candidate {}: {err}", index + 1))
                })?;
                Ok((bytes, format))
            })
            .collect::<Result<Vec<_>, ThemegenError>>()?;

        let mut candidates: Vec<Candidate> = Vec::with_capacity(decoded.len());
        let selected =
            match self.present_and_choose(decoded, asset, &mut candidates, input, output) {
                Ok(selected) => selected,
                Err(err) => {
                    cleanup(&candidates, None);
                    return Err(err);
                }
            };

        cleanup(&candidates, Some(selected));
        let chosen = candidates.swap_remove(selected);
        Ok(SelectedAsset {
            bytes: chosen.bytes,
            temp_path: chosen.path,
        })
    }

    /// Writes each candidate to a scratch file, shows it, then asks for a
    /// choice. Every file written is pushed onto `candidates` first so the
    /// caller can clean up whatever happens afterwards.
    fn present_and_choose<R: BufRead, W: Write>(
        &self,
        decoded: Vec<(Vec<u8>, image::ImageFormat)>,
        asset: &AssetDescriptor,
        candidates: &mut Vec<Candidate>,
        input: &mut R,
        output: &mut W,
    ) -> Result<usize, ThemegenError> {
        writeln!(output, "  Showing: opening candidates for {}...", asset.filename)?;

        for (index, (bytes, format)) in decoded.into_iter().enumerate() {
            let ext = format.extensions_str().first().copied().unwrap_or("png");
            let path = candidate_path(&self.temp_dir, asset, index, ext);
            if let Err(err) = std::fs::write(&path, &bytes) {
                remove_quietly(&path);
                return Err(err.into());
            }
            let dimensions = image::ImageReader::new(Cursor::new(bytes.as_slice()))
                .with_guessed_format()
                .ok()
                .and_then(|reader| reader.into_dimensions().ok());
            candidates.push(Candidate {
                bytes,
                path,
                dimensions,
            });
            let path = &candidates[index].path;
            if !self.viewer.open(path) {
                writeln!(output, "  Image file: {}", path.display())?;
            }
        }

        writeln!(output, "  Each image should have opened in an external viewer.")?;
        writeln!(
            output,
            "  If an image didn't show up, open the files below manually:"
        )?;
        for (index, candidate) in candidates.iter().enumerate() {
            match candidate.dimensions {
                Some((width, height)) => writeln!(
                    output,
                    "    [{}] {} ({width}x{height})",
                    index + 1,
                    candidate.path.display()
                )?,
                None => writeln!(output, "    [{}] {}", index + 1, candidate.path.display())?,
            }
        }

        prompt_for_choice(candidates.len(), input, output)
    }
}

fn cleanup(candidates: &[Candidate], keep: Option<usize>) {
    for (index, candidate) in candidates.iter().enumerate() {
        if Some(index) != keep {
            remove_quietly(&candidate.path);
        }
    }
}

fn prompt_for_choice<R: BufRead, W: Write>(
    count: usize,
    input: &mut R,
    output: &mut W,
) -> Result<usize, ThemegenError> {
    loop {
        write!(output, "  Which image do you want to keep? (1-{count}): ")?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(ThemegenError::InputClosed);
        }
        match parse_selection(&line, count) {
            Ok(selected) => return Ok(selected),
            Err(err) => {
                debug!("{err}");
                writeln!(output, "  Invalid input.")?;
            }
        }
    }
}
