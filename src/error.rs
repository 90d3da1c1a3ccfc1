//! Error handling

use std::path::PathBuf;

/// Everything that can go wrong while generating the theme.
#[derive(Debug)]
pub enum ThemegenError {
    /// The output root doesn't exist, nothing can be saved so the run stops
    MissingOutputRoot(PathBuf),
    /// Transport failure, timeout or non-2xx response from the txt2img service
    ServiceUnavailable(String),
    /// The service answered but didn't hand back any images
    EmptyResult,
    /// A candidate payload couldn't be decoded into an image
    InvalidPayload(String),
    /// Writing the chosen image to the output tree failed
    WriteFailure {
        /// Where we tried to write
        path: PathBuf,
        /// What the filesystem said
        source: std::io::Error,
    },
    /// The operator typed something that isn't a candidate number
    InvalidSelectionInput(String),
    /// stdin closed while waiting for a selection
    InputClosed,
    /// Terminal or scratch file IO failed
    Io(std::io::Error),
    /// The catalog file couldn't be read or failed validation
    Catalog(String),
}

impl ThemegenError {
    /// True for failures that end the whole run rather than a single asset.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingOutputRoot(_) | Self::InputClosed | Self::Catalog(_)
        )
    }
}

impl std::fmt::Display for ThemegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingOutputRoot(path) => write!(
                f,
                "Base directory '{}' does not exist. Please create it first.",
                path.display()
            ),
            Self::ServiceUnavailable(details) => write!(
                f,
                "API request failed, is the server running with --api? {details}"
            ),
            Self::EmptyResult => write!(f, "No image data received"),
            Self::InvalidPayload(details) => write!(f, "Invalid image payload: {details}"),
            Self::WriteFailure { path, source } => {
                write!(f, "Failed to write {}: {source}", path.display())
            }
            Self::InvalidSelectionInput(input) => write!(f, "Invalid selection: {input:?}"),
            Self::InputClosed => write!(f, "Input closed while waiting for a selection"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::Catalog(details) => write!(f, "Catalog error: {details}"),
        }
    }
}

impl std::error::Error for ThemegenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WriteFailure { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ThemegenError {
    fn from(err: std::io::Error) -> Self {
        ThemegenError::Io(err)
    }
}

impl From<reqwest::Error> for ThemegenError {
    fn from(err: reqwest::Error) -> Self {
        ThemegenError::ServiceUnavailable(err.to_string())
    }
}

impl From<base64::DecodeError> for ThemegenError {
    fn from(err: base64::DecodeError) -> Self {
        ThemegenError::InvalidPayload(err.to_string())
    }
}
