//! Error types for menu rendering and history

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for menu operations
pub type Result<T> = std::result::Result<T, MenuError>;

/// Errors that can occur while building, rendering or archiving a menu.
///
/// Font problems are not represented here: they degrade to the built-in font
/// and surface as a [`crate::template::FontWarning`] instead.
#[derive(Error, Debug)]
pub enum MenuError {
    /// Background image does not exist
    #[error("background image not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    /// Background image exists but could not be decoded
    #[error("failed to decode background image {}: {source}", path.display())]
    TemplateDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Form refers to a section that is not in the layout table
    #[error("unknown menu section: {0}")]
    UnknownSection(String),

    /// Form has more slots for a section than the layout has rows
    #[error("section {section} has {given} slots but only {rows} rows")]
    TooManySlots {
        section: String,
        given: usize,
        rows: usize,
    },

    /// Save or export requested before anything was rendered
    #[error("no menu has been rendered yet")]
    NothingRendered,

    /// History file name contains path components or is not a JPEG
    #[error("invalid history file name: {0}")]
    InvalidHistoryName(String),

    /// History file does not exist
    #[error("history file not found: {0}")]
    HistoryNotFound(String),

    /// Image encoding failed
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// Filesystem error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
