//! Error type shared by every stage of the report pipeline.

use thiserror::Error;

#[cfg(feature = "bookmarks")]
use crate::bookmarks::BookmarkError;

/// Errors that abort a report run.
///
/// Field-level defects in the payload never show up here: they are absorbed
/// by the lenient deserializers in [`crate::payload`].
#[derive(Debug, Error)]
pub enum ReportError {
    /// The payload could not be read from its source.
    #[error("failed to read payload: {0}")]
    Input(#[source] std::io::Error),

    /// The payload is not valid JSON or has a structurally invalid section.
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The payload parsed but its top level is not a JSON object.
    #[error("invalid payload: expected a JSON object at the top level, found {found}")]
    PayloadShape {
        /// Kind of JSON value that was found instead.
        found: &'static str,
    },

    /// No usable font family could be loaded.
    #[error("failed to load fonts: {0}")]
    FontLoad(#[source] genpdf::error::Error),

    /// The layout engine failed while rendering the document.
    #[error("failed to render report: {0}")]
    Render(#[source] genpdf::error::Error),

    /// The output file could not be written.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// The finished temporary file could not be moved into place.
    #[error("failed to persist report to its output path: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// Section bookmarks could not be embedded into the rendered bytes.
    #[cfg(feature = "bookmarks")]
    #[error("failed to add section bookmarks: {0}")]
    Bookmarks(#[from] BookmarkError),
}
