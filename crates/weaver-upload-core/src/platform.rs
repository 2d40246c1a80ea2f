//! Platform abstraction for the upload pipeline.
//!
//! The pipeline never touches the DOM directly. Everything it needs from the
//! editor (mode, selection, editability, insertion, tooltip and progress bar)
//! goes through [`EditorPlatform`], so the same logic runs against the
//! browser and against test doubles.

use crate::render::EditorMode;

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Editor surface operations consumed by the upload pipeline.
///
/// All methods take `&self`: the editor is single-threaded and progress
/// callbacks arrive while an upload is awaiting, so implementations use
/// interior mutability where they keep state.
pub trait EditorPlatform {
    /// Opaque saved selection (a DOM `Range` in the browser).
    type Range: Clone;

    /// Currently active editing mode.
    fn mode(&self) -> EditorMode;

    /// Snapshot the caret/selection inside the editable root.
    ///
    /// Returns `None` if there is no sensible position to capture.
    fn capture_range(&self) -> Option<Self::Range>;

    /// Make `range` the live selection again.
    fn restore_range(&self, range: &Self::Range) -> Result<(), PlatformError>;

    /// Move focus into the editable root.
    fn focus(&self);

    /// Insert markup at the live selection as one edit.
    fn insert_html(&self, html: &str) -> Result<(), PlatformError>;

    /// Toggle whether the user can edit the root.
    fn set_editable(&self, editable: bool);

    /// Show HTML on the transient diagnostic surface.
    fn show_tip(&self, html: &str);

    fn hide_tip(&self);

    /// Show the progress indicator at `fraction` (0.0..=1.0).
    fn show_progress(&self, fraction: f64);

    fn hide_progress(&self);

    /// Clear the triggering `<input type="file">` so the same file can be
    /// picked again. No-op when the upload did not come from an input.
    fn reset_file_input(&self);
}

impl<T: EditorPlatform> EditorPlatform for &T {
    type Range = T::Range;

    fn mode(&self) -> EditorMode {
        (*self).mode()
    }

    fn capture_range(&self) -> Option<Self::Range> {
        (*self).capture_range()
    }

    fn restore_range(&self, range: &Self::Range) -> Result<(), PlatformError> {
        (*self).restore_range(range)
    }

    fn focus(&self) {
        (*self).focus()
    }

    fn insert_html(&self, html: &str) -> Result<(), PlatformError> {
        (*self).insert_html(html)
    }

    fn set_editable(&self, editable: bool) {
        (*self).set_editable(editable)
    }

    fn show_tip(&self, html: &str) {
        (*self).show_tip(html)
    }

    fn hide_tip(&self) {
        (*self).hide_tip()
    }

    fn show_progress(&self, fraction: f64) {
        (*self).show_progress(fraction)
    }

    fn hide_progress(&self) {
        (*self).hide_progress()
    }

    fn reset_file_input(&self) {
        (*self).reset_file_input()
    }
}
