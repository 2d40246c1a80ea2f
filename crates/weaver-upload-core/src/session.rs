//! Per-editor upload session state.
//!
//! One [`UploadSession`] lives as long as its editor. It records whether an
//! upload is in flight, the selection saved before the upload started, and
//! the progress indicator state.
//!
//! Each call into the pipeline opens an [`Attempt`]. Locking the attempt
//! makes the root read-only and marks the session busy; dropping it undoes
//! both, hides progress and clears the file input. Because the cleanup is in
//! `Drop`, it runs exactly once whichever way the attempt ends.

use std::cell::{Cell, RefCell};

use crate::error::UploadError;
use crate::platform::EditorPlatform;

/// Mutable upload state for one editor instance.
#[derive(Debug)]
pub struct UploadSession<R> {
    uploading: Cell<bool>,
    range: RefCell<Option<R>>,
    progress: Cell<Option<f64>>,
}

impl<R> Default for UploadSession<R> {
    fn default() -> Self {
        Self {
            uploading: Cell::new(false),
            range: RefCell::new(None),
            progress: Cell::new(None),
        }
    }
}

impl<R: Clone> UploadSession<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// True between transport dispatch and settle.
    pub fn is_uploading(&self) -> bool {
        self.uploading.get()
    }

    /// Selection captured before the current (or last) upload.
    pub fn saved_range(&self) -> Option<R> {
        self.range.borrow().clone()
    }

    pub fn save_range(&self, range: Option<R>) {
        *self.range.borrow_mut() = range;
    }

    /// Last reported fraction while the indicator is visible.
    pub fn progress(&self) -> Option<f64> {
        self.progress.get()
    }

    pub fn is_progress_visible(&self) -> bool {
        self.progress.get().is_some()
    }

    /// Record a progress tick and forward it to the indicator.
    pub fn report_progress<P>(&self, platform: &P, fraction: f64)
    where
        P: EditorPlatform<Range = R>,
    {
        let fraction = fraction.clamp(0.0, 1.0);
        self.progress.set(Some(fraction));
        platform.show_progress(fraction);
    }

    /// Start an attempt. Nothing is locked until [`Attempt::lock`].
    pub fn attempt<'a, P>(&'a self, platform: &'a P, from_file_input: bool) -> Attempt<'a, P>
    where
        P: EditorPlatform<Range = R>,
    {
        Attempt {
            session: self,
            platform,
            from_file_input,
            locked: false,
        }
    }
}

/// Guard for one pass through the pipeline.
#[must_use = "dropping an attempt immediately runs its cleanup"]
pub struct Attempt<'a, P: EditorPlatform> {
    session: &'a UploadSession<P::Range>,
    platform: &'a P,
    from_file_input: bool,
    locked: bool,
}

impl<'a, P: EditorPlatform> Attempt<'a, P> {
    /// Claim the session for a transport call.
    ///
    /// Saves `range`, makes the root read-only and sets the in-flight flag.
    /// Fails without side effects if another attempt holds the session.
    pub fn lock(&mut self, range: Option<P::Range>) -> Result<(), UploadError> {
        if self.locked {
            return Ok(());
        }
        if self.session.uploading.get() {
            return Err(UploadError::AlreadyUploading);
        }
        self.session.save_range(range);
        self.platform.set_editable(false);
        self.session.uploading.set(true);
        self.locked = true;
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// End the attempt now. Same as dropping it, but reads better at call sites.
    pub fn settle(self) {}
}

impl<P: EditorPlatform> Drop for Attempt<'_, P> {
    fn drop(&mut self) {
        if self.locked {
            self.platform.set_editable(true);
            self.session.uploading.set(false);
            self.session.progress.set(None);
            self.platform.hide_progress();
        }
        if self.from_file_input {
            self.platform.reset_file_input();
        }
    }
}
