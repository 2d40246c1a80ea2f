//! DOM-backed [`EditorPlatform`].
//!
//! Wraps the editor's contenteditable root plus the two auxiliary elements
//! the upload flow drives: a tooltip for diagnostics and an optional
//! progress bar whose width tracks the upload fraction.

use std::cell::{Cell, RefCell};

use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, HtmlElement, HtmlInputElement, Range};
use weaver_upload_core::{EditorMode, EditorPlatform, PlatformError};

use crate::cursor;

/// Tooltip element used as the diagnostic surface.
#[derive(Clone, Debug)]
pub struct BrowserTip {
    element: HtmlElement,
}

impl BrowserTip {
    pub fn new(element: HtmlElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &HtmlElement {
        &self.element
    }

    pub fn show(&self, html: &str) {
        self.element.set_inner_html(html);
        set_style(&self.element, "display", "block");
    }

    pub fn hide(&self) {
        self.element.set_inner_html("");
        set_style(&self.element, "display", "none");
    }
}

/// Browser editor surface for the upload pipeline.
pub struct BrowserSurface {
    root: HtmlElement,
    tip: BrowserTip,
    progress: RefCell<Option<HtmlElement>>,
    file_input: RefCell<Option<HtmlInputElement>>,
    mode: Cell<EditorMode>,
}

impl BrowserSurface {
    pub fn new(root: HtmlElement, tip: HtmlElement) -> Self {
        Self {
            root,
            tip: BrowserTip::new(tip),
            progress: RefCell::new(None),
            file_input: RefCell::new(None),
            mode: Cell::new(EditorMode::default()),
        }
    }

    /// Look up the root and tooltip elements by id.
    pub fn from_ids(root_id: &str, tip_id: &str) -> Result<Self, PlatformError> {
        Ok(Self::new(element_by_id(root_id)?, element_by_id(tip_id)?))
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    pub fn tip(&self) -> &BrowserTip {
        &self.tip
    }

    pub fn set_mode(&self, mode: EditorMode) {
        self.mode.set(mode);
    }

    /// Element whose width shows upload progress. Hidden until an upload starts.
    pub fn set_progress_element(&self, element: Option<HtmlElement>) {
        if let Some(el) = &element {
            set_style(el, "display", "none");
        }
        *self.progress.borrow_mut() = element;
    }

    /// File input to clear when an input-triggered upload ends.
    pub fn set_file_input(&self, input: Option<HtmlInputElement>) {
        *self.file_input.borrow_mut() = input;
    }
}

impl EditorPlatform for BrowserSurface {
    type Range = Range;

    fn mode(&self) -> EditorMode {
        self.mode.get()
    }

    fn capture_range(&self) -> Option<Range> {
        cursor::capture_range(&self.root).or_else(|| cursor::range_at_end(&self.root))
    }

    fn restore_range(&self, range: &Range) -> Result<(), PlatformError> {
        cursor::restore_range(range)
    }

    fn focus(&self) {
        if let Err(e) = self.root.focus() {
            tracing::debug!(target: "weaver::upload", "focus failed: {:?}", e);
        }
    }

    fn insert_html(&self, html: &str) -> Result<(), PlatformError> {
        let document = self
            .root
            .owner_document()
            .ok_or("editor root is detached")?
            .dyn_into::<HtmlDocument>()
            .map_err(|_| "not an HTML document")?;

        let applied = document
            .exec_command_with_show_ui_and_value("insertHTML", false, html)
            .map_err(|e| format!("insertHTML failed: {e:?}"))?;
        if !applied {
            return Err("insertHTML was not applied".into());
        }
        Ok(())
    }

    fn set_editable(&self, editable: bool) {
        let value = if editable { "true" } else { "false" };
        if let Err(e) = self.root.set_attribute("contenteditable", value) {
            tracing::warn!(target: "weaver::upload", "failed to set contenteditable: {:?}", e);
        }
    }

    fn show_tip(&self, html: &str) {
        self.tip.show(html);
    }

    fn hide_tip(&self) {
        self.tip.hide();
    }

    fn show_progress(&self, fraction: f64) {
        if let Some(el) = self.progress.borrow().as_ref() {
            set_style(el, "display", "block");
            set_style(el, "width", &format!("{}%", fraction * 100.0));
        }
    }

    fn hide_progress(&self) {
        if let Some(el) = self.progress.borrow().as_ref() {
            set_style(el, "display", "none");
            set_style(el, "width", "0");
        }
    }

    fn reset_file_input(&self) {
        if let Some(input) = self.file_input.borrow().as_ref() {
            input.set_value("");
        }
    }
}

fn element_by_id(id: &str) -> Result<HtmlElement, PlatformError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("no document")?;
    document
        .get_element_by_id(id)
        .ok_or_else(|| format!("element #{id} not found"))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| format!("element #{id} is not an HtmlElement").into())
}

fn set_style(el: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = el.style().set_property(property, value) {
        tracing::trace!(target: "weaver::upload", "set {} failed: {:?}", property, e);
    }
}
