//! Markup for uploaded files.
//!
//! What gets inserted depends on two things: what kind of file it is
//! ([`ContentCategory`], by extension) and which view the editor is in
//! ([`EditorMode`]). Each pair has one render function in [`RENDERERS`];
//! adding a mode or category means adding a row or column there.

use serde::{Deserialize, Serialize};

use crate::config::{FilenameRewrite, UploadMessages};
use crate::error::UploadError;
use crate::escape_html;
use crate::file::split_extension;
use crate::platform::EditorPlatform;
use crate::response::UploadResponse;
use crate::session::UploadSession;

/// Editing view of the editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorMode {
    /// Plain markdown source.
    #[default]
    Source,
    /// Rich view where the document is HTML.
    Wysiwyg,
    /// Markdown with inline-rendered previews.
    InstantRender,
}

impl EditorMode {
    /// Accepts the long names and the short `sv` / `ir` aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "source" | "sv" => Some(Self::Source),
            "wysiwyg" => Some(Self::Wysiwyg),
            "instant-render" | "ir" => Some(Self::InstantRender),
            _ => None,
        }
    }
}

/// How an uploaded file is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    Audio,
    Image,
    File,
}

const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg"];

const IMAGE_EXTENSIONS: &[&str] = &[
    "apng", "bmp", "gif", "ico", "cur", "jpg", "jpeg", "jfif", "pjp", "pjpeg", "png", "svg",
    "webp",
];

impl ContentCategory {
    /// Classify by extension (with or without the leading dot).
    pub fn classify(extension: &str) -> Self {
        let ext = extension.strip_prefix('.').unwrap_or(extension);
        let matches = |list: &[&str]| list.iter().any(|e| e.eq_ignore_ascii_case(ext));
        if matches(AUDIO_EXTENSIONS) {
            Self::Audio
        } else if matches(IMAGE_EXTENSIONS) {
            Self::Image
        } else {
            Self::File
        }
    }
}

/// Wrapper class the rich view uses for raw HTML blocks.
pub const HTML_BLOCK_CLASS: &str = "weaver-wysiwyg__block";
/// Class of the rendered preview inside an HTML block.
pub const HTML_PREVIEW_CLASS: &str = "weaver-wysiwyg__preview";

type RenderFn = fn(name: &str, path: &str) -> String;

/// Indexed by `[category][mode]`, modes in `Source, Wysiwyg, InstantRender` order.
const RENDERERS: [[RenderFn; 3]; 3] = [
    [markdown_link, audio_block, audio_element],
    [markdown_image, img_tag, markdown_image],
    [markdown_link, anchor_tag, markdown_link],
];

/// Markup for one uploaded file. `name` and `path` are raw; escaping happens here.
pub fn render_item(category: ContentCategory, mode: EditorMode, name: &str, path: &str) -> String {
    let row = match category {
        ContentCategory::Audio => 0,
        ContentCategory::Image => 1,
        ContentCategory::File => 2,
    };
    let col = match mode {
        EditorMode::Source => 0,
        EditorMode::Wysiwyg => 1,
        EditorMode::InstantRender => 2,
    };
    RENDERERS[row][col](&escape_html(name), &escape_html(path))
}

fn markdown_link(name: &str, path: &str) -> String {
    format!("[{name}]({path})\n")
}

fn markdown_image(name: &str, path: &str) -> String {
    format!("![{name}]({path})\n")
}

fn img_tag(name: &str, path: &str) -> String {
    format!("<img alt=\"{name}\" src=\"{path}\">\n")
}

fn anchor_tag(name: &str, path: &str) -> String {
    format!("<a href=\"{path}\">{name}</a>\n")
}

fn audio_tag(path: &str) -> String {
    format!("<audio controls=\"controls\" src=\"{path}\"></audio>")
}

fn audio_element(_name: &str, path: &str) -> String {
    format!("{}\n", audio_tag(path))
}

/// Raw-HTML block: escaped source for editing plus a live preview.
fn audio_block(_name: &str, path: &str) -> String {
    let tag = audio_tag(path);
    format!(
        "<div class=\"{HTML_BLOCK_CLASS}\" data-type=\"html-block\" data-block=\"0\">\
         <pre><code>{}</code></pre>\
         <pre class=\"{HTML_PREVIEW_CLASS}\" data-render=\"1\">{tag}</pre></div>\n",
        escape_html(&tag)
    )
}

/// Markup and diagnostics derived from a decoded response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedResult {
    /// Concatenated markup for every stored file; empty if none.
    pub markup: String,
    /// HTML for the diagnostic surface, if anything failed.
    pub diagnostics: Option<String>,
}

/// Turn a response into markup for `mode` plus any failure report.
pub fn render_response(
    response: &UploadResponse,
    mode: EditorMode,
    filename: &FilenameRewrite,
    messages: &UploadMessages,
) -> RenderedResult {
    let mut lines = Vec::new();
    if response.is_failure() && !response.msg.is_empty() {
        lines.push(escape_html(&response.msg));
    }
    for key in &response.data.err_files {
        lines.push(format!(
            "{} {}",
            escape_html(&filename.display_name(key)),
            escape_html(&messages.upload_error)
        ));
    }
    let diagnostics = (!lines.is_empty()).then(|| {
        let items: String = lines.iter().map(|l| format!("<li>{l}</li>")).collect();
        format!("<ul>{items}</ul>")
    });

    let markup = response
        .uploaded()
        .iter()
        .map(|item| {
            let (_, ext) = split_extension(&item.original_key);
            render_item(
                ContentCategory::classify(ext),
                mode,
                &filename.display_name(&item.original_key),
                &item.storage_path,
            )
        })
        .collect();

    RenderedResult {
        markup,
        diagnostics,
    }
}

/// Render `response` and insert it at the session's saved range.
///
/// Diagnostics replace the tooltip (or hide it when there are none). The
/// markup goes in as a single insertion at the range captured before the
/// upload; the selection after insertion becomes the new saved range.
pub fn insert_response<P: EditorPlatform>(
    platform: &P,
    session: &UploadSession<P::Range>,
    response: &UploadResponse,
    filename: &FilenameRewrite,
    messages: &UploadMessages,
) -> Result<(), UploadError> {
    platform.focus();

    let rendered = render_response(response, platform.mode(), filename, messages);
    match &rendered.diagnostics {
        Some(html) => platform.show_tip(html),
        None => platform.hide_tip(),
    }

    if rendered.markup.is_empty() {
        return Ok(());
    }

    if let Some(range) = session.saved_range() {
        platform.restore_range(&range)?;
    }
    platform.insert_html(&rendered.markup)?;
    session.save_range(platform.capture_range());

    tracing::debug!(
        target: "weaver::upload",
        mode = ?platform.mode(),
        bytes = rendered.markup.len(),
        "inserted upload result"
    );
    Ok(())
}
