//! Selection capture and restore for the insertion point.
//!
//! Uses the DOM Selection API. Captured ranges are clones, so later
//! selection changes do not move them, but DOM mutations still adjust
//! their boundaries the way live ranges do.

use web_sys::{Node, Range};
use weaver_upload_core::PlatformError;

/// Clone the first selection range if it lies inside `root`.
pub fn capture_range(root: &Node) -> Option<Range> {
    let selection = web_sys::window()?.get_selection().ok()??;
    if selection.range_count() == 0 {
        return None;
    }
    let range = selection.get_range_at(0).ok()?;
    let container = range.common_ancestor_container().ok()?;
    if !root.contains(Some(&container)) {
        tracing::trace!(target: "weaver::upload", "selection outside editor root");
        return None;
    }
    Some(range.clone_range())
}

/// Replace the document selection with `range`.
pub fn restore_range(range: &Range) -> Result<(), PlatformError> {
    let window = web_sys::window().ok_or("no window")?;
    let selection = window
        .get_selection()
        .map_err(|e| format!("getSelection failed: {e:?}"))?
        .ok_or("no selection")?;

    selection
        .remove_all_ranges()
        .map_err(|e| format!("removeAllRanges failed: {e:?}"))?;
    selection
        .add_range(range)
        .map_err(|e| format!("addRange failed: {e:?}"))?;
    Ok(())
}

/// Collapsed range at the end of `root`'s content.
pub fn range_at_end(root: &Node) -> Option<Range> {
    let document = root.owner_document()?;
    let range = document.create_range().ok()?;
    range.select_node_contents(root).ok()?;
    range.collapse_with_to_start(false);
    Some(range)
}
