//! The document seam the initializer runs against.
//!
//! The protocol itself never touches `web_sys` directly; it sees the document
//! through these traits so it can run (and be tested) without a browser. The
//! `wasm` feature provides the real implementation over the loaded page.

/// Class marker identifying widget mount points in the document.
pub const MOUNT_CLASS: &str = "molviewspec-viewer";

/// Suffix every mount point id carries; stripping it yields the base id the
/// sibling data elements are named from.
pub const MOUNT_SUFFIX: &str = "-viewer";

/// One widget mount point. The document owns the element; the initializer
/// only rewrites its contents.
pub trait MountNode {
    fn id(&self) -> String;

    /// Destructively clear the element's contents.
    fn clear(&self);

    /// Destructively replace the element's contents with the given HTML.
    fn replace_html(&self, html: &str);
}

/// Read-only view of the loaded document.
pub trait DocumentView {
    type Node: MountNode;

    /// All mount points currently in the document, in document order.
    fn mount_points(&self) -> Vec<Self::Node>;

    /// Text content of the element with the given id, if present.
    fn fragment_text(&self, id: &str) -> Option<String>;
}

/// Strip the mount suffix from a mount point id, yielding the base id used to
/// locate the widget's data elements. Ids without the suffix are returned
/// unchanged, matching how the sibling lookup degrades for them.
pub fn base_id(mount_id: &str) -> &str {
    mount_id.strip_suffix(MOUNT_SUFFIX).unwrap_or(mount_id)
}

pub fn scene_id(base: &str) -> String {
    format!("{base}-scene")
}

pub fn story_id(base: &str) -> String {
    format!("{base}-story")
}

pub fn props_id(base: &str) -> String {
    format!("{base}-props")
}
