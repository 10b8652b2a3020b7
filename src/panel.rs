//! Diagnostic panel generation — the inline HTML that replaces a mount
//! point's content when a widget cannot be brought up. Two shapes: one for a
//! document-wide dependency failure, one for a per-widget instantiation
//! failure (which also carries the widget's source inside a collapsed
//! disclosure for debugging).

/// Class marker carried by every diagnostic panel.
pub const PANEL_CLASS: &str = "molviewspec-error";

const PANEL_STYLE: &str =
    "padding: 20px; background: #fff3cd; border: 1px solid #ffc107; border-radius: 4px;";
const MESSAGE_STYLE: &str = "margin: 0; white-space: pre-wrap; word-wrap: break-word;";

/// Panel shown in every mount point when the rendering library or the
/// component factory failed to resolve.
pub fn dependency_failure(message: &str) -> String {
    format!(
        r#"<div class="{PANEL_CLASS}" style="{PANEL_STYLE}">
  <p style="margin: 0 0 10px 0;"><strong>Error loading dependencies:</strong></p>
  <pre style="{MESSAGE_STYLE}">{msg}</pre>
  <p style="margin-top: 10px;">Failed to load molstar-components. Check the console for details.</p>
</div>"#,
        msg = escape(message),
    )
}

/// Panel shown in one mount point when its component instantiation failed.
/// The story and scene source go inside a collapsed disclosure.
pub fn instantiation_failure(message: &str, story: &str, scene: &str) -> String {
    format!(
        r#"<div class="{PANEL_CLASS}" style="{PANEL_STYLE}">
  <p style="margin: 0 0 10px 0;"><strong>Error initializing viewer:</strong></p>
  <pre style="{MESSAGE_STYLE}">{msg}</pre>
  <details style="margin-top: 10px;">
    <summary style="cursor: pointer;">Code</summary>
    <pre style="margin-top: 10px; background: white; padding: 10px; border-radius: 4px; overflow-x: auto; font-family: monospace;">Story: {story}
---
{scene}</pre>
  </details>
</div>"#,
        msg = escape(message),
        story = escape(story),
        scene = escape(scene),
    )
}

/// Minimal HTML escaping for text interpolated into panel markup. Error
/// messages and widget source are author-controlled but must never be
/// interpreted as markup.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
