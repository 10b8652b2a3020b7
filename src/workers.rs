//! Worker URL resolution.
//!
//! The embedded editor delegates background work to auxiliary workers that are
//! bundled separately and discovered at runtime. The deployable bundle can
//! land under any base URL, so the resolution strategy is: find the script
//! tag that loaded this bundle (its src contains [`BUNDLE_MARKER`]), take the
//! directory portion of that URL as the base path, and map worker labels to
//! fixed filenames under the asset directory.
//!
//! Resolution goes through an explicitly registered process-wide hook
//! ([`register_worker_resolver`] / [`resolve_worker`]) that must be installed
//! before the embedded component initializes, since the component reads it
//! eagerly.

use std::sync::OnceLock;

/// Marker identifying this system's own bundle among the document's scripts.
pub const BUNDLE_MARKER: &str = "molviewspec";

/// Worker bundle filenames, relative to the bundle's base path.
pub const TS_WORKER: &str = "assets/ts.worker.js";
pub const EDITOR_WORKER: &str = "assets/editor.worker.js";

/// Find the bundle's base path from the srcs of all script elements in the
/// document: the directory portion (up to and including the final `/`) of the
/// first src containing [`BUNDLE_MARKER`].
pub fn base_path_from_scripts<I, S>(srcs: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for src in srcs {
        let src = src.as_ref();
        if src.is_empty() || !src.contains(BUNDLE_MARKER) {
            continue;
        }
        return Some(match src.rfind('/') {
            Some(idx) => src[..=idx].to_string(),
            None => String::new(),
        });
    }
    None
}

/// Map a worker label to its bundle URL under the given base path. The
/// TypeScript/JavaScript language worker has its own bundle; every other
/// label falls through to the base editor worker.
pub fn worker_url(base_path: &str, label: &str) -> String {
    match label {
        "typescript" | "javascript" => format!("{base_path}{TS_WORKER}"),
        _ => format!("{base_path}{EDITOR_WORKER}"),
    }
}

/// Process-wide hook mapping a worker label to a URL.
pub type WorkerResolver = Box<dyn Fn(&str) -> String + Send + Sync>;

static RESOLVER: OnceLock<WorkerResolver> = OnceLock::new();

/// Register the process-wide worker resolver. First registration wins; a
/// second registration is rejected and the offered resolver handed back, so a
/// caller can tell its hook is not the one in effect.
pub fn register_worker_resolver(
    resolver: WorkerResolver,
) -> std::result::Result<(), WorkerResolver> {
    RESOLVER.set(resolver)
}

/// Resolve a worker label through the registered hook, or `None` if no
/// resolver has been registered yet.
pub fn resolve_worker(label: &str) -> Option<String> {
    RESOLVER.get().map(|resolve| resolve(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_found_among_other_scripts() {
        let srcs = [
            "https://cdn.example/vendor/jquery.js",
            "https://cdn.example/path/molviewspec.abc.js",
            "https://cdn.example/other/late.js",
        ];
        assert_eq!(
            base_path_from_scripts(srcs),
            Some("https://cdn.example/path/".to_string())
        );
    }

    #[test]
    fn base_path_missing_when_no_marker() {
        let srcs = ["https://cdn.example/vendor/jquery.js", ""];
        assert_eq!(base_path_from_scripts(srcs), None);
    }

    #[test]
    fn language_workers_map_to_ts_worker() {
        let base = "https://cdn.example/path/";
        assert_eq!(
            worker_url(base, "typescript"),
            "https://cdn.example/path/assets/ts.worker.js"
        );
        assert_eq!(
            worker_url(base, "javascript"),
            "https://cdn.example/path/assets/ts.worker.js"
        );
    }

    #[test]
    fn other_labels_map_to_editor_worker() {
        let base = "https://cdn.example/path/";
        assert_eq!(
            worker_url(base, "css"),
            "https://cdn.example/path/assets/editor.worker.js"
        );
        assert_eq!(
            worker_url(base, ""),
            "https://cdn.example/path/assets/editor.worker.js"
        );
    }

    #[test]
    fn registration_is_first_wins() {
        // Single test for the process-wide hook: OnceLock state is shared
        // across the whole test binary.
        let first = register_worker_resolver(Box::new(|label| worker_url("/x/", label)));
        assert!(first.is_ok());
        assert_eq!(
            resolve_worker("typescript").as_deref(),
            Some("/x/assets/ts.worker.js")
        );

        let second = register_worker_resolver(Box::new(|_| "elsewhere".to_string()));
        assert!(second.is_err());
        assert_eq!(
            resolve_worker("css").as_deref(),
            Some("/x/assets/editor.worker.js")
        );
    }
}
