//! Widget discovery and initialization.
//!
//! Runs once per document load, after the document's structural content is
//! parsed. Each mount point moves through a small state machine:
//!
//! `Discovered → { Skipped (no scene) | Failed (diagnostic panel) | Instantiated }`
//!
//! Terminal states only; there is no retry. Failures are isolated per widget,
//! except a dependency-load failure, which is a document-wide precondition and
//! fails every mount point with a shared diagnostic panel.
//!
//! There is no teardown path: rewriting a mount point's contents abandons the
//! previous instance. Whether the embedded component leaks background
//! rendering contexts on such a rewrite is an open question of the component,
//! not handled here.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{self, ViewerConfig};
use crate::dom::{self, DocumentView, MountNode};
use crate::error::Result;
use crate::panel;

/// The payload handed to the component factory for one widget: the visible
/// scene code, the hidden story code, and the effective configuration
/// flattened alongside them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceProps {
    pub initial_code: String,
    pub hidden_code: String,
    #[serde(flatten)]
    pub config: ViewerConfig,
}

/// The embedded editor+viewer component, seen at its interface boundary.
/// Mounting may hand off rendering asynchronously; this system treats the
/// hand-off as fire-and-forget and only observes synchronous failures.
pub trait ComponentFactory<N: MountNode> {
    /// Mount a widget instance into the (already cleared) node.
    fn mount(&self, node: &N, props: &InstanceProps) -> Result<()>;
}

/// Terminal state of one mount point after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    /// Widget instantiated (its internal render may still be in flight).
    Instantiated,
    /// No scene fragment; mount point left untouched.
    Skipped,
    /// Diagnostic panel rendered into the mount point.
    Failed,
}

/// Per-mount outcomes of one initialization pass, in document order.
#[derive(Debug, Default)]
pub struct InitReport {
    pub outcomes: Vec<(String, MountOutcome)>,
}

impl InitReport {
    pub fn instantiated(&self) -> usize {
        self.count(MountOutcome::Instantiated)
    }

    pub fn failed(&self) -> usize {
        self.count(MountOutcome::Failed)
    }

    fn count(&self, outcome: MountOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }
}

/// Initialize every widget mount point in the document.
///
/// The provider is only invoked when at least one mount point exists, so
/// documents without widgets pay nothing. If the provider fails, every mount
/// point receives the shared dependency-failure panel; otherwise each mount
/// point is processed independently.
pub fn initialize<D, F, P>(doc: &D, provider: P) -> InitReport
where
    D: DocumentView,
    F: ComponentFactory<D::Node>,
    P: FnOnce() -> Result<F>,
{
    let mounts = doc.mount_points();
    if mounts.is_empty() {
        return InitReport::default();
    }

    let factory = match provider() {
        Ok(factory) => factory,
        Err(e) => {
            error!("failed to load dependencies: {e}");
            let html = panel::dependency_failure(e.panel_message());
            let mut report = InitReport::default();
            for mount in &mounts {
                mount.replace_html(&html);
                report.outcomes.push((mount.id(), MountOutcome::Failed));
            }
            return report;
        }
    };

    let mut report = InitReport::default();
    for mount in &mounts {
        let outcome = initialize_mount(doc, mount, &factory);
        report.outcomes.push((mount.id(), outcome));
    }
    info!(
        instantiated = report.instantiated(),
        failed = report.failed(),
        total = report.outcomes.len(),
        "viewer initialization finished"
    );
    report
}

fn initialize_mount<D, F>(doc: &D, mount: &D::Node, factory: &F) -> MountOutcome
where
    D: DocumentView,
    F: ComponentFactory<D::Node>,
{
    let mount_id = mount.id();
    let base = dom::base_id(&mount_id);

    let Some(scene) = doc.fragment_text(&dom::scene_id(base)) else {
        warn!(viewer = %mount_id, "no scene code found for viewer, skipping");
        return MountOutcome::Skipped;
    };
    let story = doc.fragment_text(&dom::story_id(base)).unwrap_or_default();
    let props_text = doc.fragment_text(&dom::props_id(base));

    let props = InstanceProps {
        initial_code: scene,
        hidden_code: story,
        config: config::effective_config(props_text.as_deref()),
    };

    mount.clear();
    match factory.mount(mount, &props) {
        Ok(()) => MountOutcome::Instantiated,
        Err(e) => {
            error!(viewer = %mount_id, "error initializing viewer: {e}");
            mount.replace_html(&panel::instantiation_failure(
                e.panel_message(),
                &props.hidden_code,
                &props.initial_code,
            ));
            MountOutcome::Failed
        }
    }
}
