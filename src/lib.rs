//! Embeds interactive MolViewSpec editor+viewer widgets into static documents
//! produced by a publishing pipeline, and assembles the deployable bundle
//! that carries them.
//!
//! Two halves, built and run at different times:
//!
//! - The **initializer** ([`init`], browser bindings in [`wasm`] behind the
//!   `wasm` feature) runs at document-load time: it discovers widget mount
//!   points, pairs each with its scene/story/props fragments, layers
//!   configuration over the built-in defaults, instantiates the embedded
//!   editor+viewer component, and renders a diagnostic panel on failure.
//! - The **bundle assembler** ([`assemble`], driven by the
//!   `molviewspec-build` binary) runs at publish time: it produces the main
//!   bundle plus the auxiliary worker bundles in a deterministic layout, with
//!   asset naming and a public path that keep everything relocatable to an
//!   arbitrary base URL. Worker URLs are recovered at runtime through
//!   [`workers`].

pub mod assemble;
pub mod config;
pub mod dom;
pub mod error;
pub mod esbuild;
pub mod init;
pub mod panel;
pub mod workers;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::ViewerConfig;
pub use error::{EmbedError, Result};
pub use init::{initialize, ComponentFactory, InitReport, InstanceProps, MountOutcome};

use std::path::PathBuf;

/// Run a full build with the esbuild-backed bundler, honoring the plan's
/// loader configuration.
pub fn build_bundles(
    plan: &assemble::BuildPlan,
    esbuild_command: impl Into<PathBuf>,
) -> std::result::Result<assemble::BuildReport, assemble::BuildError> {
    let command = esbuild_command.into();
    let mut bundler = match &plan.config_path {
        Some(path) => esbuild::EsbuildCli::with_config(command, path)?,
        None => esbuild::EsbuildCli::new(command),
    };
    assemble::assemble(plan, &mut bundler)
}
