//! The bundle assembler — the offline pipeline producing the deployable
//! script set: the main entry-point bundle plus one self-contained bundle per
//! auxiliary worker, written into a deterministic layout under the extension
//! directory.
//!
//! Steps run sequentially against a single bundler instance and fail fast: a
//! failed step aborts the whole build. The bundler's background resources are
//! released exactly once on every path via an RAII guard.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

/// Main bundle filename inside the extension directory.
pub const MAIN_BUNDLE: &str = "molviewspec.js";

/// Stylesheet the main bundle step emits into the assets directory.
pub const CSS_BUNDLE: &str = "molstar-components.css";

/// Entry module bundled into the main bundle by default: the initializer's
/// wasm-bindgen glue entry produced by the wasm build of this crate.
pub const DEFAULT_ENTRY: &str = "build/molviewspec.js";

/// Shared compile options across every step.
pub const ES_TARGET: &str = "es2022";
pub const JSX_IMPORT_SOURCE: &str = "preact";

/// Non-script assets (fonts) referenced transitively by the main bundle are
/// emitted under this content-hashed naming scheme, resolved against a
/// relative public path so the bundle works from any base URL.
pub const ASSET_NAMES: &str = "assets/[name]-[hash]";
pub const PUBLIC_PATH: &str = "./";

/// File extensions handed to the bundler's `file` loader.
pub const FONT_EXTENSIONS: &[&str] = &[".ttf", ".woff", ".woff2", ".eot"];

/// Output module format of one bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// Importable browser module (the main bundle).
    Esm,
    /// Immediately-invoked bundle for isolated worker execution contexts,
    /// which cannot receive closures from the main bundle.
    Iife,
}

impl ModuleFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleFormat::Esm => "esm",
            ModuleFormat::Iife => "iife",
        }
    }
}

/// One compile invocation: entry module in, one bundle (plus any emitted
/// assets) out. Minification, browser platform, target, and font loaders are
/// implied for every job.
#[derive(Debug, Clone)]
pub struct BundleJob {
    /// Step name for logs and failure reports.
    pub name: String,
    /// Entry module specifier, resolved through the loader configuration.
    pub entry: String,
    pub outfile: PathBuf,
    pub format: ModuleFormat,
    /// Automatic JSX transform using the rendering library's element-creation
    /// function. Only the main bundle needs it.
    pub jsx: bool,
    pub asset_names: Option<&'static str>,
    pub public_path: Option<&'static str>,
}

/// One auxiliary worker to bundle independently.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    /// Output stem; the bundle lands at `{assetsDir}/{name}.js`.
    pub name: String,
    pub entry: String,
}

/// Everything one build run needs: where sources come from, where outputs go.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Entry module of the main bundle.
    pub entry: String,
    /// Loader configuration file (import map) shared by every step.
    pub config_path: Option<PathBuf>,
    /// Root of the output layout; the main bundle lands here.
    pub extension_dir: PathBuf,
    pub workers: Vec<WorkerSpec>,
}

impl BuildPlan {
    /// Plan with the stock entry and the two Monaco editor workers.
    pub fn new(extension_dir: impl Into<PathBuf>) -> Self {
        Self {
            entry: DEFAULT_ENTRY.to_string(),
            config_path: None,
            extension_dir: extension_dir.into(),
            workers: vec![
                WorkerSpec {
                    name: "editor.worker".to_string(),
                    entry: "monaco-editor/esm/vs/editor/editor.worker.js".to_string(),
                },
                WorkerSpec {
                    name: "ts.worker".to_string(),
                    entry: "monaco-editor/esm/vs/language/typescript/ts.worker.js".to_string(),
                },
            ],
        }
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.extension_dir.join("assets")
    }

    pub fn main_job(&self) -> BundleJob {
        BundleJob {
            name: "molviewspec".to_string(),
            entry: self.entry.clone(),
            outfile: self.extension_dir.join(MAIN_BUNDLE),
            format: ModuleFormat::Esm,
            jsx: true,
            asset_names: Some(ASSET_NAMES),
            public_path: Some(PUBLIC_PATH),
        }
    }

    pub fn worker_job(&self, worker: &WorkerSpec) -> BundleJob {
        BundleJob {
            name: worker.name.clone(),
            entry: worker.entry.clone(),
            outfile: self.assets_dir().join(format!("{}.js", worker.name)),
            format: ModuleFormat::Iife,
            jsx: false,
            asset_names: None,
            public_path: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot create output directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot move stylesheet '{}' to '{}': {source}", .from.display(), .to.display())]
    StylesheetMove {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read loader config '{}': {source}", .path.display())]
    LoaderConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid loader config '{}': {source}", .path.display())]
    LoaderConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to launch bundler '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("bundling '{name}' failed: {reason}")]
    Step { name: String, reason: String },
}

/// Paths written by a successful build, main bundle first.
#[derive(Debug)]
pub struct BuildReport {
    pub artifacts: Vec<PathBuf>,
}

/// Run the whole build: ensure the asset directory exists, bundle the main
/// entry point, then each worker, sequentially. Any failure aborts the run.
/// `bundler.shutdown()` runs exactly once whether the build succeeds or not.
pub fn assemble(plan: &BuildPlan, bundler: &mut dyn Bundler) -> Result<BuildReport, BuildError> {
    struct ServiceGuard<'a> {
        bundler: &'a mut dyn Bundler,
    }

    impl Drop for ServiceGuard<'_> {
        fn drop(&mut self) {
            self.bundler.shutdown();
        }
    }

    let mut guard = ServiceGuard { bundler };
    run_steps(plan, &mut *guard.bundler)
}

fn run_steps(plan: &BuildPlan, bundler: &mut dyn Bundler) -> Result<BuildReport, BuildError> {
    let assets_dir = plan.assets_dir();
    fs::create_dir_all(&assets_dir).map_err(|source| BuildError::CreateDir {
        path: assets_dir.clone(),
        source,
    })?;

    let main = plan.main_job();
    info!(step = %main.name, outfile = %main.outfile.display(), "bundling entry point");
    bundler.bundle(&main)?;

    let mut artifacts = vec![main.outfile.clone()];

    // The bundler names the extracted stylesheet after the outfile and writes
    // it beside it; the deployable layout wants it in the assets directory.
    let emitted_css = main.outfile.with_extension("css");
    if emitted_css.is_file() {
        let css_out = assets_dir.join(CSS_BUNDLE);
        fs::rename(&emitted_css, &css_out).map_err(|source| BuildError::StylesheetMove {
            from: emitted_css.clone(),
            to: css_out.clone(),
            source,
        })?;
        artifacts.push(css_out);
    }

    for worker in &plan.workers {
        let job = plan.worker_job(worker);
        info!(step = %job.name, outfile = %job.outfile.display(), "bundling worker");
        bundler.bundle(&job)?;
        artifacts.push(job.outfile);
    }

    Ok(BuildReport { artifacts })
}

/// A bundler capable of executing one [`BundleJob`] at a time. The production
/// implementation shells out to esbuild; tests substitute a fake.
pub trait Bundler {
    fn bundle(&mut self, job: &BundleJob) -> Result<(), BuildError>;

    /// Release background resources. The pipeline calls this exactly once per
    /// build run, success or failure.
    fn shutdown(&mut self);
}
