//! Production [`Bundler`]: drives the `esbuild` binary, one child process per
//! compile step. Package-style imports shared by every step come from the
//! loader configuration file (an import map) and are translated into
//! `--alias` flags.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::assemble::{
    BuildError, BundleJob, Bundler, ES_TARGET, FONT_EXTENSIONS, JSX_IMPORT_SOURCE,
};

/// The `imports` table of the loader configuration (deno.json / import map).
#[derive(Debug, Default, Deserialize)]
struct LoaderConfig {
    #[serde(default)]
    imports: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct EsbuildCli {
    command: PathBuf,
    aliases: Vec<(String, String)>,
}

impl EsbuildCli {
    /// Bundler with no aliases; `command` is the esbuild binary to invoke.
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            aliases: Vec::new(),
        }
    }

    /// Bundler whose aliases come from the loader configuration's `imports`
    /// table. Registry-scheme specifiers (`npm:`, `jsr:`) are normalized to
    /// the bare package form esbuild resolves through `node_modules`.
    pub fn with_config(
        command: impl Into<PathBuf>,
        config_path: &Path,
    ) -> Result<Self, BuildError> {
        let text = fs::read_to_string(config_path).map_err(|source| BuildError::LoaderConfig {
            path: config_path.to_path_buf(),
            source,
        })?;
        let config: LoaderConfig =
            serde_json::from_str(&text).map_err(|source| BuildError::LoaderConfigParse {
                path: config_path.to_path_buf(),
                source,
            })?;

        let aliases = config
            .imports
            .into_iter()
            .filter_map(|(key, target)| {
                let normalized = normalize_specifier(&target);
                if normalized == key {
                    None
                } else {
                    Some((key, normalized))
                }
            })
            .collect();

        Ok(Self {
            command: command.into(),
            aliases,
        })
    }

    fn args_for(&self, job: &BundleJob) -> Vec<String> {
        let mut args = vec![
            job.entry.clone(),
            "--bundle".to_string(),
            format!("--outfile={}", job.outfile.display()),
            format!("--format={}", job.format.as_str()),
            "--platform=browser".to_string(),
            "--minify".to_string(),
            format!("--target={ES_TARGET}"),
        ];
        if job.jsx {
            args.push("--jsx=automatic".to_string());
            args.push(format!("--jsx-import-source={JSX_IMPORT_SOURCE}"));
        }
        for ext in FONT_EXTENSIONS {
            args.push(format!("--loader:{ext}=file"));
        }
        if let Some(names) = job.asset_names {
            args.push(format!("--asset-names={names}"));
        }
        if let Some(path) = job.public_path {
            args.push(format!("--public-path={path}"));
        }
        for (key, target) in &self.aliases {
            args.push(format!("--alias:{key}={target}"));
        }
        args
    }
}

impl Bundler for EsbuildCli {
    fn bundle(&mut self, job: &BundleJob) -> Result<(), BuildError> {
        let args = self.args_for(job);
        debug!(step = %job.name, command = %self.command.display(), "invoking esbuild");

        let output = Command::new(&self.command)
            .args(&args)
            .output()
            .map_err(|source| BuildError::Spawn {
                command: self.command.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(BuildError::Step {
                name: job.name.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        // One child process per step; nothing persistent to stop.
    }
}

/// Normalize a registry-scheme import target (`npm:pkg@ver/subpath`,
/// `jsr:@scope/pkg@ver`) to the bare specifier esbuild can resolve.
fn normalize_specifier(spec: &str) -> String {
    let spec = spec
        .strip_prefix("npm:")
        .or_else(|| spec.strip_prefix("jsr:"))
        .unwrap_or(spec);

    // A scoped name keeps its leading '@'; any later '@' starts a version
    // pin, which may be followed by a subpath.
    let search_from = usize::from(spec.starts_with('@'));
    match spec[search_from..].find('@').map(|i| i + search_from) {
        Some(at) => {
            let rest = &spec[at..];
            match rest.find('/') {
                Some(slash) => format!("{}{}", &spec[..at], &rest[slash..]),
                None => spec[..at].to_string(),
            }
        }
        None => spec.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::BuildPlan;

    #[test]
    fn normalizes_registry_specifiers() {
        assert_eq!(normalize_specifier("npm:preact@10.28.1"), "preact");
        assert_eq!(
            normalize_specifier("jsr:@zachcp/molstar-components@0.4.12"),
            "@zachcp/molstar-components"
        );
        assert_eq!(
            normalize_specifier("npm:monaco-editor@0.45.0/esm/vs/editor/editor.worker.js"),
            "monaco-editor/esm/vs/editor/editor.worker.js"
        );
        assert_eq!(normalize_specifier("preact"), "preact");
        assert_eq!(normalize_specifier("@zachcp/plain"), "@zachcp/plain");
    }

    #[test]
    fn main_job_args_carry_jsx_and_asset_wiring() {
        let plan = BuildPlan::new("out");
        let cli = EsbuildCli::new("esbuild");
        let args = cli.args_for(&plan.main_job());

        assert_eq!(args[0], "build/molviewspec.js");
        assert!(args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--format=esm".to_string()));
        assert!(args.contains(&"--platform=browser".to_string()));
        assert!(args.contains(&"--minify".to_string()));
        assert!(args.contains(&"--target=es2022".to_string()));
        assert!(args.contains(&"--jsx=automatic".to_string()));
        assert!(args.contains(&"--jsx-import-source=preact".to_string()));
        assert!(args.contains(&"--loader:.woff2=file".to_string()));
        assert!(args.contains(&"--asset-names=assets/[name]-[hash]".to_string()));
        assert!(args.contains(&"--public-path=./".to_string()));
        assert!(args.contains(&"--outfile=out/molviewspec.js".to_string()));
    }

    #[test]
    fn worker_job_args_are_iife_without_jsx() {
        let plan = BuildPlan::new("out");
        let cli = EsbuildCli::new("esbuild");
        let args = cli.args_for(&plan.worker_job(&plan.workers[1]));

        assert_eq!(args[0], "monaco-editor/esm/vs/language/typescript/ts.worker.js");
        assert!(args.contains(&"--format=iife".to_string()));
        assert!(args.contains(&"--outfile=out/assets/ts.worker.js".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--jsx")));
        assert!(!args.iter().any(|a| a.starts_with("--asset-names")));
    }

    #[test]
    fn aliases_come_from_import_map() {
        let dir = std::env::temp_dir().join("molviewspec-embed-loader-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("deno.json");
        std::fs::write(
            &path,
            r#"{"imports":{"preact":"npm:preact@10.28.1","@zachcp/molstar-components":"jsr:@zachcp/molstar-components@0.4.12"}}"#,
        )
        .unwrap();

        let cli = EsbuildCli::with_config("esbuild", &path).unwrap();
        let args = cli.args_for(&BuildPlan::new("out").main_job());
        // Both targets normalize to their own keys, so no aliases are needed.
        assert!(!args.iter().any(|a| a.starts_with("--alias:")));

        std::fs::write(
            &path,
            r#"{"imports":{"react":"npm:preact@10.28.1/compat"}}"#,
        )
        .unwrap();
        let cli = EsbuildCli::with_config("esbuild", &path).unwrap();
        let args = cli.args_for(&BuildPlan::new("out").main_job());
        assert!(args.contains(&"--alias:react=preact/compat".to_string()));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_config_is_an_error() {
        let err = EsbuildCli::with_config("esbuild", Path::new("no/such/deno.json")).unwrap_err();
        assert!(matches!(err, BuildError::LoaderConfig { .. }));
    }
}
