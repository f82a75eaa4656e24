//! Scenario working directories, implementing `WorkdirPreparer`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use provcheck_common::InstanceVariables;
use tempfile::TempDir;

use crate::application::ports::{Workdir, WorkdirPreparer};
use crate::domain::HarnessError;

/// Entries never copied into a private workdir: provider caches and local
/// state belong to the original directory.
const SKIPPED: &[&str] = &[".terraform", "terraform.tfstate", "terraform.tfstate.backup"];

/// Terraform loads this file on its own, so a kept workdir can be destroyed
/// with a bare `terraform destroy`.
const KEPT_VARS_FILE: &str = "terraform.tfvars.json";

/// Production filesystem implementation of `WorkdirPreparer`.
pub struct LocalWorkdirs;

/// Either the configuration directory itself or a private copy of it.
#[derive(Debug)]
pub enum LocalWorkdir {
    InPlace(PathBuf),
    Private(TempDir),
}

impl Workdir for LocalWorkdir {
    fn path(&self) -> &Path {
        match self {
            Self::InPlace(path) => path,
            Self::Private(temp) => temp.path(),
        }
    }

    fn persist(self, vars: &InstanceVariables) -> PathBuf {
        match self {
            Self::InPlace(path) => path,
            Self::Private(temp) => {
                let path = temp.keep();
                let written = serde_json::to_vec_pretty(vars)
                    .context("serializing variables")
                    .and_then(|json| {
                        std::fs::write(path.join(KEPT_VARS_FILE), json)
                            .context("writing variables")
                    });
                if let Err(e) = written {
                    let error = format!("{e:#}");
                    tracing::warn!(dir = %path.display(), %error, "kept workdir has no variables file");
                }
                tracing::warn!(dir = %path.display(), "kept workdir with state of leaked resources");
                path
            }
        }
    }
}

impl WorkdirPreparer for LocalWorkdirs {
    type Dir = LocalWorkdir;

    async fn prepare(&self, config_dir: &Path, isolate: bool) -> Result<LocalWorkdir, HarnessError> {
        if !isolate {
            return Ok(LocalWorkdir::InPlace(config_dir.to_path_buf()));
        }

        let source = config_dir.to_path_buf();
        let copied = tokio::task::spawn_blocking(move || {
            let temp = tempfile::Builder::new()
                .prefix("provcheck-")
                .tempdir()
                .context("creating scenario workdir")?;
            copy_tree(&source, temp.path())?;
            Ok::<_, anyhow::Error>(temp)
        })
        .await
        .context("spawn_blocking for workdir copy")
        .and_then(|r| r)
        .map_err(|e| HarnessError::Setup(format!("{e:#}")))?;

        tracing::debug!(from = %config_dir.display(), to = %copied.path().display(), "isolated workdir");
        Ok(LocalWorkdir::Private(copied))
    }
}

/// Recursively copy `from` into the existing directory `to`.
fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in std::fs::read_dir(from).with_context(|| format!("reading {}", from.display()))? {
        let entry = entry.with_context(|| format!("reading {}", from.display()))?;
        let name = entry.file_name();
        if SKIPPED.iter().any(|s| name == *s) {
            continue;
        }
        let src = entry.path();
        let dst = to.join(&name);
        let kind = entry
            .file_type()
            .with_context(|| format!("inspecting {}", src.display()))?;
        if kind.is_dir() {
            std::fs::create_dir(&dst).with_context(|| format!("creating {}", dst.display()))?;
            copy_tree(&src, &dst)?;
        } else {
            std::fs::copy(&src, &dst)
                .with_context(|| format!("copying {} to {}", src.display(), dst.display()))?;
        }
    }
    Ok(())
}
