//! Helpers for running the harness against `tests/fixtures/fake-terraform.sh`.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// A private executable copy of the fake terraform script.
pub struct FakeTerraform {
    _dir: tempfile::TempDir,
    pub bin: PathBuf,
    pub log: PathBuf,
}

impl FakeTerraform {
    pub fn install() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("fake-terraform.sh");
        let bin = dir.path().join("terraform");
        std::fs::copy(&source, &bin).unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        let log = dir.path().join("calls.log");
        Self {
            _dir: dir,
            bin,
            log,
        }
    }

    /// Subcommands in call order.
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}

/// A configuration directory holding a single `main.tf`.
pub fn config_dir(parent: &Path, name: &str) -> PathBuf {
    let dir = parent.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("main.tf"), "# provisioned by the fake\n").unwrap();
    dir
}
