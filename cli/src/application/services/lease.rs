//! Scoped ownership of applied resources.
//!
//! A successful (or interrupted) apply hands back an [`AppliedLease`]. The
//! only way to get rid of a lease without a warning is [`AppliedLease::release`],
//! which runs the provisioning tool's destroy exactly once.

use std::path::{Path, PathBuf};

use provcheck_common::InstanceVariables;

use crate::application::ports::Provisioner;
use crate::domain::{ApplyResult, DestroyOutcome, HarnessError};

/// Result of trying to apply a configuration.
pub enum Acquired<'p, P: Provisioner> {
    /// Apply converged and outputs were read.
    Applied {
        lease: AppliedLease<'p, P>,
        outputs: ApplyResult,
    },
    /// The tool rejected the configuration; nothing was created.
    Rejected(HarnessError),
    /// Apply did not finish (timeout, lost outputs). Resources may exist.
    Interrupted {
        lease: AppliedLease<'p, P>,
        error: HarnessError,
    },
}

/// Resources created by one apply, owed exactly one destroy.
#[must_use = "applied resources are only torn down by `release()`"]
pub struct AppliedLease<'p, P: Provisioner> {
    provisioner: &'p P,
    dir: PathBuf,
    vars: InstanceVariables,
    released: bool,
}

impl<'p, P: Provisioner> AppliedLease<'p, P> {
    /// Apply `vars` in `dir`. Only an `Apply` error means nothing exists;
    /// every other failure still yields a lease to release.
    pub async fn acquire(provisioner: &'p P, dir: &Path, vars: &InstanceVariables) -> Acquired<'p, P> {
        let result = provisioner.apply_all(dir, vars).await;
        let lease = || Self {
            provisioner,
            dir: dir.to_path_buf(),
            vars: vars.clone(),
            released: false,
        };
        match result {
            Ok(outputs) => Acquired::Applied {
                lease: lease(),
                outputs,
            },
            Err(err @ HarnessError::Apply { .. }) => Acquired::Rejected(err),
            Err(error) => Acquired::Interrupted {
                lease: lease(),
                error,
            },
        }
    }

    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.vars.instance_name
    }

    /// Tear the resources down.
    ///
    /// # Errors
    ///
    /// Returns `Teardown` (or `Timeout`) when destroy fails after the
    /// provisioner's own retries.
    pub async fn release(mut self) -> Result<DestroyOutcome, HarnessError> {
        self.released = true;
        self.provisioner.destroy(&self.dir, &self.vars).await
    }
}

impl<P: Provisioner> Drop for AppliedLease<'_, P> {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(
                instance = %self.vars.instance_name,
                dir = %self.dir.display(),
                "applied resources dropped without teardown; they may have leaked"
            );
        }
    }
}
