//! Step outcomes and the provisioning report.

use std::fmt;

use thiserror::Error;
use wgns_common::error::{ErrorKind, WgnsError};

/// Result of one idempotent step that did not fail.
///
/// A failed step is the `Err` arm of the surrounding `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The step changed kernel or filesystem state.
    Applied,
    /// The target state was already present; nothing changed.
    AlreadySatisfied,
}

impl StepOutcome {
    /// Combines the outcomes of sub-operations: any change makes the whole
    /// step [`StepOutcome::Applied`].
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::AlreadySatisfied, Self::AlreadySatisfied) => Self::AlreadySatisfied,
            _ => Self::Applied,
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::AlreadySatisfied => write!(f, "already satisfied"),
        }
    }
}

/// The steps of a provisioning run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisionStep {
    /// Create the network namespace.
    CreateNamespace,
    /// Create the tunnel link on the host.
    CreateLink,
    /// Move the link into the namespace.
    MoveLink,
    /// Push keys and peers with `wg setconf`.
    PushPeerConfig,
    /// Assign interface addresses.
    AssignAddresses,
    /// Set the MTU and bring the link up.
    SetMtuAndUp,
    /// Write the namespace resolver file.
    InstallDns,
    /// Add routes for allowed IPs.
    InstallRoutes,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateNamespace => "create-namespace",
            Self::CreateLink => "create-link",
            Self::MoveLink => "move-link",
            Self::PushPeerConfig => "push-peer-config",
            Self::AssignAddresses => "assign-addresses",
            Self::SetMtuAndUp => "set-mtu-and-up",
            Self::InstallDns => "install-dns",
            Self::InstallRoutes => "install-routes",
        };
        f.write_str(name)
    }
}

/// One executed step and how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    /// Which step ran.
    pub step: ProvisionStep,
    /// What it did.
    pub outcome: StepOutcome,
}

/// A fatal failure, tagged with the step that produced it.
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct ProvisionError {
    /// The step that failed.
    pub step: ProvisionStep,
    /// The classified failure.
    #[source]
    pub source: WgnsError,
}

impl ProvisionError {
    /// Returns the classification of the underlying failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Attaches a [`ProvisionStep`] to a failure.
pub trait InStep<T> {
    /// Tags an error with `step`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] if `self` is an error.
    fn in_step(self, step: ProvisionStep) -> Result<T, ProvisionError>;
}

impl<T> InStep<T> for Result<T, WgnsError> {
    fn in_step(self, step: ProvisionStep) -> Result<T, ProvisionError> {
        self.map_err(|source| ProvisionError { step, source })
    }
}

/// Every step a provisioning run executed, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Executed steps.
    pub steps: Vec<StepRecord>,
}

impl ProvisionReport {
    /// Records a finished step.
    pub fn record(&mut self, step: ProvisionStep, outcome: StepOutcome) {
        tracing::info!(%step, %outcome, "step finished");
        self.steps.push(StepRecord { step, outcome });
    }

    /// Returns the outcome of `step`, if it ran.
    #[must_use]
    pub fn outcome_of(&self, step: ProvisionStep) -> Option<StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| r.outcome)
    }

    /// Returns `true` if no step changed anything.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.steps
            .iter()
            .all(|r| r.outcome == StepOutcome::AlreadySatisfied)
    }
}
