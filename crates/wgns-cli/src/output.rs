//! Status lines printed for each provisioning step.
//!
//! Status goes to stderr so that stdout stays clean for `show-config`.

use std::fmt::Display;

use wgns_core::{ProvisionReport, StepOutcome};

/// Formats one status line, e.g. `  + create-link (applied)`.
#[must_use]
pub fn format_step(step: impl Display, outcome: StepOutcome) -> String {
    let marker = match outcome {
        StepOutcome::Applied => '+',
        StepOutcome::AlreadySatisfied => '=',
    };
    format!("  {marker} {step} ({outcome})")
}

/// Prints the status line of a single step.
pub fn step(step: impl Display, outcome: StepOutcome) {
    #[allow(clippy::print_stderr)]
    {
        eprintln!("{}", format_step(step, outcome));
    }
}

/// Prints every step of a report followed by a summary line.
pub fn report(report: &ProvisionReport) {
    for record in &report.steps {
        step(record.step, record.outcome);
    }
    let summary = if report.is_noop() {
        "nothing to do; already provisioned"
    } else {
        "done"
    };
    #[allow(clippy::print_stderr)]
    {
        eprintln!("{summary}");
    }
}
