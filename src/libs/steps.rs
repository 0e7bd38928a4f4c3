// Step outcomes and the orchestrator's continue-or-abort decision.
//
// Every provisioning step returns `Result<StepOutcome>`. The orchestrator
// feeds each result through `handle_outcome`, which logs it and answers the
// one question that matters: does the run continue? This makes the
// fail-fast policy a visible match arm instead of an interpreter default,
// and it is the only place where a step failure stops the run.

use crate::{log_error, log_info, log_success, log_warn};
use anyhow::Result;
use colored::Colorize;

/// What a step did to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step performed work (installed, cloned, wrote files).
    Changed,
    /// The desired state was already satisfied; nothing to do.
    Unchanged,
    /// The step could not run but the run continues. The two skippable
    /// conditions are an absent optional package manager and an
    /// already-cloned repository; the reason says which.
    Skipped(String),
}

/// Logs a step's result and decides whether the run continues.
///
/// # Returns
/// * `true` to continue with the next step, `false` to abort the run.
///   Nothing after a `false` executes; the caller exits non-zero.
pub fn handle_outcome(step_name: &str, result: Result<StepOutcome>) -> bool {
    match result {
        Ok(StepOutcome::Changed) => {
            log_success!("{} completed.", step_name.bold());
            true
        }
        Ok(StepOutcome::Unchanged) => {
            log_info!("{} already satisfied; nothing to do.", step_name.bold());
            true
        }
        Ok(StepOutcome::Skipped(reason)) => {
            log_warn!("{} skipped: {}", step_name.bold(), reason);
            true
        }
        Err(err) => {
            log_error!("{} failed: {:#}", step_name.bold().red(), err);
            log_error!("Aborting the run. Completed steps are left in place; no rollback is attempted.");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn changed_and_unchanged_continue() {
        assert!(handle_outcome("Step", Ok(StepOutcome::Changed)));
        assert!(handle_outcome("Step", Ok(StepOutcome::Unchanged)));
    }

    #[test]
    fn skipped_continues() {
        assert!(handle_outcome(
            "Ruby gems",
            Ok(StepOutcome::Skipped("'gem' not found on the PATH".into()))
        ));
    }

    #[test]
    fn error_aborts() {
        assert!(!handle_outcome("Step", Err(anyhow!("boom"))));
    }
}
