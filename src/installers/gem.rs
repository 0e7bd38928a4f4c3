// The Ruby gem backend, one of the two optional package managers. An
// absent `gem` binary is the designed-in skippable condition: the section
// logs a warning and the run carries on. A present `gem` that then fails
// mid-batch is fatal, like every other command failure.

use crate::schema::ProvisionState;
use crate::utils::{command_exists, current_timestamp, run_command, warn_on_duplicates};
use crate::{libs::steps::StepOutcome, log_debug, log_info};
use anyhow::{Context, Result};
use colored::Colorize;

const TAG: &str = "[Gem]";

/// Installs the catalog's Ruby gems in one `gem install` batch.
pub fn install_gems(gems: &[String], state: &mut ProvisionState) -> Result<StepOutcome> {
    if gems.is_empty() {
        return Ok(StepOutcome::Unchanged);
    }

    if !command_exists("gem") {
        return Ok(StepOutcome::Skipped(
            "'gem' not found on the PATH; install Ruby to enable this section".to_string(),
        ));
    }
    warn_on_duplicates(TAG, gems);

    let pending: Vec<&String> = gems
        .iter()
        .filter(|name| !state.package_recorded("gem", name))
        .collect();

    if pending.is_empty() {
        log_debug!("{TAG} All catalog gems already recorded.");
        return Ok(StepOutcome::Unchanged);
    }

    log_info!(
        "{TAG} Installing {} gem(s): {}",
        pending.len(),
        pending
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .bold()
    );

    // One batch call, no per-gem error isolation: a failure partway aborts
    // the run with whatever gems happened to land first left in place.
    let mut args = vec!["gem", "install"];
    args.extend(pending.iter().map(|s| s.as_str()));
    run_command(TAG, "sudo", &args, None).context("gem batch install failed")?;

    let now = current_timestamp();
    for name in pending {
        state.record_package("gem", name, &now);
    }

    Ok(StepOutcome::Changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_gem_list_is_unchanged() {
        let mut state = ProvisionState::default();
        assert_eq!(
            install_gems(&[], &mut state).unwrap(),
            StepOutcome::Unchanged
        );
    }

    #[test]
    fn recorded_gems_short_circuit_before_the_presence_probe_matters() {
        // With every gem recorded, the function must return before running
        // any command, whether or not `gem` exists on the test machine.
        let mut state = ProvisionState::default();
        state.record_package("gem", "wayback_machine_downloader", &current_timestamp());
        let outcome = install_gems(
            &["wayback_machine_downloader".to_string()],
            &mut state,
        )
        .unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Unchanged | StepOutcome::Skipped(_)
        ));
    }
}
