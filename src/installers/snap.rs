// The snap backend, the second optional package manager. Snaps are
// installed one `snap install` call per package rather than in a batch,
// because `--classic` confinement is a per-package flag.

use crate::schema::{ProvisionState, SnapEntry};
use crate::utils::{command_exists, current_timestamp, run_command};
use crate::{libs::steps::StepOutcome, log_debug, log_info};
use anyhow::{Context, Result};
use colored::Colorize;

const TAG: &str = "[Snap]";

/// Installs the catalog's snap packages.
///
/// Like the gem backend, an absent `snap` binary is skippable; a failing
/// install with `snap` present aborts the run, with earlier snaps of the
/// section left installed.
pub fn install_snaps(snaps: &[SnapEntry], state: &mut ProvisionState) -> Result<StepOutcome> {
    if snaps.is_empty() {
        return Ok(StepOutcome::Unchanged);
    }

    if !command_exists("snap") {
        return Ok(StepOutcome::Skipped(
            "'snap' not found on the PATH; install snapd to enable this section".to_string(),
        ));
    }

    let mut installed_any = false;
    for entry in snaps {
        if state.package_recorded("snap", &entry.name) {
            log_debug!("{TAG} Snap '{}' already recorded.", entry.name);
            continue;
        }

        log_info!("{TAG} Installing snap: {}", entry.name.bold());
        let mut args = vec!["snap", "install", entry.name.as_str()];
        if entry.classic {
            args.push("--classic");
        }
        run_command(TAG, "sudo", &args, None)
            .with_context(|| format!("snap install failed for '{}'", entry.name))?;

        state.record_package("snap", &entry.name, &current_timestamp());
        installed_any = true;
    }

    Ok(if installed_any {
        StepOutcome::Changed
    } else {
        StepOutcome::Unchanged
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snap_list_is_unchanged() {
        let mut state = ProvisionState::default();
        assert_eq!(
            install_snaps(&[], &mut state).unwrap(),
            StepOutcome::Unchanged
        );
    }

    #[test]
    fn recorded_snaps_do_no_work() {
        let mut state = ProvisionState::default();
        state.record_package("snap", "onionshare", &current_timestamp());
        let catalog = vec![SnapEntry {
            name: "onionshare".to_string(),
            classic: false,
        }];
        let outcome = install_snaps(&catalog, &mut state).unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Unchanged | StepOutcome::Skipped(_)
        ));
    }
}
