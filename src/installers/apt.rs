// The apt backend: the system bootstrap step and the declarative batch
// install of the catalog's package list. Both run through `sudo` because
// the provisioner targets a freshly created analyst VM where the invoking
// user holds passwordless sudo; running the whole binary as root is not
// required for the other steps and would put every clone in root's home.

use crate::schema::ProvisionState;
use crate::utils::{current_timestamp, run_command, warn_on_duplicates};
use crate::{libs::steps::StepOutcome, log_debug, log_info};
use anyhow::{Context, Result};
use colored::Colorize;

const TAG: &str = "[Apt]";

/// The base compiler/VCS toolset installed before anything else. Everything
/// later in the run assumes these exist: git for the clones, curl/gnupg for
/// the MongoDB key, build-essential for gems and pip packages with native
/// extensions.
pub const BASE_TOOLSET: &[&str] = &[
    "build-essential",
    "ca-certificates",
    "curl",
    "git",
    "gnupg",
    "wget",
];

/// Refreshes the package index and installs the base toolset.
///
/// This step runs on every invocation, index refresh included, so the rest
/// of the run installs against current package metadata. Any failure here is
/// fatal: nothing else can proceed without the base tools.
pub fn bootstrap() -> Result<StepOutcome> {
    log_debug!("{TAG} Refreshing package index.");
    run_command(TAG, "sudo", &["apt-get", "update"], None)
        .context("package index refresh failed")?;

    let mut args = vec!["apt-get", "install", "-y"];
    args.extend_from_slice(BASE_TOOLSET);
    run_command(TAG, "sudo", &args, None).context("base toolset install failed")?;

    Ok(StepOutcome::Changed)
}

/// Installs the catalog's apt package list in a single batch call.
///
/// Packages already recorded in the state file are filtered out first, so a
/// re-run with an unchanged catalog does no apt work at all. Order is
/// irrelevant and duplicates are tolerated (with a warning), matching how
/// `apt-get install` itself treats its arguments.
pub fn install_packages(packages: &[String], state: &mut ProvisionState) -> Result<StepOutcome> {
    if packages.is_empty() {
        return Ok(StepOutcome::Unchanged);
    }
    warn_on_duplicates(TAG, packages);

    let pending: Vec<&String> = packages
        .iter()
        .filter(|name| !state.package_recorded("apt", name))
        .collect();

    if pending.is_empty() {
        log_debug!("{TAG} All {} catalog packages already recorded.", packages.len());
        return Ok(StepOutcome::Unchanged);
    }

    log_info!(
        "{TAG} Installing {} package(s): {}",
        pending.len(),
        pending
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .bold()
    );

    let mut args = vec!["apt-get", "install", "-y"];
    args.extend(pending.iter().map(|s| s.as_str()));
    run_command(TAG, "sudo", &args, None).context("apt batch install failed")?;

    // Record each installed package; the batch either fully succeeded or we
    // returned above, so there is no partial bookkeeping to do.
    let now = current_timestamp();
    for name in pending {
        state.record_package("apt", name, &now);
    }

    Ok(StepOutcome::Changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_packages_are_not_reinstalled() {
        let mut state = ProvisionState::default();
        state.record_package("apt", "git", &current_timestamp());

        // Every catalog entry is already recorded, so no command runs and
        // the outcome reports the state as already satisfied.
        let outcome = install_packages(&["git".to_string()], &mut state).unwrap();
        assert_eq!(outcome, StepOutcome::Unchanged);
    }

    #[test]
    fn a_gem_record_does_not_satisfy_the_apt_filter() {
        // Same name, different manager: with an empty pending set the call
        // returns Unchanged, but a record held by another manager must not
        // count towards that.
        let mut state = ProvisionState::default();
        state.record_package("gem", "jekyll", &current_timestamp());
        state.record_package("apt", "jekyll", &current_timestamp());

        let outcome = install_packages(&["jekyll".to_string()], &mut state).unwrap();
        assert_eq!(outcome, StepOutcome::Unchanged);
        assert!(state.package_recorded("gem", "jekyll"));
        assert!(state.package_recorded("apt", "jekyll"));
    }

    #[test]
    fn empty_catalog_is_unchanged() {
        let mut state = ProvisionState::default();
        assert_eq!(
            install_packages(&[], &mut state).unwrap(),
            StepOutcome::Unchanged
        );
    }
}
