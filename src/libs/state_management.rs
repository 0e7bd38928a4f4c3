// This module is responsible for managing the application's persistent
// state. It handles loading the `ProvisionState` from `state.json`,
// initializing a new state when no file exists, and saving the updated
// state back to disk. The state records which packages, toolchains, and
// repositories have already been provisioned, which is what makes re-runs
// skip-based instead of repeating every install.

use crate::schema::ProvisionState;
use crate::{log_debug, log_error, log_info, log_warn};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

/// Loads the application's state from `state.json` or initializes a new one.
///
/// A missing state file is normal (first run) and yields an empty state,
/// which is also written out immediately so the location is visible to the
/// user. An unreadable or malformed state file is an error: silently
/// starting fresh would make the provisioner re-install everything, so the
/// caller gets an `Err` and decides to abort.
pub fn load_or_initialize_state(state_path: &Path) -> Result<ProvisionState> {
    if state_path.exists() {
        log_debug!(
            "State file found at {}. Attempting to load...",
            state_path.display()
        );
        let contents = fs::read_to_string(state_path).with_context(|| {
            format!(
                "failed to read state file {}; please verify file permissions",
                state_path.display()
            )
        })?;
        let parsed: ProvisionState = serde_json::from_str(&contents).with_context(|| {
            format!(
                "invalid state.json format at {}; check the file's content or delete it to start fresh",
                state_path.display()
            )
        })?;
        log_info!(
            "Using state file: {}",
            state_path.display().to_string().cyan()
        );
        log_debug!(
            "Loaded state: {} packages, {} toolchains, {} repos",
            parsed.packages.len(),
            parsed.toolchains.len(),
            parsed.repos.len()
        );
        Ok(parsed)
    } else {
        log_info!(
            "State file not found at {}. Creating a brand new one.",
            state_path.display().to_string().yellow()
        );
        let initial = ProvisionState::default();

        if let Some(parent_dir) = state_path.parent() {
            fs::create_dir_all(parent_dir).with_context(|| {
                format!(
                    "failed to create directory for state file at {}",
                    parent_dir.display()
                )
            })?;
        }
        let serialized =
            serde_json::to_string_pretty(&initial).context("failed to serialize initial state")?;
        if let Err(err) = fs::write(state_path, serialized) {
            // Not fatal: the run can proceed, it just won't remember anything.
            log_warn!(
                "Failed to write initial state file to {}: {}. This might prevent future state tracking.",
                state_path.display().to_string().red(),
                err
            );
        }
        Ok(initial)
    }
}

/// Saves the current `ProvisionState` as pretty-printed JSON.
///
/// # Returns
/// * `true` if the state was serialized and written, `false` otherwise.
pub fn save_provision_state(state: &ProvisionState, state_path: &Path) -> bool {
    log_debug!(
        "[StateSave] Attempting to save state to: {}",
        state_path.display()
    );

    if let Some(parent_dir) = state_path.parent() {
        if !parent_dir.exists() {
            if let Err(e) = fs::create_dir_all(parent_dir) {
                log_error!(
                    "[StateSave] Failed to create directory for state file at {}: {}. Cannot save state.",
                    parent_dir.display().to_string().red(),
                    e
                );
                return false;
            }
        }
    }

    match serde_json::to_string_pretty(state) {
        Ok(serialized) => match fs::write(state_path, serialized) {
            Ok(_) => {
                log_debug!(
                    "[StateSave] State saved to {}",
                    state_path.display().to_string().cyan()
                );
                true
            }
            Err(err) => {
                log_error!(
                    "[StateSave] Failed to write state file to {}: {}.",
                    state_path.display().to_string().red(),
                    err
                );
                false
            }
        },
        Err(err) => {
            log_error!(
                "[StateSave] Failed to serialize state: {}. This is an internal application error.",
                err
            );
            false
        }
    }
}

/// Saves state after a section completes, warning loudly when it cannot.
pub fn save_state_to_file(state: &ProvisionState, state_path: &Path) {
    if !save_provision_state(state, state_path) {
        log_error!("[StateSave] Failed to save state; re-runs may repeat completed work.");
    }
}
