// Path resolution for everything `osintbox` reads and writes: the catalog
// files, the state file, the environment record, and the directory the
// git-cloned tools land in.

use crate::utils::expand_tilde;
use crate::{log_debug, log_error, log_info};
use colored::Colorize;
use std::path::PathBuf;

/// Default location of the master catalog written by `osintbox generate`.
pub const DEFAULT_CONFIG: &str = "~/.osintbox/configs/config.yaml";
/// Default location of the state file (`osintbox`'s memory between runs).
pub const DEFAULT_STATE: &str = "~/.osintbox/state.json";
/// The programs directory: every repository from the catalog is cloned
/// directly under it.
pub const DEFAULT_PROGRAMS_DIR: &str = "~/tools";

/// Determines and resolves the absolute paths for the master catalog file
/// and the application state file.
///
/// # Arguments
/// * `config_path`: An `Option<String>` allowing the user to specify a custom config path.
/// * `state_path`: An `Option<String>` allowing the user to specify a custom state file path.
///
/// # Returns
/// A tuple of `(config_path_resolved, config_filename, state_path_resolved)`,
/// or `None` if essential paths cannot be resolved.
pub fn resolve_paths(
    config_path: Option<String>,
    state_path: Option<String>,
) -> Option<(PathBuf, String, PathBuf)> {
    log_debug!("Initial config_path parameter: {:?}", config_path);
    log_debug!("Initial state_path parameter: {:?}", state_path);

    let config_path_resolved: PathBuf =
        expand_tilde(config_path.as_deref().unwrap_or(DEFAULT_CONFIG));
    // The filename decides whether we load the master index or a single
    // catalog file directly (e.g. `repos.yaml`).
    let config_filename = config_path_resolved
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();
    let state_path_resolved: PathBuf = expand_tilde(state_path.as_deref().unwrap_or(DEFAULT_STATE));

    log_info!(
        "Using catalog file: {}",
        config_path_resolved.display().to_string().cyan()
    );
    log_debug!(
        "Managing application state in: {}",
        state_path_resolved.display().to_string().yellow()
    );

    if config_path_resolved.as_os_str().is_empty() || state_path_resolved.as_os_str().is_empty() {
        log_error!("Resolved config or state path is empty. This is an internal error.");
        return None;
    }

    Some((config_path_resolved, config_filename, state_path_resolved))
}

/// The application directory holding the environment record (and, by
/// default, the catalogs and state file).
pub fn app_dir() -> PathBuf {
    expand_tilde("~/.osintbox")
}

/// The directory repositories are cloned into.
pub fn programs_dir() -> PathBuf {
    expand_tilde(DEFAULT_PROGRAMS_DIR)
}
