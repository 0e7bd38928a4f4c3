// The environment-settings record.
//
// The shell-script ancestor of this tool appended `export` lines to the
// invoking user's shell start-up file on every run, leaving a growing trail
// of ambient state. Here the same information lives in one explicit record:
// `environment.json` under the application directory, plus a rendered
// `env.sh` the user sources once from their rc file. Both files are written
// whole on every save, so repeated runs converge instead of accumulating.

use crate::schema::EnvironmentSettings;
use crate::{log_debug, log_info, log_warn};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Location of the JSON record inside the application directory.
pub fn record_path(app_dir: &Path) -> PathBuf {
    app_dir.join("environment.json")
}

/// Location of the rendered, sourceable snippet.
pub fn snippet_path(app_dir: &Path) -> PathBuf {
    app_dir.join("env.sh")
}

/// Loads the environment record, or an empty one when none exists yet.
///
/// A malformed record is reported and replaced with an empty one rather
/// than failing the run: losing a PATH entry is recoverable by re-running,
/// unlike losing track of installed packages.
pub fn load_or_default(app_dir: &Path) -> EnvironmentSettings {
    let path = record_path(app_dir);
    if !path.exists() {
        log_debug!("[Environment] No environment record at {}.", path.display());
        return EnvironmentSettings::default();
    }
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                log_warn!(
                    "[Environment] Malformed environment record at {}: {}. Starting from an empty record.",
                    path.display().to_string().yellow(),
                    e
                );
                EnvironmentSettings::default()
            }
        },
        Err(e) => {
            log_warn!(
                "[Environment] Could not read {}: {}. Starting from an empty record.",
                path.display().to_string().yellow(),
                e
            );
            EnvironmentSettings::default()
        }
    }
}

/// Persists the record and re-renders the shell snippet.
pub fn save(settings: &EnvironmentSettings, app_dir: &Path) -> Result<()> {
    fs::create_dir_all(app_dir)
        .with_context(|| format!("failed to create {}", app_dir.display()))?;

    let json_path = record_path(app_dir);
    let serialized = serde_json::to_string_pretty(settings)
        .context("failed to serialize environment settings")?;
    fs::write(&json_path, serialized)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let sh_path = snippet_path(app_dir);
    fs::write(&sh_path, render_snippet(settings))
        .with_context(|| format!("failed to write {}", sh_path.display()))?;

    log_info!(
        "[Environment] Environment recorded in {} (source {} from your shell rc).",
        json_path.display().to_string().cyan(),
        sh_path.display().to_string().cyan()
    );
    Ok(())
}

/// Renders the record as a POSIX-sh snippet.
///
/// Exports come out in key order (the record uses a BTreeMap) and PATH
/// entries in insertion order, so the rendered file is stable across runs
/// with the same record.
pub fn render_snippet(settings: &EnvironmentSettings) -> String {
    let mut out = String::from(
        "# Generated by osintbox. Do not edit: this file is rewritten on every run.\n",
    );
    for (key, value) in &settings.exports {
        out.push_str(&format!("export {key}=\"{value}\"\n"));
    }
    for dir in &settings.path_entries {
        out.push_str(&format!("export PATH=\"{dir}:$PATH\"\n"));
    }
    out
}
