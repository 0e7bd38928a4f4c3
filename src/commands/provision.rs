// This file contains the primary logic for the `osintbox provision`
// command: load the catalogs and the state file, then walk the fixed
// section order, deciding after every step whether the run continues.
//
// The order is: bootstrap first (git, curl, compilers), then system
// packages, the Go toolchain, the optional package managers (gems, snaps),
// MongoDB, and finally the git-cloned utilities, which need python3/pipenv
// from the package step. `section_plan` is the single place that order
// lives; `run` executes whatever the plan says. Failure anywhere aborts
// the run with completed steps left in place; the two skippable conditions
// (absent optional manager, already-cloned repo) come back as
// `StepOutcome::Skipped` and never abort.

use crate::installers::{apt, gem, git_repo, golang, mongodb, snap};
use crate::libs::{
    config_loading::{self, ParsedConfigs},
    environment, paths,
    state_management::{self, save_state_to_file},
    steps::{StepOutcome, handle_outcome},
};
use crate::schema::{EnvironmentSettings, ProvisionState};
use crate::utils::repo_dir_name;
use crate::{log_debug, log_error, log_success};
use anyhow::Context;
use colored::Colorize;
use std::path::Path;

/// One section of a provisioning run. Sections whose catalog is absent are
/// left out of the plan entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Bootstrap,
    AptPackages,
    Toolchains,
    EnvironmentRecord,
    RubyGems,
    SnapPackages,
    MongoDb,
    Repositories,
}

/// Builds the ordered section list for one run. Bootstrap always runs;
/// everything else depends on which catalogs were loaded, and MongoDB on
/// the catalog actually carrying an entry.
fn section_plan(parsed: &ParsedConfigs) -> Vec<Section> {
    let mut plan = vec![Section::Bootstrap];
    if parsed.packages.is_some() {
        plan.push(Section::AptPackages);
    }
    if parsed.toolchains.is_some() {
        plan.push(Section::Toolchains);
        plan.push(Section::EnvironmentRecord);
    }
    if let Some(packages) = &parsed.packages {
        plan.push(Section::RubyGems);
        plan.push(Section::SnapPackages);
        if packages.mongodb.is_some() {
            plan.push(Section::MongoDb);
        }
    }
    if parsed.repos.is_some() {
        plan.push(Section::Repositories);
    }
    plan
}

/// Entry point for the `provision` command.
///
/// # Arguments
/// * `config_path`: Optional custom path to `config.yaml` or a single catalog file.
/// * `state_path`: Optional custom path to `state.json`.
/// * `update`: Reconcile already-cloned repositories with `git pull`
///   instead of skipping them.
///
/// # Returns
/// The process exit code: 0 on full completion, 1 on the first failing step.
pub fn run(config_path: Option<String>, state_path: Option<String>, update: bool) -> i32 {
    // Resolve catalog and state file paths.
    let Some((config_resolved, config_filename, state_resolved)) =
        paths::resolve_paths(config_path, state_path)
    else {
        return 1;
    };

    // Load existing state or initialize a new one. A corrupt state file is
    // fatal: proceeding would re-run every install.
    let mut state = match state_management::load_or_initialize_state(&state_resolved) {
        Ok(state) => state,
        Err(e) => {
            log_error!("Failed to load state: {:#}", e);
            return 1;
        }
    };

    // Load catalogs: the master index, or a single catalog file directly.
    let parsed: ParsedConfigs = if config_filename == "config.yaml" {
        match config_loading::load_master_configs(&config_resolved) {
            Some(p) => p,
            None => return 1,
        }
    } else {
        match config_loading::load_single_config(&config_resolved, &config_filename) {
            Some(p) => p,
            None => return 1,
        }
    };

    let app_dir = paths::app_dir();
    let programs_dir = paths::programs_dir();
    let mut env_settings = environment::load_or_default(&app_dir);

    let plan = section_plan(&parsed);
    log_debug!("Provisioning plan: {:?}", plan);

    for section in plan {
        let keep_going = run_section(
            section,
            &parsed,
            &mut state,
            &mut env_settings,
            &app_dir,
            &programs_dir,
            update,
        );
        // State is persisted after every section, failed ones included, so
        // an aborted run still remembers what it completed.
        save_state_to_file(&state, &state_resolved);
        if !keep_going {
            return 1;
        }
    }

    log_success!("{}", "osintbox provision completed.".bold());
    0
}

/// Executes one section, returning whether the run continues. Sections
/// with more than one step inside (toolchains, repositories) stop at the
/// first failing step.
fn run_section(
    section: Section,
    parsed: &ParsedConfigs,
    state: &mut ProvisionState,
    env_settings: &mut EnvironmentSettings,
    app_dir: &Path,
    programs_dir: &Path,
    update: bool,
) -> bool {
    match section {
        Section::Bootstrap => handle_outcome("System bootstrap", apt::bootstrap()),
        Section::AptPackages => {
            let Some(packages) = &parsed.packages else {
                return true;
            };
            handle_outcome(
                "Apt packages",
                apt::install_packages(&packages.apt, state),
            )
        }
        Section::Toolchains => {
            let Some(toolchains) = &parsed.toolchains else {
                return true;
            };
            for entry in &toolchains.toolchains {
                let step_name = format!("Toolchain '{}'", entry.name);
                let result = match entry.name.as_str() {
                    "go" => golang::install(entry, state, env_settings),
                    other => Ok(StepOutcome::Skipped(format!(
                        "unknown toolchain kind '{other}'"
                    ))),
                };
                if !handle_outcome(&step_name, result) {
                    return false;
                }
            }
            true
        }
        // Persisted once for the whole toolchain section; the rendered
        // env.sh replaces the shell start-up file appends the old
        // provisioning scripts relied on.
        Section::EnvironmentRecord => handle_outcome(
            "Environment record",
            environment::save(env_settings, app_dir)
                .map(|_| StepOutcome::Changed)
                .context("failed to write the environment record"),
        ),
        Section::RubyGems => {
            let Some(packages) = &parsed.packages else {
                return true;
            };
            handle_outcome("Ruby gems", gem::install_gems(&packages.gems, state))
        }
        Section::SnapPackages => {
            let Some(packages) = &parsed.packages else {
                return true;
            };
            handle_outcome(
                "Snap packages",
                snap::install_snaps(&packages.snaps, state),
            )
        }
        Section::MongoDb => {
            let Some(mongo) = parsed.packages.as_ref().and_then(|p| p.mongodb.as_ref()) else {
                return true;
            };
            handle_outcome("MongoDB", mongodb::setup(mongo, state))
        }
        Section::Repositories => {
            let Some(repos) = &parsed.repos else {
                return true;
            };
            for entry in &repos.repos {
                let step_name = format!("Repository '{}'", repo_dir_name(&entry.url));
                if !handle_outcome(
                    &step_name,
                    git_repo::ensure_repo(entry, programs_dir, state, update),
                ) {
                    return false;
                }
            }
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MongoDbEntry, PackagesConfig, RepoConfig, ToolchainConfig};

    fn full_configs() -> ParsedConfigs {
        ParsedConfigs {
            packages: Some(PackagesConfig {
                apt: vec!["git".to_string()],
                gems: vec!["wayback_machine_downloader".to_string()],
                snaps: vec![],
                mongodb: Some(MongoDbEntry {
                    series: "7.0".to_string(),
                }),
            }),
            toolchains: Some(ToolchainConfig { toolchains: vec![] }),
            repos: Some(RepoConfig { repos: vec![] }),
        }
    }

    #[test]
    fn toolchains_run_before_the_optional_managers() {
        // Under fail-fast this order is observable: a failed Go install must
        // leave gems, snaps, and MongoDB untouched.
        assert_eq!(
            section_plan(&full_configs()),
            vec![
                Section::Bootstrap,
                Section::AptPackages,
                Section::Toolchains,
                Section::EnvironmentRecord,
                Section::RubyGems,
                Section::SnapPackages,
                Section::MongoDb,
                Section::Repositories,
            ]
        );
    }

    #[test]
    fn missing_catalogs_drop_their_sections() {
        let parsed = ParsedConfigs {
            packages: None,
            toolchains: None,
            repos: None,
        };
        assert_eq!(section_plan(&parsed), vec![Section::Bootstrap]);
    }

    #[test]
    fn mongodb_needs_a_catalog_entry() {
        let mut parsed = full_configs();
        if let Some(packages) = &mut parsed.packages {
            packages.mongodb = None;
        }
        let plan = section_plan(&parsed);
        assert!(!plan.contains(&Section::MongoDb));
        assert!(plan.contains(&Section::SnapPackages));
    }
}
