// The per-repository installer, the one recurring decision procedure in
// the catalog: clone a git URL under the programs directory, look at what
// dependency manifest the repository ships, and populate an isolated
// Python environment accordingly.
//
// The decision table, per repository:
//   directory already exists      -> skip (or `git pull --ff-only` with --update)
//   `requirements.txt` present    -> create a venv inside the clone, install into it
//   `Pipfile` present             -> delegate to `pipenv install` (pipenv owns its env)
//   neither                       -> clone only
//
// Each clone's environment lives inside that clone and is never shared
// with another repository; that isolation is the whole point. The venv's
// own `pip` binary is invoked directly, which is what "activating" an
// environment amounts to anyway, so the provisioning process never touches
// its own working directory or environment variables.

use crate::schema::{ProvisionState, RepoEntry, RepoState};
use crate::utils::{current_timestamp, repo_dir_name, run_command};
use crate::{libs::steps::StepOutcome, log_debug, log_info, log_warn};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

const TAG: &str = "[Repo Installer]";

/// Which dependency manifest a cloned repository declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manifest {
    /// A plain `requirements.txt` list: we own the isolated environment.
    Requirements,
    /// A `Pipfile` (lock-file style): pipenv owns the environment.
    Pipfile,
    /// No recognised manifest: the clone is all there is to install.
    None,
}

impl Manifest {
    /// Inspects a repository root. A repository shipping both files is
    /// treated as requirements-based; the plain list is the one the
    /// project's own README invariably documents.
    pub fn detect(repo_root: &Path) -> Manifest {
        if repo_root.join("requirements.txt").is_file() {
            Manifest::Requirements
        } else if repo_root.join("Pipfile").is_file() {
            Manifest::Pipfile
        } else {
            Manifest::None
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Manifest::Requirements => "requirements",
            Manifest::Pipfile => "pipfile",
            Manifest::None => "none",
        }
    }
}

/// The isolated-environment directory name for a repository: the catalog's
/// explicit name, or `<dir>-env` when the catalog omits one.
pub fn venv_name(entry: &RepoEntry, dir_name: &str) -> String {
    entry
        .venv
        .clone()
        .unwrap_or_else(|| format!("{dir_name}-env"))
}

/// Ensures one catalog repository is present under the programs directory,
/// with its dependencies installed into its own isolated environment.
///
/// # Arguments
/// * `entry`: The repository descriptor from `repos.yaml`.
/// * `programs_dir`: The directory all clones live under.
/// * `state`: Mutated with a `RepoState` record on a successful install.
/// * `update`: When `true`, an existing clone is reconciled with
///   `git pull --ff-only` instead of being skipped. Dependency installs are
///   not re-run on update; delete the clone to rebuild its environment.
pub fn ensure_repo(
    entry: &RepoEntry,
    programs_dir: &Path,
    state: &mut ProvisionState,
    update: bool,
) -> Result<StepOutcome> {
    let dir_name = repo_dir_name(&entry.url);
    let clone_path = programs_dir.join(&dir_name);

    // A directory that already exists is never re-cloned.
    if clone_path.exists() {
        if update {
            log_info!(
                "{TAG} Reconciling existing clone {}",
                clone_path.display().to_string().cyan()
            );
            run_command(
                TAG,
                "git",
                &["-C", &clone_path.to_string_lossy(), "pull", "--ff-only"],
                None,
            )
            .with_context(|| format!("git pull failed for '{dir_name}'"))?;
            return Ok(StepOutcome::Changed);
        }

        log_warn!(
            "{TAG} '{}' already cloned at {}; skipping. Pass --update to pull.",
            dir_name.bold(),
            clone_path.display()
        );
        // Backfill the state record if a previous run predates state
        // tracking; the directory on disk is the source of truth here.
        state.repos.entry(dir_name.clone()).or_insert_with(|| RepoState {
            url: entry.url.clone(),
            clone_path: clone_path.to_string_lossy().into_owned(),
            venv_path: None,
            manifest: Manifest::detect(&clone_path).as_str().to_string(),
            installed_at: current_timestamp(),
        });
        return Ok(StepOutcome::Skipped(format!(
            "'{dir_name}' already cloned"
        )));
    }

    fs::create_dir_all(programs_dir)
        .with_context(|| format!("failed to create {}", programs_dir.display()))?;

    log_info!("{TAG} Cloning {}", entry.url.cyan());
    run_command(
        TAG,
        "git",
        &["clone", &entry.url, &clone_path.to_string_lossy()],
        None,
    )
    .with_context(|| format!("git clone failed for '{}'", entry.url))?;

    // Dependency installation, decided by the manifest in the clone root.
    let manifest = Manifest::detect(&clone_path);
    log_debug!("{TAG} Detected manifest for '{}': {}", dir_name, manifest.as_str());

    let venv_path = match manifest {
        Manifest::Requirements => {
            let name = venv_name(entry, &dir_name);
            let venv_dir = clone_path.join(&name);
            log_info!(
                "{TAG} Creating isolated environment {}",
                venv_dir.display().to_string().cyan()
            );
            run_command(
                TAG,
                "python3",
                &["-m", "venv", &venv_dir.to_string_lossy()],
                None,
            )
            .with_context(|| format!("venv creation failed for '{dir_name}'"))?;

            let pip = venv_dir.join("bin").join("pip");
            run_command(
                TAG,
                &pip.to_string_lossy(),
                &["install", "-r", "requirements.txt"],
                Some(&clone_path),
            )
            .with_context(|| format!("dependency install failed for '{dir_name}'"))?;
            Some(venv_dir.to_string_lossy().into_owned())
        }
        Manifest::Pipfile => {
            // Pipenv resolves the lock file and manages its own environment;
            // no directory of ours to record.
            run_command(TAG, "pipenv", &["install"], Some(&clone_path))
                .with_context(|| format!("pipenv install failed for '{dir_name}'"))?;
            None
        }
        Manifest::None => {
            log_info!(
                "{TAG} '{}' declares no dependency manifest; clone only.",
                dir_name
            );
            None
        }
    };

    state.repos.insert(
        dir_name.clone(),
        RepoState {
            url: entry.url.clone(),
            clone_path: clone_path.to_string_lossy().into_owned(),
            venv_path,
            manifest: manifest.as_str().to_string(),
            installed_at: current_timestamp(),
        },
    );

    log_info!("{TAG} '{}' installed.", dir_name.green());
    Ok(StepOutcome::Changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::command_exists;
    use std::path::PathBuf;

    fn entry(url: &str, venv: Option<&str>) -> RepoEntry {
        RepoEntry {
            url: url.to_string(),
            venv: venv.map(str::to_string),
        }
    }

    /// Creates a local git repository with one commit; its path doubles as
    /// the clone URL, so the clone tests run without any network.
    fn init_fixture_repo(root: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let repo = root.join(name);
        fs::create_dir_all(&repo).unwrap();
        for (file, contents) in files {
            fs::write(repo.join(file), contents).unwrap();
        }
        let git = |args: &[&str]| {
            let output = std::process::Command::new("git")
                .arg("-C")
                .arg(&repo)
                .args(args)
                .output()
                .unwrap();
            assert!(output.status.success(), "git {args:?} failed");
        };
        git(&["init", "-q"]);
        git(&["add", "."]);
        git(&[
            "-c",
            "user.name=fixture",
            "-c",
            "user.email=fixture@localhost",
            "commit",
            "-q",
            "-m",
            "initial",
        ]);
        repo
    }

    #[test]
    fn manifest_detection_prefers_requirements() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Manifest::detect(dir.path()), Manifest::None);

        fs::write(dir.path().join("Pipfile"), "[packages]\n").unwrap();
        assert_eq!(Manifest::detect(dir.path()), Manifest::Pipfile);

        fs::write(dir.path().join("requirements.txt"), "requests\n").unwrap();
        assert_eq!(Manifest::detect(dir.path()), Manifest::Requirements);
    }

    #[test]
    fn venv_name_uses_catalog_value_or_derives_one() {
        let with_name = entry("https://example.com/example-tool.git", Some("x-env"));
        assert_eq!(venv_name(&with_name, "example-tool"), "x-env");

        let without = entry("https://example.com/example-tool.git", None);
        assert_eq!(venv_name(&without, "example-tool"), "example-tool-env");
    }

    #[test]
    fn existing_clone_is_skipped_without_touching_git() {
        let programs = tempfile::tempdir().unwrap();
        let clone = programs.path().join("example-tool");
        fs::create_dir_all(&clone).unwrap();
        fs::write(clone.join("requirements.txt"), "requests\n").unwrap();

        let mut state = ProvisionState::default();
        let outcome = ensure_repo(
            &entry("https://example.com/example-tool.git", Some("x-env")),
            programs.path(),
            &mut state,
            false,
        )
        .unwrap();

        // Skipped, no venv created, and the pre-existing directory state is
        // exactly what it was before the call.
        assert_eq!(
            outcome,
            StepOutcome::Skipped("'example-tool' already cloned".to_string())
        );
        assert!(!clone.join("x-env").exists());

        // The skip also backfills a state record from what is on disk.
        let record = &state.repos["example-tool"];
        assert_eq!(record.manifest, "requirements");
        assert!(record.venv_path.is_none());
    }

    #[test]
    fn second_skip_leaves_state_record_alone() {
        let programs = tempfile::tempdir().unwrap();
        fs::create_dir_all(programs.path().join("sherlock")).unwrap();

        let mut state = ProvisionState::default();
        let e = entry("https://github.com/sherlock-project/sherlock.git", None);
        ensure_repo(&e, programs.path(), &mut state, false).unwrap();
        let first = state.repos["sherlock"].installed_at.clone();

        ensure_repo(&e, programs.path(), &mut state, false).unwrap();
        assert_eq!(state.repos["sherlock"].installed_at, first);
    }

    #[test]
    fn requirements_clone_populates_one_venv_inside_the_clone() {
        let fixtures = tempfile::tempdir().unwrap();
        let programs = tempfile::tempdir().unwrap();
        // A comment-only requirements.txt keeps the pip run offline.
        let origin = init_fixture_repo(
            fixtures.path(),
            "example-tool.git",
            &[("requirements.txt", "# no dependencies\n")],
        );

        let mut state = ProvisionState::default();
        let outcome = ensure_repo(
            &entry(&origin.to_string_lossy(), Some("x-env")),
            programs.path(),
            &mut state,
            false,
        )
        .unwrap();

        assert_eq!(outcome, StepOutcome::Changed);
        let clone = programs.path().join("example-tool");
        assert!(clone.join("requirements.txt").is_file());

        // Exactly one environment, under the catalog name, inside the clone.
        assert!(clone.join("x-env").join("pyvenv.cfg").is_file());
        assert!(!clone.join("example-tool-env").exists());

        let record = &state.repos["example-tool"];
        assert_eq!(record.manifest, "requirements");
        assert!(record.venv_path.as_deref().unwrap().ends_with("x-env"));
    }

    #[test]
    fn manifestless_clone_is_clone_only() {
        let fixtures = tempfile::tempdir().unwrap();
        let programs = tempfile::tempdir().unwrap();
        let origin = init_fixture_repo(
            fixtures.path(),
            "plain-tool.git",
            &[("README.md", "data only\n")],
        );

        let mut state = ProvisionState::default();
        let outcome = ensure_repo(
            &entry(&origin.to_string_lossy(), None),
            programs.path(),
            &mut state,
            false,
        )
        .unwrap();

        assert_eq!(outcome, StepOutcome::Changed);
        let clone = programs.path().join("plain-tool");
        assert!(clone.join("README.md").is_file());
        assert!(!clone.join("plain-tool-env").exists());

        let record = &state.repos["plain-tool"];
        assert_eq!(record.manifest, "none");
        assert!(record.venv_path.is_none());
    }

    #[test]
    fn pipfile_clone_creates_no_venv_of_our_own() {
        // pipenv is normally installed by the apt catalog; on a machine
        // without it this branch cannot run end to end.
        if !command_exists("pipenv") {
            return;
        }

        let fixtures = tempfile::tempdir().unwrap();
        let programs = tempfile::tempdir().unwrap();
        let origin =
            init_fixture_repo(fixtures.path(), "pip-tool.git", &[("Pipfile", "[packages]\n")]);

        let mut state = ProvisionState::default();
        let outcome = ensure_repo(
            &entry(&origin.to_string_lossy(), None),
            programs.path(),
            &mut state,
            false,
        )
        .unwrap();

        assert_eq!(outcome, StepOutcome::Changed);
        let clone = programs.path().join("pip-tool");
        // pipenv owns its environment; nothing of ours lands in the clone.
        assert!(!clone.join("pip-tool-env").exists());

        let record = &state.repos["pip-tool"];
        assert_eq!(record.manifest, "pipfile");
        assert!(record.venv_path.is_none());
    }
}
