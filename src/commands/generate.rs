// src/commands/generate.rs
// Writes the default catalog files. The fixed OSINT tool catalog lives here
// as configuration data, not code: `osintbox generate` lays it down once,
// and `osintbox provision` consumes whatever the user has edited since.

use crate::utils::expand_tilde;
use crate::{log_error, log_info, log_warn};
use colored::Colorize;
use std::fs;
use std::io::Write;
use std::path::Path;

// File names for the catalog templates.
const PACKAGES_FILE: &str = "packages.yaml"; // apt, gems, snaps, MongoDB.
const TOOLCHAINS_FILE: &str = "toolchains.yaml"; // versioned release installs.
const REPOS_FILE: &str = "repos.yaml"; // git-cloned utilities.
const CONFIG_FILE: &str = "config.yaml"; // the master index.

/// Default content for `packages.yaml`: everything that goes through a
/// package manager. The apt list is installed in one batch; gems and snaps
/// only when their manager is present.
const PACKAGES_TEMPLATE: &str = r#"# Packages installed through package managers.
apt:
  - python3
  - python3-pip
  - python3-venv
  - pipenv
  - ruby-full
  - tor
  - torbrowser-launcher
  - libimage-exiftool-perl   # exiftool
  - mediainfo
  - webhttrack
  - jq
  - whois
  - dnsutils
  - net-tools
  - sqlite3
  - ffmpeg
  - keepassxc
  - chromium

# Ruby gems; skipped with a warning when 'gem' is not installed.
gems:
  - wayback_machine_downloader

# Snap packages; skipped with a warning when 'snap' is not installed.
# Confinement is per package, hence the structured entries.
snaps:
  - name: onionshare
  - name: joplin-desktop
  - name: code
    classic: true

# MongoDB from the vendor repository (used by several OSINT frameworks).
mongodb:
  series: "7.0"
"#;

/// Default content for `toolchains.yaml`. "latest" resolves against the
/// distribution site at provision time; pin a version for reproducible VMs.
const TOOLCHAINS_TEMPLATE: &str = r#"toolchains:
  - name: go
    version: latest      # or pin, e.g. "1.22.4"
    install_dir: ~/.local  # unpacks to ~/.local/go
"#;

/// Default content for `repos.yaml`: the git-cloned utilities, each with
/// the name of the isolated environment created inside its clone when the
/// repository ships a requirements.txt. Pipfile-based and source-only
/// repositories omit `venv`.
const REPOS_TEMPLATE: &str = r#"repos:
  - url: https://github.com/laramies/theHarvester.git
    venv: theHarvester-env
  - url: https://github.com/sherlock-project/sherlock.git
    venv: sherlock-env
  - url: https://github.com/smicallef/spiderfoot.git
    venv: spiderfoot-env
  - url: https://github.com/lanmaster53/recon-ng.git
    venv: recon-ng-env
  - url: https://github.com/s0md3v/Photon.git
    venv: Photon-env
  - url: https://github.com/megadose/holehe.git
    venv: holehe-env
  - url: https://github.com/soxoj/maigret.git
    venv: maigret-env
  - url: https://github.com/aboul3la/Sublist3r.git
    venv: Sublist3r-env
  - url: https://github.com/opsdisk/metagoofil.git
    venv: metagoofil-env
  - url: https://github.com/Datalux/Osintgram.git
    venv: Osintgram-env
  - url: https://github.com/mxrch/GHunt.git
    venv: GHunt-env
  - url: https://github.com/RedSiege/EyeWitness.git
    venv: EyeWitness-env
  # Go binary; nothing to install beyond the clone.
  - url: https://github.com/sundowndev/phoneinfoga.git
  # Data repository; no dependency manifest.
  - url: https://github.com/WebBreacher/WhatsMyName.git
"#;

/// The master index: points `osintbox` at the individual catalog files,
/// which lets users split or relocate them as they see fit.
const CONFIG_TEMPLATE: &str = r#"packages: packages.yaml
toolchains: toolchains.yaml
repos: repos.yaml
"#;

/// Entry point for the `generate` command. Creates the catalog directory
/// and writes every template that does not already exist.
///
/// # Arguments
/// * `config_dir`: Custom directory for the catalogs; defaults to
///   `~/.osintbox/configs/`.
///
/// # Returns
/// The process exit code: 0 when every file was created or already present.
pub fn run(config_dir: Option<String>) -> i32 {
    let base_dir = config_dir.as_deref().unwrap_or("~/.osintbox/configs/");
    let base_dir = expand_tilde(base_dir);

    log_info!(
        "[Generate] Using catalog directory: {}",
        base_dir.display().to_string().cyan()
    );

    if !base_dir.exists() {
        if let Err(e) = fs::create_dir_all(&base_dir) {
            log_error!("[Generate] Failed to create catalog directory: {}", e);
            return 1;
        }
        log_info!("[Generate] Created catalog directory {}", base_dir.display());
    }

    let mut failures = 0;
    failures += generate_file(&base_dir, PACKAGES_FILE, PACKAGES_TEMPLATE);
    failures += generate_file(&base_dir, TOOLCHAINS_FILE, TOOLCHAINS_TEMPLATE);
    failures += generate_file(&base_dir, REPOS_FILE, REPOS_TEMPLATE);
    // config.yaml goes last so the files it points at exist by the time it does.
    failures += generate_file(&base_dir, CONFIG_FILE, CONFIG_TEMPLATE);

    if failures > 0 {
        log_error!("[Generate] {} file(s) could not be written.", failures);
        return 1;
    }
    log_info!("[Generate] Catalog ready. Review it, then run 'osintbox provision'.");
    0
}

/// Creates a single catalog file from a template, refusing to overwrite an
/// existing file so user edits survive re-running `generate`.
///
/// # Returns
/// 0 on success or skip, 1 on a write failure.
fn generate_file(base_dir: &Path, filename: &str, content: &str) -> i32 {
    let file_path = base_dir.join(filename);

    if file_path.exists() {
        log_warn!(
            "[Generate] Skipping existing file {}; not overwriting your changes.",
            file_path.display().to_string().yellow()
        );
        return 0;
    }

    match fs::File::create(&file_path) {
        Ok(mut file) => {
            if let Err(e) = file.write_all(content.as_bytes()) {
                log_error!("[Generate] Failed to write to {}: {}", file_path.display(), e);
                1
            } else {
                log_info!("[Generate] Wrote {}", file_path.display().to_string().green());
                0
            }
        }
        Err(e) => {
            log_error!("[Generate] Couldn't create file {}: {}", file_path.display(), e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PackagesConfig, RepoConfig, ToolchainConfig};

    // The templates are user-facing; they must always parse against the
    // schemas the provisioner loads them with.
    #[test]
    fn packages_template_parses() {
        let cfg: PackagesConfig = serde_yaml::from_str(PACKAGES_TEMPLATE).unwrap();
        assert!(cfg.apt.contains(&"python3-venv".to_string()));
        assert_eq!(cfg.mongodb.unwrap().series, "7.0");
        assert!(cfg.snaps.iter().any(|s| s.name == "code" && s.classic));
    }

    #[test]
    fn toolchains_template_parses() {
        let cfg: ToolchainConfig = serde_yaml::from_str(TOOLCHAINS_TEMPLATE).unwrap();
        assert_eq!(cfg.toolchains[0].name, "go");
        assert_eq!(cfg.toolchains[0].version.as_deref(), Some("latest"));
    }

    #[test]
    fn repos_template_parses_with_and_without_venv() {
        let cfg: RepoConfig = serde_yaml::from_str(REPOS_TEMPLATE).unwrap();
        assert!(cfg.repos.len() >= 10);
        assert!(cfg.repos.iter().any(|r| r.venv.is_none()));
        assert!(
            cfg.repos
                .iter()
                .any(|r| r.venv.as_deref() == Some("theHarvester-env"))
        );
    }

    #[test]
    fn generate_is_idempotent_and_preserves_edits() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = Some(dir.path().to_string_lossy().into_owned());

        assert_eq!(run(dir_arg.clone()), 0);
        // Simulate a user edit, then re-run.
        fs::write(dir.path().join("repos.yaml"), "repos: []\n").unwrap();
        assert_eq!(run(dir_arg), 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("repos.yaml")).unwrap(),
            "repos: []\n"
        );
    }
}
