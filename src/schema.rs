// src/schema.rs
// This file is the blueprint for every file `osintbox` reads or writes:
// the YAML catalogs describing what to install, the JSON state file it uses
// as its memory between runs, and the environment-settings record that
// replaces ad-hoc shell start-up file appends.

// 'Deserialize' lets us parse external files (YAML or JSON) into these
// structures; 'Serialize' lets us write them back out.
use serde::{Deserialize, Serialize};
// 'BTreeMap' keeps the environment exports in a stable order so the rendered
// env.sh does not churn between runs; 'HashMap' backs the state lookups.
use std::collections::{BTreeMap, HashMap};

// Catalog File Schemas
// These structs define the structure of the configuration files that drive a
// provisioning run. `osintbox generate` writes defaults for all of them.

/// The master configuration file: `config.yaml`.
/// It acts as an index, pointing `osintbox` to the individual catalog files.
#[derive(Debug, Serialize, Deserialize)]
pub struct MainConfig {
    /// Optional path to `packages.yaml` (apt, gems, snaps, MongoDB).
    pub packages: Option<String>,
    /// Optional path to `toolchains.yaml` (versioned release installs).
    pub toolchains: Option<String>,
    /// Optional path to `repos.yaml` (git-cloned utilities).
    pub repos: Option<String>,
}

/// Configuration schema for `packages.yaml`.
/// Everything that goes through a package manager lives here.
#[derive(Debug, Serialize, Deserialize)]
pub struct PackagesConfig {
    /// Packages installed from the system repository in one batch.
    #[serde(default)]
    pub apt: Vec<String>,
    /// Ruby gems, installed only when `gem` is on the PATH.
    #[serde(default)]
    pub gems: Vec<String>,
    /// Snap packages, installed only when `snap` is on the PATH.
    #[serde(default)]
    pub snaps: Vec<SnapEntry>,
    /// Optional MongoDB release series to set up from the vendor repository.
    pub mongodb: Option<MongoDbEntry>,
}

/// A single snap package. Confinement is a per-package decision, which is
/// why snaps are not a plain string list like apt packages.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapEntry {
    pub name: String,
    /// Install with `--classic` confinement.
    #[serde(default)]
    pub classic: bool,
}

/// The MongoDB block within `packages.yaml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MongoDbEntry {
    /// Release series used to build the vendor repository URL (e.g. "7.0").
    pub series: String,
}

/// Configuration schema for `toolchains.yaml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolchainConfig {
    pub toolchains: Vec<ToolchainEntry>,
}

/// A single language toolchain installed from a versioned release archive.
/// Only the `go` kind is currently recognised; unknown kinds are skipped
/// with a warning so a newer catalog does not break an older binary.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolchainEntry {
    /// The toolchain kind (e.g. "go").
    pub name: String,
    /// Desired version (e.g. "1.22.4"). `None` or "latest" resolves the
    /// newest release against the distribution site at provision time.
    pub version: Option<String>,
    /// Directory the release archive is unpacked under.
    /// Defaults to `~/.local` when not set.
    pub install_dir: Option<String>,
}

/// Configuration schema for `repos.yaml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RepoConfig {
    pub repos: Vec<RepoEntry>,
}

/// A repository descriptor: where to clone from, and the name of the
/// isolated Python environment to create inside the clone when the
/// repository declares its dependencies in a plain `requirements.txt`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RepoEntry {
    /// The git-over-HTTPS clone URL.
    pub url: String,
    /// Isolated-environment directory name, created inside the clone.
    /// Repositories that ship a `Pipfile` (or no manifest at all) do not
    /// need one and may omit it.
    pub venv: Option<String>,
}

// State File Schema (state.json)
// These structs define `osintbox`'s memory. The state file is what makes
// re-runs cheap: sections already recorded here are not re-installed.

/// The complete structure of `state.json`.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct ProvisionState {
    /// Keyed by `manager:name` (see [`ProvisionState::record_package`]):
    /// package names are only unique per manager, and an apt package and a
    /// gem may legitimately share a name.
    #[serde(default)]
    pub packages: HashMap<String, PackageState>,
    /// Keyed by toolchain kind (e.g. "go").
    #[serde(default)]
    pub toolchains: HashMap<String, ToolchainState>,
    /// Keyed by the local directory name derived from the clone URL.
    #[serde(default)]
    pub repos: HashMap<String, RepoState>,
}

impl ProvisionState {
    fn package_key(manager: &str, name: &str) -> String {
        format!("{manager}:{name}")
    }

    /// Whether `name` was already installed through `manager`. The manager
    /// is part of the lookup so that same-named packages under different
    /// managers never shadow each other.
    pub fn package_recorded(&self, manager: &str, name: &str) -> bool {
        self.packages
            .contains_key(&Self::package_key(manager, name))
    }

    /// Records an install of `name` through `manager`.
    pub fn record_package(&mut self, manager: &str, name: &str, installed_at: &str) {
        self.packages.insert(
            Self::package_key(manager, name),
            PackageState {
                manager: manager.to_string(),
                installed_at: installed_at.to_string(),
            },
        );
    }
}

/// Records one package installed through a package-manager backend.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PackageState {
    /// The backend that installed it ("apt", "gem", "snap", "mongodb-org").
    pub manager: String,
    /// Timestamp of the install, for diagnostics only.
    pub installed_at: String,
}

/// Records one installed language toolchain.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolchainState {
    /// The exact version that was unpacked (never "latest").
    pub version: String,
    /// The root of the unpacked release (e.g. "/usr/local/go").
    pub install_path: String,
    pub installed_at: String,
}

/// Records one cloned repository and, when applicable, the isolated
/// environment populated inside it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepoState {
    /// The original clone URL, kept for future reconciliation.
    pub url: String,
    /// Absolute path of the clone under the programs directory.
    pub clone_path: String,
    /// Absolute path of the virtual environment, when one was created.
    pub venv_path: Option<String>,
    /// Which dependency manifest was found: "requirements", "pipfile",
    /// or "none".
    pub manifest: String,
    pub installed_at: String,
}

// Environment Settings Record
// The original script appended `export` lines to the invoking user's shell
// start-up file. That ambient, append-only state is replaced by a single
// explicit record written once per run and read back on the next one.

/// The environment record persisted as `environment.json` and rendered to a
/// sourceable `env.sh` next to it.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnvironmentSettings {
    /// Plain `KEY=value` exports (e.g. GOROOT).
    #[serde(default)]
    pub exports: BTreeMap<String, String>,
    /// Directories prepended to PATH, in order, without duplicates.
    #[serde(default)]
    pub path_entries: Vec<String>,
}

impl EnvironmentSettings {
    /// Sets an export, overwriting any previous value for the key.
    pub fn set_export(&mut self, key: &str, value: &str) {
        self.exports.insert(key.to_string(), value.to_string());
    }

    /// Adds a PATH entry unless it is already recorded.
    pub fn add_path_entry(&mut self, dir: &str) {
        if !self.path_entries.iter().any(|p| p == dir) {
            self.path_entries.push(dir.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_package_name_under_two_managers_keeps_two_records() {
        // "whois" exists both as a Debian package and as a gem; recording
        // one must neither overwrite nor satisfy a lookup for the other.
        let mut state = ProvisionState::default();
        state.record_package("apt", "whois", "2026-01-01T00:00:00Z");

        assert!(state.package_recorded("apt", "whois"));
        assert!(!state.package_recorded("gem", "whois"));

        state.record_package("gem", "whois", "2026-01-02T00:00:00Z");
        assert_eq!(state.packages.len(), 2);
        assert!(state.package_recorded("apt", "whois"));
        assert_eq!(state.packages["gem:whois"].manager, "gem");
    }
}
