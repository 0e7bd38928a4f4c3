// The Go toolchain installer.
//
// This is the one "versioned release archive" install in the catalog:
// resolve the latest version against the distribution site (unless the
// catalog pins one), download the linux tarball, replace any previous
// installation directory, and unpack. Instead of appending export lines to
// the user's shell start-up file, the GOROOT/GOPATH/PATH entries go into
// the explicit environment record, which the orchestrator writes out once
// at the end of the toolchain section.
//
// Deliberately absent, matching the original behavior: checksum
// verification, and rollback of a partially extracted tree when a download
// dies mid-stream. A failed install aborts the run and a re-run replaces
// the directory wholesale.

use crate::schema::{EnvironmentSettings, ProvisionState, ToolchainEntry, ToolchainState};
use crate::utils::{current_timestamp, download_file, expand_tilde, extract_tar_gz, http_get_text};
use crate::{libs::steps::StepOutcome, log_debug, log_info, log_warn};
use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::fs;
use std::path::Path;

const TAG: &str = "[Go Toolchain]";

/// The text endpoint listing current Go versions, newest first.
const VERSION_ENDPOINT: &str = "https://go.dev/VERSION?m=text";

/// Installs (or reconciles) the Go toolchain described by `entry`.
pub fn install(
    entry: &ToolchainEntry,
    state: &mut ProvisionState,
    env: &mut EnvironmentSettings,
) -> Result<StepOutcome> {
    let version = resolve_version(entry)?;
    log_debug!("{TAG} Target Go version: {}", version.bold());

    let install_dir = expand_tilde(entry.install_dir.as_deref().unwrap_or("~/.local"));
    let goroot = install_dir.join("go");

    // Already at the requested version with the tree still on disk: nothing
    // to download. The environment record is still refreshed below so a
    // deleted env.sh comes back on the next save.
    let up_to_date = state
        .toolchains
        .get("go")
        .map(|t| t.version == version)
        .unwrap_or(false);
    if up_to_date && goroot.join("bin").join("go").exists() {
        log_debug!(
            "{TAG} Go {} already installed at {}.",
            version,
            goroot.display()
        );
        record_environment(env, &goroot);
        return Ok(StepOutcome::Unchanged);
    }

    let arch = go_arch()?;
    let url = download_url(&version, arch);
    let tarball = std::env::temp_dir().join(format!("go{version}.linux-{arch}.tar.gz"));

    log_info!(
        "{TAG} Downloading Go {} from {}",
        version.bold(),
        url.cyan()
    );
    download_file(&url, &tarball).context("Go tarball download failed")?;

    // Replace, never merge: a stale tree under goroot would leave orphaned
    // files from the previous version next to the new one.
    if goroot.exists() {
        log_info!(
            "{TAG} Removing previous installation at {}",
            goroot.display().to_string().yellow()
        );
        fs::remove_dir_all(&goroot)
            .with_context(|| format!("failed to remove {}", goroot.display()))?;
    }
    fs::create_dir_all(&install_dir)
        .with_context(|| format!("failed to create {}", install_dir.display()))?;

    // The release tarball carries a single top-level `go/` directory, so
    // unpacking into install_dir lands the tree at `<install_dir>/go`.
    extract_tar_gz(&tarball, &install_dir).context("Go tarball extraction failed")?;

    if let Err(e) = fs::remove_file(&tarball) {
        log_warn!("{TAG} Could not remove downloaded tarball: {}", e);
    }

    record_environment(env, &goroot);

    state.toolchains.insert(
        "go".to_string(),
        ToolchainState {
            version: version.clone(),
            install_path: goroot.to_string_lossy().into_owned(),
            installed_at: current_timestamp(),
        },
    );

    log_info!(
        "{TAG} Go {} installed at {}",
        version.green(),
        goroot.display().to_string().green()
    );
    Ok(StepOutcome::Changed)
}

/// Resolves the version to install: the pinned catalog value, or the newest
/// release according to the distribution site when the catalog says
/// "latest" (or says nothing).
fn resolve_version(entry: &ToolchainEntry) -> Result<String> {
    match entry.version.as_deref() {
        Some(pinned) if pinned != "latest" => Ok(pinned.to_string()),
        _ => {
            log_debug!("{TAG} Querying {} for the latest version.", VERSION_ENDPOINT);
            let body =
                http_get_text(VERSION_ENDPOINT).context("latest-version query failed")?;
            parse_latest_version(&body)
                .context("unexpected response from the Go version endpoint")
        }
    }
}

/// Parses the version endpoint's response. The body lists one version tag
/// per line ("go1.22.4" newest first, followed by a timestamp line per
/// release); the first `go`-prefixed token is the latest version.
fn parse_latest_version(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("go"))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Maps the host architecture to the Go release naming scheme.
fn go_arch() -> Result<&'static str> {
    match std::env::consts::ARCH {
        "x86_64" => Ok("amd64"),
        "aarch64" => Ok("arm64"),
        other => bail!("no Go release archive for host architecture '{other}'"),
    }
}

fn download_url(version: &str, arch: &str) -> String {
    format!("https://go.dev/dl/go{version}.linux-{arch}.tar.gz")
}

/// Records GOROOT, GOPATH, and the two bin directories in the environment
/// record. Safe to call repeatedly; the record deduplicates PATH entries.
fn record_environment(env: &mut EnvironmentSettings, goroot: &Path) {
    let gopath = expand_tilde("~/go");
    env.set_export("GOROOT", &goroot.to_string_lossy());
    env.set_export("GOPATH", &gopath.to_string_lossy());
    env.add_path_entry(&goroot.join("bin").to_string_lossy());
    env.add_path_entry(&gopath.join("bin").to_string_lossy());
}
