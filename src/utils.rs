// This file is a collection of helper functions used throughout `osintbox`:
// path manipulation, external-command execution, HTTP downloads, archive
// extraction, and the small pure functions the installers share.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tar::Archive;

use crate::{log_debug, log_info, log_warn};

/// Resolves paths that start with a tilde `~` into the user's home directory.
///
/// # Arguments
/// * `path`: A string slice representing the path, which might start with `~`.
///
/// # Returns
/// * `PathBuf`: The fully resolved path, or the original path if `~` wasn't
///   present or the home directory couldn't be found.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~") {
        // `dirs::home_dir()` reliably finds the home directory across OSes.
        if let Some(home) = dirs::home_dir() {
            return PathBuf::from(path.replacen("~", &home.to_string_lossy(), 1));
        }
    }
    PathBuf::from(path)
}

/// Returns the current time as an RFC 3339 string, recorded in `state.json`
/// alongside every install.
pub fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Checks whether an external program can be spawned at all.
///
/// Probing with `--version` distinguishes "binary not on the PATH" (spawn
/// fails, `output()` is `Err`) from "binary present but unhappy" (spawn
/// succeeds, possibly with a non-zero exit, `output()` is `Ok`). Presence is
/// all the conditional installers need to decide between running and
/// skipping.
pub fn command_exists(program: &str) -> bool {
    Command::new(program).arg("--version").output().is_ok()
}

/// Runs an external command, capturing its output, and converts a non-zero
/// exit status into an error carrying the command line and stderr.
///
/// This is the single "run command, check outcome" primitive behind every
/// installer backend. The provisioning process never changes its own working
/// directory; callers that need one pass it explicitly via `cwd`.
///
/// # Arguments
/// * `tag`: The log prefix of the calling installer (e.g. "[Apt]").
/// * `program`: The executable to run.
/// * `args`: Its arguments.
/// * `cwd`: Optional working directory for the child process.
pub fn run_command(tag: &str, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<()> {
    log_info!(
        "{} Executing: {} {}",
        tag,
        program.cyan().bold(),
        args.join(" ").cyan()
    );

    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        log_debug!("{} Working directory: {}", tag, dir.display());
        command.current_dir(dir);
    }

    let output: Output = command
        .output()
        .with_context(|| format!("failed to execute '{program}'"))?;

    if output.status.success() {
        // Some tools print progress to stderr even on success; surface it at
        // WARN so it is visible without failing the step.
        if !output.stdout.is_empty() {
            log_debug!(
                "{} Stdout: {}",
                tag,
                String::from_utf8_lossy(&output.stdout)
            );
        }
        if !output.stderr.is_empty() {
            log_warn!(
                "{} Stderr (might contain warnings): {}",
                tag,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.stdout.is_empty() {
            log_debug!(
                "{} Stdout (on failure): {}",
                tag,
                String::from_utf8_lossy(&output.stdout)
            );
        }
        bail!(
            "'{} {}' failed with exit code {}: {}",
            program,
            args.join(" "),
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }
}

/// Fetches a small text resource over HTTPS (e.g. the Go version endpoint).
pub fn http_get_text(url: &str) -> Result<String> {
    log_debug!("[Utils] GET {}", url.blue());
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("HTTP request failed for {url}"))?;
    response
        .into_string()
        .with_context(|| format!("failed to read response body from {url}"))
}

/// Downloads a file from a given URL and saves it to `dest`.
///
/// # Arguments
/// * `url`: The URL of the file to download.
/// * `dest`: The local path where the downloaded file should be saved.
pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    log_debug!("[Utils] Starting download from URL: {}", url.blue());

    let response = ureq::get(url)
        .call()
        .with_context(|| format!("HTTP request failed for {url}"))?;

    // Create (or truncate) the destination and stream the body into it.
    let mut file =
        File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    let mut reader = response.into_reader();
    io::copy(&mut reader, &mut file)
        .with_context(|| format!("failed while writing {}", dest.display()))?;

    log_debug!(
        "[Utils] File downloaded successfully to {}",
        dest.display().to_string().green()
    );
    Ok(())
}

/// Unpacks a `.tar.gz` archive into `dest`.
///
/// The Go distribution ships its releases exclusively as gzipped tarballs on
/// Linux, so this is the only archive format the toolchain installer needs.
pub fn extract_tar_gz(src: &Path, dest: &Path) -> Result<()> {
    log_debug!(
        "[Utils] Extracting archive {} into {}",
        src.display().to_string().blue(),
        dest.display().to_string().cyan()
    );

    let tar_gz = File::open(src).with_context(|| format!("failed to open {}", src.display()))?;
    let decompressor = GzDecoder::new(tar_gz);
    let mut archive = Archive::new(decompressor);
    archive
        .unpack(dest)
        .with_context(|| format!("failed to unpack {} into {}", src.display(), dest.display()))?;

    log_debug!("[Utils] Tar.gz archive extracted successfully.");
    Ok(())
}

/// Derives the local directory name for a clone URL: the final path segment
/// with any `.git` suffix stripped.
///
/// `https://github.com/laramies/theHarvester.git` -> `theHarvester`.
pub fn repo_dir_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// Warns when a catalog list contains the same name twice. Duplicates are
/// not fatal (the package managers tolerate them) but they usually indicate
/// a catalog editing mistake.
pub fn warn_on_duplicates(tag: &str, names: &[String]) {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            log_warn!("{} Duplicate entry '{}' in catalog.", tag, name.yellow());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_dir_name_strips_git_suffix() {
        assert_eq!(
            repo_dir_name("https://github.com/laramies/theHarvester.git"),
            "theHarvester"
        );
    }

    #[test]
    fn repo_dir_name_without_suffix() {
        assert_eq!(
            repo_dir_name("https://github.com/sherlock-project/sherlock"),
            "sherlock"
        );
    }

    #[test]
    fn repo_dir_name_tolerates_trailing_slash() {
        assert_eq!(
            repo_dir_name("https://github.com/smicallef/spiderfoot/"),
            "spiderfoot"
        );
    }

    #[test]
    fn command_exists_rejects_missing_binary() {
        assert!(!command_exists("definitely-not-a-real-binary-xyz"));
    }

    #[test]
    fn run_command_reports_nonzero_exit() {
        // `false` exists on every Debian base install and always exits 1.
        let err = run_command("[Test]", "false", &[], None).unwrap_err();
        assert!(err.to_string().contains("exit code 1"));
    }

    #[test]
    fn run_command_succeeds_on_zero_exit() {
        assert!(run_command("[Test]", "true", &[], None).is_ok());
    }

    #[test]
    fn extract_tar_gz_round_trip() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("sample.tar.gz");

        // Build a one-file tarball in memory.
        let file = File::create(&archive_path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let payload = b"hello";
        let mut header = tar::Header::new_gnu();
        header.set_size(payload.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "go/VERSION", payload.as_slice())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap().flush().unwrap();

        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        extract_tar_gz(&archive_path, &dest).unwrap();
        assert_eq!(
            std::fs::read_to_string(dest.join("go/VERSION")).unwrap(),
            "hello"
        );
    }
}
