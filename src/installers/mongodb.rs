// MongoDB setup from the vendor's apt repository.
//
// MongoDB is not in Debian's own archive, so this backend does the three
// things the vendor documents: fetch and dearmor the release signing key,
// write the apt source list for the pinned series, and install
// `mongodb-org` after an index refresh. The step reconciles rather than
// re-runs: when the source list is already in place and the server binary
// is present, nothing is touched.

use crate::schema::{MongoDbEntry, ProvisionState};
use crate::utils::{command_exists, current_timestamp, download_file, run_command};
use crate::{libs::steps::StepOutcome, log_debug, log_info, log_warn};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

const TAG: &str = "[MongoDB]";

/// Fallback when /etc/os-release does not state a codename (e.g. Debian
/// testing); current stable is the safest repository to point at.
const FALLBACK_CODENAME: &str = "bookworm";

/// Sets up the vendor repository for the given series and installs
/// `mongodb-org`.
pub fn setup(entry: &MongoDbEntry, state: &mut ProvisionState) -> Result<StepOutcome> {
    let series = entry.series.as_str();
    let list_path = format!("/etc/apt/sources.list.d/mongodb-org-{series}.list");
    let keyring_path = format!("/usr/share/keyrings/mongodb-server-{series}.gpg");

    if Path::new(&list_path).exists() && command_exists("mongod") {
        log_debug!("{TAG} Source list and server binary already present.");
        return Ok(StepOutcome::Unchanged);
    }

    // 1. Signing key: download the ASCII-armored key, dearmor it into the
    //    keyring the source list references.
    let key_url = format!("https://www.mongodb.org/static/pgp/server-{series}.asc");
    let key_tmp = std::env::temp_dir().join(format!("mongodb-server-{series}.asc"));
    log_info!("{TAG} Fetching release signing key for series {}", series.bold());
    download_file(&key_url, &key_tmp).context("MongoDB signing key download failed")?;
    run_command(
        TAG,
        "sudo",
        &[
            "gpg",
            "--dearmor",
            "--yes",
            "-o",
            &keyring_path,
            &key_tmp.to_string_lossy(),
        ],
        None,
    )
    .context("dearmoring the MongoDB signing key failed")?;
    if let Err(e) = fs::remove_file(&key_tmp) {
        log_warn!("{TAG} Could not remove downloaded key file: {}", e);
    }

    // 2. Source list. Written through `sudo sh -c` because the list lives
    //    under /etc and the provisioner itself does not run as root.
    let codename = debian_codename();
    let deb_line = format!(
        "deb [ signed-by={keyring_path} ] https://repo.mongodb.org/apt/debian {codename}/mongodb-org/{series} main"
    );
    log_info!("{TAG} Writing source list: {}", list_path.cyan());
    let write_cmd = format!("echo '{deb_line}' > {list_path}");
    run_command(TAG, "sudo", &["sh", "-c", &write_cmd], None)
        .context("writing the MongoDB source list failed")?;

    // 3. Refresh against the new source and install the metapackage.
    run_command(TAG, "sudo", &["apt-get", "update"], None)
        .context("package index refresh failed after adding the MongoDB repository")?;
    run_command(TAG, "sudo", &["apt-get", "install", "-y", "mongodb-org"], None)
        .context("mongodb-org install failed")?;

    state.record_package("mongodb-org", "mongodb-org", &current_timestamp());

    Ok(StepOutcome::Changed)
}

/// Reads the Debian release codename from /etc/os-release.
fn debian_codename() -> String {
    match fs::read_to_string("/etc/os-release") {
        Ok(contents) => parse_codename(&contents).unwrap_or_else(|| {
            log_warn!(
                "{TAG} No VERSION_CODENAME in /etc/os-release; assuming '{}'.",
                FALLBACK_CODENAME
            );
            FALLBACK_CODENAME.to_string()
        }),
        Err(e) => {
            log_warn!(
                "{TAG} Could not read /etc/os-release ({}); assuming '{}'.",
                e,
                FALLBACK_CODENAME
            );
            FALLBACK_CODENAME.to_string()
        }
    }
}

/// Extracts VERSION_CODENAME from os-release style `KEY=value` contents.
fn parse_codename(contents: &str) -> Option<String> {
    contents
        .lines()
        .find_map(|line| line.strip_prefix("VERSION_CODENAME="))
        .map(|v| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codename_parses_plain_value() {
        let contents = "PRETTY_NAME=\"Debian GNU/Linux 12\"\nVERSION_CODENAME=bookworm\nID=debian\n";
        assert_eq!(parse_codename(contents).unwrap(), "bookworm");
    }

    #[test]
    fn codename_parses_quoted_value() {
        assert_eq!(
            parse_codename("VERSION_CODENAME=\"trixie\"\n").unwrap(),
            "trixie"
        );
    }

    #[test]
    fn missing_codename_yields_none() {
        assert!(parse_codename("ID=debian\nVERSION_ID=\"12\"\n").is_none());
    }
}
