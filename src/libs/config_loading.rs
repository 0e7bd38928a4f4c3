use crate::schema::{MainConfig, PackagesConfig, RepoConfig, ToolchainConfig};
use crate::utils::expand_tilde;
use crate::{log_debug, log_error, log_info, log_warn};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// A struct holding all the parsed catalog data for one provisioning run.
/// This keeps the orchestrator's signature manageable instead of threading
/// three separate `Option`s through every call.
pub struct ParsedConfigs {
    pub packages: Option<PackagesConfig>,
    pub toolchains: Option<ToolchainConfig>,
    pub repos: Option<RepoConfig>,
}

/// Helper to load an individual catalog file (e.g. `packages.yaml`).
///
/// Abstracts the repetitive read-expand-deserialize sequence and gives each
/// outcome a clear log line: parsed, missing (skippable), or malformed.
///
/// # Type Parameters
/// * `T`: The catalog struct to deserialize into.
///
/// # Arguments
/// * `path_option`: The path from `config.yaml`, when the section is present.
/// * `base_dir`: Directory of the master file; relative paths resolve against it.
/// * `config_name`: Human-readable name for logs (e.g. "packages").
pub fn load_individual_config<T>(
    path_option: Option<&String>,
    base_dir: &Path,
    config_name: &str,
) -> Option<T>
where
    T: serde::de::DeserializeOwned + std::fmt::Debug,
{
    let path_str = path_option?;
    let expanded = expand_tilde(path_str);
    // Paths in config.yaml are usually bare filenames next to it.
    let path = if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    };

    log_debug!(
        "Attempting to load {} catalog from: {}",
        config_name,
        path.display()
    );
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_yaml::from_str::<T>(&contents) {
            Ok(cfg) => {
                log_debug!(
                    "Successfully loaded {} catalog from {}",
                    config_name,
                    path.display().to_string().green()
                );
                Some(cfg)
            }
            Err(e) => {
                log_error!(
                    "Failed to parse {} catalog at {}: {}. Please check its YAML syntax.",
                    config_name,
                    path.display().to_string().red(),
                    e
                );
                None
            }
        },
        Err(_) => {
            log_warn!(
                "{} catalog not found or unreadable at {}. Skipping that section.",
                config_name.yellow(),
                path.display().to_string().yellow()
            );
            None
        }
    }
}

/// Loads all catalogs via the master `config.yaml` index.
///
/// Returns `None` when the master file itself cannot be read or parsed;
/// the orchestrator treats that as a fatal condition, since without the
/// index there is nothing to provision.
pub fn load_master_configs(config_path_resolved: &PathBuf) -> Option<ParsedConfigs> {
    log_debug!(
        "Loading catalogs as per master config file: {}",
        config_path_resolved.display().to_string().blue()
    );

    let main_cfg_content = match fs::read_to_string(config_path_resolved) {
        Ok(c) => c,
        Err(e) => {
            log_error!(
                "Failed to read config.yaml at {}: {}. Run 'osintbox generate' to create the default catalog.",
                config_path_resolved.display().to_string().red(),
                e
            );
            return None;
        }
    };

    let main_cfg: MainConfig = match serde_yaml::from_str(&main_cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => {
            log_error!(
                "Failed to parse config.yaml at {}: {}. Please check your YAML syntax.",
                config_path_resolved.display().to_string().red(),
                e
            );
            return None;
        }
    };
    log_debug!("MainConfig loaded: {:?}", main_cfg);

    let base_dir = config_path_resolved
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Some(ParsedConfigs {
        packages: load_individual_config(main_cfg.packages.as_ref(), &base_dir, "packages"),
        toolchains: load_individual_config(main_cfg.toolchains.as_ref(), &base_dir, "toolchains"),
        repos: load_individual_config(main_cfg.repos.as_ref(), &base_dir, "repos"),
    })
}

/// Loads a single catalog file directly, bypassing `config.yaml`.
///
/// Handles the case where the user points `--config` straight at one of the
/// individual files (e.g. `repos.yaml`) to provision just that section.
pub fn load_single_config(
    config_path_resolved: &PathBuf,
    config_filename: &str,
) -> Option<ParsedConfigs> {
    log_info!(
        "Loading catalog from single file: {}",
        config_path_resolved.display().to_string().blue()
    );

    let contents = match fs::read_to_string(config_path_resolved) {
        Ok(c) => c,
        Err(e) => {
            log_error!(
                "Failed to read catalog file {}: {}. Please check its existence and permissions.",
                config_path_resolved.display().to_string().red(),
                e
            );
            return None;
        }
    };

    let mut parsed = ParsedConfigs {
        packages: None,
        toolchains: None,
        repos: None,
    };

    match config_filename {
        "packages.yaml" => {
            parsed.packages = match serde_yaml::from_str(&contents) {
                Ok(cfg) => {
                    log_info!("[Packages] Successfully parsed packages.yaml.");
                    Some(cfg)
                }
                Err(e) => {
                    log_error!("Failed to parse packages.yaml: {}", e);
                    return None;
                }
            }
        }
        "toolchains.yaml" => {
            parsed.toolchains = match serde_yaml::from_str(&contents) {
                Ok(cfg) => {
                    log_info!("[Toolchains] Successfully parsed toolchains.yaml.");
                    Some(cfg)
                }
                Err(e) => {
                    log_error!("Failed to parse toolchains.yaml: {}", e);
                    return None;
                }
            }
        }
        "repos.yaml" => {
            parsed.repos = match serde_yaml::from_str(&contents) {
                Ok(cfg) => {
                    log_info!("[Repos] Successfully parsed repos.yaml.");
                    Some(cfg)
                }
                Err(e) => {
                    log_error!("Failed to parse repos.yaml: {}", e);
                    return None;
                }
            }
        }
        other => {
            log_error!(
                "Unsupported single catalog file: '{}'. Expected 'packages.yaml', 'toolchains.yaml', or 'repos.yaml'.",
                other.red()
            );
            return None;
        }
    }

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn single_repos_catalog_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repos.yaml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(
            f,
            "repos:\n  - url: https://github.com/laramies/theHarvester.git\n    venv: theHarvester-env"
        )
        .unwrap();

        let parsed = load_single_config(&path, "repos.yaml").unwrap();
        let repos = parsed.repos.unwrap();
        assert_eq!(repos.repos.len(), 1);
        assert_eq!(repos.repos[0].venv.as_deref(), Some("theHarvester-env"));
        assert!(parsed.packages.is_none());
    }

    #[test]
    fn unsupported_single_catalog_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery.yaml");
        fs::write(&path, "repos: []").unwrap();
        assert!(load_single_config(&path, "mystery.yaml").is_none());
    }

    #[test]
    fn master_config_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "packages: packages.yaml\ntoolchains: toolchains.yaml\nrepos: repos.yaml\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("packages.yaml"),
            "apt:\n  - git\n  - curl\n",
        )
        .unwrap();
        // toolchains.yaml deliberately absent: that section must load as None
        // without failing the whole catalog.
        fs::write(dir.path().join("repos.yaml"), "repos: []\n").unwrap();

        let parsed = load_master_configs(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(parsed.packages.unwrap().apt, vec!["git", "curl"]);
        assert!(parsed.toolchains.is_none());
        assert!(parsed.repos.unwrap().repos.is_empty());
    }

    #[test]
    fn missing_master_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_master_configs(&dir.path().join("config.yaml")).is_none());
    }
}
