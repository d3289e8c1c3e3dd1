use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusCodes {
    List(Vec<u16>),
    Csv(String),
}

impl StatusCodes {
    pub fn to_set(&self) -> Result<HashSet<u16>, String> {
        match self {
            StatusCodes::List(codes) => {
                crate::utils::parse_u16_set_csv(
                    &codes.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(","),
                )
            }
            StatusCodes::Csv(raw) => crate::utils::parse_u16_set_csv(raw),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    #[serde(alias = "domain")]
    pub url: Option<String>,
    pub wordlist: Option<String>,
    #[serde(alias = "default_threads", alias = "concurrency")]
    pub threads: Option<usize>,
    #[serde(alias = "default_delay")]
    pub delay: Option<f64>,
    #[serde(alias = "default_timeout")]
    pub timeout: Option<u64>,
    #[serde(alias = "default_user_agent")]
    pub user_agent: Option<String>,
    pub verify_tls: Option<bool>,
    #[serde(alias = "default_status_codes")]
    pub status_codes: Option<StatusCodes>,
    pub rate: Option<u32>,
    pub progress_every: Option<usize>,
    pub workers: Option<usize>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub log_file: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".dirforcer").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn parse_config(contents: &str, origin: &str) -> Result<ConfigFile, String> {
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents)
        .map_err(|e| format!("failed to parse config '{origin}': {e}"))
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, &path.display().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# dirforcer config
#
# Location (default):
#   ~/.dirforcer/config.yml
#
# Command-line flags override every value set here.

# Target (optional, usually given with --url)
# url: https://example.com/app/
# wordlist: ./wordlists/common.txt

# Performance
threads: 10
delay: 0
timeout: 10
# rate: 100
workers: 10
progress_every: 10

# HTTP
# user_agent: "Mozilla/5.0 ..."
verify_tls: true

# Matching
status_codes: "200,301,302,403,401"

# Output (optional)
# output: ./results.json
# output_format: json
# log_file: ./dirforcer.log
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
