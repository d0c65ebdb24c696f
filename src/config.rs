use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(rename = "GITHUB_TOKEN", default)]
    pub token: String,
    /// Account that owns the target repository.
    #[serde(rename = "GITHUB_USERNAME", default)]
    pub username: String,
    #[serde(rename = "REPO_NAME", default)]
    pub repo: String,
    #[serde(rename = "BRANCH", default = "default_branch")]
    pub branch: String,
    /// Upload dotfiles and descend into dot-directories.
    #[serde(rename = "HIDDEN", default = "default_hidden")]
    pub hidden: bool,
    /// Commit message used for every written file.
    #[serde(rename = "COMMIT_MESSAGE", default = "default_message")]
    pub message: String,
    /// Base URL of the REST API, e.g. a GitHub Enterprise host.
    #[serde(rename = "API_URL", default = "default_api_url")]
    pub api_url: String,
}

impl UploadConfig {
    pub fn full_repo_name(&self) -> String {
        format!("{}/{}", self.username, self.repo)
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        for (key, value) in [
            ("GITHUB_TOKEN", &self.token),
            ("GITHUB_USERNAME", &self.username),
            ("REPO_NAME", &self.repo),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { key });
            }
        }
        if self.branch.trim().is_empty() {
            self.branch = default_branch();
        }
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("hidden", &self.hidden)
            .field("message", &self.message)
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn default_branch() -> String {
    String::from("main")
}

fn default_hidden() -> bool {
    true
}

fn default_message() -> String {
    String::from("Uploaded via gh-upload")
}

fn default_api_url() -> String {
    String::from("https://api.github.com")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("missing required configuration key `{key}`")]
    Missing { key: &'static str },
}

/// Loads and validates the configuration at `path`.
///
/// `.toml` files are read as TOML, everything else as JSON.
pub fn load_config(path: &Path) -> Result<UploadConfig, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&data, path)
}

fn parse_config(data: &str, path: &Path) -> Result<UploadConfig, ConfigError> {
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let config: UploadConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(data).map_err(|err| parse_error(err.to_string()))?,
        _ => serde_json::from_str(data).map_err(|err| parse_error(err.to_string()))?,
    };
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(data: &str) -> Result<UploadConfig, ConfigError> {
        parse_config(data, Path::new("config.json"))
    }

    #[test]
    fn applies_defaults() {
        let config = json(r#"{"GITHUB_TOKEN":"t","GITHUB_USERNAME":"octo","REPO_NAME":"site"}"#)
            .unwrap();
        assert_eq!(config.branch, "main");
        assert!(config.hidden);
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.full_repo_name(), "octo/site");
    }

    #[test]
    fn reads_optional_keys() {
        let config = json(
            r#"{"GITHUB_TOKEN":"t","GITHUB_USERNAME":"octo","REPO_NAME":"site",
                "BRANCH":"gh-pages","HIDDEN":false,"API_URL":"https://ghe.local/api/v3/"}"#,
        )
        .unwrap();
        assert_eq!(config.branch, "gh-pages");
        assert!(!config.hidden);
        assert_eq!(config.api_url, "https://ghe.local/api/v3");
    }

    #[test]
    fn missing_token_is_reported() {
        let err = json(r#"{"GITHUB_USERNAME":"octo","REPO_NAME":"site"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "GITHUB_TOKEN" }));
    }

    #[test]
    fn blank_repo_is_missing() {
        let err = json(r#"{"GITHUB_TOKEN":"t","GITHUB_USERNAME":"octo","REPO_NAME":"  "}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "REPO_NAME" }));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(json("{not json"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn toml_by_extension() {
        let config = parse_config(
            "GITHUB_TOKEN = \"t\"\nGITHUB_USERNAME = \"octo\"\nREPO_NAME = \"site\"\nHIDDEN = false\n",
            Path::new("upload.toml"),
        )
        .unwrap();
        assert_eq!(config.repo, "site");
        assert!(!config.hidden);
    }

    #[test]
    fn debug_redacts_token() {
        let config = json(r#"{"GITHUB_TOKEN":"secret","GITHUB_USERNAME":"o","REPO_NAME":"r"}"#)
            .unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}
