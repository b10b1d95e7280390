//! Client configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment variables. Later layers override earlier ones field by field.
//!
//! ```yaml
//! zenodo_url: https://sandbox.zenodo.org/api
//! community: hflav
//! gitlab_project: hflav/shared/hflav-fair
//! timeout_secs: 10
//! download_dir: /data/hflav
//! ```

use std::path::{Path, PathBuf};

use hflav_core::RecordId;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

const DEFAULT_ZENODO_URL: &str = "https://zenodo.org/api";
const DEFAULT_COMMUNITY: &str = "hflav";
const DEFAULT_TEMPLATE_RECORD: u64 = 12087575;
const DEFAULT_GITLAB_URL: &str = "https://gitlab.cern.ch";
const DEFAULT_GITLAB_PROJECT: &str = "hflav/shared/hflav-fair";
const DEFAULT_VERSION_TAG: &str = "main";

/// Configuration for the Zenodo and GitLab clients.
///
/// Custom `Debug` implementation redacts the `gitlab_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct HflavConfig {
    /// Zenodo REST API root. Default: <https://zenodo.org/api>
    pub zenodo_url: Url,
    /// Community every search is scoped to.
    pub community: String,
    /// Concept record whose versions are the HFLAV templates.
    pub template_concept_id: RecordId,
    /// GitLab instance hosting the companion schema repository.
    pub gitlab_url: Url,
    /// Full path of the companion repository, e.g. `group/subgroup/project`.
    pub gitlab_project: String,
    /// Sent as `PRIVATE-TOKEN` when present.
    pub gitlab_token: Option<Zeroizing<String>>,
    /// Tag used when a data file names no schema version.
    pub default_version_tag: String,
    /// Timeout for metadata requests, in seconds.
    pub timeout_secs: u64,
    /// Timeout for file downloads, in seconds.
    pub download_timeout_secs: u64,
    /// Where downloads land when the caller gives no destination.
    /// `None` means the current working directory.
    pub download_dir: Option<PathBuf>,
}

impl std::fmt::Debug for HflavConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HflavConfig")
            .field("zenodo_url", &self.zenodo_url)
            .field("community", &self.community)
            .field("template_concept_id", &self.template_concept_id)
            .field("gitlab_url", &self.gitlab_url)
            .field("gitlab_project", &self.gitlab_project)
            .field(
                "gitlab_token",
                &self.gitlab_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("default_version_tag", &self.default_version_tag)
            .field("timeout_secs", &self.timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("download_dir", &self.download_dir)
            .finish()
    }
}

/// Optional overrides read from a YAML file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    zenodo_url: Option<String>,
    community: Option<String>,
    template_concept_id: Option<u64>,
    gitlab_url: Option<String>,
    gitlab_project: Option<String>,
    gitlab_token: Option<String>,
    default_version_tag: Option<String>,
    timeout_secs: Option<u64>,
    download_timeout_secs: Option<u64>,
    download_dir: Option<PathBuf>,
}

impl HflavConfig {
    /// Built-in defaults pointing at production Zenodo and CERN GitLab.
    pub fn defaults() -> Result<Self, ConfigError> {
        Ok(Self {
            zenodo_url: parse_url("zenodo_url", DEFAULT_ZENODO_URL)?,
            community: DEFAULT_COMMUNITY.to_string(),
            template_concept_id: RecordId(DEFAULT_TEMPLATE_RECORD),
            gitlab_url: parse_url("gitlab_url", DEFAULT_GITLAB_URL)?,
            gitlab_project: DEFAULT_GITLAB_PROJECT.to_string(),
            gitlab_token: None,
            default_version_tag: DEFAULT_VERSION_TAG.to_string(),
            timeout_secs: 30,
            download_timeout_secs: 60,
            download_dir: None,
        })
    }

    /// Load configuration from defaults and environment variables.
    ///
    /// Variables:
    /// - `HFLAV_ZENODO_URL` (default: `https://zenodo.org/api`)
    /// - `HFLAV_COMMUNITY` (default: `hflav`)
    /// - `HFLAV_TEMPLATE_RECORD` (default: `12087575`)
    /// - `HFLAV_GITLAB_URL` (default: `https://gitlab.cern.ch`)
    /// - `HFLAV_GITLAB_PROJECT` (default: `hflav/shared/hflav-fair`)
    /// - `HFLAV_GITLAB_TOKEN` (optional)
    /// - `HFLAV_DEFAULT_TAG` (default: `main`)
    /// - `HFLAV_TIMEOUT_SECS` (default: 30)
    /// - `HFLAV_DOWNLOAD_TIMEOUT_SECS` (default: 60)
    /// - `HFLAV_DOWNLOAD_DIR` (default: current directory)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Defaults, then the YAML file at `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::defaults()?;
        if let Some(path) = path {
            config.apply_file(path)?;
        }
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Create a configuration pointing both clients at one mock server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `uri` cannot be parsed.
    pub fn local_mock(uri: &str) -> Result<Self, ConfigError> {
        let base = parse_url("mock", uri)?;
        Ok(Self {
            zenodo_url: base.clone(),
            gitlab_url: base,
            timeout_secs: 5,
            download_timeout_secs: 5,
            ..Self::defaults()?
        })
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(v) = file.zenodo_url {
            self.zenodo_url = parse_url("zenodo_url", &v)?;
        }
        if let Some(v) = file.gitlab_url {
            self.gitlab_url = parse_url("gitlab_url", &v)?;
        }
        if let Some(v) = file.community {
            self.community = v;
        }
        if let Some(v) = file.template_concept_id {
            self.template_concept_id = RecordId(v);
        }
        if let Some(v) = file.gitlab_project {
            self.gitlab_project = v;
        }
        if let Some(v) = file.gitlab_token {
            self.gitlab_token = Some(Zeroizing::new(v));
        }
        if let Some(v) = file.default_version_tag {
            self.default_version_tag = v;
        }
        if let Some(v) = file.timeout_secs {
            self.timeout_secs = v;
        }
        if let Some(v) = file.download_timeout_secs {
            self.download_timeout_secs = v;
        }
        if let Some(v) = file.download_dir {
            self.download_dir = Some(v);
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup("HFLAV_ZENODO_URL") {
            self.zenodo_url = parse_url("HFLAV_ZENODO_URL", &v)?;
        }
        if let Some(v) = lookup("HFLAV_GITLAB_URL") {
            self.gitlab_url = parse_url("HFLAV_GITLAB_URL", &v)?;
        }
        if let Some(v) = lookup("HFLAV_COMMUNITY") {
            self.community = v;
        }
        if let Some(v) = lookup("HFLAV_TEMPLATE_RECORD") {
            self.template_concept_id = RecordId(parse_number("HFLAV_TEMPLATE_RECORD", &v)?);
        }
        if let Some(v) = lookup("HFLAV_GITLAB_PROJECT") {
            self.gitlab_project = v;
        }
        if let Some(v) = lookup("HFLAV_GITLAB_TOKEN") {
            self.gitlab_token = Some(Zeroizing::new(v));
        }
        if let Some(v) = lookup("HFLAV_DEFAULT_TAG") {
            self.default_version_tag = v;
        }
        if let Some(v) = lookup("HFLAV_TIMEOUT_SECS") {
            self.timeout_secs = parse_number("HFLAV_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("HFLAV_DOWNLOAD_TIMEOUT_SECS") {
            self.download_timeout_secs = parse_number("HFLAV_DOWNLOAD_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("HFLAV_DOWNLOAD_DIR") {
            self.download_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

fn parse_number(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_point_at_production() {
        let cfg = HflavConfig::defaults().unwrap();
        assert_eq!(cfg.zenodo_url.as_str(), "https://zenodo.org/api");
        assert_eq!(cfg.community, "hflav");
        assert_eq!(cfg.template_concept_id, RecordId(12087575));
        assert_eq!(cfg.gitlab_project, "hflav/shared/hflav-fair");
        assert_eq!(cfg.default_version_tag, "main");
        assert_eq!((cfg.timeout_secs, cfg.download_timeout_secs), (30, 60));
        assert!(cfg.gitlab_token.is_none());
    }

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = HflavConfig::local_mock("http://127.0.0.1:9000").unwrap();
        assert_eq!(cfg.zenodo_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.gitlab_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.community, "hflav");
    }

    #[test]
    fn env_overrides_defaults() {
        let mut cfg = HflavConfig::defaults().unwrap();
        cfg.apply_env(env(&[
            ("HFLAV_ZENODO_URL", "https://sandbox.zenodo.org/api"),
            ("HFLAV_TEMPLATE_RECORD", "42"),
            ("HFLAV_TIMEOUT_SECS", "7"),
            ("HFLAV_DOWNLOAD_DIR", "/tmp/hflav"),
        ]))
        .unwrap();
        assert_eq!(cfg.zenodo_url.as_str(), "https://sandbox.zenodo.org/api");
        assert_eq!(cfg.template_concept_id, RecordId(42));
        assert_eq!(cfg.timeout_secs, 7);
        assert_eq!(cfg.download_dir, Some(PathBuf::from("/tmp/hflav")));
        assert_eq!(cfg.community, "hflav");
    }

    #[test]
    fn env_rejects_invalid_url_and_number() {
        let mut cfg = HflavConfig::defaults().unwrap();
        let err = cfg.apply_env(env(&[("HFLAV_GITLAB_URL", "not a url")]));
        assert!(matches!(err, Err(ConfigError::InvalidUrl(..))));

        let err = cfg.apply_env(env(&[("HFLAV_TIMEOUT_SECS", "soon")]));
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn yaml_file_overlays_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hflav.yaml");
        std::fs::write(
            &path,
            "community: hflav-test\ntimeout_secs: 12\ngitlab_token: secret\n",
        )
        .unwrap();

        let mut cfg = HflavConfig::defaults().unwrap();
        cfg.apply_file(&path).unwrap();
        assert_eq!(cfg.community, "hflav-test");
        assert_eq!(cfg.timeout_secs, 12);
        assert_eq!(cfg.gitlab_token.as_deref().map(String::as_str), Some("secret"));
        assert_eq!(cfg.download_timeout_secs, 60);
    }

    #[test]
    fn yaml_unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hflav.yaml");
        std::fs::write(&path, "comunity: typo\n").unwrap();

        let mut cfg = HflavConfig::defaults().unwrap();
        assert!(matches!(cfg.apply_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_read_error() {
        let mut cfg = HflavConfig::defaults().unwrap();
        let err = cfg.apply_file(Path::new("/no/such/hflav.yaml"));
        assert!(matches!(err, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn debug_redacts_token() {
        let mut cfg = HflavConfig::defaults().unwrap();
        cfg.gitlab_token = Some(Zeroizing::new("glpat-secret".to_string()));
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("glpat-secret"));
        assert!(printed.contains("[REDACTED]"));
    }
}
