//! Blocking client for the companion GitLab repository that publishes
//! versioned JSON Schemas for HFLAV data files.
//!
//! ## Endpoints (GitLab REST v4)
//!
//! All paths are relative to `{gitlab}/api/v4/projects/{url-encoded project}`.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/repository/tree?path=&per_page=&page=` | List one directory |
//! | GET | `/repository/tags/{tag}` | Look up a tag |
//! | GET | `/repository/files/{url-encoded path}/raw?ref=` | Raw file content |
//!
//! ## Schema search
//!
//! The tree is walked one directory at a time. Entries of each directory are
//! visited in lexicographic path order and subdirectories are descended into
//! as they are met, so the first schema file found is the same on every run
//! regardless of the order the server lists entries in.

use hflav_core::{SchemaRepository, SourceError};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::HflavConfig;
use crate::http::{build_client, endpoint, excerpt, status_error, transport_error};
use crate::retry::retry_send;

/// File name suffixes recognised as schema documents.
pub const SCHEMA_SUFFIXES: &[&str] = &[".schema", ".schema.json"];

const TREE_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
struct TreeEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct TagJson {
    name: String,
}

/// GitLab implementation of [`SchemaRepository`].
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: Client,
    project_root: Url,
}

impl GitLabClient {
    pub fn new(config: &HflavConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.gitlab_token {
            let value = HeaderValue::from_str(token.as_str()).map_err(|_| SourceError::DataAccess {
                message: "GitLab token contains invalid header characters".to_string(),
                details: None,
            })?;
            headers.insert("private-token", value);
        }
        let project_root = endpoint(
            &config.gitlab_url,
            &["api", "v4", "projects", &config.gitlab_project],
        )?;
        Ok(Self {
            http: build_client(config.timeout_secs, headers)?,
            project_root,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, SourceError> {
        endpoint(&self.project_root, segments)
    }

    fn get(&self, url: &Url, name: &str) -> Result<Response, SourceError> {
        retry_send(name, || self.http.get(url.clone()).send())
            .map_err(|e| transport_error(name, e))
    }

    /// List the entries of one directory on the default branch.
    fn list_dir(&self, dir: &str) -> Result<Vec<TreeEntry>, SourceError> {
        let not_found = |details: String| SourceError::SchemaNotFound {
            details: Some(details),
        };

        let mut entries = Vec::new();
        let mut page = 1u32;
        loop {
            let mut url = self.url(&["repository", "tree"])?;
            {
                let mut q = url.query_pairs_mut();
                if !dir.is_empty() {
                    q.append_pair("path", dir);
                }
                q.append_pair("per_page", &TREE_PAGE_SIZE.to_string());
                q.append_pair("page", &page.to_string());
            }

            let resp = self
                .get(&url, "repository tree")
                .map_err(|e| not_found(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(not_found(format!(
                    "listing '{dir}' returned {}",
                    resp.status()
                )));
            }
            let next_page = resp
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok());
            let batch: Vec<TreeEntry> = resp
                .json()
                .map_err(|e| not_found(format!("unreadable tree listing for '{dir}': {e}")))?;
            entries.extend(batch);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Path of the first schema file in a depth-first walk from `dir`.
    fn find_schema_in(&self, dir: &str) -> Result<Option<String>, SourceError> {
        for entry in self.list_dir(dir)? {
            match entry.kind.as_str() {
                "blob" if is_schema_file(&entry.name) => return Ok(Some(entry.path)),
                "tree" => {
                    if let Some(found) = self.find_schema_in(&entry.path)? {
                        return Ok(Some(found));
                    }
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Locate the schema file in the repository tree.
    ///
    /// # Errors
    ///
    /// `SourceError::SchemaNotFound` when the walk fails or finds nothing.
    pub fn find_schema_path(&self) -> Result<String, SourceError> {
        self.find_schema_in("")?
            .ok_or_else(|| SourceError::SchemaNotFound {
                details: Some("no file with a schema suffix in the repository tree".to_string()),
            })
    }

    /// Resolve `tag` to the tag name GitLab reports.
    ///
    /// # Errors
    ///
    /// `SourceError::VersionTagNotFound` for any HTTP error status,
    /// `SourceError::DataAccess` if the server cannot be reached.
    pub fn tag_name(&self, tag: &str) -> Result<String, SourceError> {
        let url = self.url(&["repository", "tags", tag])?;
        let resp = self.get(&url, "tag lookup")?;
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(SourceError::VersionTagNotFound {
                tag: tag.to_string(),
                details: Some(format!("tag lookup returned {status}")),
            });
        }
        let parsed: TagJson = resp.json().map_err(|e| SourceError::InvalidContent {
            source_name: format!("tag '{tag}'"),
            reason: e.to_string(),
        })?;
        Ok(parsed.name)
    }

    /// Raw content of `path` at `git_ref`.
    pub fn file_content(&self, path: &str, git_ref: &str) -> Result<String, SourceError> {
        let mut url = self.url(&["repository", "files", path, "raw"])?;
        url.query_pairs_mut().append_pair("ref", git_ref);

        let resp = self.get(&url, "file content")?;
        if resp.status() == StatusCode::NOT_FOUND {
            let body = resp.text().unwrap_or_default();
            return Err(SourceError::SchemaNotFound {
                details: Some(format!("'{path}' absent at '{git_ref}': {}", excerpt(&body))),
            });
        }
        if !resp.status().is_success() {
            return Err(status_error("file content", resp));
        }
        resp.text()
            .map_err(|e| transport_error("file content", e))
    }
}

impl SchemaRepository for GitLabClient {
    fn schema_for_version(&self, version_tag: &str) -> Result<Value, SourceError> {
        let path = self.find_schema_path()?;
        let tag = self.tag_name(version_tag)?;
        tracing::info!(path = %path, tag = %tag, "fetching schema from GitLab");

        let content = self.file_content(&path, &tag)?;
        serde_json::from_str(&content).map_err(|e| SourceError::InvalidContent {
            source_name: path,
            reason: e.to_string(),
        })
    }
}

/// Whether `name` carries one of the [`SCHEMA_SUFFIXES`].
pub fn is_schema_file(name: &str) -> bool {
    SCHEMA_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}
