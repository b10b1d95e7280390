//! Blocking client for the Zenodo records API.
//!
//! ## Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/records?communities=&q=&size=&page=&sort=` | Search |
//! | GET | `/records/{id}` | Fetch one record |
//! | GET | `links.versions` of the template concept record | List template versions |
//! | GET | `files[].links.self` | Download file content |
//!
//! Paths are relative to the configured API root (`https://zenodo.org/api`).

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use hflav_core::{
    FileReference, RecordDescriptor, RecordId, RecordRepository, SearchQuery, SourceError,
    TemplateDescriptor,
};
use reqwest::blocking::{Client, Response};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::HflavConfig;
use crate::http::{build_client, endpoint, status_error, transport_error};
use crate::retry::retry_send;

/// Size of each chunk copied from a download stream to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

// -- Wire types --------------------------------------------------------------
//
// Fields use `#[serde(default)]` so that records with sparse metadata still
// map; unknown fields are ignored.

#[derive(Debug, Deserialize)]
struct RecordJson {
    id: u64,
    #[serde(default)]
    doi: String,
    #[serde(default)]
    metadata: MetadataJson,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    #[serde(default)]
    files: Vec<FileJson>,
    #[serde(default)]
    links: RecordLinksJson,
}

#[derive(Debug, Default, Deserialize)]
struct MetadataJson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileJson {
    #[serde(default)]
    key: String,
    #[serde(default)]
    links: FileLinksJson,
}

#[derive(Debug, Default, Deserialize)]
struct FileLinksJson {
    #[serde(rename = "self", default)]
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecordLinksJson {
    #[serde(default)]
    versions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponseJson {
    #[serde(default)]
    hits: HitsJson,
}

#[derive(Debug, Default, Deserialize)]
struct HitsJson {
    #[serde(default)]
    hits: Vec<RecordJson>,
}

impl RecordJson {
    fn files(&self) -> Vec<FileReference> {
        self.files
            .iter()
            .map(|f| FileReference::new(&f.key, &f.links.content))
            .collect()
    }

    fn into_record(self) -> RecordDescriptor {
        let children = self.files();
        RecordDescriptor {
            id: RecordId(self.id),
            doi: self.doi,
            title: self.metadata.title,
            created_at: self.created,
            updated_at: self.updated,
            children,
        }
    }

    fn into_template(self) -> TemplateDescriptor {
        let files = self.files();
        TemplateDescriptor::new(
            RecordId(self.id),
            self.metadata.title,
            self.created,
            self.updated,
            self.metadata.version.unwrap_or_default(),
            &files,
        )
    }
}

// -- Client ------------------------------------------------------------------

/// Zenodo implementation of [`RecordRepository`].
#[derive(Debug, Clone)]
pub struct ZenodoClient {
    http: Client,
    api_root: Url,
    community: String,
    template_concept_id: RecordId,
    download_timeout: Duration,
    download_dir: Option<PathBuf>,
}

impl ZenodoClient {
    pub fn new(config: &HflavConfig) -> Result<Self, SourceError> {
        Ok(Self {
            http: build_client(config.timeout_secs, HeaderMap::new())?,
            api_root: config.zenodo_url.clone(),
            community: config.community.clone(),
            template_concept_id: config.template_concept_id,
            download_timeout: Duration::from_secs(config.download_timeout_secs),
            download_dir: config.download_dir.clone(),
        })
    }

    fn get(&self, url: &Url, name: &str) -> Result<Response, SourceError> {
        retry_send(name, || self.http.get(url.clone()).send())
            .map_err(|e| transport_error(name, e))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url, name: &str) -> Result<T, SourceError> {
        let resp = self.get(url, name)?;
        if !resp.status().is_success() {
            return Err(status_error(name, resp));
        }
        resp.json()
            .map_err(|e| SourceError::access(format!("invalid response from {name}"), e))
    }

    /// Every published version of the template concept record.
    pub fn template_versions(&self) -> Result<Vec<TemplateDescriptor>, SourceError> {
        let concept = self.template_concept_id;
        let url = endpoint(&self.api_root, &["records", &concept.to_string()])?;
        let concept_record: RecordJson = self.get_json(&url, "template record")?;

        let versions = concept_record.links.versions.ok_or_else(|| {
            SourceError::not_found(format!("no versions link found for record {concept}"))
        })?;
        let versions_url = Url::parse(&versions)
            .map_err(|e| SourceError::access("invalid versions link", e))?;

        let page: SearchResponseJson = self.get_json(&versions_url, "template versions")?;
        let templates: Vec<TemplateDescriptor> = page
            .hits
            .hits
            .into_iter()
            .map(RecordJson::into_template)
            .collect();
        tracing::debug!(concept = %concept, count = templates.len(), "listed template versions");
        Ok(templates)
    }

    fn destination(&self, dest: Option<&Path>, file_name: &str) -> Result<PathBuf, SourceError> {
        match dest {
            Some(path) if path.is_dir() => Ok(path.join(file_name)),
            Some(path) => Ok(path.to_path_buf()),
            None => {
                let dir = match &self.download_dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir()?,
                };
                Ok(dir.join(file_name))
            }
        }
    }
}

impl RecordRepository for ZenodoClient {
    fn search(&self, query: &SearchQuery) -> Result<Vec<RecordDescriptor>, SourceError> {
        let mut url = endpoint(&self.api_root, &["records"])?;
        url.query_pairs_mut()
            .extend_pairs(query.params(&self.community));

        let page: SearchResponseJson = self.get_json(&url, "record search")?;
        let records: Vec<RecordDescriptor> = page
            .hits
            .hits
            .into_iter()
            .map(RecordJson::into_record)
            .collect();
        tracing::info!(q = %query, hits = records.len(), "record search complete");
        Ok(records)
    }

    fn get_record(&self, id: RecordId) -> Result<RecordDescriptor, SourceError> {
        let id = id.require()?;
        let url = endpoint(&self.api_root, &["records", &id.to_string()])?;
        let resp = self.get(&url, "record fetch")?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::not_found(format!("record {id} not found")));
        }
        if !resp.status().is_success() {
            return Err(status_error("record fetch", resp));
        }
        let record: RecordJson = resp
            .json()
            .map_err(|e| SourceError::access(format!("invalid record {id}"), e))?;
        Ok(record.into_record())
    }

    fn resolve_template_for_date(
        &self,
        date: Option<DateTime<Utc>>,
    ) -> Result<TemplateDescriptor, SourceError> {
        let template = TemplateDescriptor::select_for_date(self.template_versions()?, date)?;
        tracing::info!(
            template = %template.record_id(),
            version = template.version(),
            "selected template"
        );
        Ok(template)
    }

    fn download(
        &self,
        record_id: RecordId,
        filename: &str,
        dest: Option<&Path>,
    ) -> Result<PathBuf, SourceError> {
        let record_id = record_id.require()?;
        if filename.is_empty() {
            return Err(SourceError::Precondition(
                "a file name must be provided".to_string(),
            ));
        }

        let record = self.get_record(record_id)?;
        let file = record.child(filename)?;
        if file.download_url().is_empty() {
            return Err(SourceError::not_found(format!(
                "no download link found for file '{filename}' in record {record_id}"
            )));
        }

        let resp = retry_send("file download", || {
            self.http
                .get(file.download_url())
                .timeout(self.download_timeout)
                .send()
        })
        .map_err(|e| transport_error("file download", e))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::not_found(format!(
                "file '{filename}' of record {record_id} is not downloadable"
            )));
        }
        if !resp.status().is_success() {
            return Err(status_error("file download", resp));
        }

        let out_path = self.destination(dest, file.name())?;
        let bytes = write_chunked(resp, &out_path)?;
        tracing::info!(
            record_id = %record_id,
            file = filename,
            path = %out_path.display(),
            bytes,
            "downloaded file"
        );
        Ok(out_path)
    }
}

/// Copy `body` to `path` in fixed-size chunks.
///
/// Bytes go to a temporary file beside `path` that is renamed into place
/// once the body is complete, so a failed transfer leaves nothing behind.
fn write_chunked(mut body: impl Read, path: &Path) -> Result<u64, SourceError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut out = tempfile::Builder::new()
        .prefix(".hflav-download-")
        .tempfile_in(dir)?;
    let mut buf = [0u8; DOWNLOAD_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = body
            .read(&mut buf)
            .map_err(|e| SourceError::access("download interrupted", e))?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        total += n as u64;
    }
    out.flush()?;
    out.persist(path).map_err(|e| SourceError::Io(e.error))?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_json() -> serde_json::Value {
        json!({
            "id": 13989054,
            "doi": "10.5281/zenodo.13989054",
            "created": "2024-10-24T09:12:01.512345+00:00",
            "updated": "2024-10-24T09:12:02+00:00",
            "metadata": {"title": "HFLAV tau branching fractions", "version": "v2"},
            "files": [
                {"key": "tau.schema.json", "links": {"self": "https://zenodo.org/f/1"}},
                {"key": "tau.json", "links": {"self": "https://zenodo.org/f/2"}}
            ],
            "links": {"versions": "https://zenodo.org/api/records/1/versions"}
        })
    }

    #[test]
    fn record_json_maps_fields() {
        let parsed: RecordJson = serde_json::from_value(record_json()).unwrap();
        let record = parsed.into_record();
        assert_eq!(record.id, RecordId(13989054));
        assert_eq!(record.doi, "10.5281/zenodo.13989054");
        assert_eq!(record.title, "HFLAV tau branching fractions");
        assert_eq!(record.children.len(), 2);
        assert_eq!(record.children[1].name(), "tau.json");
        assert_eq!(record.children[1].download_url(), "https://zenodo.org/f/2");
    }

    #[test]
    fn template_json_derives_markers() {
        let parsed: RecordJson = serde_json::from_value(record_json()).unwrap();
        let template = parsed.into_template();
        assert_eq!(template.version(), "v2");
        assert_eq!(
            template.embedded_schema_file().map(FileReference::name),
            Some("tau.schema.json")
        );
        assert_eq!(template.template_file().map(FileReference::name), Some("tau.json"));
    }

    #[test]
    fn sparse_record_still_maps() {
        let parsed: RecordJson = serde_json::from_value(json!({
            "id": 1,
            "created": "2024-01-01T00:00:00Z",
            "updated": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let record = parsed.into_record();
        assert!(record.doi.is_empty());
        assert!(record.children.is_empty());
    }

    /// Yields one full chunk, then fails like a dropped connection.
    struct Interrupted {
        sent: bool,
    }

    impl Read for Interrupted {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                ));
            }
            self.sent = true;
            buf.fill(b'{');
            Ok(buf.len())
        }
    }

    #[test]
    fn interrupted_download_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.schema");

        let err = write_chunked(Interrupted { sent: false }, &path).unwrap_err();

        assert!(matches!(err, SourceError::DataAccess { .. }), "got: {err}");
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn completed_download_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, b"stale").unwrap();

        write_chunked(&b"{\"k\": \"v\"}"[..], &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"k": "v"}"#);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn chunked_copy_handles_multiple_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let body = vec![7u8; DOWNLOAD_CHUNK_SIZE * 2 + 17];
        let written = write_chunked(body.as_slice(), &path).unwrap();
        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&path).unwrap(), body);
    }
}
