//! Shared HTTP plumbing: client construction, URL building, and mapping of
//! transport and status failures into [`SourceError`].

use std::time::Duration;

use hflav_core::SourceError;
use reqwest::blocking::{Client, Response};
use reqwest::header::HeaderMap;
use url::Url;

/// Longest response body excerpt carried in an error.
const BODY_EXCERPT_LEN: usize = 256;

pub(crate) fn build_client(timeout_secs: u64, headers: HeaderMap) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(headers)
        .user_agent(concat!("hflav-client/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SourceError::access("failed to build HTTP client", e))
}

/// Append path segments to `base`, percent-encoding each one.
///
/// A segment containing `/` is encoded as a single segment (`%2F`), which is
/// how GitLab expects project and file paths.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, SourceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| SourceError::DataAccess {
            message: format!("base URL cannot carry a path: {base}"),
            details: None,
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn transport_error(endpoint: &str, e: reqwest::Error) -> SourceError {
    SourceError::access(format!("HTTP error calling {endpoint}"), e)
}

/// Consume a non-success response into a `DataAccess` error.
pub(crate) fn status_error(endpoint: &str, resp: Response) -> SourceError {
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    SourceError::DataAccess {
        message: format!("{endpoint} returned {status}"),
        details: Some(excerpt(&body)),
    }
}

pub(crate) fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_to_api_root() {
        let base = Url::parse("https://zenodo.org/api").unwrap();
        let url = endpoint(&base, &["records", "42"]).unwrap();
        assert_eq!(url.as_str(), "https://zenodo.org/api/records/42");
    }

    #[test]
    fn endpoint_on_bare_host() {
        let base = Url::parse("http://127.0.0.1:8080").unwrap();
        let url = endpoint(&base, &["records"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/records");
    }

    #[test]
    fn endpoint_encodes_slashes_within_a_segment() {
        let base = Url::parse("https://gitlab.cern.ch").unwrap();
        let url = endpoint(&base, &["api", "v4", "projects", "hflav/shared/hflav-fair"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.cern.ch/api/v4/projects/hflav%2Fshared%2Fhflav-fair"
        );
    }

    #[test]
    fn endpoint_rejects_cannot_be_a_base() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(endpoint(&base, &["records"]).is_err());
    }

    #[test]
    fn excerpt_truncates() {
        let long = "x".repeat(1000);
        assert_eq!(excerpt(&long).len(), BODY_EXCERPT_LEN);
        assert_eq!(excerpt("short"), "short");
    }
}
