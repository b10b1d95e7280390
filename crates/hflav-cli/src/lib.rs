//! # hflav-cli: Command-line Client for HFLAV Data
//!
//! Provides the `hflav` binary. Every subcommand prints its result to
//! stdout as pretty JSON so the output can be piped into `jq`.
//!
//! ## Subcommands
//!
//! - `hflav search`: Search records in the HFLAV Zenodo community.
//! - `hflav load`: Download a data file of a record and validate it.
//! - `hflav local`: Validate a data file already on disk.
//! - `hflav template`: Show the template in force at a date.
//! - `hflav infer`: Print the schema inferred from an example document.
//!
//! ```bash
//! hflav search "tau lifetime" --size 5
//! hflav -v load 13989054 hflav_averages.json --dest ./data
//! hflav template --date 2024-06-01
//! ```

pub mod data;
pub mod search;
pub mod template;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use hflav_client::{GitLabClient, HflavConfig, ZenodoClient};
use hflav_resolve::{HflavService, SchemaResolutionChain};

/// Wire the HTTP clients, the resolution chain and the service together.
pub fn build_service(config: &HflavConfig) -> Result<HflavService> {
    let records: Arc<dyn hflav_core::RecordRepository> =
        Arc::new(ZenodoClient::new(config).context("building Zenodo client")?);
    let schemas = Arc::new(GitLabClient::new(config).context("building GitLab client")?);

    let mut chain = SchemaResolutionChain::new(Arc::clone(&records), schemas)
        .with_default_tag(config.default_version_tag.clone());
    if let Some(dir) = &config.download_dir {
        chain = chain.with_download_dir(dir.clone());
    }
    Ok(HflavService::with_chain(records, chain))
}

/// Write `value` as pretty JSON followed by a newline.
pub fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("serializing output")?;
    writeln!(out)?;
    Ok(())
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date '{s}': expected YYYY-MM-DD or RFC 3339"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn plain_date_is_midnight_utc() {
        assert_eq!(
            parse_date("2024-06-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rfc3339_offset_is_normalised() {
        assert_eq!(
            parse_date("2024-06-01T12:00:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn garbage_date_is_rejected() {
        let err = parse_date("June 1st").unwrap_err();
        assert!(err.contains("June 1st"));
    }

    #[test]
    fn json_output_ends_with_newline() {
        let mut out = Vec::new();
        print_json(&mut out, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn service_builds_from_defaults_without_network() {
        let config = HflavConfig::defaults().unwrap();
        assert!(build_service(&config).is_ok());
    }
}
