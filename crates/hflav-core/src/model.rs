//! # Record and Template Descriptors
//!
//! Typed views over Zenodo records. A [`RecordDescriptor`] is one queryable
//! dataset entry with its file listing; a [`TemplateDescriptor`] is one
//! version of the HFLAV template record, whose files declare the expected
//! shape of data files published at or after its creation time.
//!
//! ## Capability markers
//!
//! A template carries up to two markers derived from its file listing:
//!
//! - `embedded_schema_file`: the first file whose name mentions `schema`.
//! - `template_file`: the first `.json` file that is not a schema file.
//!
//! The markers are fixed when the descriptor is constructed. Schema
//! resolution reads them to decide which strategies may run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SourceError;
use crate::identity::RecordId;

/// A retrievable artifact inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileReference {
    name: String,
    download_url: String,
}

impl FileReference {
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct download location. Empty when the source published none.
    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    /// Whether the file name signals a JSON Schema document.
    pub fn is_schema(&self) -> bool {
        self.name.to_ascii_lowercase().contains("schema")
    }

    /// Whether the file is a JSON document by extension.
    pub fn is_json(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".json")
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File(name='{}', download_url='{}')", self.name, self.download_url)
    }
}

/// One queryable dataset entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDescriptor {
    pub id: RecordId,
    pub doi: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Files in the order the source listed them.
    pub children: Vec<FileReference>,
}

impl RecordDescriptor {
    /// Look up a file by exact name.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::DataNotFound` when the record has no file with
    /// that name.
    pub fn child(&self, name: &str) -> Result<&FileReference, SourceError> {
        if self.children.is_empty() {
            return Err(SourceError::not_found(format!(
                "no files in record {}",
                self.id
            )));
        }
        self.children
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| {
                SourceError::not_found(format!(
                    "file '{name}' not found in record {}",
                    self.id
                ))
            })
    }
}

impl fmt::Display for RecordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Record(")?;
        writeln!(f, "  id={},", self.id)?;
        writeln!(f, "  title='{}',", self.title)?;
        writeln!(f, "  doi='{}',", self.doi)?;
        writeln!(f, "  created={},", self.created_at.to_rfc3339())?;
        writeln!(f, "  updated={},", self.updated_at.to_rfc3339())?;
        writeln!(f, "  children=[")?;
        for (i, child) in self.children.iter().enumerate() {
            writeln!(f, "    {}: {child},", i + 1)?;
        }
        write!(f, "  ]\n)")
    }
}

/// One version of the template record governing data file shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateDescriptor {
    record_id: RecordId,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: String,
    embedded_schema_file: Option<FileReference>,
    template_file: Option<FileReference>,
}

impl TemplateDescriptor {
    /// Build a descriptor, deriving the capability markers from `files`.
    pub fn new(
        record_id: RecordId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        version: impl Into<String>,
        files: &[FileReference],
    ) -> Self {
        let embedded_schema_file = files.iter().find(|f| f.is_schema()).cloned();
        let template_file = files
            .iter()
            .find(|f| f.is_json() && !f.is_schema())
            .cloned();
        Self {
            record_id,
            title: title.into(),
            created_at,
            updated_at,
            version: version.into(),
            embedded_schema_file,
            template_file,
        }
    }

    /// Build a descriptor with explicit markers.
    pub fn with_markers(
        record_id: RecordId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
        version: impl Into<String>,
        embedded_schema_file: Option<FileReference>,
        template_file: Option<FileReference>,
    ) -> Self {
        Self {
            record_id,
            title: title.into(),
            created_at,
            updated_at: created_at,
            version: version.into(),
            embedded_schema_file,
            template_file,
        }
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Explicit JSON Schema published by the template record, if any.
    pub fn embedded_schema_file(&self) -> Option<&FileReference> {
        self.embedded_schema_file.as_ref()
    }

    /// Raw example document published by the template record, if any.
    pub fn template_file(&self) -> Option<&FileReference> {
        self.template_file.as_ref()
    }

    /// Pick the template governing data created at `date`.
    ///
    /// Returns the template with the latest creation time not after `date`,
    /// or the globally latest template when `date` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::DataNotFound` when no template qualifies.
    pub fn select_for_date(
        templates: impl IntoIterator<Item = TemplateDescriptor>,
        date: Option<DateTime<Utc>>,
    ) -> Result<TemplateDescriptor, SourceError> {
        let selected = templates
            .into_iter()
            .filter(|t| date.map_or(true, |d| t.created_at <= d))
            .max_by_key(|t| t.created_at);

        selected.ok_or_else(|| match date {
            Some(d) => SourceError::not_found(format!(
                "no template versions found before date {}",
                d.to_rfc3339()
            )),
            None => SourceError::not_found("no template versions published"),
        })
    }
}

impl fmt::Display for TemplateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Template(rec_id={}, title='{}', version='{}', created={})",
            self.record_id,
            self.title,
            self.version,
            self.created_at.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn template(id: u64, created: DateTime<Utc>) -> TemplateDescriptor {
        TemplateDescriptor::with_markers(RecordId(id), "HFLAV template", created, "1", None, None)
    }

    fn record() -> RecordDescriptor {
        RecordDescriptor {
            id: RecordId(13989054),
            doi: "10.5281/zenodo.13989054".into(),
            title: "tau lifetime".into(),
            created_at: at(2024, 10, 21),
            updated_at: at(2024, 10, 22),
            children: vec![
                FileReference::new("hflav-tau-lifetime.json", "https://z/files/a"),
                FileReference::new("hflav-tau-mass.json", "https://z/files/b"),
            ],
        }
    }

    #[test]
    fn markers_derived_from_file_listing() {
        let files = vec![
            FileReference::new("README.md", "u0"),
            FileReference::new("hflav-template.json", "u1"),
            FileReference::new("hflav.schema.json", "u2"),
        ];
        let t = TemplateDescriptor::new(RecordId(1), "t", at(2024, 1, 1), at(2024, 1, 1), "2", &files);
        assert_eq!(t.embedded_schema_file().unwrap().name(), "hflav.schema.json");
        assert_eq!(t.template_file().unwrap().name(), "hflav-template.json");
    }

    #[test]
    fn schema_file_is_not_a_template_file() {
        let files = vec![FileReference::new("data-schema.json", "u")];
        let t = TemplateDescriptor::new(RecordId(1), "t", at(2024, 1, 1), at(2024, 1, 1), "2", &files);
        assert!(t.embedded_schema_file().is_some());
        assert!(t.template_file().is_none());
    }

    #[test]
    fn no_json_files_means_no_markers() {
        let files = vec![FileReference::new("notes.txt", "u")];
        let t = TemplateDescriptor::new(RecordId(1), "t", at(2024, 1, 1), at(2024, 1, 1), "2", &files);
        assert!(t.embedded_schema_file().is_none());
        assert!(t.template_file().is_none());
    }

    #[test]
    fn select_latest_not_after_date() {
        let templates = vec![
            template(1, at(2023, 1, 1)),
            template(2, at(2024, 1, 1)),
            template(3, at(2025, 1, 1)),
        ];
        let chosen = TemplateDescriptor::select_for_date(templates, Some(at(2024, 6, 1))).unwrap();
        assert_eq!(chosen.record_id(), RecordId(2));
    }

    #[test]
    fn select_includes_exact_creation_time() {
        let templates = vec![template(1, at(2023, 1, 1)), template(2, at(2024, 1, 1))];
        let chosen = TemplateDescriptor::select_for_date(templates, Some(at(2024, 1, 1))).unwrap();
        assert_eq!(chosen.record_id(), RecordId(2));
    }

    #[test]
    fn select_without_date_returns_latest() {
        let templates = vec![template(5, at(2025, 1, 1)), template(4, at(2023, 1, 1))];
        let chosen = TemplateDescriptor::select_for_date(templates, None).unwrap();
        assert_eq!(chosen.record_id(), RecordId(5));
    }

    #[test]
    fn select_before_first_template_is_not_found() {
        let templates = vec![template(1, at(2023, 1, 1))];
        let err = TemplateDescriptor::select_for_date(templates, Some(at(2020, 1, 1))).unwrap_err();
        assert!(matches!(err, SourceError::DataNotFound { .. }));
        assert!(TemplateDescriptor::select_for_date(Vec::new(), None).is_err());
    }

    #[test]
    fn child_lookup_by_exact_name() {
        let r = record();
        assert_eq!(
            r.child("hflav-tau-mass.json").unwrap().download_url(),
            "https://z/files/b"
        );
        let err = r.child("HFLAV-TAU-MASS.JSON").unwrap_err();
        assert!(matches!(err, SourceError::DataNotFound { .. }));
    }

    #[test]
    fn child_lookup_on_empty_record() {
        let mut r = record();
        r.children.clear();
        let err = r.child("anything.json").unwrap_err();
        assert!(err.to_string().contains("no files in record 13989054"));
    }

    #[test]
    fn record_display_lists_children() {
        let shown = record().to_string();
        assert!(shown.contains("id=13989054"));
        assert!(shown.contains("2: File(name='hflav-tau-mass.json'"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn templates(offsets: &[i64]) -> Vec<TemplateDescriptor> {
        offsets
            .iter()
            .enumerate()
            .map(|(i, days)| {
                TemplateDescriptor::with_markers(
                    RecordId(i as u64 + 1),
                    "HFLAV template",
                    epoch() + Duration::days(*days),
                    "1",
                    None,
                    None,
                )
            })
            .collect()
    }

    proptest! {
        /// The chosen template is the latest one not after the date, and
        /// nothing is chosen only when no template qualifies.
        #[test]
        fn selection_is_latest_not_after(
            offsets in prop::collection::vec(0i64..2000, 0..12),
            date_offset in prop::option::of(-10i64..2010),
        ) {
            let date = date_offset.map(|d| epoch() + Duration::days(d));
            let qualifying: Vec<DateTime<Utc>> = templates(&offsets)
                .iter()
                .map(TemplateDescriptor::created_at)
                .filter(|c| date.map_or(true, |d| *c <= d))
                .collect();

            match TemplateDescriptor::select_for_date(templates(&offsets), date) {
                Ok(chosen) => {
                    prop_assert!(date.map_or(true, |d| chosen.created_at() <= d));
                    prop_assert_eq!(Some(chosen.created_at()), qualifying.iter().max().copied());
                }
                Err(e) => {
                    prop_assert!(qualifying.is_empty(), "unexpected error: {}", e);
                    prop_assert!(matches!(e, SourceError::DataNotFound { .. }), "expected DataNotFound, got: {}", e);
                }
            }
        }
    }
}
