//! # Search Subcommand
//!
//! Queries the HFLAV community on Zenodo and prints the matching records.

use std::io::Write;

use anyhow::Result;
use clap::{Args, ValueEnum};

use hflav_core::{Combinator, QueryBuilder, SearchQuery, SortOption};
use hflav_resolve::HflavService;

/// Arguments for the `hflav search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query in Zenodo query-string syntax.
    pub query: Option<String>,

    /// Restrict to records whose title contains this phrase.
    #[arg(long)]
    pub title: Option<String>,

    /// Number of records per page.
    #[arg(long, default_value_t = 10)]
    pub size: u32,

    /// Page to fetch, starting at 1.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Sort order.
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,

    /// Reverse the sort order.
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    MostRecent,
    BestMatch,
}

impl From<SortArg> for SortOption {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::MostRecent => SortOption::MostRecent,
            SortArg::BestMatch => SortOption::BestMatch,
        }
    }
}

impl SearchArgs {
    /// Translate the flags into a search query.
    pub fn to_query(&self) -> SearchQuery {
        let mut builder = QueryBuilder::new().with_pagination(self.size, self.page);
        if let Some(q) = &self.query {
            builder = builder.with_raw(q.as_str());
        }
        if let Some(title) = &self.title {
            builder = builder.with_text("title", title.as_str());
        }
        if let Some(sort) = self.sort {
            builder = builder.order_by(sort.into(), self.desc);
        }
        let mut query = builder.build(Combinator::And);
        if self.sort.is_none() {
            query.sort = None;
        }
        query
    }
}

/// Execute the search subcommand.
pub fn run_search(args: &SearchArgs, service: &HflavService, out: &mut dyn Write) -> Result<u8> {
    let query = args.to_query();
    tracing::debug!(q = %query, size = query.size, page = query.page, "searching");
    let records = service.search_records(&query)?;
    crate::print_json(out, &records)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(query: Option<&str>, title: Option<&str>) -> SearchArgs {
        SearchArgs {
            query: query.map(str::to_string),
            title: title.map(str::to_string),
            size: 10,
            page: 1,
            sort: None,
            desc: false,
        }
    }

    #[test]
    fn free_text_and_title_are_joined_with_and() {
        let query = args(Some("charm"), Some("tau lifetime")).to_query();
        assert_eq!(query.query_string(), r#"(charm) AND (title:"tau lifetime")"#);
    }

    #[test]
    fn no_sort_flag_keeps_service_default() {
        let query = args(Some("charm"), None).to_query();
        assert_eq!(query.sort, None);
        assert_eq!(query.query_string(), "charm");
    }

    #[test]
    fn descending_sort_is_prefixed() {
        let mut a = args(None, None);
        a.sort = Some(SortArg::BestMatch);
        a.desc = true;
        assert_eq!(a.to_query().sort.as_deref(), Some("-bestmatch"));
    }

    #[test]
    fn blank_query_has_no_filter() {
        let query = args(Some("   "), None).to_query();
        assert!(query.filter.is_none());
    }
}
