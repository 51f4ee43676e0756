//! Page-number pagination
//!
//! Lists are split into fixed-size pages. Page numbers start at 1; asking for
//! a page past the last one is an error rather than an empty page.

use serde::Serialize;

/// One page of results with links to its neighbours
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Total rows matching the query, across all pages
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// The requested page was malformed or out of range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPage;

/// A validated page number and size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    /// Parse the raw `page` query value (absent means page 1)
    pub fn parse(raw: Option<&str>, size: u32) -> Result<Self, InvalidPage> {
        let number = match raw {
            None => 1,
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| InvalidPage)?,
        };
        if number == 0 {
            return Err(InvalidPage);
        }
        Ok(Self { number, size })
    }

    /// Reject pages beyond the last; page 1 is always valid
    pub fn check_in_range(&self, count: i64) -> Result<(), InvalidPage> {
        if self.number == 1 || self.number <= self.last_page(count) {
            Ok(())
        } else {
            Err(InvalidPage)
        }
    }

    /// Number of the last non-empty page (at least 1)
    pub fn last_page(&self, count: i64) -> u32 {
        let size = i64::from(self.size.max(1));
        let pages = (count.max(0) + size - 1) / size;
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    /// Assemble a page, linking neighbours under `path` with `filters` kept
    pub fn into_page<T>(
        self,
        count: i64,
        results: Vec<T>,
        path: &str,
        filters: &[(&str, String)],
    ) -> Page<T> {
        let last = self.last_page(count);
        let next = (self.number < last).then(|| page_link(path, filters, self.number + 1));
        let previous = (self.number > 1).then(|| page_link(path, filters, self.number - 1));

        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

fn page_link(path: &str, filters: &[(&str, String)], page: u32) -> String {
    let mut query: Vec<String> = filters
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    query.push(format!("page={page}"));
    format!("{}?{}", path, query.join("&"))
}
