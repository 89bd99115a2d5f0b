//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct and helpers to normalize inputs.

use common::types::Page;
use serde::Deserialize;

/// Pagination parameters
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    /// Clamp to sane defaults and convert to `u64`
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, 100);
        ((page - 1) as u64, per_page as u64)
    }

    /// Wrap one page of rows in the listing envelope.
    pub fn page_of<T>(self, items: Vec<T>, total: u64) -> Page<T> {
        let (idx, per) = self.normalize();
        Page::new(items, idx + 1, per, total)
    }

    /// Slice an already filtered and ordered collection.
    pub fn slice<T: Clone>(self, items: &[T]) -> Vec<T> {
        let (idx, per) = self.normalize();
        items.iter().skip((idx * per) as usize).take(per as usize).cloned().collect()
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}
