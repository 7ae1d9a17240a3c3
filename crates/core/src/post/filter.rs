//! Post listing filters.

use chrono::NaiveDate;
use serde::Deserialize;

use super::{Post, PostStatus};

/// Sort order for post listings. Creation order is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Oldest,
    Newest,
    /// Grouped by status: pending, processing, failed, completed.
    Status,
}

/// Filter for listing posts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    /// Case-insensitive match against content and account reference.
    pub search: Option<String>,
    /// Inclusive lower bound on the creation date (UTC).
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the creation date (UTC).
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub(crate) fn matches(&self, post: &Post) -> bool {
        if let Some(status) = self.status {
            if post.status != status {
                return false;
            }
        }

        let created = post.created_at.date_naive();
        if self.from.is_some_and(|from| created < from) {
            return false;
        }
        if self.to.is_some_and(|to| created > to) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                post.content.to_lowercase().contains(&needle)
                    || post.account_ref.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }

    pub(crate) fn sort(&self, posts: &mut [Post]) {
        match self.sort {
            SortOrder::Oldest => {}
            SortOrder::Newest => posts.reverse(),
            SortOrder::Status => posts.sort_by_key(|p| status_rank(p.status)),
        }
    }
}

fn status_rank(status: PostStatus) -> u8 {
    match status {
        PostStatus::Pending => 0,
        PostStatus::Processing => 1,
        PostStatus::Failed => 2,
        PostStatus::Completed => 3,
    }
}
