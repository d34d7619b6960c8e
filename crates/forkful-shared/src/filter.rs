//! Search view over a loaded restaurant collection.
//!
//! The filter is a single pass of case-insensitive substring checks over
//! name, tags and recommended dishes. It never reorders and never copies:
//! the result borrows from the input and is recomputed on every query.

use serde::Deserialize;

use crate::models::{Restaurant, RestaurantWithImages};

/// Anything the collection filter can match against.
pub trait Searchable {
    fn name(&self) -> &str;
    fn tags(&self) -> &[String];
    fn dishes(&self) -> &[String];
}

impl Searchable for Restaurant {
    fn name(&self) -> &str {
        &self.name
    }

    fn tags(&self) -> &[String] {
        self.tags.as_slice()
    }

    fn dishes(&self) -> &[String] {
        self.recommended_dishes.as_slice()
    }
}

impl Searchable for RestaurantWithImages {
    fn name(&self) -> &str {
        self.restaurant.name()
    }

    fn tags(&self) -> &[String] {
        self.restaurant.tags()
    }

    fn dishes(&self) -> &[String] {
        self.restaurant.dishes()
    }
}

/// Which fields a query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFields {
    /// Name, tags and recommended dishes.
    #[default]
    All,
    /// Name only (owner dashboard).
    Name,
}

/// A trimmed, lowercased, non-empty search needle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// `None` for blank input, which means "no filtering".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn contained_in(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.0)
    }

    pub fn matches_name<T: Searchable + ?Sized>(&self, record: &T) -> bool {
        self.contained_in(record.name())
    }

    pub fn matches<T: Searchable + ?Sized>(&self, record: &T) -> bool {
        self.matches_name(record)
            || record.tags().iter().any(|t| self.contained_in(t))
            || record.dishes().iter().any(|d| self.contained_in(d))
    }

    pub fn matches_fields<T: Searchable + ?Sized>(&self, record: &T, fields: SearchFields) -> bool {
        match fields {
            SearchFields::All => self.matches(record),
            SearchFields::Name => self.matches_name(record),
        }
    }
}

/// Records whose name, tags or dishes contain `query`, in input order.
///
/// A blank query returns every record.
pub fn filter<'a, T: Searchable>(records: &'a [T], query: &str) -> Vec<&'a T> {
    filter_with(records, query, SearchFields::All)
}

/// [`filter`] restricted to the given fields.
pub fn filter_with<'a, T: Searchable>(
    records: &'a [T],
    query: &str,
    fields: SearchFields,
) -> Vec<&'a T> {
    match SearchQuery::parse(query) {
        None => records.iter().collect(),
        Some(q) => records
            .iter()
            .filter(|r| q.matches_fields(*r, fields))
            .collect(),
    }
}
