//! Core domain types for watchlist feeds.

use std::fmt;

/// A single movie extracted from a watchlist feed
///
/// Both fields are kept as text: the year is whatever sat between the
/// parentheses of the item title and is not validated further.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchlistEntry {
    title: String,
    year: String,
}

impl WatchlistEntry {
    pub fn new(title: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year: year.into(),
        }
    }

    /// Extract an entry from an item title such as `"Dune (2021)"`.
    ///
    /// Returns `None` when the text is empty or lacks either parenthesis.
    /// The title is everything before the first `(`; the year is the segment
    /// after it, up to the next `(` if any, with `)` removed. Both are trimmed.
    ///
    /// ```
    /// use feed::WatchlistEntry;
    ///
    /// let entry = WatchlistEntry::from_item_title("Dune (2021)").unwrap();
    /// assert_eq!(entry.title(), "Dune");
    /// assert_eq!(entry.year(), "2021");
    ///
    /// assert!(WatchlistEntry::from_item_title("Untitled").is_none());
    /// ```
    pub fn from_item_title(text: &str) -> Option<Self> {
        if text.is_empty() || !text.contains('(') || !text.contains(')') {
            return None;
        }

        let mut segments = text.split('(');
        let title = segments.next()?.trim();
        let year = segments.next()?.replace(')', "");

        Some(Self::new(title, year.trim()))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn year(&self) -> &str {
        &self.year
    }
}

impl fmt::Display for WatchlistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.year)
    }
}
