use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{PopularityScheme, RatingBook};

/// A downloadable quality variant of a movie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality {
    /// Display label such as `720p`
    #[serde(rename = "quality", alias = "label")]
    pub label: String,
    pub url: String,
}

impl Quality {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Popularity data, in exactly one of the two supported schemes
#[derive(Debug, Clone, PartialEq)]
pub enum Popularity {
    /// Number of successful lookups
    Counter(u64),
    /// Star ratings from individual users
    Rating(RatingBook),
}

impl Popularity {
    /// Zero popularity in the given scheme
    pub fn empty(scheme: PopularityScheme) -> Self {
        match scheme {
            PopularityScheme::Counter => Popularity::Counter(0),
            PopularityScheme::Rating => Popularity::Rating(RatingBook::new()),
        }
    }

    pub fn scheme(&self) -> PopularityScheme {
        match self {
            Popularity::Counter(_) => PopularityScheme::Counter,
            Popularity::Rating(_) => PopularityScheme::Rating,
        }
    }

    /// Records a successful lookup. Returns true if anything changed.
    ///
    /// Only the counter scheme tracks views.
    pub fn record_view(&mut self) -> bool {
        match self {
            Popularity::Counter(count) => {
                *count = count.saturating_add(1);
                true
            }
            Popularity::Rating(_) => false,
        }
    }

    /// Converts into `scheme`, returning the converted value unchanged if it
    /// is already in that scheme.
    ///
    /// Counter values cannot be turned into ratings and are discarded; a
    /// rating book becomes a counter equal to its number of ratings.
    pub fn migrate(self, scheme: PopularityScheme) -> Self {
        match (self, scheme) {
            (Popularity::Counter(_), PopularityScheme::Rating) => {
                Popularity::Rating(RatingBook::new())
            }
            (Popularity::Rating(book), PopularityScheme::Counter) => {
                Popularity::Counter(book.count() as u64)
            }
            (same, _) => same,
        }
    }

    /// Primary and secondary sort keys for favorites, higher first
    pub fn rank(&self) -> (f64, usize) {
        match self {
            Popularity::Counter(count) => (*count as f64, 0),
            Popularity::Rating(book) => (book.average().unwrap_or(0.0), book.count()),
        }
    }
}

/// A cataloged movie
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    /// Unique (case-insensitively) title, stored with its original casing
    pub title: String,
    /// Download links in display order
    pub qualities: Vec<Quality>,
    pub popularity: Popularity,
    /// Fields from the catalog file this version does not interpret
    pub extra: Map<String, Value>,
}

impl MovieRecord {
    pub fn new(title: impl Into<String>, qualities: Vec<Quality>, scheme: PopularityScheme) -> Self {
        Self {
            title: title.into(),
            qualities,
            popularity: Popularity::empty(scheme),
            extra: Map::new(),
        }
    }

    /// Lower-cased title used for lookups
    pub fn key(&self) -> String {
        self.title.to_lowercase()
    }

    pub fn has_title(&self, title: &str) -> bool {
        self.key() == title.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Score, UserId};

    #[test]
    fn test_quality_wire_names() {
        let quality = Quality::new("720p", "https://example.com/a");
        let json = serde_json::to_value(&quality).unwrap();
        assert_eq!(json["quality"], "720p");

        let parsed: Quality =
            serde_json::from_str(r#"{"label": "1080p", "url": "https://x"}"#).unwrap();
        assert_eq!(parsed.label, "1080p");
    }

    #[test]
    fn test_record_view_only_counts_in_counter_scheme() {
        let mut counter = Popularity::empty(PopularityScheme::Counter);
        assert!(counter.record_view());
        assert!(counter.record_view());
        assert_eq!(counter, Popularity::Counter(2));

        let mut rating = Popularity::empty(PopularityScheme::Rating);
        assert!(!rating.record_view());
        assert_eq!(rating, Popularity::Rating(RatingBook::new()));
    }

    #[test]
    fn test_migrate_between_schemes() {
        let mut book = RatingBook::new();
        book.rate(UserId(1), Score::try_from(5).unwrap());
        book.rate(UserId(2), Score::try_from(2).unwrap());

        let counter = Popularity::Rating(book).migrate(PopularityScheme::Counter);
        assert_eq!(counter, Popularity::Counter(2));

        let rating = Popularity::Counter(17).migrate(PopularityScheme::Rating);
        assert_eq!(rating, Popularity::Rating(RatingBook::new()));

        let unchanged = Popularity::Counter(3).migrate(PopularityScheme::Counter);
        assert_eq!(unchanged, Popularity::Counter(3));
    }

    #[test]
    fn test_has_title_ignores_case() {
        let movie = MovieRecord::new("Inception", vec![], PopularityScheme::Counter);
        assert!(movie.has_title("inCEPtion"));
        assert!(movie.has_title("  inception "));
        assert!(!movie.has_title("incep"));
    }
}
