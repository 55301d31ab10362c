use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

use super::{MovieRecord, Popularity, PopularityScheme, Quality, RatingBook, UserId};

/// Key used by early catalog files for the view counter
const LEGACY_COUNTER_KEY: &str = "rating";

// ============================================================================
// On-disk schema
// ============================================================================

/// Catalog file as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default, deserialize_with = "deserialize_entries")]
    pub movies: Vec<MovieEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parses entries one at a time so a malformed entry is skipped instead of
/// failing the whole document
fn deserialize_entries<'de, D>(deserializer: D) -> Result<Vec<MovieEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    let mut entries = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<MovieEntry>(value) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!(index, error = %e, "Dropping malformed catalog entry"),
        }
    }
    Ok(entries)
}

/// One movie entry as stored on disk
///
/// Popularity fields are kept as raw JSON so that a bad value only resets
/// that entry's popularity; [`Catalog::from_document`] validates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub qualities: Vec<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Value>,
    /// Keyed by the decimal user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MovieEntry {
    /// Validates the entry and converts it into `scheme`
    fn into_record(mut self, scheme: PopularityScheme) -> MovieRecord {
        let stored = if self.ratings.is_some() || self.user_ratings.is_some() {
            let ratings = self.take_ratings();
            let user_ratings = self.take_user_ratings();
            let (book, repaired) = RatingBook::from_parts(ratings, user_ratings);
            if repaired {
                tracing::warn!(title = %self.title, "Repaired inconsistent rating data");
            }
            Popularity::Rating(book)
        } else {
            Popularity::Counter(self.take_counter())
        };

        if stored.scheme() != scheme {
            tracing::warn!(
                title = %self.title,
                from = %stored.scheme(),
                to = %scheme,
                "Migrating popularity scheme"
            );
        }

        MovieRecord {
            title: self.title,
            qualities: self.qualities,
            popularity: stored.migrate(scheme),
            extra: self.extra,
        }
    }

    /// `popularity`, else the legacy `rating` key; anything but a
    /// non-negative integer counts as zero
    fn take_counter(&mut self) -> u64 {
        let legacy = if self.extra.get(LEGACY_COUNTER_KEY).is_some_and(Value::is_u64) {
            self.extra.remove(LEGACY_COUNTER_KEY)
        } else {
            None
        };
        match self.popularity.take().or(legacy) {
            None => 0,
            Some(value) => value.as_u64().unwrap_or_else(|| {
                tracing::warn!(title = %self.title, value = %value, "Resetting invalid popularity");
                0
            }),
        }
    }

    fn take_ratings(&mut self) -> Vec<i64> {
        match self.ratings.take() {
            None => Vec::new(),
            Some(Value::Array(values)) => values
                .into_iter()
                .filter_map(|value| {
                    let score = value.as_i64();
                    if score.is_none() {
                        tracing::warn!(title = %self.title, value = %value, "Ignoring invalid rating");
                    }
                    score
                })
                .collect(),
            Some(other) => {
                tracing::warn!(title = %self.title, value = %other, "Ignoring invalid ratings list");
                Vec::new()
            }
        }
    }

    fn take_user_ratings(&mut self) -> BTreeMap<UserId, i64> {
        let entries = match self.user_ratings.take() {
            None => return BTreeMap::new(),
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                tracing::warn!(title = %self.title, value = %other, "Ignoring invalid user ratings");
                return BTreeMap::new();
            }
        };

        let mut user_ratings = BTreeMap::new();
        for (key, value) in entries {
            match (key.trim().parse::<i64>(), value.as_i64()) {
                (Ok(id), Some(score)) => {
                    user_ratings.insert(UserId(id), score);
                }
                _ => {
                    tracing::warn!(title = %self.title, key = %key, value = %value, "Ignoring invalid user rating");
                }
            }
        }
        user_ratings
    }
}

impl From<&MovieRecord> for MovieEntry {
    fn from(record: &MovieRecord) -> Self {
        let (popularity, ratings, user_ratings) = match &record.popularity {
            Popularity::Counter(count) => (Some(Value::from(*count)), None, None),
            Popularity::Rating(book) => (
                None,
                Some(Value::from(book.ratings().to_vec())),
                Some(Value::Object(
                    book.user_ratings()
                        .iter()
                        .map(|(user, score)| (user.to_string(), Value::from(*score)))
                        .collect(),
                )),
            ),
        };

        Self {
            title: record.title.clone(),
            qualities: record.qualities.clone(),
            popularity,
            ratings,
            user_ratings,
            extra: record.extra.clone(),
        }
    }
}

// ============================================================================
// In-memory catalog
// ============================================================================

/// Whether an upsert created a new movie or extended an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Ordered collection of movies with case-insensitively unique titles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub movies: Vec<MovieRecord>,
    /// Top-level fields from the catalog file this version does not interpret
    pub extra: Map<String, Value>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_movies(movies: Vec<MovieRecord>) -> Self {
        Self {
            movies,
            extra: Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    /// Builds a catalog from a stored document, normalizing every entry to `scheme`.
    ///
    /// Titles are trimmed. Entries with an empty title are dropped, as are
    /// later entries whose title repeats an earlier one ignoring case.
    pub fn from_document(document: CatalogDocument, scheme: PopularityScheme) -> Self {
        let mut seen = HashSet::new();
        let mut movies = Vec::with_capacity(document.movies.len());

        for mut entry in document.movies {
            entry.title = entry.title.trim().to_string();
            if entry.title.is_empty() {
                tracing::warn!("Dropping catalog entry without a title");
                continue;
            }
            if !seen.insert(entry.title.to_lowercase()) {
                tracing::warn!(title = %entry.title, "Dropping duplicate catalog entry");
                continue;
            }
            movies.push(entry.into_record(scheme));
        }

        Self {
            movies,
            extra: document.extra,
        }
    }

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            movies: self.movies.iter().map(MovieEntry::from).collect(),
            extra: self.extra.clone(),
        }
    }

    pub fn find(&self, title: &str) -> Option<&MovieRecord> {
        self.movies.iter().find(|m| m.has_title(title))
    }

    pub fn find_mut(&mut self, title: &str) -> Option<&mut MovieRecord> {
        self.movies.iter_mut().find(|m| m.has_title(title))
    }

    /// Creates `title` with `qualities`, or appends `qualities` to the
    /// existing movie with that title. Existing links are never deduplicated.
    pub fn upsert_qualities(
        &mut self,
        title: &str,
        qualities: Vec<Quality>,
        scheme: PopularityScheme,
    ) -> UpsertAction {
        match self.find_mut(title) {
            Some(movie) => {
                movie.qualities.extend(qualities);
                UpsertAction::Updated
            }
            None => {
                self.movies
                    .push(MovieRecord::new(title.trim(), qualities, scheme));
                UpsertAction::Created
            }
        }
    }

    /// The `limit` most popular movies, most popular first.
    ///
    /// Ties keep catalog order.
    pub fn favorites(&self, limit: usize) -> Vec<&MovieRecord> {
        let mut ranked: Vec<&MovieRecord> = self.movies.iter().collect();
        ranked.sort_by(|a, b| {
            let (a_primary, a_secondary) = a.popularity.rank();
            let (b_primary, b_secondary) = b.popularity.rank();
            b_primary
                .total_cmp(&a_primary)
                .then(b_secondary.cmp(&a_secondary))
        });
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Score;

    fn parse(json: &str) -> CatalogDocument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_counter_document_loads() {
        let doc = parse(
            r#"{"movies": [
                {"title": "Inception", "qualities": [{"quality": "720p", "url": "https://a"}], "popularity": 4}
            ]}"#,
        );
        let catalog = Catalog::from_document(doc, PopularityScheme::Counter);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.movies[0].popularity, Popularity::Counter(4));
        assert_eq!(catalog.movies[0].qualities[0].label, "720p");
    }

    #[test]
    fn test_legacy_counter_key_is_accepted() {
        let doc = parse(r#"{"movies": [{"title": "Up", "qualities": [], "rating": 9}]}"#);
        let catalog = Catalog::from_document(doc, PopularityScheme::Counter);

        assert_eq!(catalog.movies[0].popularity, Popularity::Counter(9));
        assert!(catalog.movies[0].extra.is_empty());

        let saved = serde_json::to_value(catalog.to_document()).unwrap();
        assert_eq!(saved["movies"][0]["popularity"], 9);
        assert!(saved["movies"][0].get("rating").is_none());
    }

    #[test]
    fn test_rating_document_loads() {
        let doc = parse(
            r#"{"movies": [
                {"title": "Up", "qualities": [], "ratings": [5, 3], "user_ratings": {"1": 5, "2": 3}}
            ]}"#,
        );
        let catalog = Catalog::from_document(doc, PopularityScheme::Rating);

        match &catalog.movies[0].popularity {
            Popularity::Rating(book) => {
                assert_eq!(book.count(), 2);
                assert_eq!(book.user_score(UserId(2)), Some(3));
            }
            other => panic!("unexpected popularity {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let doc = parse(
            r#"{"version": 2, "movies": [{"title": "Up", "qualities": [], "popularity": 1, "year": 2009}]}"#,
        );
        let catalog = Catalog::from_document(doc, PopularityScheme::Counter);
        let saved = serde_json::to_value(catalog.to_document()).unwrap();

        assert_eq!(saved["version"], 2);
        assert_eq!(saved["movies"][0]["year"], 2009);
    }

    #[test]
    fn test_invalid_entries_dropped() {
        let doc = parse(
            r#"{"movies": [
                {"title": "", "qualities": []},
                {"title": "Alien", "qualities": []},
                {"title": "ALIEN", "qualities": []},
                {"qualities": []}
            ]}"#,
        );
        let catalog = Catalog::from_document(doc, PopularityScheme::Counter);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.movies[0].title, "Alien");
    }

    #[test]
    fn test_bad_popularity_only_resets_that_entry() {
        let doc = parse(
            r#"{"movies": [
                {"title": "Inception", "qualities": [], "popularity": 4},
                {"title": "Up", "qualities": [], "popularity": -1},
                {"title": "Heat", "qualities": [], "popularity": 2.5}
            ]}"#,
        );
        let catalog = Catalog::from_document(doc, PopularityScheme::Counter);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.movies[0].popularity, Popularity::Counter(4));
        assert_eq!(catalog.movies[1].popularity, Popularity::Counter(0));
        assert_eq!(catalog.movies[2].popularity, Popularity::Counter(0));
    }

    #[test]
    fn test_bad_rating_values_are_ignored() {
        let doc = parse(
            r#"{"movies": [
                {"title": "Up", "qualities": [], "ratings": [4.5, 3], "user_ratings": {"1": 4.5, "2": 3, "x": 5}},
                {"title": "Heat", "qualities": [], "ratings": "many", "user_ratings": [1, 2]}
            ]}"#,
        );
        let catalog = Catalog::from_document(doc, PopularityScheme::Rating);

        assert_eq!(catalog.len(), 2);
        match &catalog.movies[0].popularity {
            Popularity::Rating(book) => {
                assert_eq!(book.count(), 1);
                assert_eq!(book.user_score(UserId(2)), Some(3));
            }
            other => panic!("unexpected popularity {:?}", other),
        }
        assert_eq!(
            catalog.movies[1].popularity,
            Popularity::Rating(RatingBook::new())
        );
    }

    #[test]
    fn test_malformed_entry_is_dropped_alone() {
        let doc = parse(
            r#"{"movies": [
                {"title": "Inception", "qualities": [{"quality": "720p", "url": "https://a"}]},
                {"title": 42, "qualities": "none"},
                "not an entry"
            ]}"#,
        );
        let catalog = Catalog::from_document(doc, PopularityScheme::Counter);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.movies[0].title, "Inception");
    }

    #[test]
    fn test_titles_are_trimmed_on_load() {
        let doc = parse(
            r#"{"movies": [
                {"title": "  Inception ", "qualities": []},
                {"title": "inception", "qualities": []}
            ]}"#,
        );
        let catalog = Catalog::from_document(doc, PopularityScheme::Counter);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.movies[0].title, "Inception");
        assert!(catalog.find("inception").is_some());
    }

    #[test]
    fn test_counter_entries_migrate_to_rating() {
        let doc = parse(r#"{"movies": [{"title": "Up", "qualities": [], "popularity": 12}]}"#);
        let catalog = Catalog::from_document(doc, PopularityScheme::Rating);

        assert_eq!(
            catalog.movies[0].popularity,
            Popularity::Rating(RatingBook::new())
        );
    }

    #[test]
    fn test_upsert_appends_without_dedup() {
        let mut catalog = Catalog::new();
        let link = Quality::new("720p", "https://a");

        let action =
            catalog.upsert_qualities("Inception", vec![link.clone()], PopularityScheme::Counter);
        assert_eq!(action, UpsertAction::Created);

        let action =
            catalog.upsert_qualities("inception", vec![link.clone()], PopularityScheme::Counter);
        assert_eq!(action, UpsertAction::Updated);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.movies[0].title, "Inception");
        assert_eq!(catalog.movies[0].qualities, vec![link.clone(), link]);
    }

    #[test]
    fn test_favorites_ordering() {
        let mut a = MovieRecord::new("A", vec![], PopularityScheme::Rating);
        let mut b = MovieRecord::new("B", vec![], PopularityScheme::Rating);
        let c = MovieRecord::new("C", vec![], PopularityScheme::Rating);
        let mut d = MovieRecord::new("D", vec![], PopularityScheme::Rating);

        if let Popularity::Rating(book) = &mut a.popularity {
            book.rate(UserId(1), Score::try_from(4).unwrap());
        }
        if let Popularity::Rating(book) = &mut b.popularity {
            book.rate(UserId(1), Score::try_from(5).unwrap());
        }
        if let Popularity::Rating(book) = &mut d.popularity {
            book.rate(UserId(1), Score::try_from(4).unwrap());
            book.rate(UserId(2), Score::try_from(4).unwrap());
        }

        let catalog = Catalog::from_movies(vec![a, b, c, d]);
        let titles: Vec<&str> = catalog
            .favorites(3)
            .iter()
            .map(|m| m.title.as_str())
            .collect();

        assert_eq!(titles, vec!["B", "D", "A"]);
    }
}
