use std::collections::HashSet;

use strsim::normalized_levenshtein;

use crate::{
    config::Config,
    models::{Catalog, MovieRecord},
};

/// Thresholds for approximate title matching
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    /// Minimum similarity in `[0, 1]` for an approximate candidate
    pub cutoff: f64,
    /// Maximum number of approximate candidates
    pub max_fuzzy: usize,
}

impl MatchConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cutoff: config.suggestion_cutoff,
            max_fuzzy: config.max_fuzzy_suggestions,
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            cutoff: 0.4,
            max_fuzzy: 3,
        }
    }
}

/// Outcome of resolving a query against a catalog snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The query names a cataloged title, ignoring case
    ExactMatch(MovieRecord),
    /// Candidate titles, best first; empty when nothing is close
    Suggestions(Vec<MovieRecord>),
}

/// Trims and lower-cases a query
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Edit-distance similarity between two lower-cased titles, 1.0 when identical
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// Resolves a free-text query to a movie or a ranked suggestion list.
///
/// Suggestions list every title containing the query first, in catalog
/// order, followed by up to `max_fuzzy` titles whose similarity reaches
/// `cutoff`, best first with ties in catalog order. A title is listed at
/// most once. The catalog is not modified.
pub fn resolve(query: &str, catalog: &Catalog, config: &MatchConfig) -> Resolution {
    let normalized = normalize_query(query);
    if normalized.is_empty() {
        return Resolution::Suggestions(Vec::new());
    }

    let titles: Vec<String> = catalog.movies.iter().map(MovieRecord::key).collect();

    if let Some(pos) = titles.iter().position(|t| *t == normalized) {
        return Resolution::ExactMatch(catalog.movies[pos].clone());
    }

    let substring = titles
        .iter()
        .enumerate()
        .filter(|(_, title)| title.contains(normalized.as_str()))
        .map(|(i, _)| i);

    let mut scored: Vec<(usize, f64)> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| (i, similarity(&normalized, title)))
        .filter(|(_, score)| *score >= config.cutoff)
        .collect();
    // Stable sort, so equal scores stay in catalog order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    let approximate = scored.into_iter().take(config.max_fuzzy).map(|(i, _)| i);

    let mut seen = HashSet::new();
    let suggestions = substring
        .chain(approximate)
        .filter(|&i| seen.insert(titles[i].as_str()))
        .map(|i| catalog.movies[i].clone())
        .collect();

    Resolution::Suggestions(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PopularityScheme;

    fn catalog(titles: &[&str]) -> Catalog {
        Catalog::from_movies(
            titles
                .iter()
                .map(|t| MovieRecord::new(*t, vec![], PopularityScheme::Counter))
                .collect(),
        )
    }

    fn suggestion_titles(resolution: Resolution) -> Vec<String> {
        match resolution {
            Resolution::Suggestions(movies) => movies.into_iter().map(|m| m.title).collect(),
            Resolution::ExactMatch(movie) => panic!("unexpected exact match {}", movie.title),
        }
    }

    #[test]
    fn test_exact_match_ignores_case_and_whitespace() {
        let catalog = catalog(&["Inception", "Interstellar"]);
        let resolution = resolve("  inCEPTION ", &catalog, &MatchConfig::default());

        match resolution {
            Resolution::ExactMatch(movie) => assert_eq!(movie.title, "Inception"),
            other => panic!("expected exact match, got {:?}", other),
        }
    }

    #[test]
    fn test_every_title_resolves_exactly() {
        let catalog = catalog(&["Up", "Alien", "Aliens", "The Thing"]);
        for movie in &catalog.movies {
            let resolution = resolve(&movie.title.to_uppercase(), &catalog, &MatchConfig::default());
            assert_eq!(resolution, Resolution::ExactMatch(movie.clone()));
        }
    }

    #[test]
    fn test_partial_query_suggests_substring_match() {
        let catalog = catalog(&["Inception", "Interstellar"]);
        let titles = suggestion_titles(resolve("incep", &catalog, &MatchConfig::default()));

        assert_eq!(titles[0], "Inception");
        assert_eq!(titles.iter().filter(|t| *t == "Inception").count(), 1);
        if titles.contains(&"Interstellar".to_string()) {
            assert!(similarity("incep", "interstellar") >= 0.4);
        }
    }

    #[test]
    fn test_empty_catalog_yields_no_suggestions() {
        let resolution = resolve("anything", &Catalog::new(), &MatchConfig::default());
        assert_eq!(resolution, Resolution::Suggestions(vec![]));
    }

    #[test]
    fn test_blank_query_yields_no_suggestions() {
        let catalog = catalog(&["Up"]);
        assert_eq!(
            resolve("   ", &catalog, &MatchConfig::default()),
            Resolution::Suggestions(vec![])
        );
    }

    #[test]
    fn test_no_matches() {
        let catalog = catalog(&["Inception", "Interstellar"]);
        let titles = suggestion_titles(resolve("zzzzzzzzzzzzzzzz", &catalog, &MatchConfig::default()));
        assert!(titles.is_empty());
    }

    #[test]
    fn test_substring_matches_precede_approximate_ones() {
        // "matrix" is a substring of the last two; "matriz" is only close
        let catalog = catalog(&["Matriz", "The Matrix", "The Matrix Reloaded"]);
        let titles = suggestion_titles(resolve("matrix", &catalog, &MatchConfig::default()));

        assert_eq!(titles[0], "The Matrix");
        assert_eq!(titles[1], "The Matrix Reloaded");
        assert!(titles.contains(&"Matriz".to_string()));
        assert_eq!(titles.len(), 3);
    }

    #[test]
    fn test_at_most_max_fuzzy_approximate_candidates() {
        let catalog = catalog(&["Cat", "Bat", "Hat", "Mat", "Rat"]);
        let config = MatchConfig {
            cutoff: 0.4,
            max_fuzzy: 3,
        };
        let titles = suggestion_titles(resolve("pat", &catalog, &config));

        // All five are equally similar, ties keep catalog order
        assert_eq!(titles, vec!["Cat", "Bat", "Hat"]);
    }

    #[test]
    fn test_suggestions_never_repeat_titles() {
        let catalog = catalog(&["Alien", "Aliens", "Alien 3", "Alien Resurrection", "Allied"]);
        let titles = suggestion_titles(resolve("alie", &catalog, &MatchConfig::default()));

        let unique: HashSet<String> = titles.iter().map(|t| t.to_lowercase()).collect();
        assert_eq!(unique.len(), titles.len());
        assert!(titles.len() <= 4 + 3);
    }

    #[test]
    fn test_approximate_ranked_by_similarity() {
        let catalog = catalog(&["Jaws 2", "Jaw", "Jars"]);
        let config = MatchConfig {
            cutoff: 0.0,
            max_fuzzy: 3,
        };
        let titles = suggestion_titles(resolve("jaws", &catalog, &config));

        // "jaws 2" contains the query and comes first; then by similarity
        assert_eq!(titles[0], "Jaws 2");
        assert_eq!(titles[1], "Jaw");
        assert_eq!(titles[2], "Jars");
    }

    #[test]
    fn test_cutoff_is_respected() {
        let catalog = catalog(&["Interstellar"]);
        let strict = MatchConfig {
            cutoff: 0.99,
            max_fuzzy: 3,
        };
        assert!(suggestion_titles(resolve("interstelar", &catalog, &strict)).is_empty());

        let loose = MatchConfig {
            cutoff: 0.5,
            max_fuzzy: 3,
        };
        assert_eq!(
            suggestion_titles(resolve("interstelar", &catalog, &loose)),
            vec!["Interstellar"]
        );
    }
}
