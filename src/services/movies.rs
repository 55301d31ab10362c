use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::CatalogStore,
    models::{
        MovieRecord, Popularity, PopularityScheme, Quality, RatingSummary, Score, UpsertAction,
        UserId,
    },
    services::{
        resolver::{normalize_query, resolve, MatchConfig, Resolution},
        session::{SelectionError, SessionStore},
    },
};

const URL_SCHEMES: [&str; 2] = ["http://", "https://"];

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// No movie name was given
    MissingQuery,
    Found(MovieRecord),
    /// No exact match; the list is now pending for `/confirm`
    Suggestions { query: String, movies: Vec<MovieRecord> },
    NotFound { query: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    /// No index was given
    MissingIndex,
    Found(MovieRecord),
    Rejected(SelectionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddMovieError {
    /// Caller is not the owner
    Unauthorized,
    /// Missing name or links
    Usage,
    /// A link entry is not of the form `label:url`
    InvalidFormat(String),
    /// A link does not start with `http://` or `https://`
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMovieResult {
    pub title: String,
    pub action: UpsertAction,
    pub added: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateOutcome {
    /// Missing or malformed arguments
    Usage,
    InvalidScore(String),
    /// The active scheme is the view counter
    Disabled,
    NotFound(String),
    Rated { title: String, summary: RatingSummary },
}

/// The bot's movie operations, independent of the chat transport
///
/// Mutations follow a whole-catalog read-modify-write against the store
/// with no locking between concurrent callers.
pub struct MovieService {
    store: Arc<dyn CatalogStore>,
    sessions: SessionStore,
    match_config: MatchConfig,
    scheme: PopularityScheme,
    owner_id: UserId,
}

impl MovieService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        sessions: SessionStore,
        match_config: MatchConfig,
        scheme: PopularityScheme,
        owner_id: UserId,
    ) -> Self {
        Self {
            store,
            sessions,
            match_config,
            scheme,
            owner_id,
        }
    }

    pub fn scheme(&self) -> PopularityScheme {
        self.scheme
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        user_id == self.owner_id
    }

    /// The `limit` most popular movies
    pub async fn favorites(&self, limit: usize) -> Vec<MovieRecord> {
        let catalog = self.store.load().await;
        catalog.favorites(limit).into_iter().cloned().collect()
    }

    /// Searches for `query`. An exact match counts as a view; otherwise any
    /// suggestions replace the user's pending list.
    #[instrument(skip(self))]
    pub async fn search(&self, user_id: UserId, query: &str) -> SearchOutcome {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return SearchOutcome::MissingQuery;
        }

        let mut catalog = self.store.load().await;
        match resolve(&normalized, &catalog, &self.match_config) {
            Resolution::ExactMatch(movie) => {
                let movie = match catalog.find_mut(&movie.title) {
                    Some(record) => {
                        let changed = record.popularity.record_view();
                        let record = record.clone();
                        if changed {
                            self.store.save(&catalog).await;
                        }
                        record
                    }
                    None => movie,
                };
                tracing::info!(title = %movie.title, "Exact match");
                SearchOutcome::Found(movie)
            }
            Resolution::Suggestions(movies) if movies.is_empty() => {
                tracing::info!("No matches");
                SearchOutcome::NotFound { query: normalized }
            }
            Resolution::Suggestions(movies) => {
                tracing::info!(count = movies.len(), "Offering suggestions");
                self.sessions.store(user_id, movies.clone()).await;
                SearchOutcome::Suggestions {
                    query: normalized,
                    movies,
                }
            }
        }
    }

    /// Picks from the user's pending suggestions by 1-based index.
    ///
    /// The pick counts as a view on the current catalog record and the
    /// pending list is cleared. If the movie was removed since the search,
    /// the remembered record is shown as is.
    #[instrument(skip(self))]
    pub async fn confirm(&self, user_id: UserId, index: Option<&str>) -> ConfirmOutcome {
        let Some(index) = index else {
            return ConfirmOutcome::MissingIndex;
        };

        let chosen = match self.sessions.select(user_id, index).await {
            Ok(movie) => movie,
            Err(e) => {
                tracing::info!(reason = ?e, "Selection rejected");
                return ConfirmOutcome::Rejected(e);
            }
        };

        let mut catalog = self.store.load().await;
        let movie = match catalog.find_mut(&chosen.title) {
            Some(record) => {
                let changed = record.popularity.record_view();
                let record = record.clone();
                if changed {
                    self.store.save(&catalog).await;
                }
                record
            }
            None => {
                tracing::warn!(title = %chosen.title, "Confirmed movie no longer in catalog");
                chosen
            }
        };

        self.sessions.clear(user_id).await;
        tracing::info!(title = %movie.title, "Suggestion confirmed");
        ConfirmOutcome::Found(movie)
    }

    /// Owner-only: creates a movie or appends links to an existing one.
    ///
    /// `args` is the whitespace-split argument list. Any malformed link
    /// rejects the whole command.
    #[instrument(skip(self, args))]
    pub async fn add_movie(&self, user_id: UserId, args: &[&str]) -> Result<AddMovieResult, AddMovieError> {
        if !self.is_owner(user_id) {
            tracing::warn!("Non-owner attempted to add a movie");
            return Err(AddMovieError::Unauthorized);
        }

        let (title, qualities) = parse_add_movie_args(args)?;
        let added = qualities.len();

        let mut catalog = self.store.load().await;
        let action = catalog.upsert_qualities(&title, qualities, self.scheme);
        let title = catalog
            .find(&title)
            .map(|m| m.title.clone())
            .unwrap_or(title);
        self.store.save(&catalog).await;

        tracing::info!(title = %title, added, ?action, "Movie added or updated");
        Ok(AddMovieResult {
            title,
            action,
            added,
        })
    }

    /// Rates `title` on behalf of `user_id`, replacing any earlier rating
    #[instrument(skip(self))]
    pub async fn rate(&self, user_id: UserId, title: &str, score: Score) -> RateOutcome {
        if self.scheme != PopularityScheme::Rating {
            return RateOutcome::Disabled;
        }

        let mut catalog = self.store.load().await;
        let Some(movie) = catalog.find_mut(title) else {
            return RateOutcome::NotFound(title.trim().to_string());
        };

        let summary = match &mut movie.popularity {
            Popularity::Rating(book) => book.rate(user_id, score),
            Popularity::Counter(_) => return RateOutcome::Disabled,
        };
        let title = movie.title.clone();
        self.store.save(&catalog).await;

        tracing::info!(
            title = %title,
            score = score.value(),
            average = summary.average,
            count = summary.count,
            action = ?summary.action,
            "Rating recorded"
        );
        RateOutcome::Rated { title, summary }
    }

    /// `/rate <1-5> <movie name...>`
    pub async fn rate_command(&self, user_id: UserId, args: &[&str]) -> RateOutcome {
        let Some((raw_score, name)) = args.split_first() else {
            return RateOutcome::Usage;
        };
        if name.is_empty() {
            return RateOutcome::Usage;
        }
        let score = match raw_score.parse::<Score>() {
            Ok(score) => score,
            Err(_) => return RateOutcome::InvalidScore(raw_score.to_string()),
        };
        self.rate(user_id, &name.join(" "), score).await
    }
}

/// Splits `/addmovie` arguments into a title and its links.
///
/// The title is every token before the first `label:rest` token with both
/// sides non-empty, so titles like `Mission: Impossible` survive. Every
/// token after that must be a link.
pub fn parse_add_movie_args(args: &[&str]) -> Result<(String, Vec<Quality>), AddMovieError> {
    let first_link = args
        .iter()
        .position(|token| split_link(token).is_some())
        .ok_or(AddMovieError::Usage)?;
    if first_link == 0 {
        return Err(AddMovieError::Usage);
    }

    let title = args[..first_link].join(" ");
    let mut qualities = Vec::with_capacity(args.len() - first_link);

    for token in &args[first_link..] {
        let (label, url) =
            split_link(token).ok_or_else(|| AddMovieError::InvalidFormat(token.to_string()))?;
        if !URL_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
            return Err(AddMovieError::InvalidUrl(url.to_string()));
        }
        qualities.push(Quality::new(label, url));
    }

    Ok((title, qualities))
}

fn split_link(token: &str) -> Option<(&str, &str)> {
    token
        .split_once(':')
        .filter(|(label, rest)| !label.is_empty() && !rest.is_empty())
}
