use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use super::UserId;

/// A star rating between 1 and 5 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }

    /// All valid scores in ascending order
    pub fn all() -> impl Iterator<Item = Score> {
        (Self::MIN..=Self::MAX).map(Score)
    }
}

impl TryFrom<i64> for Score {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Score(value as u8))
        } else {
            Err(format!("score must be between {} and {}", Self::MIN, Self::MAX))
        }
    }
}

impl FromStr for Score {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("'{}' is not a number", s));
        }
        let value: i64 = s.parse().map_err(|_| format!("'{}' is out of range", s))?;
        Score::try_from(value)
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a rating was new for this user or replaced an earlier one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingAction {
    Added,
    Updated,
}

/// Result of applying a rating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
    pub action: RatingAction,
}

impl RatingSummary {
    /// Average rounded to one decimal place
    pub fn rounded_average(&self) -> f64 {
        round_one_decimal(self.average)
    }
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Per-movie rating ledger
///
/// Keeps the multiset of scores alongside the user → score map so a user who
/// rates again replaces their earlier score instead of adding a second one.
/// Both collections always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingBook {
    ratings: Vec<u8>,
    user_ratings: BTreeMap<UserId, u8>,
}

impl RatingBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a book from stored parts.
    ///
    /// Out-of-range scores are dropped from `user_ratings`. If `ratings` then
    /// disagrees with the per-user map it is rebuilt from the map. The boolean
    /// reports whether any repair was needed.
    pub fn from_parts(ratings: Vec<i64>, user_ratings: BTreeMap<UserId, i64>) -> (Self, bool) {
        let valid: BTreeMap<UserId, u8> = user_ratings
            .iter()
            .filter_map(|(user, score)| Score::try_from(*score).ok().map(|s| (*user, s.value())))
            .collect();
        let mut repaired = valid.len() != user_ratings.len();

        let mut stored: Vec<u8> = ratings
            .iter()
            .filter_map(|score| Score::try_from(*score).ok().map(Score::value))
            .collect();
        let mut expected: Vec<u8> = valid.values().copied().collect();
        stored.sort_unstable();
        expected.sort_unstable();

        let ratings = if stored == expected && stored.len() == ratings.len() {
            ratings.into_iter().map(|r| r as u8).collect()
        } else {
            repaired = true;
            valid.values().copied().collect()
        };

        (
            Self {
                ratings,
                user_ratings: valid,
            },
            repaired,
        )
    }

    pub fn ratings(&self) -> &[u8] {
        &self.ratings
    }

    pub fn user_ratings(&self) -> &BTreeMap<UserId, u8> {
        &self.user_ratings
    }

    pub fn count(&self) -> usize {
        self.ratings.len()
    }

    pub fn user_score(&self, user_id: UserId) -> Option<u8> {
        self.user_ratings.get(&user_id).copied()
    }

    /// Arithmetic mean of all scores, `None` when nobody has rated yet
    pub fn average(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let sum: u32 = self.ratings.iter().map(|&r| u32::from(r)).sum();
        Some(f64::from(sum) / self.ratings.len() as f64)
    }

    /// Records `score` for `user_id`, replacing any earlier score by that user.
    ///
    /// On replacement exactly one occurrence of the old value is removed from
    /// the multiset, whichever user it originally came from.
    pub fn rate(&mut self, user_id: UserId, score: Score) -> RatingSummary {
        let action = match self.user_ratings.insert(user_id, score.value()) {
            Some(previous) => {
                if let Some(pos) = self.ratings.iter().position(|&r| r == previous) {
                    self.ratings.remove(pos);
                }
                RatingAction::Updated
            }
            None => RatingAction::Added,
        };
        self.ratings.push(score.value());

        RatingSummary {
            average: self.average().unwrap_or(0.0),
            count: self.count(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(value: i64) -> Score {
        Score::try_from(value).unwrap()
    }

    #[test]
    fn test_first_rating_is_added() {
        let mut book = RatingBook::new();
        let summary = book.rate(UserId(1), score(4));

        assert_eq!(summary.action, RatingAction::Added);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, 4.0);
        assert_eq!(book.user_score(UserId(1)), Some(4));
    }

    #[test]
    fn test_rerating_replaces_instead_of_accumulating() {
        let mut book = RatingBook::new();
        book.rate(UserId(7), score(3));
        let summary = book.rate(UserId(7), score(5));

        assert_eq!(summary.action, RatingAction::Updated);
        assert_eq!(summary.count, 1);
        assert_eq!(book.ratings(), &[5]);
        assert_eq!(book.user_score(UserId(7)), Some(5));
    }

    #[test]
    fn test_update_removes_single_matching_value() {
        let mut book = RatingBook::new();
        book.rate(UserId(1), score(3));
        book.rate(UserId(2), score(3));
        book.rate(UserId(3), score(5));

        let summary = book.rate(UserId(1), score(1));

        assert_eq!(summary.count, 3);
        let mut ratings = book.ratings().to_vec();
        ratings.sort_unstable();
        assert_eq!(ratings, vec![1, 3, 5]);
        assert_eq!(book.ratings().len(), book.user_ratings().len());
    }

    #[test]
    fn test_average_rounding() {
        let mut book = RatingBook::new();
        book.rate(UserId(1), score(5));
        book.rate(UserId(2), score(4));
        let summary = book.rate(UserId(3), score(4));

        assert!((summary.average - 13.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(summary.rounded_average(), 4.3);
    }

    #[test]
    fn test_empty_average_is_none() {
        assert_eq!(RatingBook::new().average(), None);
    }

    #[test]
    fn test_score_parsing() {
        assert_eq!("3".parse::<Score>().unwrap().value(), 3);
        assert!("0".parse::<Score>().is_err());
        assert!("6".parse::<Score>().is_err());
        assert!("+2".parse::<Score>().is_err());
        assert!("two".parse::<Score>().is_err());
        assert_eq!(Score::all().count(), 5);
    }

    #[test]
    fn test_from_parts_consistent() {
        let mut users = BTreeMap::new();
        users.insert(UserId(1), 4);
        users.insert(UserId(2), 2);

        let (book, repaired) = RatingBook::from_parts(vec![2, 4], users);
        assert!(!repaired);
        assert_eq!(book.ratings(), &[2, 4]);
    }

    #[test]
    fn test_from_parts_repairs_mismatch() {
        let mut users = BTreeMap::new();
        users.insert(UserId(1), 4);
        users.insert(UserId(2), 9);

        let (book, repaired) = RatingBook::from_parts(vec![4, 4, 1], users);
        assert!(repaired);
        assert_eq!(book.ratings(), &[4]);
        assert_eq!(book.user_ratings().len(), 1);
    }
}
