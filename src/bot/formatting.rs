//! Renders service outcomes as chat replies.
//!
//! Only the detail view and the welcome message use HTML; everything else is
//! plain text so titles and queries need no escaping.

use crate::{
    bot::commands::rate_callback_data,
    models::{
        InlineKeyboardButton, InlineKeyboardMarkup, MovieRecord, Popularity, RatingAction,
        RatingBook, Reply, Score, UpsertAction,
    },
    models::rating::round_one_decimal,
    services::{
        movies::{AddMovieError, AddMovieResult, ConfirmOutcome, RateOutcome, SearchOutcome},
        session::SelectionError,
    },
};

pub const MOVIE_USAGE: &str = "⚠️ Usage: /movie <movie_name>";
pub const CONFIRM_USAGE: &str = "⚠️ Usage: /confirm <number>";
pub const ADD_MOVIE_USAGE: &str =
    "⚠️ Usage: /addmovie <movie_name> <quality1>:<url1> [<quality2>:<url2> ...]";
pub const RATE_USAGE: &str = "⚠️ Usage: /rate <1-5> <movie_name>";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn rating_line(book: &RatingBook) -> String {
    match book.average() {
        Some(average) => format!(
            "⭐ Rating: {:.1}/5 ({} {})",
            round_one_decimal(average),
            book.count(),
            if book.count() == 1 { "rating" } else { "ratings" }
        ),
        None => "⭐ No ratings yet".to_string(),
    }
}

fn popularity_line(popularity: &Popularity) -> String {
    match popularity {
        Popularity::Counter(count) => format!("🔥 Popularity: {}", count),
        Popularity::Rating(book) => rating_line(book),
    }
}

fn rating_keyboard(title: &str) -> Option<InlineKeyboardMarkup> {
    let row = Score::all()
        .map(|score| {
            rate_callback_data(score, title).map(|callback_data| InlineKeyboardButton {
                text: format!("{}⭐", score),
                callback_data,
            })
        })
        .collect::<Option<Vec<_>>>()?;

    Some(InlineKeyboardMarkup {
        inline_keyboard: vec![row],
    })
}

/// Title, download links and popularity, plus rating buttons when ratings are on
pub fn movie_detail(movie: &MovieRecord) -> Reply {
    let mut text = format!("🎬 <b>{}</b> Download Links:\n\n", escape_html(&movie.title));
    if movie.qualities.is_empty() {
        text.push_str("No download links yet.\n");
    }
    for quality in &movie.qualities {
        text.push_str(&format!(
            "🔹 {}: {}\n",
            escape_html(&quality.label),
            escape_html(&quality.url)
        ));
    }
    text.push('\n');
    text.push_str(&popularity_line(&movie.popularity));

    if let Popularity::Rating(_) = movie.popularity {
        match rating_keyboard(&movie.title) {
            Some(keyboard) => {
                text.push_str("\n\nRate this movie:");
                return Reply::html(text).with_keyboard(keyboard);
            }
            None => {
                text.push_str(&format!(
                    "\n\nRate this movie with /rate &lt;1-5&gt; {}",
                    escape_html(&movie.title)
                ));
            }
        }
    }

    Reply::html(text)
}

pub fn search(outcome: &SearchOutcome) -> Reply {
    match outcome {
        SearchOutcome::MissingQuery => Reply::text(MOVIE_USAGE),
        SearchOutcome::Found(movie) => movie_detail(movie),
        SearchOutcome::Suggestions { query, movies } => {
            let list = movies
                .iter()
                .enumerate()
                .map(|(i, movie)| format!("{}. {}", i + 1, movie.title))
                .collect::<Vec<_>>()
                .join("\n");
            Reply::text(format!(
                "❌ No movie found with the exact name '{}'.\n\
                 Did you mean one of these?\n{}\n\n\
                 Use /confirm <number> to select a movie (e.g., /confirm 1).",
                query, list
            ))
        }
        SearchOutcome::NotFound { query } => Reply::text(format!(
            "❌ No movie found with the name '{}'.\nCheck the spelling or try another movie.",
            query
        )),
    }
}

pub fn confirm(outcome: &ConfirmOutcome) -> Reply {
    match outcome {
        ConfirmOutcome::MissingIndex => Reply::text(CONFIRM_USAGE),
        ConfirmOutcome::Found(movie) => movie_detail(movie),
        ConfirmOutcome::Rejected(SelectionError::NotANumber(_)) => Reply::text(CONFIRM_USAGE),
        ConfirmOutcome::Rejected(SelectionError::NoSuggestions) => Reply::text(
            "❌ No suggestions available. Use /movie <movie_name> to search first.",
        ),
        ConfirmOutcome::Rejected(SelectionError::OutOfRange { available, .. }) => {
            Reply::text(format!(
                "❌ Invalid selection. Pick a number from 1 to {}, or use /movie <movie_name> to search again.",
                available
            ))
        }
    }
}

pub fn add_movie(result: &Result<AddMovieResult, AddMovieError>) -> Reply {
    match result {
        Ok(added) => {
            let verb = match added.action {
                UpsertAction::Created => "added",
                UpsertAction::Updated => "updated",
            };
            Reply::text(format!(
                "✅ Movie '{}' {} ({} link{}).",
                added.title,
                verb,
                added.added,
                if added.added == 1 { "" } else { "s" }
            ))
        }
        Err(AddMovieError::Unauthorized) => {
            Reply::text("⛔ Only the bot owner can use this command.")
        }
        Err(AddMovieError::Usage) => Reply::text(ADD_MOVIE_USAGE),
        Err(AddMovieError::InvalidFormat(entry)) => Reply::text(format!(
            "❌ Invalid format: {}. Use quality:url",
            entry
        )),
        Err(AddMovieError::InvalidUrl(url)) => Reply::text(format!(
            "❌ Invalid URL: {}. Links must start with http:// or https://",
            url
        )),
    }
}

pub fn rate(outcome: &RateOutcome) -> Reply {
    match outcome {
        RateOutcome::Usage => Reply::text(RATE_USAGE),
        RateOutcome::InvalidScore(raw) => Reply::text(format!(
            "❌ Invalid rating: {}. Choose a number from 1 to 5.",
            raw
        )),
        RateOutcome::Disabled => Reply::text("❌ Ratings are not enabled for this catalog."),
        RateOutcome::NotFound(title) => {
            Reply::text(format!("❌ No movie found with the name '{}'.", title))
        }
        RateOutcome::Rated { title, summary } => {
            let verb = match summary.action {
                RatingAction::Added => "Thanks! Your rating was added",
                RatingAction::Updated => "Your rating was updated",
            };
            Reply::text(format!(
                "✅ {} for '{}'.\n⭐ Average: {:.1}/5 from {} {}.",
                verb,
                title,
                summary.rounded_average(),
                summary.count,
                if summary.count == 1 { "rating" } else { "ratings" }
            ))
        }
    }
}

/// Short text for the callback toast
pub fn rate_toast(outcome: &RateOutcome) -> String {
    match outcome {
        RateOutcome::Rated { summary, .. } => match summary.action {
            RatingAction::Added => "Rating added".to_string(),
            RatingAction::Updated => "Rating updated".to_string(),
        },
        RateOutcome::NotFound(_) => "Movie not found".to_string(),
        RateOutcome::Disabled => "Ratings are disabled".to_string(),
        RateOutcome::Usage | RateOutcome::InvalidScore(_) => "Invalid rating".to_string(),
    }
}

pub fn welcome(
    first_name: &str,
    bot_username: &str,
    channel: &str,
    favorites: &[MovieRecord],
    is_member: bool,
) -> Reply {
    let mut text = format!("👋 Hello, {}!\n", escape_html(first_name));
    if bot_username.is_empty() {
        text.push_str("Welcome to your movie link bot!\n\n");
    } else {
        text.push_str(&format!(
            "Welcome to {}, your movie link bot!\n\n",
            escape_html(bot_username)
        ));
    }

    text.push_str("🌟 <b>Top Favorite Movies</b>:\n");
    if favorites.is_empty() {
        text.push_str("No popular movies yet. Start searching to build the list!\n");
    }
    for (i, movie) in favorites.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} ({})\n",
            i + 1,
            escape_html(&movie.title),
            popularity_line(&movie.popularity)
        ));
    }

    text.push_str(&format!(
        "\n🔍 <b>Find Your Movie</b>:\n\
         - Use /movie &lt;movie_name&gt; to search for a movie.\n\
         - If suggestions appear, use /confirm &lt;number&gt; to select one.\n\
         - Join our channel {} and use /verify to unlock access.\n",
        escape_html(channel)
    ));

    if is_member {
        text.push_str("\nYou're a member! Start searching with /movie.");
    } else {
        text.push_str(&format!(
            "\nPlease join {} and use /verify to unlock full access.",
            escape_html(channel)
        ));
    }

    Reply::html(text)
}

pub fn help() -> Reply {
    Reply::text(
        "/movie <movie_name> - search for a movie\n\
         /confirm <number> - pick a suggestion\n\
         /rate <1-5> <movie_name> - rate a movie\n\
         /verify - check your channel membership",
    )
}

pub fn verified(first_name: &str) -> Reply {
    Reply::text(format!(
        "✅ Verified! Welcome, {}.\nNow you can use /movie <movie_name> to get movie links.",
        first_name
    ))
}

pub fn not_a_member(channel: &str) -> Reply {
    Reply::text(format!(
        "❌ You're not a member of {}.\nPlease join and then use /verify again.",
        channel
    ))
}

pub fn membership_required(channel: &str) -> Reply {
    Reply::text(format!(
        "🔒 Please join {} to access movie links.\nThen use /verify to unlock access.",
        channel
    ))
}

pub fn unknown_command(name: &str) -> Reply {
    Reply::text(format!("🤔 Unknown command /{}. Try /help.", name))
}
