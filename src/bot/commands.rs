use crate::models::Score;

/// Telegram rejects callback data longer than this many bytes
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

const RATE_CALLBACK_PREFIX: &str = "rate";

/// A recognized slash command and its raw arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Verify,
    /// `/movie <name...>`, arguments re-joined with single spaces
    Movie(String),
    /// `/confirm <n>`, first argument if any
    Confirm(Option<String>),
    /// `/addmovie <name...> <quality:url>...`
    AddMovie(Vec<String>),
    /// `/rate <1-5> <name...>`
    Rate(Vec<String>),
    Unknown(String),
}

/// Parses a message text into a command.
///
/// Returns `None` for plain text and for commands addressed to a different
/// bot via `/command@otherbot`.
pub fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    let mut tokens = text.split_whitespace();
    let head = tokens.next()?.strip_prefix('/')?;
    if head.is_empty() {
        return None;
    }

    let name = match head.split_once('@') {
        Some((name, target)) => {
            let own = bot_username.trim_start_matches('@');
            if !own.is_empty() && !target.eq_ignore_ascii_case(own) {
                return None;
            }
            name
        }
        None => head,
    };

    let args: Vec<String> = tokens.map(str::to_string).collect();
    let command = match name.to_lowercase().as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "verify" => Command::Verify,
        "movie" => Command::Movie(args.join(" ")),
        "confirm" => Command::Confirm(args.into_iter().next()),
        "addmovie" => Command::AddMovie(args),
        "rate" => Command::Rate(args),
        other => Command::Unknown(other.to_string()),
    };
    Some(command)
}

/// Action encoded in an inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Rate { score: Score, title: String },
}

/// Callback data for a rating button, `None` if it would exceed the Bot API limit
pub fn rate_callback_data(score: Score, title: &str) -> Option<String> {
    let data = format!("{}:{}:{}", RATE_CALLBACK_PREFIX, score, title);
    (data.len() <= MAX_CALLBACK_DATA_LEN).then_some(data)
}

pub fn parse_callback(data: &str) -> Option<CallbackAction> {
    let mut parts = data.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(RATE_CALLBACK_PREFIX), Some(score), Some(title)) if !title.trim().is_empty() => {
            Some(CallbackAction::Rate {
                score: score.parse().ok()?,
                title: title.to_string(),
            })
        }
        _ => None,
    }
}
