//! Release-name cleaning and title/author guessing.

use std::sync::LazyLock;

use regex::Regex;

/// A trailing bracketed tag such as `[M4B]`, `(Unabridged)` or `{2021}`.
static TRAILING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[\[\(\{][^\[\]\(\)\{\}]*[\]\)\}]\s*$").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static BY_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+by\s+").unwrap());

/// Title and optional author guessed from a release name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TitleGuess {
    pub title: String,
    pub author: Option<String>,
}

/// Strip trailing bracketed tags and normalize separators.
///
/// Underscores always become spaces; dots become spaces only when the name
/// has no spaces at all (scene-style `Some.Book.Title`).
///
/// ```
/// use audiohook_parser::clean_title;
///
/// assert_eq!(clean_title("Dune [M4B] (Unabridged)"), "Dune");
/// assert_eq!(clean_title("The_Hobbit"), "The Hobbit");
/// ```
pub fn clean_title(name: &str) -> String {
    let mut text = name.replace('_', " ");
    if !text.trim().contains(' ') {
        text = text.replace('.', " ");
    }

    let mut text = text.trim().to_string();
    loop {
        let stripped = TRAILING_TAG.replace(&text, "").into_owned();
        if stripped == text || stripped.trim().is_empty() {
            break;
        }
        text = stripped;
    }

    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    collapsed
        .trim_end_matches(|c: char| c == '-' || c == ',' || c == ':' || c.is_whitespace())
        .to_string()
}

/// Guess `(title, author)` from a release name.
///
/// Recognizes `Title by Author` (split on the last `by`) and
/// `Title - Author`. Anything else is returned as a bare title.
pub fn guess_title_author(name: &str) -> TitleGuess {
    let cleaned = clean_title(name);

    if let Some(found) = BY_SEPARATOR.find_iter(&cleaned).last() {
        let title = cleaned[..found.start()].trim();
        let author = cleaned[found.end()..].trim();
        if !title.is_empty() && !author.is_empty() {
            return TitleGuess {
                title: title.to_string(),
                author: Some(author.to_string()),
            };
        }
    }

    if let Some((title, author)) = cleaned.split_once(" - ") {
        let (title, author) = (title.trim(), author.trim());
        if !title.is_empty() && !author.is_empty() {
            return TitleGuess {
                title: title.to_string(),
                author: Some(author.to_string()),
            };
        }
    }

    TitleGuess {
        title: cleaned,
        author: None,
    }
}
