//! Title and name normalization shared by the matcher and the resolver.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

static EPISODE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\. ").expect("valid episode number pattern"));

static NUMERIC_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-[0-9]+$").expect("valid numeric suffix pattern"));

/// Trim a scraped title and drop a leading `"<digits>. "` episode number.
pub fn clean_title(title: &str) -> String {
    EPISODE_NUMBER.replace(title.trim(), "").trim().to_string()
}

/// Lowercase `name` and keep only the letters `a` to `z`.
pub fn category_shortname(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

/// Drop a trailing `-<digits>` from a shortname.
pub fn strip_numeric_suffix(shortname: &str) -> String {
    NUMERIC_SUFFIX.replace(shortname, "").into_owned()
}

/// The part of a title after its last `:`, trimmed.
///
/// Strips prefixes like `"Spezial: "`. Titles without a colon are only
/// trimmed.
pub fn prefix_free(title: &str) -> &str {
    title.rsplit(':').next().unwrap_or(title).trim()
}

/// Lowercased word set of `text`. Every non-alphabetic character separates
/// words; empty words are dropped.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_drops_episode_number() {
        assert_eq!(clean_title("  12. Der Wal "), "Der Wal");
        assert_eq!(clean_title("Der Wal"), "Der Wal");
        // Only a leading number followed by ". " counts
        assert_eq!(clean_title("Folge 12. Der Wal"), "Folge 12. Der Wal");
        assert_eq!(clean_title("2024er Rückblick"), "2024er Rückblick");
    }

    #[test]
    fn test_category_shortname() {
        assert_eq!(category_shortname("Wilde Welt!"), "wildewelt");
        assert_eq!(category_shortname("Löwenzahn 2"), "lwenzahn");
    }

    #[test]
    fn test_strip_numeric_suffix() {
        assert_eq!(strip_numeric_suffix("der-wal-104"), "der-wal");
        assert_eq!(strip_numeric_suffix("der-wal"), "der-wal");
        assert_eq!(strip_numeric_suffix("folge-1-teil"), "folge-1-teil");
    }

    #[test]
    fn test_prefix_free() {
        assert_eq!(prefix_free("Spezial: Der Wal"), "Der Wal");
        assert_eq!(prefix_free("A: B: Der Wal"), "Der Wal");
        assert_eq!(prefix_free(" Der Wal "), "Der Wal");
        assert_eq!(prefix_free("Spezial:"), "");
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("Der große Wal - Spezial!");
        let expected: BTreeSet<String> = ["der", "große", "wal", "spezial"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tokens, expected);

        assert_eq!(tokenize("Teil 2"), tokenize("teil"));
        assert!(tokenize("  123 ").is_empty());
    }
}
