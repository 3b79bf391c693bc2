//! Title, id, year, episode and quality comparisons.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::search::EpisodeTarget;

static DATE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})[ .\-](\d{2})[ .\-](\d{2})\b").unwrap());

/// ASCII letters for Latin letters that have no decomposition.
fn fold(c: char) -> Option<&'static str> {
    match c {
        'ø' => Some("o"),
        'ß' => Some("ss"),
        'đ' | 'ð' => Some("d"),
        'æ' => Some("ae"),
        'œ' => Some("oe"),
        'ł' => Some("l"),
        'þ' => Some("th"),
        'ı' => Some("i"),
        _ => None,
    }
}

/// Lowercase ASCII slug: diacritics dropped, a few Latin letters folded,
/// every run of other characters collapsed to one hyphen, no
/// leading/trailing hyphen.
///
/// "Amélie: Le Fabuleux Destin" -> "amelie-le-fabuleux-destin"
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut gap = false;
    for c in title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        let mut buf = [0u8; 4];
        let piece = if c.is_ascii_alphanumeric() {
            &*c.encode_utf8(&mut buf)
        } else if let Some(folded) = fold(c) {
            folded
        } else {
            gap = true;
            continue;
        };
        if gap && !slug.is_empty() {
            slug.push('-');
        }
        gap = false;
        slug.push_str(piece);
    }
    slug
}

fn contains_on_boundaries(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        (start == 0 || haystack[..start].ends_with('-'))
            && (end == haystack.len() || haystack[end..].starts_with('-'))
    })
}

fn slugs_match(found: &str, wanted: &str) -> bool {
    if found.is_empty() || wanted.is_empty() {
        return false;
    }
    found == wanted
        || contains_on_boundaries(found, wanted)
        || found.replace('-', "") == wanted.replace('-', "")
}

/// Whether a parsed title matches any of the wanted titles.
pub fn title_matches<'a>(found: &str, wanted: impl IntoIterator<Item = &'a str>) -> bool {
    let found = slugify(found);
    wanted
        .into_iter()
        .any(|title| slugs_match(&found, &slugify(title)))
}

/// Numeric form of an external id: digits only, leading zeros dropped.
///
/// "tt0133093" -> "133093"
pub fn numeric_id(id: &str) -> Option<String> {
    let digits: String = id.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
}

/// Ids that both reduce to the same number are the same id.
pub fn external_ids_match(a: &str, b: &str) -> bool {
    match (numeric_id(a), numeric_id(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Whether the year appears in a raw title, not as part of a longer number.
pub fn title_contains_year(title: &str, year: u32) -> bool {
    let year = year.to_string();
    title.match_indices(&year).any(|(start, _)| {
        let end = start + year.len();
        !title[..start].ends_with(|c: char| c.is_ascii_digit())
            && !title[end..].starts_with(|c: char| c.is_ascii_digit())
    })
}

/// Normalized `YYYY-MM-DD` form of a date identifier.
pub fn normalize_date(identifier: &str) -> Option<String> {
    DATE_IDENTIFIER
        .captures(identifier)
        .map(|caps| format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]))
}

/// Recognises the target episode in raw release titles.
///
/// Accepts `S01E02`, `s1e2`, `S01 E02`, `1x02` and `1 x 02`. Season and
/// episode numbers are matched as whole tokens, so `S1E2` never matches
/// `S1E20`. Date-identified episodes compare normalized air dates.
#[derive(Debug, Clone)]
pub enum EpisodeMatcher {
    Numbered(Regex),
    Dated(String),
    /// Matches nothing.
    Never,
}

impl EpisodeMatcher {
    pub fn new(target: &EpisodeTarget) -> Self {
        if let Some(date) = normalize_date(&target.identifier) {
            return EpisodeMatcher::Dated(date);
        }
        let pattern = format!(
            r"(?i)\bs0*{s}\s?e0*{e}\b|\b0*{s}\s?x\s?0*{e}\b",
            s = target.season,
            e = target.episode
        );
        Regex::new(&pattern).map_or(EpisodeMatcher::Never, EpisodeMatcher::Numbered)
    }

    pub fn is_match(&self, title: &str) -> bool {
        match self {
            EpisodeMatcher::Numbered(re) => re.is_match(&title.replace(['.', '_', '-'], " ")),
            EpisodeMatcher::Dated(wanted) => DATE_IDENTIFIER
                .captures_iter(&title.replace('_', " "))
                .any(|caps| format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]) == *wanted),
            EpisodeMatcher::Never => false,
        }
    }
}

/// Lowercase with `-`, `.`, ` ` and `_` removed, so "WEB-DL" equals "webdl".
pub fn normalize_quality(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '-' | '.' | ' ' | '_'))
        .collect()
}

/// Whether an attribute value is allowed by a wanted list.
///
/// An empty list allows anything. A non-empty list rejects unknown values.
pub fn wanted_allows(wanted: &[String], value: Option<&str>) -> bool {
    if wanted.is_empty() {
        return true;
    }
    match value {
        Some(value) => {
            let value = normalize_quality(value);
            wanted.iter().any(|w| normalize_quality(w) == value)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Amélie: Le Fabuleux Destin"), "amelie-le-fabuleux-destin");
        assert_eq!(slugify("  The Matrix!! "), "the-matrix");
        assert_eq!(slugify("Mr. Robot"), "mr-robot");
        assert_eq!(slugify("..."), "");
        assert_eq!(slugify("Sørensen"), "sorensen");
        assert_eq!(slugify("Die Straße"), "die-strasse");
        assert_eq!(slugify("ĐORĐE Æon"), "dorde-aeon");
        assert_eq!(slugify("Léon 東京"), "leon");
    }

    #[test]
    fn test_title_matches_policy() {
        assert!(title_matches("The Matrix", ["the matrix"]));
        assert!(title_matches("Amelie", ["Amélie"]));
        assert!(title_matches("Sorensen", ["Sørensen"]));
        // Contained on hyphen boundaries.
        assert!(title_matches("The Office US", ["The Office"]));
        // Separator differences.
        assert!(title_matches("Spider Man", ["Spider-Man"]));
        assert!(title_matches("SpiderMan", ["Spider-Man"]));
        // Not on a boundary.
        assert!(!title_matches("Theme", ["The"]));
        assert!(!title_matches("Other Movie", ["The Matrix", "Matrix Reloaded"]));
        assert!(!title_matches("", ["anything"]));
    }

    #[test]
    fn test_title_matches_alternates() {
        let wanted = ["Amelie", "Le Fabuleux Destin d'Amélie Poulain"];
        assert!(title_matches("Le Fabuleux Destin d Amelie Poulain", wanted));
    }

    #[test]
    fn test_numeric_ids() {
        assert_eq!(numeric_id("tt0133093").as_deref(), Some("133093"));
        assert_eq!(numeric_id("0000").as_deref(), Some("0"));
        assert_eq!(numeric_id("none"), None);
        assert!(external_ids_match("tt0133093", "133093"));
        assert!(!external_ids_match("tt0133093", "tt0133094"));
        assert!(!external_ids_match("abc", "abc"));
    }

    #[test]
    fn test_title_contains_year() {
        assert!(title_contains_year("Movie.2020.1080p", 2020));
        assert!(title_contains_year("Movie2020.1080p", 2020));
        assert!(title_contains_year("Movie (2020)", 2020));
        assert!(!title_contains_year("Movie.20201.1080p", 2020));
        assert!(!title_contains_year("Movie.12020.1080p", 2020));
        assert!(!title_contains_year("Movie.1080p", 2020));
    }

    #[test]
    fn test_episode_notations() {
        let matcher = EpisodeMatcher::new(&EpisodeTarget::new(1, "Show", 1, 2, "hd"));
        for title in [
            "Show.S01E02.720p",
            "Show s1e2 720p",
            "Show S01 E02",
            "Show.1x02.HDTV",
            "Show 1 x 02",
            "Show-S01E02-GRP",
        ] {
            assert!(matcher.is_match(title), "{}", title);
        }
        for title in ["Show.S02E02.720p", "Show.S01E20.720p", "Show.S01E03", "Show.11x02"] {
            assert!(!matcher.is_match(title), "{}", title);
        }
    }

    #[test]
    fn test_dated_episode() {
        let matcher = EpisodeMatcher::new(&EpisodeTarget::dated(1, "Daily", "2024-03-05", "hd"));
        assert!(matches!(matcher, EpisodeMatcher::Dated(_)));
        assert!(matcher.is_match("Daily.2024.03.05.720p"));
        assert!(matcher.is_match("Daily 2024-03-05 720p"));
        assert!(!matcher.is_match("Daily.2024.03.06.720p"));
    }

    #[test]
    fn test_wanted_allows() {
        let wanted = vec!["WEB-DL".to_string(), "bluray".to_string()];
        assert!(wanted_allows(&wanted, Some("webdl")));
        assert!(wanted_allows(&wanted, Some("Blu-Ray")));
        assert!(!wanted_allows(&wanted, Some("hdtv")));
        assert!(!wanted_allows(&wanted, None));
        assert!(wanted_allows(&[], None));
    }
}
