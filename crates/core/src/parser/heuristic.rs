//! Regex-based release title parser.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::trace;

use super::{ParseError, ParsedRelease, ReleaseParser};

static EPISODE_SE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bs(\d{1,2})\s?e(\d{1,3})\b").unwrap());

// Exactly two episode digits so codec tags like "1 x264" never parse as episodes.
static EPISODE_X: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\s?x\s?(\d{2})\b").unwrap());

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})[ \-](\d{2})[ \-](\d{2})\b").unwrap());

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").unwrap());

static RESOLUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(2160p|1080p|1080i|720p|576p|480p|4k|uhd)\b").unwrap());

static QUALITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(remux|bluray|blu-ray|bdrip|brrip|web-dl|webdl|webrip|web|hdtv|dvdrip|dvd|hdrip|telesync|cam|ts)\b",
    )
    .unwrap()
});

static CODEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(x264|x265|h ?264|h ?265|hevc|avc|xvid|divx|av1)\b").unwrap());

static AUDIO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(truehd|atmos|dts-hd|dts|ddp\d?|eac3|ac3|dd\d?|aac\d?|flac|mp3)\b").unwrap()
});

static IMDB: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(tt\d{7,8})\b").unwrap());

static PROPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bproper\b").unwrap());
static REPACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(repack|rerip)\b").unwrap());
static EXTENDED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bextended\b").unwrap());

/// Parses scene-style names with a fixed set of patterns.
///
/// The title is everything before the first recognised marker (episode
/// identifier, date, release year, resolution, source, codec or bracket).
#[derive(Debug, Clone, Default)]
pub struct HeuristicReleaseParser;

impl HeuristicReleaseParser {
    pub fn new() -> Self {
        Self
    }
}

impl ReleaseParser for HeuristicReleaseParser {
    fn parse(&self, title: &str) -> Result<ParsedRelease, ParseError> {
        let original = title.trim();
        if original.is_empty() {
            return Err(ParseError::Empty);
        }

        let cleaned = original.replace(['.', '_'], " ");
        let mut parsed = ParsedRelease::default();
        let mut markers: Vec<usize> = Vec::new();

        if let Some(caps) = EPISODE_SE.captures(&cleaned) {
            parsed.season = caps[1].parse().ok();
            parsed.episode = caps[2].parse().ok();
            markers.push(caps.get(0).map_or(0, |m| m.start()));
        } else if let Some(caps) = EPISODE_X.captures(&cleaned) {
            parsed.season = caps[1].parse().ok();
            parsed.episode = caps[2].parse().ok();
            markers.push(caps.get(0).map_or(0, |m| m.start()));
        }
        if let (Some(season), Some(episode)) = (parsed.season, parsed.episode) {
            parsed.identifier = Some(format!("S{:02}E{:02}", season, episode));
        }

        if parsed.identifier.is_none() {
            if let Some(caps) = DATE.captures(&cleaned) {
                let date = format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]);
                parsed.identifier = Some(date.clone());
                parsed.date = Some(date);
                parsed.year = caps[1].parse().ok();
                markers.push(caps.get(0).map_or(0, |m| m.start()));
            }
        }

        if parsed.year.is_none() {
            // A year at the very start belongs to the title ("1917", "2012").
            if let Some(m) = YEAR.find_iter(&cleaned).filter(|m| m.start() > 0).last() {
                parsed.year = m.as_str().parse().ok();
                markers.push(m.start());
            }
        }

        if let Some(m) = RESOLUTION.find(&cleaned) {
            parsed.resolution = Some(normalize_resolution(m.as_str()));
            markers.push(m.start());
        }
        if let Some(m) = QUALITY.find(&cleaned) {
            parsed.quality = Some(normalize_source(m.as_str()));
            markers.push(m.start());
        }
        if let Some(m) = CODEC.find(&cleaned) {
            parsed.codec = Some(normalize_codec(m.as_str()));
            markers.push(m.start());
        }
        if let Some(m) = AUDIO.find(&cleaned) {
            parsed.audio = Some(normalize_audio(m.as_str()));
        }
        if let Some(caps) = IMDB.captures(&cleaned) {
            parsed.imdb_id = Some(caps[1].to_string());
        }
        if let Some(pos) = cleaned.find(['[', '(']) {
            markers.push(pos);
        }

        parsed.proper = PROPER.is_match(&cleaned);
        parsed.repack = REPACK.is_match(&cleaned);
        parsed.extended = EXTENDED.is_match(&cleaned);

        let end = markers.into_iter().min().unwrap_or(cleaned.len());
        let name = cleaned[..end]
            .trim()
            .trim_end_matches(['-', '(', '[', ' '])
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            return Err(ParseError::NoTitle(original.to_string()));
        }
        parsed.title = name;

        trace!(
            title = original,
            parsed_title = %parsed.title,
            year = ?parsed.year,
            identifier = ?parsed.identifier,
            resolution = ?parsed.resolution,
            "Parsed release title"
        );

        Ok(parsed)
    }
}

fn normalize_resolution(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "4k" | "uhd" => "2160p".to_string(),
        other => other.to_string(),
    }
}

fn normalize_source(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "blu-ray" => "bluray".to_string(),
        "webdl" => "web-dl".to_string(),
        "telesync" => "ts".to_string(),
        other => other.to_string(),
    }
}

fn normalize_codec(raw: &str) -> String {
    let lower = raw.to_lowercase().replace(' ', "");
    match lower.as_str() {
        "h264" | "avc" => "x264".to_string(),
        "h265" | "hevc" => "x265".to_string(),
        _ => lower,
    }
}

fn normalize_audio(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.starts_with("ddp") || lower == "eac3" {
        "eac3".to_string()
    } else if lower.starts_with("dd") || lower == "ac3" {
        "ac3".to_string()
    } else if lower.starts_with("aac") {
        "aac".to_string()
    } else {
        lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(title: &str) -> ParsedRelease {
        HeuristicReleaseParser::new().parse(title).unwrap()
    }

    #[test]
    fn test_parse_movie_release() {
        let parsed = parse("The.Matrix.1999.1080p.BluRay.x264.DTS-GROUP");
        assert_eq!(parsed.title, "The Matrix");
        assert_eq!(parsed.year, Some(1999));
        assert_eq!(parsed.resolution.as_deref(), Some("1080p"));
        assert_eq!(parsed.quality.as_deref(), Some("bluray"));
        assert_eq!(parsed.codec.as_deref(), Some("x264"));
        assert_eq!(parsed.audio.as_deref(), Some("dts"));
        assert!(parsed.identifier.is_none());
        assert!(parsed.date.is_none());
    }

    #[test]
    fn test_parse_title_starting_with_year() {
        let parsed = parse("1917.2019.2160p.WEB-DL.DDP5.1.HEVC-GRP");
        assert_eq!(parsed.title, "1917");
        assert_eq!(parsed.year, Some(2019));
        assert_eq!(parsed.resolution.as_deref(), Some("2160p"));
        assert_eq!(parsed.quality.as_deref(), Some("web-dl"));
        assert_eq!(parsed.codec.as_deref(), Some("x265"));
        assert_eq!(parsed.audio.as_deref(), Some("eac3"));
    }

    #[test]
    fn test_parse_episode_notations() {
        for title in [
            "Show.Name.S01E02.720p.HDTV.x264-GRP",
            "Show Name s1e2 720p",
            "Show.Name.1x02.720p.HDTV",
            "Show Name 1 x 02 HDTV",
        ] {
            let parsed = parse(title);
            assert_eq!(parsed.title, "Show Name", "title for {}", title);
            assert_eq!(parsed.season, Some(1), "season for {}", title);
            assert_eq!(parsed.episode, Some(2), "episode for {}", title);
            assert_eq!(parsed.identifier.as_deref(), Some("S01E02"));
        }
    }

    #[test]
    fn test_codec_is_not_an_episode() {
        let parsed = parse("Movie.2010.720p.BluRay.DD5.1.x264-GRP");
        assert!(parsed.season.is_none());
        assert!(parsed.identifier.is_none());
        assert_eq!(parsed.audio.as_deref(), Some("ac3"));
    }

    #[test]
    fn test_parse_dated_episode() {
        let parsed = parse("The.Daily.Show.2024.03.05.Guest.720p.WEB.h264-GRP");
        assert_eq!(parsed.title, "The Daily Show");
        assert_eq!(parsed.identifier.as_deref(), Some("2024-03-05"));
        assert_eq!(parsed.date.as_deref(), Some("2024-03-05"));
        assert_eq!(parsed.year, Some(2024));
        assert_eq!(parsed.codec.as_deref(), Some("x264"));
    }

    #[test]
    fn test_parse_flags_and_imdb() {
        let parsed = parse("Movie.2020.EXTENDED.PROPER.REPACK.1080p.tt1234567.WEB");
        assert!(parsed.proper);
        assert!(parsed.repack);
        assert!(parsed.extended);
        assert_eq!(parsed.imdb_id.as_deref(), Some("tt1234567"));
    }

    #[test]
    fn test_parse_bracket_ends_title() {
        let parsed = parse("Movie Title (2015) [1080p]");
        assert_eq!(parsed.title, "Movie Title");
        assert_eq!(parsed.year, Some(2015));
    }

    #[test]
    fn test_parse_failures() {
        let parser = HeuristicReleaseParser::new();
        assert_eq!(parser.parse("   "), Err(ParseError::Empty));
        assert!(matches!(
            parser.parse("1080p.BluRay.x264"),
            Err(ParseError::NoTitle(_))
        ));
    }
}
