//! Release title parsing.
//!
//! Turns scene-style release names ("Movie.Title.2020.1080p.BluRay.x264-GRP")
//! into structured attributes. The engine only depends on the
//! `ReleaseParser` trait; `HeuristicReleaseParser` is the bundled default.

mod heuristic;

pub use heuristic::HeuristicReleaseParser;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured attributes extracted from a release title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRelease {
    /// Title part (movie or series name), separators turned into spaces.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Source tier (bluray, web-dl, hdtv, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// Canonical episode identifier: `S01E02`, or `2024-03-05` for dated shows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Air date of a dated episode, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// IMDB id embedded in the title, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub proper: bool,
    #[serde(default)]
    pub extended: bool,
    #[serde(default)]
    pub repack: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty release title")]
    Empty,

    #[error("no title found in '{0}'")]
    NoTitle(String),
}

/// Parser for raw release titles.
pub trait ReleaseParser: Send + Sync {
    fn parse(&self, title: &str) -> Result<ParsedRelease, ParseError>;
}
