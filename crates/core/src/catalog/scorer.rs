//! Release priority scoring.

use crate::config::QualityProfile;
use crate::parser::ParsedRelease;

/// Ranks a parsed release. Higher is better; 0 means "could not score".
pub trait PriorityScorer: Send + Sync {
    fn priority(&self, parsed: &ParsedRelease, profile: &QualityProfile) -> u32;
}

/// Sums fixed per-attribute ranks.
///
/// Resolution dominates, then source, then codec, then audio, so that a
/// better resolution always outranks any combination of lesser attributes.
#[derive(Debug, Clone, Default)]
pub struct RankTableScorer;

impl RankTableScorer {
    pub fn new() -> Self {
        Self
    }

    fn resolution_rank(value: &str) -> u32 {
        match value {
            "2160p" => 400,
            "1080p" | "1080i" => 300,
            "720p" => 200,
            "576p" | "480p" => 100,
            _ => 0,
        }
    }

    fn quality_rank(value: &str) -> u32 {
        match value {
            "remux" => 45,
            "bluray" => 40,
            "web-dl" => 35,
            "webrip" | "web" => 30,
            "bdrip" | "brrip" => 25,
            "hdtv" => 20,
            "hdrip" => 15,
            "dvdrip" | "dvd" => 10,
            "cam" | "ts" => 1,
            _ => 0,
        }
    }

    fn codec_rank(value: &str) -> u32 {
        match value {
            "x265" | "av1" => 4,
            "x264" => 3,
            "xvid" | "divx" => 1,
            _ => 0,
        }
    }

    fn audio_rank(value: &str) -> u32 {
        match value {
            "truehd" | "atmos" | "dts-hd" => 4,
            "dts" => 3,
            "eac3" | "ac3" | "flac" => 2,
            "aac" | "mp3" => 1,
            _ => 0,
        }
    }
}

impl PriorityScorer for RankTableScorer {
    fn priority(&self, parsed: &ParsedRelease, _profile: &QualityProfile) -> u32 {
        let resolution = parsed
            .resolution
            .as_deref()
            .map_or(0, Self::resolution_rank);
        let quality = parsed.quality.as_deref().map_or(0, Self::quality_rank);
        if resolution == 0 && quality == 0 {
            return 0;
        }

        let codec = parsed.codec.as_deref().map_or(0, Self::codec_rank);
        let audio = parsed.audio.as_deref().map_or(0, Self::audio_rank);
        let bonus = u32::from(parsed.proper || parsed.repack);

        resolution + quality + codec + audio + bonus
    }
}
