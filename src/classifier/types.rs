use crate::parser::EpisodeCode;

/// The classifier's structured guess about what a file is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCandidate {
    Movie {
        raw_title: String,
        year: Option<u16>,
        resolution: Option<String>,
    },
    Episode {
        raw_show_name: String,
        /// Year hint from the folder or show name, used for disambiguation
        year: Option<u16>,
        season: u32,
        episode: u32,
        episode_range_end: Option<u32>,
        resolution: Option<String>,
    },
    AnimeEpisode {
        raw_show_name: String,
        season: u32,
        absolute_episode: u32,
        resolution: Option<String>,
    },
}

impl MediaCandidate {
    pub fn resolution(&self) -> Option<&str> {
        match self {
            MediaCandidate::Movie { resolution, .. }
            | MediaCandidate::Episode { resolution, .. }
            | MediaCandidate::AnimeEpisode { resolution, .. } => resolution.as_deref(),
        }
    }

    pub fn is_movie(&self) -> bool {
        matches!(self, MediaCandidate::Movie { .. })
    }

    /// Episode code for episodic candidates
    pub fn episode_code(&self) -> Option<EpisodeCode> {
        match self {
            MediaCandidate::Episode {
                season,
                episode,
                episode_range_end,
                ..
            } => Some(EpisodeCode {
                season: *season,
                episode: *episode,
                range_end: *episode_range_end,
            }),
            MediaCandidate::AnimeEpisode {
                season,
                absolute_episode,
                ..
            } => Some(EpisodeCode::single(*season, *absolute_episode)),
            MediaCandidate::Movie { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Sample,
    UnsupportedExtension,
}

impl IgnoreReason {
    pub fn description(&self) -> &'static str {
        match self {
            IgnoreReason::Sample => "sample or extra",
            IgnoreReason::UnsupportedExtension => "not a video file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Candidate(MediaCandidate),
    Ignore(IgnoreReason),
    AlreadyHandled,
    Unmatched,
}
