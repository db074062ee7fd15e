use std::fmt;

/// Season/episode code normalized from any of the recognized naming shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpisodeCode {
    pub season: u32,
    pub episode: u32,
    /// Last episode of a multi-episode file
    pub range_end: Option<u32>,
}

impl EpisodeCode {
    pub fn single(season: u32, episode: u32) -> Self {
        Self {
            season,
            episode,
            range_end: None,
        }
    }

    pub fn range(season: u32, first: u32, last: u32) -> Self {
        Self {
            season,
            episode: first,
            range_end: Some(last),
        }
    }

    pub fn is_multi_episode(&self) -> bool {
        self.range_end.is_some()
    }

    /// Lowercase label used in destination file names (`s01e02`, `s01e02-e03`)
    pub fn label(&self) -> String {
        match self.range_end {
            Some(last) => format!("s{:02}e{:02}-e{:02}", self.season, self.episode, last),
            None => format!("s{:02}e{:02}", self.season, self.episode),
        }
    }
}

impl fmt::Display for EpisodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range_end {
            Some(last) => write!(f, "S{:02}E{:02}-E{:02}", self.season, self.episode, last),
            None => write!(f, "S{:02}E{:02}", self.season, self.episode),
        }
    }
}

/// An episode code located inside a larger name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMatch {
    /// Everything before the code (usually the show name)
    pub prefix: String,
    /// The code exactly as it appeared
    pub raw: String,
    pub code: EpisodeCode,
}
