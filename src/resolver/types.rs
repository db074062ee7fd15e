use crate::api::{ApiError, ExternalId, SearchKind};
use crate::classifier::MediaCandidate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which library section a resolved title belongs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Show,
    AnimeShow,
    Movie,
}

impl MediaKind {
    /// Top-level directory under the destination root
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::Show => "shows",
            MediaKind::AnimeShow => "anime_shows",
            MediaKind::Movie => "movies",
        }
    }
}

/// Catalog-confirmed identity, or the raw guess when nothing matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub display_name: String,
    pub external_id: Option<ExternalId>,
    pub year: Option<u16>,
    pub media_kind: MediaKind,
}

impl ResolvedIdentity {
    /// Identity that echoes the query because the catalog had no match
    pub fn degraded(query: &TitleQuery) -> Self {
        Self {
            display_name: query.title.clone(),
            external_id: None,
            year: query.year,
            media_kind: match query.kind {
                SearchKind::Series => MediaKind::Show,
                SearchKind::Movie => MediaKind::Movie,
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.external_id.is_none()
    }

    /// Folder name: `Name (Year) {imdb-tt123}`, or the bare name when degraded
    pub fn folder_name(&self) -> String {
        match (&self.external_id, self.year) {
            (Some(id), Some(year)) => format!("{} ({}) {{{}}}", self.display_name, year, id),
            (Some(id), None) => format!("{} {{{}}}", self.display_name, id),
            (None, _) => self.display_name.clone(),
        }
    }
}

/// A title to look up in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleQuery {
    pub title: String,
    pub year: Option<u16>,
    pub kind: SearchKind,
}

/// Memo key: normalized title, year, search kind
pub(crate) type CacheKey = (String, Option<u16>, SearchKind);

impl TitleQuery {
    pub fn series(title: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            title: title.into(),
            year,
            kind: SearchKind::Series,
        }
    }

    pub fn movie(title: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            title: title.into(),
            year,
            kind: SearchKind::Movie,
        }
    }

    pub fn for_candidate(candidate: &MediaCandidate) -> Self {
        match candidate {
            MediaCandidate::Movie {
                raw_title, year, ..
            } => Self::movie(raw_title.clone(), *year),
            MediaCandidate::Episode {
                raw_show_name,
                year,
                ..
            } => Self::series(raw_show_name.clone(), *year),
            MediaCandidate::AnimeEpisode { raw_show_name, .. } => {
                Self::series(raw_show_name.clone(), None)
            }
        }
    }

    pub(crate) fn cache_key(&self) -> CacheKey {
        let normalized = self
            .title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        (normalized, self.year, self.kind)
    }
}

/// Result of asking the catalog for a single episode's title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeLookup {
    Titled {
        show: String,
        year: Option<u16>,
        title: String,
    },
    /// Series found, episode missing or untitled
    Untitled { show: String, year: Option<u16> },
    Unavailable,
}

/// Similarity cutoffs used when matching names
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Folder name vs. name derived from the episode code
    pub name_preference: f64,
    /// Catalog title vs. query, and between the top two results
    pub title_match: f64,
    /// Minimum similarity for the top result to count as a confident match
    pub query_match: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            name_preference: 0.8,
            title_match: 0.9,
            query_match: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Never prompt; pick the best-ranked result
    pub auto_mode: bool,
    /// Route anime series to their own library section
    pub split_anime: bool,
    pub thresholds: Thresholds,
}

#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("Catalog search failed: {0}")]
    Catalog(#[from] ApiError),

    #[error("Catalog search worker panicked")]
    WorkerPanicked,
}
