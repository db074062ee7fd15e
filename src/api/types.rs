use std::fmt;
use thiserror::Error;

/// Catalog identifier, tagged by provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExternalId {
    Imdb(String),
    Tmdb(u64),
}

impl ExternalId {
    /// Parse a user-supplied id such as `tt0903747` or `tmdb-1396`
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let lower = input.to_lowercase();

        if let Some(rest) = lower.strip_prefix("imdb-") {
            return Self::parse(rest);
        }

        if lower.starts_with("tt") && lower.len() > 2 && lower[2..].chars().all(|c| c.is_ascii_digit())
        {
            return Some(ExternalId::Imdb(lower));
        }

        lower
            .strip_prefix("tmdb-")
            .or_else(|| lower.strip_prefix("tmdb:"))
            .and_then(|rest| rest.parse().ok())
            .map(ExternalId::Tmdb)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalId::Imdb(id) => write!(f, "imdb-{}", id),
            ExternalId::Tmdb(id) => write!(f, "tmdb-{}", id),
        }
    }
}

/// Which catalog section a search targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Series,
    Movie,
}

impl SearchKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            SearchKind::Series => "series",
            SearchKind::Movie => "movie",
        }
    }
}

/// A single search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTitle {
    pub id: ExternalId,
    pub name: String,
    pub release_year: Option<u16>,
}

/// One entry of a series' episode list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeInfo {
    pub season: u32,
    pub episode: u32,
    pub title: Option<String>,
}

/// Full series record including the episode list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDetail {
    pub id: ExternalId,
    pub name: String,
    pub release_year: Option<u16>,
    pub episodes: Vec<EpisodeInfo>,
}

impl SeriesDetail {
    pub fn episode(&self, season: u32, episode: u32) -> Option<&EpisodeInfo> {
        self.episodes
            .iter()
            .find(|e| e.season == season && e.episode == episode)
    }
}

/// Catalog client configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub cinemeta_url: String,
    pub tmdb_url: String,
    pub tmdb_api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub min_request_interval_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cinemeta_url: "https://v3-cinemeta.strem.io".to_string(),
            tmdb_url: "https://api.themoviedb.org".to_string(),
            tmdb_api_key: None,
            timeout_secs: 30,
            max_retries: 3,
            min_request_interval_ms: 250,
        }
    }
}

impl ApiConfig {
    /// The anime keyword check needs a TMDB key
    pub fn has_tmdb_key(&self) -> bool {
        self.tmdb_api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Errors that can occur when talking to the metadata catalog
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Title not found: {0}")]
    NotFound(String),

    #[error("Rate limited by catalog")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("API returned error: {0}")]
    ServerError(String),

    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    #[error("TMDB API key not configured: set TMDB_API_KEY")]
    NotConfigured,
}

impl ApiError {
    /// Errors worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited
                | ApiError::NetworkError(_)
                | ApiError::Timeout
                | ApiError::ServerError(_)
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }
}
