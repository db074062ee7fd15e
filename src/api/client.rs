use super::types::{
    ApiConfig, ApiError, CatalogTitle, EpisodeInfo, ExternalId, SearchKind, SeriesDetail,
};
use super::Catalog;
use crate::parser::find_year;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Rate limiter so concurrent lookups don't hammer the catalog
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    fn wait_if_needed(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?}", wait_time);
                std::thread::sleep(wait_time);
            }
        }

        *last = Some(Instant::now());
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    metas: Vec<MetaPreview>,
}

#[derive(Debug, Deserialize)]
struct MetaPreview {
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "releaseInfo")]
    release_info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    #[serde(default)]
    meta: Option<MetaDetail>,
}

#[derive(Debug, Deserialize)]
struct MetaDetail {
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "releaseInfo")]
    release_info: Option<String>,
    #[serde(default)]
    moviedb_id: Option<serde_json::Value>,
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    #[serde(default)]
    season: Option<u32>,
    #[serde(default)]
    episode: Option<u32>,
    #[serde(default)]
    number: Option<u32>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordsResponse {
    #[serde(default)]
    results: Vec<Keyword>,
}

#[derive(Debug, Deserialize)]
struct Keyword {
    name: String,
}

impl MetaPreview {
    fn into_title(self) -> Option<CatalogTitle> {
        let raw_id = self.imdb_id.or(self.id)?;
        let id = ExternalId::parse(&raw_id)?;
        let name = self.name.filter(|n| !n.trim().is_empty())?;

        Some(CatalogTitle {
            id,
            name,
            release_year: self.release_info.as_deref().and_then(find_year),
        })
    }
}

impl MetaDetail {
    fn external_id(&self) -> Option<ExternalId> {
        self.imdb_id
            .as_deref()
            .or(self.id.as_deref())
            .and_then(ExternalId::parse)
    }

    fn moviedb_id(&self) -> Option<u64> {
        match self.moviedb_id.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Cinemeta catalog client, with TMDB used for the anime keyword check
pub struct CinemetaClient {
    client: Client,
    config: ApiConfig,
    rate_limiter: RateLimiter,
}

impl CinemetaClient {
    /// Create a new catalog client with the given configuration
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .user_agent(format!("medialink/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let rate_limiter =
            RateLimiter::new(Duration::from_millis(config.min_request_interval_ms));

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// GET with retry logic; `Ok(None)` means the resource does not exist
    fn get_with_retry(&self, url: &str) -> Result<Option<String>, ApiError> {
        let mut last_error = None;
        let mut delay = Duration::from_secs(1);

        for attempt in 1..=self.config.max_retries {
            self.rate_limiter.wait_if_needed();

            match self.get_once(url) {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!(
                        "Request attempt {}/{} failed: {}",
                        attempt, self.config.max_retries, e
                    );

                    if !e.is_transient() {
                        return Err(e);
                    }

                    last_error = Some(e);

                    if attempt < self.config.max_retries {
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                        delay *= 2; // Exponential backoff
                    }
                }
            }
        }

        Err(last_error.unwrap_or(ApiError::MaxRetriesExceeded {
            attempts: self.config.max_retries,
        }))
    }

    fn get_once(&self, url: &str) -> Result<Option<String>, ApiError> {
        debug!("Requesting: {}", redact(url));

        let response = self.client.get(url).send()?;
        let status = response.status();

        debug!("Response status: {}", status);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }

        if !status.is_success() {
            return Err(ApiError::ServerError(format!("HTTP {}", status)));
        }

        Ok(Some(response.text()?))
    }

    fn meta_url(&self, kind: SearchKind, id: &str) -> String {
        format!(
            "{}/meta/{}/{}.json",
            self.config.cinemeta_url,
            kind.as_path(),
            id
        )
    }

    fn fetch_meta(&self, kind: SearchKind, id: &ExternalId) -> Result<Option<MetaDetail>, ApiError> {
        let path_id = match id {
            ExternalId::Imdb(imdb) => imdb.clone(),
            ExternalId::Tmdb(tmdb) => format!("tmdb:{}", tmdb),
        };

        match self.get_with_retry(&self.meta_url(kind, &path_id))? {
            Some(body) => parse_meta_response(&body),
            None => Ok(None),
        }
    }
}

impl Catalog for CinemetaClient {
    fn search(
        &self,
        kind: SearchKind,
        query: &str,
        year: Option<u16>,
    ) -> Result<Vec<CatalogTitle>, ApiError> {
        // Cinemeta has no year filter; the resolver uses the year to pick among hits
        let url = format!(
            "{}/catalog/{}/top/search={}.json",
            self.config.cinemeta_url,
            kind.as_path(),
            urlencoding::encode(query)
        );

        info!(query = %query, year = ?year, kind = kind.as_path(), "Searching catalog");

        match self.get_with_retry(&url)? {
            Some(body) => parse_search_response(&body),
            None => Ok(Vec::new()),
        }
    }

    fn lookup(&self, kind: SearchKind, id: &ExternalId) -> Result<Option<CatalogTitle>, ApiError> {
        let meta = match self.fetch_meta(kind, id)? {
            Some(meta) => meta,
            None => return Ok(None),
        };

        let name = match meta.name.clone().filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => return Ok(None),
        };

        Ok(Some(CatalogTitle {
            id: meta.external_id().unwrap_or_else(|| id.clone()),
            name,
            release_year: meta.release_info.as_deref().and_then(find_year),
        }))
    }

    fn series_detail(&self, id: &ExternalId) -> Result<SeriesDetail, ApiError> {
        let meta = self
            .fetch_meta(SearchKind::Series, id)?
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;

        series_detail_from_meta(id, meta)
    }

    fn is_anime(&self, id: &ExternalId) -> Result<bool, ApiError> {
        let api_key = self
            .config
            .tmdb_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ApiError::NotConfigured)?;

        let moviedb_id = match id {
            ExternalId::Tmdb(tmdb) => Some(*tmdb),
            ExternalId::Imdb(_) => self
                .fetch_meta(SearchKind::Series, id)?
                .and_then(|meta| meta.moviedb_id()),
        };

        let moviedb_id = match moviedb_id {
            Some(m) => m,
            None => {
                debug!("No movie database id for {}", id);
                return Ok(false);
            }
        };

        let url = format!(
            "{}/3/tv/{}/keywords?api_key={}",
            self.config.tmdb_url,
            moviedb_id,
            urlencoding::encode(api_key)
        );

        match self.get_with_retry(&url)? {
            Some(body) => parse_keywords_response(&body),
            None => Ok(false),
        }
    }
}

fn parse_search_response(body: &str) -> Result<Vec<CatalogTitle>, ApiError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| ApiError::ParseError(e.to_string()))?;

    Ok(response
        .metas
        .into_iter()
        .filter_map(MetaPreview::into_title)
        .collect())
}

fn parse_meta_response(body: &str) -> Result<Option<MetaDetail>, ApiError> {
    let response: MetaResponse =
        serde_json::from_str(body).map_err(|e| ApiError::ParseError(e.to_string()))?;
    Ok(response.meta)
}

fn series_detail_from_meta(id: &ExternalId, meta: MetaDetail) -> Result<SeriesDetail, ApiError> {
    let id = meta.external_id().unwrap_or_else(|| id.clone());
    let release_year = meta.release_info.as_deref().and_then(find_year);

    let name = meta
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::ParseError(format!("series {} has no name", id)))?;

    let episodes = meta
        .videos
        .into_iter()
        .flat_map(|video| {
            let season = match video.season {
                Some(season) => season,
                None => return Vec::new(),
            };
            let title = video.title.or(video.name).filter(|t| !t.trim().is_empty());

            // A video answers to its in-season episode and its running number
            let numbers = match (video.episode, video.number) {
                (Some(episode), Some(number)) if episode != number => vec![episode, number],
                (episode, number) => episode.or(number).into_iter().collect(),
            };

            numbers
                .into_iter()
                .map(|episode| EpisodeInfo {
                    season,
                    episode,
                    title: title.clone(),
                })
                .collect()
        })
        .collect();

    Ok(SeriesDetail {
        id,
        name,
        release_year,
        episodes,
    })
}

fn parse_keywords_response(body: &str) -> Result<bool, ApiError> {
    let response: KeywordsResponse =
        serde_json::from_str(body).map_err(|e| ApiError::ParseError(e.to_string()))?;

    Ok(response
        .results
        .iter()
        .any(|k| k.name.eq_ignore_ascii_case("anime")))
}

/// Hide API keys from debug logs
fn redact(url: &str) -> String {
    match url.find("api_key=") {
        Some(pos) => format!("{}api_key=***", &url[..pos]),
        None => url.to_string(),
    }
}
