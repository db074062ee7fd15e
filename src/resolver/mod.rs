mod prompt;
mod types;

pub use prompt::{AutoPrompter, Choice, Disambiguation, Prompter, MAX_CHOICES};
pub use types::{
    EpisodeLookup, MediaKind, ResolveError, ResolvedIdentity, ResolverConfig, Thresholds,
    TitleQuery,
};

use crate::api::{Catalog, CatalogTitle, ExternalId, SearchKind, SeriesDetail};
use crate::parser::similarity;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};
use types::CacheKey;

/// Turns title guesses into catalog identities
///
/// Results are memoized for the lifetime of the resolver. The memo tables are
/// behind mutexes so the search step can run from several threads at once.
pub struct CatalogResolver<C: Catalog> {
    catalog: C,
    config: ResolverConfig,
    identities: Mutex<HashMap<CacheKey, ResolvedIdentity>>,
    series: Mutex<HashMap<ExternalId, SeriesDetail>>,
}

impl<C: Catalog> CatalogResolver<C> {
    pub fn new(catalog: C, config: ResolverConfig) -> Self {
        Self {
            catalog,
            config,
            identities: Mutex::new(HashMap::new()),
            series: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a query end to end: memo, search, select
    pub fn resolve(
        &self,
        query: &TitleQuery,
        prompter: &dyn Prompter,
    ) -> Result<ResolvedIdentity, ResolveError> {
        if let Some(identity) = self.cached(query) {
            return Ok(identity);
        }

        let results = self.search(query)?;
        Ok(self.select(query, results, prompter))
    }

    /// Memoized identity for this query, if any
    pub fn cached(&self, query: &TitleQuery) -> Option<ResolvedIdentity> {
        let hit = self
            .identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&query.cache_key())
            .cloned();

        if hit.is_some() {
            debug!(title = %query.title, "Identity cache hit");
        }
        hit
    }

    /// Catalog search only; safe to call concurrently
    pub fn search(&self, query: &TitleQuery) -> Result<Vec<CatalogTitle>, ResolveError> {
        let results = self
            .catalog
            .search(query.kind, &query.title, query.year)?;

        debug!(
            title = %query.title,
            year = ?query.year,
            count = results.len(),
            "Catalog search complete"
        );
        Ok(results)
    }

    /// Pick an identity from search results, prompting if ambiguous, and memoize it
    pub fn select(
        &self,
        query: &TitleQuery,
        results: Vec<CatalogTitle>,
        prompter: &dyn Prompter,
    ) -> ResolvedIdentity {
        let identity = match self.pick(query, results, prompter) {
            Some(title) => self.identity_for(query, title),
            None => {
                info!(title = %query.title, "No catalog match, using raw title");
                ResolvedIdentity::degraded(query)
            }
        };

        self.identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query.cache_key(), identity.clone());

        identity
    }

    fn pick(
        &self,
        query: &TitleQuery,
        mut results: Vec<CatalogTitle>,
        prompter: &dyn Prompter,
    ) -> Option<CatalogTitle> {
        let thresholds = &self.config.thresholds;

        match results.len() {
            0 => return None,
            1 => return results.pop(),
            _ => {}
        }

        if let Some(year) = query.year {
            let index = results
                .iter()
                .position(|r| r.release_year == Some(year))
                .or_else(|| {
                    results
                        .iter()
                        .position(|r| similarity(&r.name, &query.title) >= thresholds.title_match)
                })
                .unwrap_or(0);
            return Some(results.swap_remove(index));
        }

        if self.config.auto_mode || !self.is_ambiguous(query, &results) {
            return Some(results.swap_remove(0));
        }

        results.truncate(MAX_CHOICES);
        let question = Disambiguation {
            query: query.title.clone(),
            kind: query.kind,
            candidates: results,
        };

        match prompter.choose(&question) {
            Choice::Index(i) if i < question.candidates.len() => {
                question.candidates.into_iter().nth(i)
            }
            Choice::ExternalId(id) => match self.catalog.lookup(query.kind, &id) {
                Ok(Some(title)) => Some(title),
                Ok(None) => {
                    warn!(id = %id, "Catalog has no entry for that id, using first result");
                    question.candidates.into_iter().next()
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Lookup failed, using first result");
                    question.candidates.into_iter().next()
                }
            },
            _ => question.candidates.into_iter().next(),
        }
    }

    /// Top two results look alike, or the best one doesn't resemble the query
    fn is_ambiguous(&self, query: &TitleQuery, results: &[CatalogTitle]) -> bool {
        let thresholds = &self.config.thresholds;

        let top_pair_similar = match results {
            [first, second, ..] => similarity(&first.name, &second.name) >= thresholds.title_match,
            _ => false,
        };

        let top_unlike_query = results
            .first()
            .map(|first| similarity(&first.name, &query.title) < thresholds.query_match)
            .unwrap_or(false);

        top_pair_similar || top_unlike_query
    }

    fn identity_for(&self, query: &TitleQuery, title: CatalogTitle) -> ResolvedIdentity {
        let media_kind = match query.kind {
            SearchKind::Movie => MediaKind::Movie,
            SearchKind::Series if self.config.split_anime => {
                match self.catalog.is_anime(&title.id) {
                    Ok(true) => MediaKind::AnimeShow,
                    Ok(false) => MediaKind::Show,
                    Err(e) => {
                        warn!(id = %title.id, error = %e, "Anime check failed, filing as show");
                        MediaKind::Show
                    }
                }
            }
            SearchKind::Series => MediaKind::Show,
        };

        info!(
            query = %query.title,
            matched = %title.name,
            id = %title.id,
            "Resolved title"
        );

        ResolvedIdentity {
            display_name: title.name,
            external_id: Some(title.id),
            year: title.release_year.or(query.year),
            media_kind,
        }
    }

    /// Episode title for a resolved series
    pub fn episode_lookup(
        &self,
        identity: &ResolvedIdentity,
        season: u32,
        episode: u32,
    ) -> EpisodeLookup {
        let id = match &identity.external_id {
            Some(id) => id,
            None => return EpisodeLookup::Unavailable,
        };

        let cached = self
            .series
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned();

        let detail = match cached {
            Some(detail) => detail,
            None => match self.catalog.series_detail(id) {
                Ok(detail) => {
                    self.series
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(id.clone(), detail.clone());
                    detail
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to fetch series details");
                    return EpisodeLookup::Unavailable;
                }
            },
        };

        let show = identity.display_name.clone();
        let year = identity.year.or(detail.release_year);

        match detail.episode(season, episode).and_then(|e| e.title.clone()) {
            Some(title) => EpisodeLookup::Titled { show, year, title },
            None => EpisodeLookup::Untitled { show, year },
        }
    }
}
